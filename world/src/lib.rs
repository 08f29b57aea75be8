#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative match state for Tower Duel.
//!
//! The [`World`] owns the grid, both ledgers, the tower registry and the phase
//! state machine. Every mutation flows through [`apply`]; read access goes
//! through the [`query`] module.

mod combat;
mod editor;
mod grid;
pub mod navigation;
mod snapshot;
mod towers;
mod validation;

use thiserror::Error;
use tower_duel_core::{
    economy, CellChange, CellCoord, Command, Event, Faction, LegalityError, Ledger, MapLayout,
    MatchSnapshot, Phase, SoldierId, MAX_CASTLE_HITPOINTS, MAX_GRID_DIMENSION,
};

pub use combat::CombatFault;
pub use snapshot::{InvalidSavedStateError, LoadTarget};

use combat::TickOutcome;
use grid::{Grid, GridCell, Ground, Site};
use towers::TowerRegistry;

const DEFAULT_GRID_ROWS: u32 = 10;
const DEFAULT_GRID_COLUMNS: u32 = 10;

/// Reasons a [`MapLayout`] cannot start a match.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum LayoutError {
    /// The grid needs at least two cells to hold both castles.
    #[error("grid {rows}x{columns} is too small for two castles")]
    GridTooSmall {
        /// Requested rows.
        rows: u32,
        /// Requested columns.
        columns: u32,
    },
    /// A side of the grid exceeds [`MAX_GRID_DIMENSION`].
    #[error("grid {rows}x{columns} exceeds {} cells per side", MAX_GRID_DIMENSION)]
    GridTooLarge {
        /// Requested rows.
        rows: u32,
        /// Requested columns.
        columns: u32,
    },
    /// A castle lies outside the grid.
    #[error("castle of {0:?} lies outside the grid")]
    CastleOutOfBounds(Faction),
    /// Both castles share a cell.
    #[error("castles overlap")]
    CastlesOverlap,
    /// An obstacle lies outside the grid.
    #[error("obstacle at {0:?} lies outside the grid")]
    ObstacleOutOfBounds(CellCoord),
    /// An obstacle covers a castle.
    #[error("obstacle at {0:?} covers a castle")]
    ObstacleOnCastle(CellCoord),
    /// No route connects the castles.
    #[error("the castles are not connected")]
    Disconnected,
}

/// Failure returned by [`apply`]. The world is left untouched.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum CommandError {
    /// The command is not legal in the current state.
    #[error(transparent)]
    Rejected(#[from] LegalityError),
    /// A new match was requested from an unusable layout.
    #[error("invalid map layout: {0}")]
    InvalidLayout(#[from] LayoutError),
    /// A combat tick hit an internal inconsistency and was discarded.
    #[error("combat tick aborted: {0}")]
    Fault(#[from] CombatFault),
}

/// Represents the authoritative Tower Duel match state.
#[derive(Clone, Debug)]
pub struct World {
    grid: Grid,
    castles: [CellCoord; 2],
    towers: TowerRegistry,
    ledgers: [Ledger; 2],
    phase: Phase,
    round: u32,
    lane: Vec<CellCoord>,
    tick_count: u64,
    next_soldier_id: u32,
}

impl World {
    /// Creates a blank 10x10 match with castles in opposite corners.
    #[must_use]
    pub fn new() -> Self {
        Self::blank(
            DEFAULT_GRID_ROWS,
            DEFAULT_GRID_COLUMNS,
            economy::STARTING_MONEY,
        )
    }

    /// Builds a match from a layout after validating it.
    pub fn from_layout(layout: &MapLayout) -> Result<Self, LayoutError> {
        let MapLayout { rows, columns, .. } = *layout;
        if u64::from(rows) * u64::from(columns) < 2 {
            return Err(LayoutError::GridTooSmall { rows, columns });
        }
        if rows > MAX_GRID_DIMENSION || columns > MAX_GRID_DIMENSION {
            return Err(LayoutError::GridTooLarge { rows, columns });
        }

        let mut world = Self::blank(rows, columns, layout.starting_money);
        for faction in Faction::ALL {
            if !world.grid.contains(layout.castle(faction)) {
                return Err(LayoutError::CastleOutOfBounds(faction));
            }
        }
        if layout.castle(Faction::One) == layout.castle(Faction::Two) {
            return Err(LayoutError::CastlesOverlap);
        }

        world.grid = Grid::new(rows, columns);
        for faction in Faction::ALL {
            let cell = layout.castle(faction);
            world.castles[faction.index()] = cell;
            let _ = world.grid.replace(cell, castle_cell(faction));
        }

        for (cell, obstacle) in &layout.obstacles {
            if !world.grid.contains(*cell) {
                return Err(LayoutError::ObstacleOutOfBounds(*cell));
            }
            if world.castles.contains(cell) {
                return Err(LayoutError::ObstacleOnCastle(*cell));
            }
            let _ = world.grid.replace(*cell, GridCell::Obstacle(*obstacle));
        }

        if world.castle_path().is_none() {
            return Err(LayoutError::Disconnected);
        }
        Ok(world)
    }

    /// All-plain match; castles go to the top-left and bottom-right corners.
    fn blank(rows: u32, columns: u32, money: u32) -> Self {
        let layout = MapLayout::blank(rows, columns);
        let mut grid = Grid::new(rows, columns);
        for faction in Faction::ALL {
            let _ = grid.replace(layout.castle(faction), castle_cell(faction));
        }

        Self {
            grid,
            castles: layout.castles,
            towers: TowerRegistry::new(),
            ledgers: [Ledger::with_money(money); 2],
            phase: Phase::Build(Faction::One),
            round: 1,
            lane: Vec::new(),
            tick_count: 0,
            next_soldier_id: 0,
        }
    }

    fn castle(&self, faction: Faction) -> CellCoord {
        self.castles[faction.index()]
    }

    fn ledger(&self, faction: Faction) -> Ledger {
        self.ledgers[faction.index()]
    }

    fn ledger_mut(&mut self, faction: Faction) -> &mut Ledger {
        &mut self.ledgers[faction.index()]
    }

    fn allocate_soldier_id(&mut self) -> SoldierId {
        let id = SoldierId::new(self.next_soldier_id);
        self.next_soldier_id = self.next_soldier_id.wrapping_add(1);
        id
    }

    /// Route between the castles, ordered from faction one to faction two.
    fn castle_path(&self) -> Option<Vec<CellCoord>> {
        let mut path = navigation::find_path(
            &self.grid.passability(),
            self.castle(Faction::One),
            self.castle(Faction::Two),
        )?;
        path.reverse();
        Some(path)
    }
}

impl Default for World {
    fn default() -> Self {
        Self::new()
    }
}

fn castle_cell(faction: Faction) -> GridCell {
    GridCell::Ground(Ground::new(Site::Castle {
        faction,
        hitpoints: MAX_CASTLE_HITPOINTS,
    }))
}

fn command_label(command: &Command) -> &'static str {
    match command {
        Command::NewMatch { .. } => "new_match",
        Command::BuildTower { .. } => "build_tower",
        Command::UpgradeTower { .. } => "upgrade_tower",
        Command::RemoveTower { .. } => "remove_tower",
        Command::BuySoldier { .. } => "buy_soldier",
        Command::EndPhase => "end_phase",
        Command::Tick => "tick",
        Command::PlaceTerrain { .. } => "place_terrain",
        Command::MoveCastle { .. } => "move_castle",
        Command::SetStartingMoney { .. } => "set_starting_money",
    }
}

/// Applies the provided command to the world, mutating state deterministically.
///
/// Rejected commands leave the world untouched and emit no events.
pub fn apply(
    world: &mut World,
    command: Command,
    out_events: &mut Vec<Event>,
) -> Result<(), CommandError> {
    let label = command_label(&command);
    let result = dispatch(world, command, out_events);
    match &result {
        Ok(()) => tracing::debug!(command = label, "command applied"),
        Err(CommandError::Fault(fault)) => {
            tracing::error!(command = label, %fault, "command aborted");
        }
        Err(error) => tracing::debug!(command = label, %error, "command rejected"),
    }
    result
}

fn dispatch(
    world: &mut World,
    command: Command,
    out_events: &mut Vec<Event>,
) -> Result<(), CommandError> {
    match command {
        Command::NewMatch { layout } => {
            *world = World::from_layout(&layout)?;
            tracing::info!(rows = layout.rows, columns = layout.columns, "match started");
            out_events.push(Event::MatchStarted {
                rows: layout.rows,
                columns: layout.columns,
            });
            out_events.push(Event::PhaseChanged { phase: world.phase });
        }
        Command::BuildTower { kind, cell } => {
            let change = validation::build_tower(world, kind, cell)?;
            publish(out_events, vec![change]);
        }
        Command::UpgradeTower { cell } => {
            let change = validation::upgrade_tower(world, cell)?;
            publish(out_events, vec![change]);
        }
        Command::RemoveTower { cell } => {
            let change = validation::remove_tower(world, cell)?;
            publish(out_events, vec![change]);
        }
        Command::BuySoldier { kind } => {
            let change = validation::buy_soldier(world, kind)?;
            publish(out_events, vec![change]);
        }
        Command::EndPhase => end_phase(world, out_events)?,
        Command::Tick => tick(world, out_events)?,
        Command::PlaceTerrain { cell, terrain } => {
            let change = editor::place_terrain(world, cell, terrain)?;
            publish(out_events, vec![change]);
        }
        Command::MoveCastle { faction, cell } => {
            let changes = editor::move_castle(world, faction, cell)?;
            publish(out_events, changes);
        }
        Command::SetStartingMoney { amount } => editor::set_starting_money(world, amount)?,
    }
    Ok(())
}

fn publish(out_events: &mut Vec<Event>, changes: Vec<CellChange>) {
    if !changes.is_empty() {
        out_events.push(Event::CellsChanged { changes });
    }
}

fn end_phase(world: &mut World, out_events: &mut Vec<Event>) -> Result<(), CommandError> {
    match world.phase {
        Phase::Build(Faction::One) => {
            world.phase = Phase::Build(Faction::Two);
        }
        Phase::Build(Faction::Two) => {
            world.lane = world.castle_path().ok_or(CombatFault::LaneUnavailable)?;
            world.tick_count = 0;
            world.phase = Phase::Simulation;
            tracing::debug!(lane_length = world.lane.len(), "lane captured");
        }
        Phase::Simulation | Phase::GameOver(_) => {
            return Err(LegalityError::WrongPhase.into());
        }
    }
    out_events.push(Event::PhaseChanged { phase: world.phase });
    Ok(())
}

fn tick(world: &mut World, out_events: &mut Vec<Event>) -> Result<(), CommandError> {
    if world.phase != Phase::Simulation {
        return Err(LegalityError::WrongPhase.into());
    }

    let mut staged = world.clone();
    let mut changes = Vec::new();
    let outcome = combat::resolve_tick(&mut staged, &mut changes)?;
    *world = staged;

    match outcome {
        TickOutcome::Advanced => publish(out_events, changes),
        TickOutcome::RoundEnded { round, income } => {
            tracing::info!(round, ?income, "round ended");
            out_events.push(Event::RoundEnded { round, income });
            out_events.push(Event::PhaseChanged { phase: world.phase });
        }
        TickOutcome::GameOver(outcome) => {
            tracing::info!(?outcome, "match over");
            out_events.push(Event::PhaseChanged { phase: world.phase });
            out_events.push(Event::GameOver { outcome });
        }
    }
    Ok(())
}

/// Replaces the world with the contents of a snapshot.
///
/// The snapshot is validated in full before anything changes; on error the
/// current match is kept as it was.
pub fn load(
    world: &mut World,
    snapshot: &MatchSnapshot,
    target: LoadTarget,
    out_events: &mut Vec<Event>,
) -> Result<(), InvalidSavedStateError> {
    match snapshot::restore(snapshot, target) {
        Ok(restored) => {
            *world = restored;
            tracing::info!(?target, round = world.round, "snapshot loaded");
            out_events.push(Event::MatchStarted {
                rows: world.grid.rows(),
                columns: world.grid.columns(),
            });
            out_events.push(Event::PhaseChanged { phase: world.phase });
            Ok(())
        }
        Err(error) => {
            tracing::warn!(?target, %error, "snapshot rejected");
            Err(error)
        }
    }
}

/// Query functions that provide read-only access to the world state.
pub mod query {
    use tower_duel_core::{
        CellCoord, CellKind, Faction, LegalityError, Ledger, MatchSnapshot, Phase, Soldier,
        SoldierKind, Terrain, Tower, TowerKind,
    };

    use super::{
        editor,
        grid::{GridCell, Site},
        navigation::PassabilityMask,
        snapshot, validation, World,
    };

    /// Number of rows and columns of the grid.
    #[must_use]
    pub fn dimensions(world: &World) -> (u32, u32) {
        (world.grid.rows(), world.grid.columns())
    }

    /// Describes the content of a cell, or `None` outside the grid.
    #[must_use]
    pub fn cell(world: &World, cell: CellCoord) -> Option<CellKind> {
        let kind = match world.grid.get(cell)? {
            GridCell::Obstacle(obstacle) => CellKind::Obstacle(*obstacle),
            GridCell::Ground(ground) => match ground.site {
                Site::Plain => CellKind::Plain,
                Site::Castle { faction, hitpoints } => CellKind::Castle { faction, hitpoints },
                Site::Tower(id) => CellKind::Tower(world.towers.get(id)?.tower),
            },
        };
        Some(kind)
    }

    /// Current phase of the match.
    #[must_use]
    pub fn phase(world: &World) -> Phase {
        world.phase
    }

    /// Current round number, starting at 1.
    #[must_use]
    pub fn round(world: &World) -> u32 {
        world.round
    }

    /// Economy counters of a faction.
    #[must_use]
    pub fn ledger(world: &World, faction: Faction) -> Ledger {
        world.ledger(faction)
    }

    /// Money held by a faction.
    #[must_use]
    pub fn money(world: &World, faction: Faction) -> u32 {
        world.ledger(faction).money
    }

    /// Cell holding a faction's castle.
    #[must_use]
    pub fn castle(world: &World, faction: Faction) -> CellCoord {
        world.castle(faction)
    }

    /// Remaining hitpoints of a faction's castle.
    #[must_use]
    pub fn castle_hitpoints(world: &World, faction: Faction) -> u32 {
        match cell(world, world.castle(faction)) {
            Some(CellKind::Castle { hitpoints, .. }) => hitpoints,
            _ => 0,
        }
    }

    /// Lane captured for the current combat phase, from faction one's castle
    /// to faction two's. Empty outside combat.
    #[must_use]
    pub fn captured_lane(world: &World) -> &[CellCoord] {
        &world.lane
    }

    /// Ticks resolved since the current combat phase started.
    #[must_use]
    pub fn tick_count(world: &World) -> u64 {
        world.tick_count
    }

    /// Soldiers of a faction alive anywhere on the grid.
    #[must_use]
    pub fn soldier_count(world: &World, faction: Faction) -> usize {
        world.grid.soldier_count(faction)
    }

    /// Soldiers of one kind alive for a faction.
    #[must_use]
    pub fn soldiers_by_kind(world: &World, faction: Faction, kind: SoldierKind) -> usize {
        world.grid.soldiers_of_kind(faction, kind)
    }

    /// Soldiers of a faction queued on a cell, front first.
    #[must_use]
    pub fn occupants(world: &World, cell: CellCoord, faction: Faction) -> Vec<Soldier> {
        world
            .grid
            .ground(cell)
            .map(|ground| ground.queue(faction).iter().copied().collect())
            .unwrap_or_default()
    }

    /// Reports whether a soldier of `faction` died on the cell during the last tick.
    #[must_use]
    pub fn just_died(world: &World, cell: CellCoord, faction: Faction) -> bool {
        world
            .grid
            .ground(cell)
            .map_or(false, |ground| ground.just_died[faction.index()])
    }

    /// Towers of a faction with their cells, in construction order.
    #[must_use]
    pub fn towers(world: &World, faction: Faction) -> Vec<(CellCoord, Tower)> {
        world
            .towers
            .owned_by(faction)
            .map(|state| (state.cell, state.tower))
            .collect()
    }

    /// Passability of the live grid.
    #[must_use]
    pub fn passability_mask(world: &World) -> PassabilityMask {
        world.grid.passability()
    }

    /// Checks whether the acting faction may build a tower on the cell.
    pub fn can_build(world: &World, kind: TowerKind, cell: CellCoord) -> Result<(), LegalityError> {
        validation::can_build(world, kind, cell)
    }

    /// Checks whether the acting faction may upgrade the tower on the cell.
    pub fn can_upgrade(world: &World, cell: CellCoord) -> Result<(), LegalityError> {
        validation::can_upgrade(world, cell)
    }

    /// Checks whether the tower on the cell may be removed.
    pub fn can_remove(world: &World, cell: CellCoord) -> Result<(), LegalityError> {
        validation::can_remove(world, cell)
    }

    /// Checks whether the acting faction may recruit a soldier.
    pub fn can_buy(world: &World, kind: SoldierKind) -> Result<(), LegalityError> {
        validation::can_buy(world, kind)
    }

    /// Checks whether the editor may paint terrain onto the cell.
    pub fn can_place_terrain(
        world: &World,
        cell: CellCoord,
        terrain: Terrain,
    ) -> Result<(), LegalityError> {
        editor::can_place_terrain(world, cell, terrain)
    }

    /// Checks whether the editor may move a castle to the cell.
    pub fn can_move_castle(
        world: &World,
        faction: Faction,
        cell: CellCoord,
    ) -> Result<(), LegalityError> {
        editor::can_move_castle(world, faction, cell)
    }

    /// Captures a save-game snapshot of the match.
    #[must_use]
    pub fn snapshot(world: &World) -> MatchSnapshot {
        snapshot::capture(world)
    }
}
