#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Shared vocabulary of the Tower Duel match engine.
//!
//! Grid coordinates, factions, match phases, towers and soldiers live here
//! together with the [`Command`] orders a player or driver may issue and the
//! [`Event`] change-sets the world answers with. Legality failures are
//! described by [`LegalityError`]; costs and payouts sit in [`economy`] and
//! the persisted save format in [`snapshot`].

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub mod economy;
pub mod snapshot;

pub use snapshot::{CellRecord, LedgerRecord, MatchSnapshot, TowerRecord};

/// Hitpoints every castle starts a match with; castle hitpoints never exceed it.
pub const MAX_CASTLE_HITPOINTS: u32 = 100;

/// Longest side, in cells, a match grid may have.
pub const MAX_GRID_DIMENSION: u32 = 256;

/// Soldiers a single castle may keep queued in a saved match.
pub const MAX_QUEUED_SOLDIERS: u32 = 10_000;

/// Highest level a tower can be upgraded to.
pub const MAX_TOWER_LEVEL: u8 = 5;

/// Radius of the territory rule around allied towers and castles, and of the
/// exclusion zone around the enemy castle.
pub const TERRITORY_RADIUS: u32 = 3;

/// One of the two opposing sides of a match.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Faction {
    /// Faction that builds first each round.
    One,
    /// Faction that builds second each round.
    Two,
}

impl Faction {
    /// Both factions in turn order.
    pub const ALL: [Faction; 2] = [Faction::One, Faction::Two];

    /// Returns the opposing faction.
    #[must_use]
    pub const fn opponent(self) -> Self {
        match self {
            Self::One => Self::Two,
            Self::Two => Self::One,
        }
    }

    /// Stable index used to address per-faction arrays.
    #[must_use]
    pub const fn index(self) -> usize {
        match self {
            Self::One => 0,
            Self::Two => 1,
        }
    }
}

/// Location of a single grid cell expressed as row and column coordinates.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CellCoord {
    row: u32,
    column: u32,
}

impl CellCoord {
    /// Creates a new grid cell coordinate.
    #[must_use]
    pub const fn new(row: u32, column: u32) -> Self {
        Self { row, column }
    }

    /// Zero-based row index of the cell.
    #[must_use]
    pub const fn row(&self) -> u32 {
        self.row
    }

    /// Zero-based column index of the cell.
    #[must_use]
    pub const fn column(&self) -> u32 {
        self.column
    }

    /// Computes the Manhattan distance between two cell coordinates.
    #[must_use]
    pub fn manhattan_distance(self, other: CellCoord) -> u32 {
        self.column().abs_diff(other.column()) + self.row().abs_diff(other.row())
    }

    /// Computes the Chebyshev (king-move) distance between two cell coordinates.
    #[must_use]
    pub fn chebyshev_distance(self, other: CellCoord) -> u32 {
        self.column()
            .abs_diff(other.column())
            .max(self.row().abs_diff(other.row()))
    }
}

/// Impassable terrain that never hosts soldiers.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Obstacle {
    /// Open water.
    Water,
    /// Mountain range.
    Mountain,
}

/// Terrain the map editor may paint onto a cell.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Terrain {
    /// Clears the cell back to plain ground.
    Plain,
    /// Places an obstacle on the cell.
    Obstacle(Obstacle),
}

/// Types of towers that can be constructed on the grid.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum TowerKind {
    /// Long reach, light damage.
    Ranged,
    /// Short reach, heavy damage.
    Damage,
    /// Heals the allied castle whenever it kills a soldier.
    Support,
}

impl TowerKind {
    /// Every constructible tower kind.
    pub const ALL: [TowerKind; 3] = [TowerKind::Ranged, TowerKind::Damage, TowerKind::Support];

    /// Statistics of a freshly built level 1 tower.
    #[must_use]
    pub const fn base_stats(self) -> TowerStats {
        match self {
            Self::Ranged => TowerStats::new(3, 5, 2, 0),
            Self::Damage => TowerStats::new(2, 10, 2, 0),
            Self::Support => TowerStats::new(2, 5, 1, 5),
        }
    }

    /// Applies the bonus granted when a tower of this kind reaches `level`.
    ///
    /// Returns `None` for levels outside `2..=5`.
    #[must_use]
    pub const fn upgrade_stats(self, stats: TowerStats, level: u8) -> Option<TowerStats> {
        let TowerStats {
            range,
            damage,
            target_count,
            heal_amount,
        } = stats;
        let upgraded = match (self, level) {
            (Self::Ranged, 2) => TowerStats::new(range + 1, damage + 3, target_count, heal_amount),
            (Self::Ranged, 3) => TowerStats::new(range, damage, target_count + 1, heal_amount),
            (Self::Ranged, 4) => TowerStats::new(range, damage + 3, target_count, heal_amount),
            (Self::Damage, 2) => TowerStats::new(range, damage + 5, target_count, heal_amount),
            (Self::Damage, 3) => TowerStats::new(range, damage, target_count + 1, heal_amount),
            (Self::Damage, 4) => TowerStats::new(range, damage + 5, target_count, heal_amount),
            (Self::Support, 2) => TowerStats::new(range, damage, target_count, heal_amount + 1),
            (Self::Support, 3) => TowerStats::new(range + 1, damage + 5, target_count, heal_amount),
            (Self::Support, 4) => TowerStats::new(range, damage, target_count + 1, heal_amount),
            (_, 5) => TowerStats::new(range + 1, damage + 5, target_count + 1, heal_amount),
            _ => return None,
        };
        Some(upgraded)
    }
}

/// Combat parameters carried by a tower.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TowerStats {
    /// Manhattan reach measured in cells.
    pub range: u32,
    /// Hitpoints removed from a soldier per attack.
    pub damage: u32,
    /// Maximum number of attacks per tick.
    pub target_count: u32,
    /// Castle hitpoints restored per kill. Zero for non-support towers.
    pub heal_amount: u32,
}

impl TowerStats {
    /// Creates a new statistics bundle.
    #[must_use]
    pub const fn new(range: u32, damage: u32, target_count: u32, heal_amount: u32) -> Self {
        Self {
            range,
            damage,
            target_count,
            heal_amount,
        }
    }
}

/// Value description of a tower standing on the grid.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Tower {
    faction: Faction,
    kind: TowerKind,
    level: u8,
    stats: TowerStats,
}

impl Tower {
    /// Creates a level 1 tower with the kind's base statistics.
    #[must_use]
    pub const fn new(faction: Faction, kind: TowerKind) -> Self {
        Self {
            faction,
            kind,
            level: 1,
            stats: kind.base_stats(),
        }
    }

    /// Rebuilds a tower from explicit values, typically restored from a snapshot.
    #[must_use]
    pub const fn from_parts(faction: Faction, kind: TowerKind, level: u8, stats: TowerStats) -> Self {
        Self {
            faction,
            kind,
            level,
            stats,
        }
    }

    /// Faction that owns the tower.
    #[must_use]
    pub const fn faction(&self) -> Faction {
        self.faction
    }

    /// Kind of tower.
    #[must_use]
    pub const fn kind(&self) -> TowerKind {
        self.kind
    }

    /// Current level in `1..=5`.
    #[must_use]
    pub const fn level(&self) -> u8 {
        self.level
    }

    /// Current combat statistics.
    #[must_use]
    pub const fn stats(&self) -> TowerStats {
        self.stats
    }

    /// Reports whether the tower reached the level cap.
    #[must_use]
    pub const fn is_max_level(&self) -> bool {
        self.level >= MAX_TOWER_LEVEL
    }

    /// Returns the tower one level higher, or `None` at the level cap.
    #[must_use]
    pub fn upgraded(self) -> Option<Self> {
        let level = self.level.checked_add(1)?;
        let stats = self.kind.upgrade_stats(self.stats, level)?;
        Some(Self {
            level,
            stats,
            ..self
        })
    }

    /// Reports whether `cell` lies within the tower's Manhattan reach from `origin`.
    #[must_use]
    pub fn reaches(&self, origin: CellCoord, cell: CellCoord) -> bool {
        origin.manhattan_distance(cell) <= self.stats.range
    }
}

/// Kinds of soldiers a faction can recruit.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum SoldierKind {
    /// Hits castles hard but is fragile.
    Attack,
    /// Hits castles lightly but survives longer.
    Tank,
}

impl SoldierKind {
    /// Every recruitable soldier kind.
    pub const ALL: [SoldierKind; 2] = [SoldierKind::Attack, SoldierKind::Tank];

    /// Damage dealt to the enemy castle on arrival.
    #[must_use]
    pub const fn damage(self) -> u32 {
        match self {
            Self::Attack => 10,
            Self::Tank => 5,
        }
    }

    /// Hitpoints of a freshly recruited soldier.
    #[must_use]
    pub const fn max_hitpoints(self) -> u32 {
        match self {
            Self::Attack => 35,
            Self::Tank => 50,
        }
    }
}

/// Unique identifier assigned to a soldier.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SoldierId(u32);

impl SoldierId {
    /// Creates a new soldier identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Unique identifier assigned to a tower; allocation order is construction order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TowerId(u32);

impl TowerId {
    /// Creates a new tower identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the tower identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// A single soldier walking the lane.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Soldier {
    id: SoldierId,
    faction: Faction,
    kind: SoldierKind,
    hitpoints: u32,
}

impl Soldier {
    /// Recruits a soldier at full health.
    #[must_use]
    pub const fn recruit(id: SoldierId, faction: Faction, kind: SoldierKind) -> Self {
        Self {
            id,
            faction,
            kind,
            hitpoints: kind.max_hitpoints(),
        }
    }

    /// Identifier allocated by the world.
    #[must_use]
    pub const fn id(&self) -> SoldierId {
        self.id
    }

    /// Faction that recruited the soldier.
    #[must_use]
    pub const fn faction(&self) -> Faction {
        self.faction
    }

    /// Kind of soldier.
    #[must_use]
    pub const fn kind(&self) -> SoldierKind {
        self.kind
    }

    /// Remaining hitpoints.
    #[must_use]
    pub const fn hitpoints(&self) -> u32 {
        self.hitpoints
    }

    /// Reports whether the soldier ran out of hitpoints.
    #[must_use]
    pub const fn is_dead(&self) -> bool {
        self.hitpoints == 0
    }

    /// Subtracts `damage`, saturating at zero.
    pub fn take_damage(&mut self, damage: u32) {
        self.hitpoints = self.hitpoints.saturating_sub(damage);
    }
}

/// Read-only description of what occupies a grid cell.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CellKind {
    /// Empty ground.
    Plain,
    /// Impassable terrain.
    Obstacle(Obstacle),
    /// A faction's home base.
    Castle {
        /// Owning faction.
        faction: Faction,
        /// Remaining hitpoints in `0..=100`.
        hitpoints: u32,
    },
    /// A tower.
    Tower(Tower),
}

impl CellKind {
    /// Reports whether soldiers may walk through and queue on the cell.
    #[must_use]
    pub const fn is_passable(&self) -> bool {
        !matches!(self, Self::Obstacle(_))
    }
}

/// Per-faction economy counters.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Ledger {
    /// Money available for spending.
    pub money: u32,
    /// Enemy soldiers killed during the current round.
    pub kills_this_round: u32,
    /// Soldiers recruited since the match began.
    pub total_units_built: u32,
}

impl Ledger {
    /// Creates a fresh ledger holding `money`.
    #[must_use]
    pub const fn with_money(money: u32) -> Self {
        Self {
            money,
            kills_this_round: 0,
            total_units_built: 0,
        }
    }
}

/// Final result of a match.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Outcome {
    /// The named faction's castle survived while the other fell.
    Winner(Faction),
    /// Both castles fell during the same tick.
    Draw,
}

/// Phase of the match state machine.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Phase {
    /// The named faction may spend money.
    Build(Faction),
    /// Soldiers march and towers fire, one tick at a time.
    Simulation,
    /// The match has ended.
    GameOver(Outcome),
}

impl Phase {
    /// Faction allowed to act during a build phase.
    #[must_use]
    pub const fn builder(self) -> Option<Faction> {
        match self {
            Self::Build(faction) => Some(faction),
            Self::Simulation | Self::GameOver(_) => None,
        }
    }
}

/// Initial arrangement of a grid, produced by map generation or the blank layout.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MapLayout {
    /// Number of grid rows.
    pub rows: u32,
    /// Number of grid columns.
    pub columns: u32,
    /// Castle positions indexed by [`Faction::index`].
    pub castles: [CellCoord; 2],
    /// Obstacles placed on the grid.
    pub obstacles: Vec<(CellCoord, Obstacle)>,
    /// Money credited to both factions at match start.
    pub starting_money: u32,
}

impl MapLayout {
    /// All-plain layout with the castles in opposite corners.
    #[must_use]
    pub fn blank(rows: u32, columns: u32) -> Self {
        Self {
            rows,
            columns,
            castles: [
                CellCoord::new(0, 0),
                CellCoord::new(rows.saturating_sub(1), columns.saturating_sub(1)),
            ],
            obstacles: Vec::new(),
            starting_money: economy::STARTING_MONEY,
        }
    }

    /// Castle position of the provided faction.
    #[must_use]
    pub const fn castle(&self, faction: Faction) -> CellCoord {
        self.castles[faction.index()]
    }
}

/// Commands that express all permissible world mutations.
///
/// Faction-specific commands act on behalf of the faction whose build phase
/// is active.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Command {
    /// Discards the current match and starts a new one from the layout.
    NewMatch {
        /// Grid arrangement for the new match.
        layout: MapLayout,
    },
    /// Constructs a tower on a plain cell.
    BuildTower {
        /// Kind of tower to construct.
        kind: TowerKind,
        /// Target cell.
        cell: CellCoord,
    },
    /// Raises an allied tower by one level.
    UpgradeTower {
        /// Cell holding the tower.
        cell: CellCoord,
    },
    /// Demolishes an allied tower for a refund.
    RemoveTower {
        /// Cell holding the tower.
        cell: CellCoord,
    },
    /// Recruits a soldier into the acting faction's castle queue.
    BuySoldier {
        /// Kind of soldier to recruit.
        kind: SoldierKind,
    },
    /// Hands the turn to the next phase.
    EndPhase,
    /// Resolves one combat step.
    Tick,
    /// Editor: paints terrain onto a cell.
    PlaceTerrain {
        /// Target cell.
        cell: CellCoord,
        /// Terrain to paint.
        terrain: Terrain,
    },
    /// Editor: relocates a castle.
    MoveCastle {
        /// Faction whose castle moves.
        faction: Faction,
        /// Destination cell.
        cell: CellCoord,
    },
    /// Editor: sets both factions' money.
    SetStartingMoney {
        /// Amount credited to each faction.
        amount: u32,
    },
}

/// Presentation hint attached to a cell in a change-set.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ChangeKind {
    /// A tower on the cell attacked this tick.
    Fired,
    /// A soldier on the cell was struck.
    Hit,
    /// The cell's content changed.
    Changed,
    /// The tower on the cell gained a level.
    Upgraded,
    /// A soldier arrived on the cell.
    SoldierEntered,
    /// A soldier departed the cell.
    SoldierLeft,
    /// A soldier died on the cell.
    SoldierDied,
}

/// Single entry of a change-set.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CellChange {
    /// Affected cell.
    pub cell: CellCoord,
    /// What happened there.
    pub kind: ChangeKind,
}

impl CellChange {
    /// Creates a new change-set entry.
    #[must_use]
    pub const fn new(cell: CellCoord, kind: ChangeKind) -> Self {
        Self { cell, kind }
    }
}

/// Events broadcast by the world after processing commands.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Event {
    /// A new match replaced the previous one.
    MatchStarted {
        /// Number of grid rows.
        rows: u32,
        /// Number of grid columns.
        columns: u32,
    },
    /// The match entered a new phase.
    PhaseChanged {
        /// Phase that became active.
        phase: Phase,
    },
    /// Aggregated per-cell presentation changes.
    CellsChanged {
        /// Changes in the order they happened.
        changes: Vec<CellChange>,
    },
    /// A combat phase ended with both rosters empty.
    RoundEnded {
        /// Round number that just finished.
        round: u32,
        /// Income credited to each faction, indexed by [`Faction::index`].
        income: [u32; 2],
    },
    /// The match reached its terminal state.
    GameOver {
        /// Winner, or draw.
        outcome: Outcome,
    },
}

/// Reasons a command may be judged illegal.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Error, Serialize, Deserialize)]
pub enum LegalityError {
    /// The targeted cell cannot take the requested action.
    #[error("the targeted cell cannot take this action")]
    InvalidCell,
    /// The acting faction cannot afford the action.
    #[error("insufficient funds")]
    InsufficientFunds,
    /// The action is not allowed in the current phase.
    #[error("action not allowed in the current phase")]
    WrongPhase,
    /// The action would disconnect the two castles.
    #[error("the castles would no longer be connected")]
    PathWouldBeSevered,
    /// The target lies too close to the enemy castle.
    #[error("too close to the enemy castle")]
    TooCloseToEnemyCastle,
    /// The target lies outside the acting faction's territory.
    #[error("no allied tower or castle nearby")]
    NoNearbyAlly,
    /// The tower already reached the level cap.
    #[error("tower is already at maximum level")]
    MaxLevelReached,
}
