//! Capture and all-or-nothing restore of save-game snapshots.

use thiserror::Error;
use tower_duel_core::{
    CellCoord, CellRecord, Faction, LedgerRecord, MatchSnapshot, Obstacle, Phase, Soldier,
    SoldierKind, Tower, TowerKind, TowerRecord, TowerStats, MAX_CASTLE_HITPOINTS,
    MAX_GRID_DIMENSION, MAX_QUEUED_SOLDIERS, MAX_TOWER_LEVEL,
};

use crate::{
    grid::{Grid, GridCell, Ground, Site},
    navigation::find_path,
    World,
};

/// Consumer a snapshot is loaded for.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LoadTarget {
    /// Resume play; towers and waiting soldiers are restored.
    Match,
    /// Edit the map; the snapshot must not contain towers or soldiers.
    Editor,
}

/// Structural problems that make a snapshot unusable.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum InvalidSavedStateError {
    /// The grid has no rows or no columns.
    #[error("grid dimensions {rows}x{columns} are empty")]
    EmptyGrid {
        /// Recorded rows.
        rows: u32,
        /// Recorded columns.
        columns: u32,
    },
    /// A side of the grid exceeds [`MAX_GRID_DIMENSION`].
    #[error("grid dimensions {rows}x{columns} exceed {} cells per side", MAX_GRID_DIMENSION)]
    GridTooLarge {
        /// Recorded rows.
        rows: u32,
        /// Recorded columns.
        columns: u32,
    },
    /// The number of cell records does not match the dimensions.
    #[error("expected {expected} cell records, found {found}")]
    CellCountMismatch {
        /// Records implied by the dimensions.
        expected: usize,
        /// Records present.
        found: usize,
    },
    /// A faction does not own exactly one castle.
    #[error("{faction:?} owns {found} castles")]
    CastleCount {
        /// Offending faction.
        faction: Faction,
        /// Castles found.
        found: usize,
    },
    /// A castle carries more hitpoints than allowed.
    #[error("castle at {cell:?} has {hitpoints} hitpoints")]
    CastleHitpoints {
        /// Castle cell.
        cell: CellCoord,
        /// Recorded hitpoints.
        hitpoints: u32,
    },
    /// A castle queues more soldiers than [`MAX_QUEUED_SOLDIERS`].
    #[error("castle at {cell:?} queues {count} soldiers")]
    QueuedSoldiers {
        /// Castle cell.
        cell: CellCoord,
        /// Recorded attack and tank soldiers combined.
        count: u64,
    },
    /// A tower level lies outside `1..=5`.
    #[error("tower at {cell:?} has level {level}")]
    TowerLevel {
        /// Tower cell.
        cell: CellCoord,
        /// Recorded level.
        level: u8,
    },
    /// The round number is zero.
    #[error("round number must start at 1")]
    RoundNumber,
    /// Towers or soldiers are present while loading into the editor.
    #[error("editor snapshots must not contain towers or soldiers")]
    OccupiedForEditor,
    /// No route connects the two castles.
    #[error("the castles are not connected")]
    Disconnected,
}

/// Captures the world into a snapshot.
///
/// The snapshot resumes in the current build faction's phase, or in faction
/// one's phase when captured during combat or after the match ended.
pub(crate) fn capture(world: &World) -> MatchSnapshot {
    let cells = world
        .grid
        .iter()
        .map(|(_, content)| record_for(world, content))
        .collect();

    MatchSnapshot {
        ledgers: [
            LedgerRecord::from(world.ledger(Faction::One)),
            LedgerRecord::from(world.ledger(Faction::Two)),
        ],
        round: world.round,
        current: world.phase.builder().unwrap_or(Faction::One),
        rows: world.grid.rows(),
        columns: world.grid.columns(),
        cells,
    }
}

fn record_for(world: &World, content: &GridCell) -> CellRecord {
    let ground = match content {
        GridCell::Obstacle(Obstacle::Mountain) => return CellRecord::Mountain,
        GridCell::Obstacle(Obstacle::Water) => return CellRecord::Water,
        GridCell::Ground(ground) => ground,
    };

    match ground.site {
        Site::Plain => CellRecord::Plain,
        Site::Castle { faction, hitpoints } => {
            let waiting = ground.queue(faction);
            let count = |kind: SoldierKind| {
                waiting.iter().filter(|soldier| soldier.kind() == kind).count() as u32
            };
            CellRecord::Castle {
                owner: faction,
                hitpoints,
                attack_soldiers: count(SoldierKind::Attack),
                tank_soldiers: count(SoldierKind::Tank),
            }
        }
        Site::Tower(id) => match world.towers.get(id) {
            Some(state) => tower_record(state.tower),
            None => CellRecord::Plain,
        },
    }
}

fn tower_record(tower: Tower) -> CellRecord {
    let stats = tower.stats();
    let record = TowerRecord {
        owner: tower.faction(),
        level: tower.level(),
        range: stats.range,
        damage: stats.damage,
        target_count: stats.target_count,
    };
    match tower.kind() {
        TowerKind::Ranged => CellRecord::RangedTower(record),
        TowerKind::Damage => CellRecord::DamageTower(record),
        TowerKind::Support => CellRecord::SupportTower {
            tower: record,
            heal_amount: stats.heal_amount,
        },
    }
}

/// Rebuilds a world from a snapshot, validating it completely first.
pub(crate) fn restore(
    snapshot: &MatchSnapshot,
    target: LoadTarget,
) -> Result<World, InvalidSavedStateError> {
    let (rows, columns) = (snapshot.rows, snapshot.columns);
    if rows == 0 || columns == 0 {
        return Err(InvalidSavedStateError::EmptyGrid { rows, columns });
    }
    if rows > MAX_GRID_DIMENSION || columns > MAX_GRID_DIMENSION {
        return Err(InvalidSavedStateError::GridTooLarge { rows, columns });
    }
    let expected = usize::try_from(u64::from(rows) * u64::from(columns)).unwrap_or(usize::MAX);
    if snapshot.cells.len() != expected {
        return Err(InvalidSavedStateError::CellCountMismatch {
            expected,
            found: snapshot.cells.len(),
        });
    }
    if snapshot.round == 0 {
        return Err(InvalidSavedStateError::RoundNumber);
    }

    let mut world = World::blank(rows, columns, 0);
    world.grid = Grid::new(rows, columns);
    let mut castles: [Vec<CellCoord>; 2] = [Vec::new(), Vec::new()];
    let mut occupied = false;

    for (offset, record) in snapshot.cells.iter().enumerate() {
        let offset = offset as u32;
        let cell = CellCoord::new(offset / columns, offset % columns);
        let content = match *record {
            CellRecord::Plain => GridCell::plain(),
            CellRecord::Mountain => GridCell::Obstacle(Obstacle::Mountain),
            CellRecord::Water => GridCell::Obstacle(Obstacle::Water),
            CellRecord::Castle {
                owner,
                hitpoints,
                attack_soldiers,
                tank_soldiers,
            } => {
                if hitpoints > MAX_CASTLE_HITPOINTS {
                    return Err(InvalidSavedStateError::CastleHitpoints { cell, hitpoints });
                }
                let count = u64::from(attack_soldiers) + u64::from(tank_soldiers);
                if count > u64::from(MAX_QUEUED_SOLDIERS) {
                    return Err(InvalidSavedStateError::QueuedSoldiers { cell, count });
                }
                castles[owner.index()].push(cell);
                occupied |= attack_soldiers > 0 || tank_soldiers > 0;

                let mut ground = Ground::new(Site::Castle {
                    faction: owner,
                    hitpoints,
                });
                let recruits = std::iter::repeat(SoldierKind::Attack)
                    .take(attack_soldiers as usize)
                    .chain(std::iter::repeat(SoldierKind::Tank).take(tank_soldiers as usize));
                for kind in recruits {
                    let soldier = Soldier::recruit(world.allocate_soldier_id(), owner, kind);
                    ground.queue_mut(owner).push_back(soldier);
                }
                GridCell::Ground(ground)
            }
            CellRecord::RangedTower(tower) => {
                occupied = true;
                restore_tower(&mut world, cell, TowerKind::Ranged, tower, 0)?
            }
            CellRecord::DamageTower(tower) => {
                occupied = true;
                restore_tower(&mut world, cell, TowerKind::Damage, tower, 0)?
            }
            CellRecord::SupportTower { tower, heal_amount } => {
                occupied = true;
                restore_tower(&mut world, cell, TowerKind::Support, tower, heal_amount)?
            }
        };
        let _ = world.grid.replace(cell, content);
    }

    for faction in Faction::ALL {
        match castles[faction.index()].as_slice() {
            [cell] => world.castles[faction.index()] = *cell,
            found => {
                return Err(InvalidSavedStateError::CastleCount {
                    faction,
                    found: found.len(),
                })
            }
        }
    }

    if target == LoadTarget::Editor && occupied {
        return Err(InvalidSavedStateError::OccupiedForEditor);
    }

    if find_path(
        &world.grid.passability(),
        world.castle(Faction::One),
        world.castle(Faction::Two),
    )
    .is_none()
    {
        return Err(InvalidSavedStateError::Disconnected);
    }

    for faction in Faction::ALL {
        *world.ledger_mut(faction) = snapshot.ledgers[faction.index()].into();
    }
    world.round = snapshot.round;
    world.phase = Phase::Build(snapshot.current);
    Ok(world)
}

fn restore_tower(
    world: &mut World,
    cell: CellCoord,
    kind: TowerKind,
    record: TowerRecord,
    heal_amount: u32,
) -> Result<GridCell, InvalidSavedStateError> {
    if record.level == 0 || record.level > MAX_TOWER_LEVEL {
        return Err(InvalidSavedStateError::TowerLevel {
            cell,
            level: record.level,
        });
    }
    let stats = TowerStats::new(record.range, record.damage, record.target_count, heal_amount);
    let id = world
        .towers
        .insert(cell, Tower::from_parts(record.owner, kind, record.level, stats));
    Ok(GridCell::Ground(Ground::new(Site::Tower(id))))
}
