//! Per-tick combat resolution along the captured lane.
//!
//! The lane is stored from the faction one castle to the faction two castle.
//! Faction one soldiers walk toward higher lane indices, faction two soldiers
//! toward lower ones.

use thiserror::Error;
use tower_duel_core::{
    economy, CellChange, CellCoord, ChangeKind, Faction, Outcome, Phase, Soldier, TowerKind,
    MAX_CASTLE_HITPOINTS,
};

use crate::{
    grid::{Ground, Site},
    World,
};

/// Programming-bug class failures that abort a tick without committing it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
pub enum CombatFault {
    /// No route connected the castles when combat tried to start.
    #[error("no lane connects the castles")]
    LaneUnavailable,
    /// A lane cell can no longer hold soldiers.
    #[error("lane cell {0:?} cannot hold soldiers")]
    LaneCellBlocked(CellCoord),
    /// A castle cell no longer holds its castle.
    #[error("castle of {0:?} is missing from the grid")]
    MissingCastle(Faction),
}

/// How a committed tick ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum TickOutcome {
    /// Soldiers moved and towers fired.
    Advanced,
    /// Both rosters were empty; income was paid and building resumes.
    RoundEnded { round: u32, income: [u32; 2] },
    /// A castle fell.
    GameOver(Outcome),
}

/// Castle heal owed to a faction after one of its support towers scored a kill.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct Heal {
    faction: Faction,
    amount: u32,
}

/// Runs one tick against `world`, recording presentation changes.
///
/// Callers stage `world` as a copy and commit it only on `Ok`.
pub(crate) fn resolve_tick(
    world: &mut World,
    changes: &mut Vec<CellChange>,
) -> Result<TickOutcome, CombatFault> {
    clear_death_markers(world)?;

    if let Some(outcome) = decide_outcome(world)? {
        world.phase = Phase::GameOver(outcome);
        return Ok(TickOutcome::GameOver(outcome));
    }

    if !world.grid.has_soldiers() {
        return Ok(end_round(world));
    }

    world.tick_count = world.tick_count.saturating_add(1);
    march(world, changes)?;
    for faction in Faction::ALL {
        collide_with_castle(world, faction, changes)?;
    }

    let mut heals = Vec::new();
    for faction in Faction::ALL {
        fire_towers(world, faction, changes, &mut heals)?;
    }
    for heal in heals {
        let castle = world.castle(heal.faction);
        let hitpoints = castle_hitpoints(world, heal.faction)?;
        set_castle_hitpoints(
            world,
            heal.faction,
            hitpoints.saturating_add(heal.amount).min(MAX_CASTLE_HITPOINTS),
        )?;
        changes.push(CellChange::new(castle, ChangeKind::Changed));
    }

    Ok(TickOutcome::Advanced)
}

fn lane_ground(world: &mut World, cell: CellCoord) -> Result<&mut Ground, CombatFault> {
    world
        .grid
        .ground_mut(cell)
        .ok_or(CombatFault::LaneCellBlocked(cell))
}

fn clear_death_markers(world: &mut World) -> Result<(), CombatFault> {
    let lane = world.lane.clone();
    for cell in lane {
        lane_ground(world, cell)?.just_died = [false; 2];
    }
    Ok(())
}

pub(crate) fn castle_hitpoints(world: &World, faction: Faction) -> Result<u32, CombatFault> {
    match world.grid.ground(world.castle(faction)).map(|ground| ground.site) {
        Some(Site::Castle {
            faction: owner,
            hitpoints,
        }) if owner == faction => Ok(hitpoints),
        _ => Err(CombatFault::MissingCastle(faction)),
    }
}

fn set_castle_hitpoints(world: &mut World, faction: Faction, hitpoints: u32) -> Result<(), CombatFault> {
    let cell = world.castle(faction);
    if world.grid.set_site(cell, Site::Castle { faction, hitpoints }) {
        Ok(())
    } else {
        Err(CombatFault::MissingCastle(faction))
    }
}

fn decide_outcome(world: &World) -> Result<Option<Outcome>, CombatFault> {
    let first_standing = castle_hitpoints(world, Faction::One)? > 0;
    let second_standing = castle_hitpoints(world, Faction::Two)? > 0;
    Ok(match (first_standing, second_standing) {
        (true, true) => None,
        (true, false) => Some(Outcome::Winner(Faction::One)),
        (false, true) => Some(Outcome::Winner(Faction::Two)),
        (false, false) => Some(Outcome::Draw),
    })
}

fn end_round(world: &mut World) -> TickOutcome {
    let mut income = [0; 2];
    for faction in Faction::ALL {
        let ledger = world.ledger_mut(faction);
        let earned = economy::round_income(ledger);
        ledger.money = ledger.money.saturating_add(earned);
        ledger.kills_this_round = 0;
        income[faction.index()] = earned;
    }

    let round = world.round;
    world.round = world.round.saturating_add(1);
    world.phase = Phase::Build(Faction::One);
    world.lane.clear();
    TickOutcome::RoundEnded { round, income }
}

/// Lane index a soldier of `faction` steps to from `position`, if any.
fn next_position(faction: Faction, position: usize, lane_len: usize) -> Option<usize> {
    match faction {
        Faction::One => position.checked_add(1).filter(|next| *next < lane_len),
        Faction::Two => position.checked_sub(1),
    }
}

/// Advances the front soldier of every lane queue by one cell.
///
/// All departing soldiers are dequeued before any of them is enqueued, so no
/// soldier can move twice in one tick.
fn march(world: &mut World, changes: &mut Vec<CellChange>) -> Result<(), CombatFault> {
    let lane = world.lane.clone();
    let mut departures: Vec<(usize, Soldier)> = Vec::new();

    for (position, cell) in lane.iter().enumerate() {
        let ground = lane_ground(world, *cell)?;
        for faction in Faction::ALL {
            let Some(next) = next_position(faction, position, lane.len()) else {
                continue;
            };
            if let Some(soldier) = ground.queue_mut(faction).pop_front() {
                departures.push((next, soldier));
                changes.push(CellChange::new(*cell, ChangeKind::SoldierLeft));
            }
        }
    }

    for (next, soldier) in departures {
        let cell = lane[next];
        lane_ground(world, cell)?
            .queue_mut(soldier.faction())
            .push_back(soldier);
        changes.push(CellChange::new(cell, ChangeKind::SoldierEntered));
    }
    Ok(())
}

/// Resolves enemy soldiers that reached `faction`'s castle.
fn collide_with_castle(
    world: &mut World,
    faction: Faction,
    changes: &mut Vec<CellChange>,
) -> Result<(), CombatFault> {
    let cell = world.castle(faction);
    let hitpoints = castle_hitpoints(world, faction)?;
    let arrivals = lane_ground(world, cell)?.queue_mut(faction.opponent());
    let Some(front) = arrivals.front().copied() else {
        return Ok(());
    };
    arrivals.clear();

    set_castle_hitpoints(
        world,
        faction,
        hitpoints.saturating_sub(front.kind().damage()),
    )?;
    changes.push(CellChange::new(cell, ChangeKind::SoldierDied));
    tracing::debug!(
        defender = ?faction,
        damage = front.kind().damage(),
        "soldier reached castle"
    );
    Ok(())
}

/// Fires every tower of `faction` in construction order.
fn fire_towers(
    world: &mut World,
    faction: Faction,
    changes: &mut Vec<CellChange>,
    heals: &mut Vec<Heal>,
) -> Result<(), CombatFault> {
    let enemy = faction.opponent();
    let castles = [world.castle(Faction::One), world.castle(Faction::Two)];
    let towers: Vec<_> = world.towers.owned_by(faction).copied().collect();

    // Faction one scans from the faction two castle backwards, faction two forwards.
    let scan: Vec<CellCoord> = match faction {
        Faction::One => world.lane.iter().rev().copied().collect(),
        Faction::Two => world.lane.clone(),
    };

    for state in towers {
        let stats = state.tower.stats();
        let mut remaining = stats.target_count;
        if remaining == 0 {
            continue;
        }

        for cell in &scan {
            if castles.contains(cell) || !state.tower.reaches(state.cell, *cell) {
                continue;
            }

            let ground = lane_ground(world, *cell)?;
            let Some(target) = ground.queue_mut(enemy).front_mut() else {
                continue;
            };

            target.take_damage(stats.damage);
            changes.push(CellChange::new(*cell, ChangeKind::Hit));

            if target.is_dead() {
                let _ = ground.queue_mut(enemy).pop_front();
                ground.just_died[enemy.index()] = true;
                changes.push(CellChange::new(*cell, ChangeKind::SoldierDied));

                let ledger = world.ledger_mut(faction);
                ledger.kills_this_round = ledger.kills_this_round.saturating_add(1);

                if state.tower.kind() == TowerKind::Support {
                    heals.push(Heal {
                        faction,
                        amount: stats.heal_amount,
                    });
                }
            }

            remaining -= 1;
            if remaining == 0 {
                break;
            }
        }

        if remaining != stats.target_count {
            changes.push(CellChange::new(state.cell, ChangeKind::Fired));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn faction_one_walks_toward_lane_end() {
        assert_eq!(next_position(Faction::One, 0, 5), Some(1));
        assert_eq!(next_position(Faction::One, 4, 5), None);
    }

    #[test]
    fn faction_two_walks_toward_lane_start() {
        assert_eq!(next_position(Faction::Two, 4, 5), Some(3));
        assert_eq!(next_position(Faction::Two, 0, 5), None);
    }
}
