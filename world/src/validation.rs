//! Legality checks and their committing counterparts for match-phase orders.
//!
//! Every `can_*` query is pure. The matching mutation re-runs it first and
//! touches nothing when it fails, so a stale "can" answer never leaks a partial
//! change into the world.

use tower_duel_core::{
    economy, CellChange, CellCoord, ChangeKind, Faction, LegalityError, Phase, Soldier,
    SoldierKind, Tower, TowerKind, TERRITORY_RADIUS,
};

use crate::{
    grid::{Ground, Site},
    navigation::find_path,
    towers::TowerState,
    World,
};

/// Checks whether the acting faction may build `kind` on `cell`.
pub(crate) fn can_build(world: &World, kind: TowerKind, cell: CellCoord) -> Result<(), LegalityError> {
    match world.grid.ground(cell) {
        Some(Ground {
            site: Site::Plain, ..
        }) => {}
        _ => return Err(LegalityError::InvalidCell),
    }

    let faction = world.phase.builder().ok_or(LegalityError::WrongPhase)?;

    if world.ledger(faction).money < economy::tower_cost(kind) {
        return Err(LegalityError::InsufficientFunds);
    }

    if !within_territory(world, faction, cell) {
        return Err(LegalityError::NoNearbyAlly);
    }

    if world.castle(faction.opponent()).chebyshev_distance(cell) <= TERRITORY_RADIUS {
        return Err(LegalityError::TooCloseToEnemyCastle);
    }

    let probe = world.grid.passability().with(cell, false);
    if find_path(&probe, world.castle(Faction::One), world.castle(Faction::Two)).is_none() {
        return Err(match kind {
            TowerKind::Ranged => LegalityError::PathWouldBeSevered,
            TowerKind::Damage | TowerKind::Support => LegalityError::InvalidCell,
        });
    }

    Ok(())
}

fn within_territory(world: &World, faction: Faction, cell: CellCoord) -> bool {
    let near_tower = world
        .towers
        .owned_by(faction)
        .any(|state| state.cell.manhattan_distance(cell) <= TERRITORY_RADIUS);
    near_tower || world.castle(faction).chebyshev_distance(cell) <= TERRITORY_RADIUS
}

pub(crate) fn build_tower(
    world: &mut World,
    kind: TowerKind,
    cell: CellCoord,
) -> Result<CellChange, LegalityError> {
    can_build(world, kind, cell)?;
    let faction = world.phase.builder().ok_or(LegalityError::WrongPhase)?;

    let ledger = world.ledger_mut(faction);
    ledger.money = ledger
        .money
        .checked_sub(economy::tower_cost(kind))
        .ok_or(LegalityError::InsufficientFunds)?;

    let id = world.towers.insert(cell, Tower::new(faction, kind));
    if !world.grid.set_site(cell, Site::Tower(id)) {
        return Err(LegalityError::InvalidCell);
    }
    tracing::debug!(?faction, ?kind, ?cell, tower = id.get(), "tower built");
    Ok(CellChange::new(cell, ChangeKind::Changed))
}

fn tower_on(world: &World, cell: CellCoord) -> Option<TowerState> {
    match world.grid.ground(cell)?.site {
        Site::Tower(id) => world.towers.get(id).copied(),
        Site::Plain | Site::Castle { .. } => None,
    }
}

/// Checks whether the acting faction may upgrade the tower on `cell`.
pub(crate) fn can_upgrade(world: &World, cell: CellCoord) -> Result<(), LegalityError> {
    let state = tower_on(world, cell).ok_or(LegalityError::InvalidCell)?;
    let faction = world.phase.builder().ok_or(LegalityError::WrongPhase)?;

    if state.tower.faction() != faction {
        return Err(LegalityError::InvalidCell);
    }
    if state.tower.is_max_level() {
        return Err(LegalityError::MaxLevelReached);
    }

    let cost = economy::upgrade_cost(state.tower.kind(), state.tower.level())
        .ok_or(LegalityError::MaxLevelReached)?;
    if world.ledger(faction).money < cost {
        return Err(LegalityError::InsufficientFunds);
    }
    Ok(())
}

pub(crate) fn upgrade_tower(world: &mut World, cell: CellCoord) -> Result<CellChange, LegalityError> {
    can_upgrade(world, cell)?;
    let state = tower_on(world, cell).ok_or(LegalityError::InvalidCell)?;
    let faction = state.tower.faction();
    let cost = economy::upgrade_cost(state.tower.kind(), state.tower.level())
        .ok_or(LegalityError::MaxLevelReached)?;
    let upgraded = state.tower.upgraded().ok_or(LegalityError::MaxLevelReached)?;

    let ledger = world.ledger_mut(faction);
    ledger.money = ledger
        .money
        .checked_sub(cost)
        .ok_or(LegalityError::InsufficientFunds)?;

    if let Some(entry) = world.towers.get_mut(state.id) {
        entry.tower = upgraded;
    }
    tracing::debug!(?faction, ?cell, level = upgraded.level(), "tower upgraded");
    Ok(CellChange::new(cell, ChangeKind::Upgraded))
}

/// Faction entitled to demolish towers in the current phase.
///
/// Only the first build phase belongs to faction one; every later phase,
/// combat included, lets faction two demolish its own towers.
fn demolisher(phase: Phase) -> Option<Faction> {
    match phase {
        Phase::Build(Faction::One) => Some(Faction::One),
        Phase::Build(Faction::Two) | Phase::Simulation => Some(Faction::Two),
        Phase::GameOver(_) => None,
    }
}

/// Checks whether the tower on `cell` may be demolished now.
pub(crate) fn can_remove(world: &World, cell: CellCoord) -> Result<(), LegalityError> {
    let state = tower_on(world, cell).ok_or(LegalityError::InvalidCell)?;
    let faction = demolisher(world.phase).ok_or(LegalityError::WrongPhase)?;
    if state.tower.faction() != faction {
        return Err(LegalityError::InvalidCell);
    }
    Ok(())
}

pub(crate) fn remove_tower(world: &mut World, cell: CellCoord) -> Result<CellChange, LegalityError> {
    can_remove(world, cell)?;
    let state = tower_on(world, cell).ok_or(LegalityError::InvalidCell)?;
    let faction = state.tower.faction();

    let _ = world.towers.remove(state.id);
    if !world.grid.set_site(cell, Site::Plain) {
        return Err(LegalityError::InvalidCell);
    }

    let refund = economy::removal_refund(state.tower.kind(), state.tower.level());
    let ledger = world.ledger_mut(faction);
    ledger.money = ledger.money.saturating_add(refund);
    tracing::debug!(?faction, ?cell, refund, "tower removed");
    Ok(CellChange::new(cell, ChangeKind::Changed))
}

/// Checks whether the acting faction may recruit a soldier of `kind`.
pub(crate) fn can_buy(world: &World, kind: SoldierKind) -> Result<(), LegalityError> {
    let faction = world.phase.builder().ok_or(LegalityError::WrongPhase)?;
    if world.ledger(faction).money < economy::soldier_cost(kind) {
        return Err(LegalityError::InsufficientFunds);
    }
    Ok(())
}

pub(crate) fn buy_soldier(world: &mut World, kind: SoldierKind) -> Result<CellChange, LegalityError> {
    can_buy(world, kind)?;
    let faction = world.phase.builder().ok_or(LegalityError::WrongPhase)?;
    let castle = world.castle(faction);

    let ledger = world.ledger_mut(faction);
    ledger.money = ledger
        .money
        .checked_sub(economy::soldier_cost(kind))
        .ok_or(LegalityError::InsufficientFunds)?;
    ledger.total_units_built = ledger.total_units_built.saturating_add(1);

    let soldier = Soldier::recruit(world.allocate_soldier_id(), faction, kind);
    world
        .grid
        .ground_mut(castle)
        .ok_or(LegalityError::InvalidCell)?
        .queue_mut(faction)
        .push_back(soldier);
    tracing::debug!(?faction, ?kind, soldier = soldier.id().get(), "soldier recruited");
    Ok(CellChange::new(castle, ChangeKind::SoldierEntered))
}
