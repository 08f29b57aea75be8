//! Map editor operations on an untouched match.
//!
//! Editing is only possible during faction one's first build phase while no
//! tower stands and no soldier has been recruited.

use tower_duel_core::{CellChange, CellCoord, ChangeKind, Faction, LegalityError, Phase, Terrain};

use crate::{
    grid::{Ground, GridCell, Site},
    navigation::find_path,
    World,
};

pub(crate) fn can_edit(world: &World) -> Result<(), LegalityError> {
    if world.phase != Phase::Build(Faction::One)
        || world.round != 1
        || !world.towers.is_empty()
        || world.grid.has_soldiers()
    {
        return Err(LegalityError::WrongPhase);
    }
    Ok(())
}

fn is_castle(world: &World, cell: CellCoord) -> bool {
    Faction::ALL
        .iter()
        .any(|faction| world.castle(*faction) == cell)
}

/// Checks whether `terrain` may be painted onto `cell`.
pub(crate) fn can_place_terrain(
    world: &World,
    cell: CellCoord,
    terrain: Terrain,
) -> Result<(), LegalityError> {
    can_edit(world)?;
    if !world.grid.contains(cell) || is_castle(world, cell) {
        return Err(LegalityError::InvalidCell);
    }

    if let Terrain::Obstacle(_) = terrain {
        let probe = world.grid.passability().with(cell, false);
        if find_path(&probe, world.castle(Faction::One), world.castle(Faction::Two)).is_none() {
            return Err(LegalityError::PathWouldBeSevered);
        }
    }
    Ok(())
}

pub(crate) fn place_terrain(
    world: &mut World,
    cell: CellCoord,
    terrain: Terrain,
) -> Result<CellChange, LegalityError> {
    can_place_terrain(world, cell, terrain)?;
    let content = match terrain {
        Terrain::Plain => GridCell::plain(),
        Terrain::Obstacle(obstacle) => GridCell::Obstacle(obstacle),
    };
    let _ = world.grid.replace(cell, content);
    Ok(CellChange::new(cell, ChangeKind::Changed))
}

/// Reports whether `cell` is too close to the opposing castle for `faction`'s castle.
///
/// The thresholds differ between the factions: faction one keeps one more row
/// and column of distance than faction two.
fn too_close(world: &World, faction: Faction, cell: CellCoord) -> bool {
    let enemy = world.castle(faction.opponent());
    let row_gap = enemy.row().abs_diff(cell.row());
    let column_gap = enemy.column().abs_diff(cell.column());
    let (row_limit, column_limit) = match faction {
        Faction::One => (world.grid.rows() / 3 + 1, world.grid.columns() / 3 + 1),
        Faction::Two => (world.grid.rows() / 3, world.grid.columns() / 3),
    };
    row_gap < row_limit && column_gap < column_limit
}

/// Checks whether `faction`'s castle may move to `cell`.
pub(crate) fn can_move_castle(
    world: &World,
    faction: Faction,
    cell: CellCoord,
) -> Result<(), LegalityError> {
    can_edit(world)?;
    let enemy = world.castle(faction.opponent());
    if !world.grid.contains(cell) || cell == enemy {
        return Err(LegalityError::InvalidCell);
    }
    if too_close(world, faction, cell) {
        return Err(LegalityError::TooCloseToEnemyCastle);
    }

    let probe = world
        .grid
        .passability()
        .with(world.castle(faction), true)
        .with(cell, true);
    if find_path(&probe, cell, enemy).is_none() {
        return Err(LegalityError::PathWouldBeSevered);
    }
    Ok(())
}

pub(crate) fn move_castle(
    world: &mut World,
    faction: Faction,
    cell: CellCoord,
) -> Result<Vec<CellChange>, LegalityError> {
    can_move_castle(world, faction, cell)?;
    let previous = world.castle(faction);
    let hitpoints = world
        .grid
        .ground(previous)
        .and_then(|ground| match ground.site {
            Site::Castle { hitpoints, .. } => Some(hitpoints),
            Site::Plain | Site::Tower(_) => None,
        })
        .ok_or(LegalityError::InvalidCell)?;

    let _ = world.grid.replace(previous, GridCell::plain());
    let _ = world.grid.replace(
        cell,
        GridCell::Ground(Ground::new(Site::Castle { faction, hitpoints })),
    );
    world.castles[faction.index()] = cell;
    tracing::debug!(?faction, from = ?previous, to = ?cell, "castle moved");

    Ok(vec![
        CellChange::new(cell, ChangeKind::Changed),
        CellChange::new(previous, ChangeKind::Changed),
    ])
}

pub(crate) fn set_starting_money(world: &mut World, amount: u32) -> Result<(), LegalityError> {
    can_edit(world)?;
    for faction in Faction::ALL {
        world.ledger_mut(faction).money = amount;
    }
    Ok(())
}
