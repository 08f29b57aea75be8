//! Authoritative tower state management utilities.

use std::collections::BTreeMap;

use tower_duel_core::{CellCoord, Faction, Tower, TowerId};

/// Snapshot of a tower stored inside the world.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct TowerState {
    /// Identifier allocated by the world for the tower.
    pub(crate) id: TowerId,
    /// Cell the tower stands on.
    pub(crate) cell: CellCoord,
    /// Owner, kind, level and statistics.
    pub(crate) tower: Tower,
}

/// Registry that stores towers and manages identifier allocation.
///
/// Identifiers grow monotonically, so iterating the registry visits towers in
/// the order they were built.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct TowerRegistry {
    entries: BTreeMap<TowerId, TowerState>,
    next_tower_id: TowerId,
}

impl TowerRegistry {
    /// Creates an empty tower registry with a reset identifier counter.
    pub(crate) fn new() -> Self {
        Self {
            entries: BTreeMap::new(),
            next_tower_id: TowerId::new(0),
        }
    }

    pub(crate) fn insert(&mut self, cell: CellCoord, tower: Tower) -> TowerId {
        let id = self.next_tower_id;
        self.next_tower_id = TowerId::new(id.get().wrapping_add(1));
        let _ = self.entries.insert(id, TowerState { id, cell, tower });
        id
    }

    pub(crate) fn remove(&mut self, id: TowerId) -> Option<TowerState> {
        self.entries.remove(&id)
    }

    pub(crate) fn get(&self, id: TowerId) -> Option<&TowerState> {
        self.entries.get(&id)
    }

    pub(crate) fn get_mut(&mut self, id: TowerId) -> Option<&mut TowerState> {
        self.entries.get_mut(&id)
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Towers owned by `faction` in construction order.
    pub(crate) fn owned_by(&self, faction: Faction) -> impl Iterator<Item = &TowerState> + '_ {
        self.entries
            .values()
            .filter(move |state| state.tower.faction() == faction)
    }
}
