//! Dense cell storage owned by the world.

use std::collections::VecDeque;

use tower_duel_core::{CellCoord, Faction, Obstacle, Soldier, SoldierKind, TowerId};

use crate::navigation::PassabilityMask;

/// What stands on a soldier-holding cell.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Site {
    Plain,
    Castle { faction: Faction, hitpoints: u32 },
    Tower(TowerId),
}

/// Passable cell together with the soldiers queued on it.
///
/// Queues are indexed by [`Faction::index`]; the front of each queue is the
/// soldier closest to the enemy castle.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct Ground {
    pub(crate) site: Site,
    pub(crate) queues: [VecDeque<Soldier>; 2],
    pub(crate) just_died: [bool; 2],
}

impl Ground {
    pub(crate) fn new(site: Site) -> Self {
        Self {
            site,
            queues: [VecDeque::new(), VecDeque::new()],
            just_died: [false; 2],
        }
    }

    pub(crate) fn queue(&self, faction: Faction) -> &VecDeque<Soldier> {
        &self.queues[faction.index()]
    }

    pub(crate) fn queue_mut(&mut self, faction: Faction) -> &mut VecDeque<Soldier> {
        &mut self.queues[faction.index()]
    }

    pub(crate) fn soldier_count(&self) -> usize {
        self.queues.iter().map(VecDeque::len).sum()
    }
}

/// Single grid cell. Obstacles carry no queues, so they can never hold soldiers.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) enum GridCell {
    Obstacle(Obstacle),
    Ground(Ground),
}

impl GridCell {
    pub(crate) fn plain() -> Self {
        Self::Ground(Ground::new(Site::Plain))
    }

    pub(crate) fn ground(&self) -> Option<&Ground> {
        match self {
            Self::Ground(ground) => Some(ground),
            Self::Obstacle(_) => None,
        }
    }

    pub(crate) fn ground_mut(&mut self) -> Option<&mut Ground> {
        match self {
            Self::Ground(ground) => Some(ground),
            Self::Obstacle(_) => None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct Grid {
    rows: u32,
    columns: u32,
    cells: Vec<GridCell>,
}

impl Grid {
    pub(crate) fn new(rows: u32, columns: u32) -> Self {
        let capacity_u64 = u64::from(columns) * u64::from(rows);
        let capacity = usize::try_from(capacity_u64).unwrap_or(0);
        Self {
            rows,
            columns,
            cells: vec![GridCell::plain(); capacity],
        }
    }

    pub(crate) const fn rows(&self) -> u32 {
        self.rows
    }

    pub(crate) const fn columns(&self) -> u32 {
        self.columns
    }

    pub(crate) fn contains(&self, cell: CellCoord) -> bool {
        cell.row() < self.rows && cell.column() < self.columns
    }

    pub(crate) fn get(&self, cell: CellCoord) -> Option<&GridCell> {
        self.index(cell).and_then(|index| self.cells.get(index))
    }

    pub(crate) fn get_mut(&mut self, cell: CellCoord) -> Option<&mut GridCell> {
        self.index(cell).and_then(|index| self.cells.get_mut(index))
    }

    pub(crate) fn ground(&self, cell: CellCoord) -> Option<&Ground> {
        self.get(cell).and_then(GridCell::ground)
    }

    pub(crate) fn ground_mut(&mut self, cell: CellCoord) -> Option<&mut Ground> {
        self.get_mut(cell).and_then(GridCell::ground_mut)
    }

    /// Replaces the cell content, returning the previous one.
    pub(crate) fn replace(&mut self, cell: CellCoord, content: GridCell) -> Option<GridCell> {
        self.get_mut(cell)
            .map(|slot| std::mem::replace(slot, content))
    }

    /// Swaps the site of a ground cell while keeping its queues and markers.
    pub(crate) fn set_site(&mut self, cell: CellCoord, site: Site) -> bool {
        match self.ground_mut(cell) {
            Some(ground) => {
                ground.site = site;
                true
            }
            None => false,
        }
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = (CellCoord, &GridCell)> + '_ {
        let columns = self.columns.max(1);
        self.cells.iter().enumerate().map(move |(index, cell)| {
            let index = index as u32;
            (CellCoord::new(index / columns, index % columns), cell)
        })
    }

    pub(crate) fn grounds(&self) -> impl Iterator<Item = &Ground> + '_ {
        self.cells.iter().filter_map(GridCell::ground)
    }

    pub(crate) fn passability(&self) -> PassabilityMask {
        let mut mask = PassabilityMask::new(self.rows, self.columns, true);
        for (cell, content) in self.iter() {
            if let GridCell::Obstacle(_) = content {
                mask.set(cell, false);
            }
        }
        mask
    }

    pub(crate) fn soldier_count(&self, faction: Faction) -> usize {
        self.grounds().map(|ground| ground.queue(faction).len()).sum()
    }

    pub(crate) fn soldiers_of_kind(&self, faction: Faction, kind: SoldierKind) -> usize {
        self.grounds()
            .flat_map(|ground| ground.queue(faction).iter())
            .filter(|soldier| soldier.kind() == kind)
            .count()
    }

    pub(crate) fn has_soldiers(&self) -> bool {
        self.grounds().any(|ground| ground.soldier_count() > 0)
    }

    fn index(&self, cell: CellCoord) -> Option<usize> {
        if !self.contains(cell) {
            return None;
        }
        let row = usize::try_from(cell.row()).ok()?;
        let column = usize::try_from(cell.column()).ok()?;
        let width = usize::try_from(self.columns).ok()?;
        Some(row * width + column)
    }
}
