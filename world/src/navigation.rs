//! Breadth-first route solver shared by build validation, combat and map generation.

use std::collections::VecDeque;

use tower_duel_core::CellCoord;

/// Dense passability grid supplied to [`find_path`].
///
/// Masks are detached from the live grid so callers can probe hypothetical
/// edits by flipping individual cells before searching.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PassabilityMask {
    rows: u32,
    columns: u32,
    cells: Vec<bool>,
}

impl PassabilityMask {
    /// Creates a mask where every cell shares the provided passability.
    #[must_use]
    pub fn new(rows: u32, columns: u32, passable: bool) -> Self {
        let capacity_u64 = u64::from(columns) * u64::from(rows);
        let capacity = usize::try_from(capacity_u64).unwrap_or(0);
        Self {
            rows,
            columns,
            cells: vec![passable; capacity],
        }
    }

    /// Number of rows covered by the mask.
    #[must_use]
    pub const fn rows(&self) -> u32 {
        self.rows
    }

    /// Number of columns covered by the mask.
    #[must_use]
    pub const fn columns(&self) -> u32 {
        self.columns
    }

    /// Reports whether the cell lies inside the mask bounds.
    #[must_use]
    pub fn contains(&self, cell: CellCoord) -> bool {
        cell.row() < self.rows && cell.column() < self.columns
    }

    /// Reports whether the cell is passable. Cells outside the mask never are.
    #[must_use]
    pub fn is_passable(&self, cell: CellCoord) -> bool {
        self.index(cell)
            .and_then(|index| self.cells.get(index).copied())
            .unwrap_or(false)
    }

    /// Marks a cell passable or impassable. Cells outside the mask are ignored.
    pub fn set(&mut self, cell: CellCoord, passable: bool) {
        if let Some(index) = self.index(cell) {
            if let Some(slot) = self.cells.get_mut(index) {
                *slot = passable;
            }
        }
    }

    /// Returns a copy of the mask with a single cell overridden.
    #[must_use]
    pub fn with(&self, cell: CellCoord, passable: bool) -> Self {
        let mut probe = self.clone();
        probe.set(cell, passable);
        probe
    }

    fn index(&self, cell: CellCoord) -> Option<usize> {
        if !self.contains(cell) {
            return None;
        }
        let width = usize::try_from(self.columns).ok()?;
        index(width, cell)
    }
}

/// Finds a shortest 4-connected route between two cells.
///
/// Neighbours are visited in the fixed order down, right, up, left, so ties
/// between equally short routes always resolve the same way. The returned
/// route is ordered **from `to` back to `from`**, both endpoints included.
/// `None` is returned when either endpoint is impassable or no route exists.
#[must_use]
pub fn find_path(
    mask: &PassabilityMask,
    from: CellCoord,
    to: CellCoord,
) -> Option<Vec<CellCoord>> {
    if !mask.is_passable(from) || !mask.is_passable(to) {
        return None;
    }

    let width = usize::try_from(mask.columns()).ok()?;
    let cell_count = mask.cells.len();
    let mut predecessors: Vec<Option<CellCoord>> = vec![None; cell_count];
    let mut visited = vec![false; cell_count];
    let mut queue = VecDeque::new();

    visited[index(width, from)?] = true;
    queue.push_back(from);

    while let Some(cell) = queue.pop_front() {
        if cell == to {
            break;
        }

        for neighbor in neighbors(cell, mask.columns(), mask.rows()) {
            if !mask.is_passable(neighbor) {
                continue;
            }

            let Some(neighbor_index) = index(width, neighbor) else {
                continue;
            };

            if visited[neighbor_index] {
                continue;
            }

            visited[neighbor_index] = true;
            predecessors[neighbor_index] = Some(cell);
            queue.push_back(neighbor);
        }
    }

    if !visited[index(width, to)?] {
        return None;
    }

    let mut path = vec![to];
    let mut current = to;
    while current != from {
        current = predecessors[index(width, current)?]?;
        path.push(current);
    }
    Some(path)
}

fn neighbors(cell: CellCoord, columns: u32, rows: u32) -> impl Iterator<Item = CellCoord> {
    let mut candidates = [None; 4];
    let mut count = 0;

    if let Some(row) = cell.row().checked_add(1) {
        if row < rows {
            candidates[count] = Some(CellCoord::new(row, cell.column()));
            count += 1;
        }
    }

    if let Some(column) = cell.column().checked_add(1) {
        if column < columns {
            candidates[count] = Some(CellCoord::new(cell.row(), column));
            count += 1;
        }
    }

    if let Some(row) = cell.row().checked_sub(1) {
        candidates[count] = Some(CellCoord::new(row, cell.column()));
        count += 1;
    }

    if let Some(column) = cell.column().checked_sub(1) {
        candidates[count] = Some(CellCoord::new(cell.row(), column));
        count += 1;
    }

    candidates.into_iter().take(count).flatten()
}

fn index(width: usize, cell: CellCoord) -> Option<usize> {
    let column = usize::try_from(cell.column()).ok()?;
    let row = usize::try_from(cell.row()).ok()?;
    row.checked_mul(width)?.checked_add(column)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mask_from_rows(rows: &[&str]) -> PassabilityMask {
        let height = rows.len() as u32;
        let width = rows.first().map_or(0, |row| row.len()) as u32;
        let mut mask = PassabilityMask::new(height, width, true);
        for (row, line) in rows.iter().enumerate() {
            for (column, symbol) in line.chars().enumerate() {
                if symbol == '#' {
                    mask.set(CellCoord::new(row as u32, column as u32), false);
                }
            }
        }
        mask
    }

    fn assert_valid_route(mask: &PassabilityMask, route: &[CellCoord], from: CellCoord, to: CellCoord) {
        assert_eq!(route.first(), Some(&to), "route must start at the goal");
        assert_eq!(route.last(), Some(&from), "route must end at the origin");
        for cell in route {
            assert!(mask.is_passable(*cell), "route crosses blocked cell {cell:?}");
        }
        for pair in route.windows(2) {
            assert_eq!(pair[0].manhattan_distance(pair[1]), 1, "route must be 4-connected");
        }
    }

    #[test]
    fn open_grid_route_matches_manhattan_distance() {
        let mask = PassabilityMask::new(5, 5, true);
        let from = CellCoord::new(0, 0);
        let to = CellCoord::new(4, 4);

        let route = find_path(&mask, from, to).expect("open grid is connected");

        assert_valid_route(&mask, &route, from, to);
        assert_eq!(route.len() - 1, 8);
    }

    #[test]
    fn ties_resolve_down_first_then_right() {
        let mask = PassabilityMask::new(5, 5, true);
        let route = find_path(&mask, CellCoord::new(0, 0), CellCoord::new(4, 4))
            .expect("open grid is connected");

        let forward: Vec<CellCoord> = route.into_iter().rev().collect();
        assert_eq!(
            forward,
            vec![
                CellCoord::new(0, 0),
                CellCoord::new(1, 0),
                CellCoord::new(2, 0),
                CellCoord::new(3, 0),
                CellCoord::new(4, 0),
                CellCoord::new(4, 1),
                CellCoord::new(4, 2),
                CellCoord::new(4, 3),
                CellCoord::new(4, 4),
            ],
        );
    }

    #[test]
    fn route_detours_around_walls() {
        let mask = mask_from_rows(&["....", "###.", "....", ".###", "...."]);
        let from = CellCoord::new(0, 0);
        let to = CellCoord::new(4, 3);

        let route = find_path(&mask, from, to).expect("serpentine is connected");

        assert_valid_route(&mask, &route, from, to);
        assert_eq!(route.len() - 1, 13);
    }

    #[test]
    fn sealed_goal_yields_none() {
        let mask = mask_from_rows(&["...", "###", "..."]);
        assert!(find_path(&mask, CellCoord::new(0, 0), CellCoord::new(2, 2)).is_none());
    }

    #[test]
    fn impassable_endpoint_yields_none() {
        let mask = mask_from_rows(&["#..", "...", "..#"]);
        assert!(find_path(&mask, CellCoord::new(0, 0), CellCoord::new(1, 1)).is_none());
        assert!(find_path(&mask, CellCoord::new(1, 1), CellCoord::new(2, 2)).is_none());
        assert!(find_path(&mask, CellCoord::new(1, 1), CellCoord::new(7, 7)).is_none());
    }

    #[test]
    fn identical_endpoints_produce_single_cell_route() {
        let mask = PassabilityMask::new(3, 3, true);
        let cell = CellCoord::new(1, 2);
        assert_eq!(find_path(&mask, cell, cell), Some(vec![cell]));
    }

    #[test]
    fn probe_copy_leaves_original_untouched() {
        let mask = PassabilityMask::new(2, 2, true);
        let probe = mask.with(CellCoord::new(0, 1), false);
        assert!(mask.is_passable(CellCoord::new(0, 1)));
        assert!(!probe.is_passable(CellCoord::new(0, 1)));
    }

    fn reachable_distances(mask: &PassabilityMask, from: CellCoord) -> Vec<Option<u32>> {
        let width = mask.columns() as usize;
        let mut distances = vec![None; mask.cells.len()];
        if !mask.is_passable(from) {
            return distances;
        }
        distances[from.row() as usize * width + from.column() as usize] = Some(0);
        let mut changed = true;
        while changed {
            changed = false;
            for row in 0..mask.rows() {
                for column in 0..mask.columns() {
                    let cell = CellCoord::new(row, column);
                    if !mask.is_passable(cell) {
                        continue;
                    }
                    let here = row as usize * width + column as usize;
                    for neighbor in neighbors(cell, mask.columns(), mask.rows()) {
                        let there = neighbor.row() as usize * width + neighbor.column() as usize;
                        if let Some(distance) = distances[there] {
                            if distances[here].map_or(true, |current| distance + 1 < current) {
                                distances[here] = Some(distance + 1);
                                changed = true;
                            }
                        }
                    }
                }
            }
        }
        distances
    }

    #[test]
    fn exhaustive_three_by_three_masks_agree_with_relaxation() {
        let from = CellCoord::new(0, 0);
        let to = CellCoord::new(2, 2);

        for bits in 0u32..512 {
            let mut mask = PassabilityMask::new(3, 3, true);
            for offset in 0..9 {
                if bits & (1 << offset) != 0 {
                    mask.set(CellCoord::new(offset / 3, offset % 3), false);
                }
            }

            let expected = reachable_distances(&mask, from)[8];
            let route = find_path(&mask, from, to);

            match (expected, route) {
                (None, None) => {}
                (Some(distance), Some(route)) => {
                    assert_valid_route(&mask, &route, from, to);
                    assert_eq!(
                        route.len() as u32 - 1,
                        distance,
                        "mask {bits:#011b} produced a non-shortest route",
                    );
                }
                (expected, route) => panic!(
                    "mask {bits:#011b}: expected distance {expected:?}, got route {route:?}"
                ),
            }
        }
    }
}
