#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Seeded generator for randomized starting maps.
//!
//! Castles land in opposite quarters of the grid. Obstacles are scattered
//! away from both castles and never cut the castles off from each other.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use thiserror::Error;
use tower_duel_core::{economy, CellCoord, Faction, MapLayout, Obstacle, MAX_GRID_DIMENSION};
use tower_duel_world::navigation::{find_path, PassabilityMask};

/// Obstacles never come closer than this Chebyshev distance to a castle.
const CASTLE_CLEARANCE: u32 = 3;
const MIN_PLACEMENT_ATTEMPTS: u64 = 64;
const ATTEMPTS_PER_CELL: u64 = 16;

/// Configuration parameters required to construct the generator.
#[derive(Clone, Copy, Debug)]
pub struct Config {
    rng_seed: u64,
    starting_money: u32,
}

impl Config {
    /// Creates a new configuration using the provided seed and the default
    /// starting money.
    #[must_use]
    pub const fn new(rng_seed: u64) -> Self {
        Self {
            rng_seed,
            starting_money: economy::STARTING_MONEY,
        }
    }

    /// Overrides the money both factions start with.
    #[must_use]
    pub const fn with_starting_money(mut self, starting_money: u32) -> Self {
        self.starting_money = starting_money;
        self
    }
}

/// Reasons a map cannot be generated.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
pub enum MapGenerationError {
    /// The grid cannot hold two separate castles.
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
}

/// Deterministic map generator; equal seeds produce equal layouts.
#[derive(Debug)]
pub struct MapGeneration {
    rng: ChaCha8Rng,
    starting_money: u32,
}

impl MapGeneration {
    /// Creates a new generator using the supplied configuration.
    #[must_use]
    pub fn new(config: Config) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(config.rng_seed),
            starting_money: config.starting_money,
        }
    }

    /// Produces a fresh layout for a `rows` x `columns` grid.
    ///
    /// Placement gives up after `max(64, 16 * rows * columns)` attempts, so a
    /// crowded or tiny grid may end with fewer obstacles than targeted.
    pub fn generate(&mut self, rows: u32, columns: u32) -> Result<MapLayout, MapGenerationError> {
        let area = u64::from(rows) * u64::from(columns);
        if area < 2 {
            return Err(MapGenerationError::GridTooSmall { rows, columns });
        }
        if rows > MAX_GRID_DIMENSION || columns > MAX_GRID_DIMENSION {
            return Err(MapGenerationError::GridTooLarge { rows, columns });
        }

        let castles = [
            CellCoord::new(
                self.rng.gen_range(0..=rows / 4),
                self.rng.gen_range(0..=columns / 4),
            ),
            CellCoord::new(
                self.rng.gen_range(rows - rows / 4 - 1..rows),
                self.rng.gen_range(columns - columns / 4 - 1..columns),
            ),
        ];

        let extra = match area / 14 {
            0 => 0,
            bound => self.rng.gen_range(0..bound),
        };
        let target = area / 9 + extra;
        let budget = MIN_PLACEMENT_ATTEMPTS.max(ATTEMPTS_PER_CELL.saturating_mul(area));

        let mut mask = PassabilityMask::new(rows, columns, true);
        let mut obstacles = Vec::new();
        let mut attempts = 0;
        while (obstacles.len() as u64) < target && attempts < budget {
            attempts += 1;
            let cell = CellCoord::new(self.rng.gen_range(0..rows), self.rng.gen_range(0..columns));
            if !mask.is_passable(cell) || near_castle(&castles, cell) {
                continue;
            }

            let probe = mask.with(cell, false);
            if find_path(
                &probe,
                castles[Faction::One.index()],
                castles[Faction::Two.index()],
            )
            .is_none()
            {
                continue;
            }

            mask = probe;
            let obstacle = if self.rng.gen_bool(0.5) {
                Obstacle::Mountain
            } else {
                Obstacle::Water
            };
            obstacles.push((cell, obstacle));
        }

        Ok(MapLayout {
            rows,
            columns,
            castles,
            obstacles,
            starting_money: self.starting_money,
        })
    }
}

fn near_castle(castles: &[CellCoord; 2], cell: CellCoord) -> bool {
    castles
        .iter()
        .any(|castle| castle.chebyshev_distance(cell) < CASTLE_CLEARANCE)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_cell_grid_is_rejected() {
        let mut generation = MapGeneration::new(Config::new(1));
        assert_eq!(
            generation.generate(1, 1),
            Err(MapGenerationError::GridTooSmall {
                rows: 1,
                columns: 1
            })
        );
    }

    #[test]
    fn oversized_grid_is_rejected() {
        let mut generation = MapGeneration::new(Config::new(1));
        assert_eq!(
            generation.generate(MAX_GRID_DIMENSION + 1, 8),
            Err(MapGenerationError::GridTooLarge {
                rows: MAX_GRID_DIMENSION + 1,
                columns: 8
            })
        );
    }

    #[test]
    fn clearance_is_measured_from_both_castles() {
        let castles = [CellCoord::new(0, 0), CellCoord::new(9, 9)];
        assert!(near_castle(&castles, CellCoord::new(2, 2)));
        assert!(near_castle(&castles, CellCoord::new(7, 8)));
        assert!(!near_castle(&castles, CellCoord::new(3, 6)));
    }

    #[test]
    fn two_by_one_grid_still_places_both_castles() {
        let mut generation = MapGeneration::new(Config::new(9));
        let layout = generation.generate(2, 1).expect("two cells suffice");
        assert_ne!(layout.castles[0], layout.castles[1]);
        assert!(layout.obstacles.is_empty());
    }
}
