use tower_duel_core::{CellCoord, Command, Faction, MapLayout, Phase};
use tower_duel_system_map_generation::{Config, MapGeneration};
use tower_duel_world::{
    self as world,
    navigation::{find_path, PassabilityMask},
    query, World,
};

fn generate(seed: u64, rows: u32, columns: u32) -> MapLayout {
    MapGeneration::new(Config::new(seed))
        .generate(rows, columns)
        .expect("grid is large enough")
}

#[test]
fn same_seed_reproduces_layout() {
    assert_eq!(generate(0x5eed, 10, 10), generate(0x5eed, 10, 10));
}

#[test]
fn different_seeds_vary_layouts() {
    let layouts: Vec<MapLayout> = (0..8).map(|seed| generate(seed, 12, 12)).collect();
    assert!(
        layouts.windows(2).any(|pair| pair[0] != pair[1]),
        "eight seeds should not all collapse to one layout"
    );
}

#[test]
fn castles_land_in_opposite_quarters() {
    for seed in 0..32 {
        let layout = generate(seed, 12, 16);
        let first = layout.castle(Faction::One);
        let second = layout.castle(Faction::Two);
        assert!(first.row() <= 3 && first.column() <= 4, "seed {seed}: {first:?}");
        assert!(second.row() >= 8 && second.column() >= 11, "seed {seed}: {second:?}");
    }
}

#[test]
fn obstacles_respect_clearance_and_connectivity() {
    for seed in 0..16 {
        let layout = generate(seed, 14, 14);
        let mut mask = PassabilityMask::new(layout.rows, layout.columns, true);
        for (cell, _) in &layout.obstacles {
            for faction in Faction::ALL {
                assert!(
                    layout.castle(faction).chebyshev_distance(*cell) >= 3,
                    "seed {seed}: obstacle {cell:?} crowds castle of {faction:?}"
                );
            }
            assert!(mask.is_passable(*cell), "seed {seed}: duplicate obstacle {cell:?}");
            mask.set(*cell, false);
        }

        assert!(
            find_path(&mask, layout.castle(Faction::One), layout.castle(Faction::Two)).is_some(),
            "seed {seed}: castles disconnected"
        );
        assert!(
            layout.obstacles.len() >= 14 * 14 / 9,
            "seed {seed}: only {} obstacles placed",
            layout.obstacles.len()
        );
    }
}

#[test]
fn generated_layout_starts_a_match() {
    let layout = generate(77, 10, 10);
    let obstacles = layout.obstacles.clone();
    let mut world = World::new();
    let mut events = Vec::new();

    world::apply(&mut world, Command::NewMatch { layout }, &mut events)
        .expect("generated layouts are valid");

    assert_eq!(query::phase(&world), Phase::Build(Faction::One));
    for (cell, obstacle) in obstacles {
        assert_eq!(
            query::cell(&world, cell),
            Some(tower_duel_core::CellKind::Obstacle(obstacle))
        );
    }
    assert_eq!(query::cell(&world, CellCoord::new(10, 0)), None);
}
