use tower_duel_core::{
    economy, CellCoord, CellKind, CellRecord, Command, Event, Faction, LegalityError, MapLayout,
    Obstacle, Phase, SoldierKind, Terrain, TowerKind, MAX_GRID_DIMENSION, MAX_QUEUED_SOLDIERS,
};
use tower_duel_world::{
    self as world, navigation::find_path, query, CommandError, InvalidSavedStateError, LoadTarget,
    World,
};

fn apply_ok(world: &mut World, command: Command) -> Vec<Event> {
    let mut events = Vec::new();
    world::apply(world, command.clone(), &mut events)
        .unwrap_or_else(|error| panic!("{command:?} should be accepted, got {error}"));
    events
}

fn expect_rejection(world: &mut World, command: Command, expected: LegalityError) {
    let before = query::snapshot(world);
    let mut events = Vec::new();
    let result = world::apply(world, command.clone(), &mut events);
    assert_eq!(
        result,
        Err(CommandError::Rejected(expected)),
        "unexpected verdict for {command:?}"
    );
    assert!(events.is_empty(), "rejected commands emit nothing");
    assert_eq!(query::snapshot(world), before, "rejected commands change nothing");
}

fn castles_connected(world: &World) -> bool {
    find_path(
        &query::passability_mask(world),
        query::castle(world, Faction::One),
        query::castle(world, Faction::Two),
    )
    .is_some()
}

#[test]
fn build_rules_are_checked_in_order() {
    let mut world = World::new();

    expect_rejection(
        &mut world,
        Command::BuildTower {
            kind: TowerKind::Ranged,
            cell: CellCoord::new(0, 0),
        },
        LegalityError::InvalidCell,
    );
    expect_rejection(
        &mut world,
        Command::BuildTower {
            kind: TowerKind::Ranged,
            cell: CellCoord::new(5, 5),
        },
        LegalityError::NoNearbyAlly,
    );
    expect_rejection(
        &mut world,
        Command::BuildTower {
            kind: TowerKind::Ranged,
            cell: CellCoord::new(40, 2),
        },
        LegalityError::InvalidCell,
    );

    let _ = apply_ok(
        &mut world,
        Command::BuildTower {
            kind: TowerKind::Ranged,
            cell: CellCoord::new(3, 3),
        },
    );
    // A tower extends territory by Manhattan distance three.
    let _ = apply_ok(
        &mut world,
        Command::BuildTower {
            kind: TowerKind::Ranged,
            cell: CellCoord::new(5, 4),
        },
    );
    assert_eq!(query::money(&world, Faction::One), 300);

    expect_rejection(
        &mut world,
        Command::BuildTower {
            kind: TowerKind::Ranged,
            cell: CellCoord::new(6, 6),
        },
        LegalityError::TooCloseToEnemyCastle,
    );
}

#[test]
fn insufficient_funds_and_wrong_phase_are_reported() {
    let mut layout = MapLayout::blank(6, 6);
    layout.starting_money = 120;
    let mut world = World::from_layout(&layout).expect("valid layout");

    expect_rejection(
        &mut world,
        Command::BuildTower {
            kind: TowerKind::Damage,
            cell: CellCoord::new(1, 1),
        },
        LegalityError::InsufficientFunds,
    );
    assert_eq!(
        query::can_build(&world, TowerKind::Ranged, CellCoord::new(1, 1)),
        Ok(())
    );

    let _ = apply_ok(&mut world, Command::EndPhase);
    let _ = apply_ok(&mut world, Command::EndPhase);
    expect_rejection(
        &mut world,
        Command::BuySoldier {
            kind: SoldierKind::Attack,
        },
        LegalityError::WrongPhase,
    );
    expect_rejection(
        &mut world,
        Command::BuildTower {
            kind: TowerKind::Ranged,
            cell: CellCoord::new(1, 1),
        },
        LegalityError::WrongPhase,
    );
}

#[test]
fn severing_probe_reports_kind_specific_error() {
    let world = World::from_layout(&MapLayout::blank(1, 9)).expect("valid corridor");
    let choke = CellCoord::new(0, 2);

    assert_eq!(
        query::can_build(&world, TowerKind::Ranged, choke),
        Err(LegalityError::PathWouldBeSevered)
    );
    assert_eq!(
        query::can_build(&world, TowerKind::Damage, choke),
        Err(LegalityError::InvalidCell)
    );
    assert_eq!(
        query::can_build(&world, TowerKind::Support, choke),
        Err(LegalityError::InvalidCell)
    );
}

#[test]
fn upgrades_raise_level_until_cap() {
    let mut world = World::new();
    let cell = CellCoord::new(2, 2);
    let _ = apply_ok(
        &mut world,
        Command::BuildTower {
            kind: TowerKind::Support,
            cell,
        },
    );
    let mut funded = query::snapshot(&world);
    funded.ledgers[0].money = 2_000;
    let mut events = Vec::new();
    world::load(&mut world, &funded, LoadTarget::Match, &mut events)
        .expect("snapshot is valid");

    let mut spent = 0;
    for level in 1..5 {
        spent += economy::upgrade_cost(TowerKind::Support, level).expect("priced level");
        let events = apply_ok(&mut world, Command::UpgradeTower { cell });
        assert_eq!(events.len(), 1);
    }
    assert_eq!(query::money(&world, Faction::One), 2_000 - spent);
    match query::cell(&world, cell) {
        Some(CellKind::Tower(tower)) => assert_eq!(tower.level(), 5),
        other => panic!("expected a tower, found {other:?}"),
    }

    expect_rejection(
        &mut world,
        Command::UpgradeTower { cell },
        LegalityError::MaxLevelReached,
    );
}

#[test]
fn upgrade_reports_phase_and_owner_before_level_and_funds() {
    let mut world = World::new();
    let cell = CellCoord::new(2, 2);
    let _ = apply_ok(
        &mut world,
        Command::BuildTower {
            kind: TowerKind::Ranged,
            cell,
        },
    );
    let mut funded = query::snapshot(&world);
    funded.ledgers[0].money = 2_000;
    let mut events = Vec::new();
    world::load(&mut world, &funded, LoadTarget::Match, &mut events)
        .expect("snapshot is valid");
    for _ in 1..5 {
        let _ = apply_ok(&mut world, Command::UpgradeTower { cell });
    }

    let _ = apply_ok(&mut world, Command::EndPhase);
    for _ in 0..10 {
        let _ = apply_ok(
            &mut world,
            Command::BuySoldier {
                kind: SoldierKind::Tank,
            },
        );
    }
    assert_eq!(query::money(&world, Faction::Two), 0);
    expect_rejection(
        &mut world,
        Command::UpgradeTower { cell },
        LegalityError::InvalidCell,
    );

    let _ = apply_ok(&mut world, Command::EndPhase);
    expect_rejection(
        &mut world,
        Command::UpgradeTower { cell },
        LegalityError::WrongPhase,
    );
}

#[test]
fn foreign_towers_cannot_be_upgraded_or_removed() {
    let mut world = World::new();
    let cell = CellCoord::new(1, 2);
    let _ = apply_ok(
        &mut world,
        Command::BuildTower {
            kind: TowerKind::Ranged,
            cell,
        },
    );
    let _ = apply_ok(&mut world, Command::EndPhase);

    expect_rejection(
        &mut world,
        Command::UpgradeTower { cell },
        LegalityError::InvalidCell,
    );
    expect_rejection(
        &mut world,
        Command::RemoveTower { cell },
        LegalityError::InvalidCell,
    );
    expect_rejection(
        &mut world,
        Command::RemoveTower {
            cell: CellCoord::new(4, 4),
        },
        LegalityError::InvalidCell,
    );
}

#[test]
fn removal_refunds_half_cost_plus_level_bonus() {
    let mut world = World::new();
    let cell = CellCoord::new(2, 1);
    let _ = apply_ok(
        &mut world,
        Command::BuildTower {
            kind: TowerKind::Ranged,
            cell,
        },
    );
    let _ = apply_ok(&mut world, Command::UpgradeTower { cell });
    assert_eq!(query::money(&world, Faction::One), 500 - 100 - 50);

    let _ = apply_ok(&mut world, Command::RemoveTower { cell });

    assert_eq!(query::money(&world, Faction::One), 350 + 50 + 40);
    assert_eq!(query::cell(&world, cell), Some(CellKind::Plain));
}

#[test]
fn money_never_goes_negative_while_spending_down() {
    let mut world = World::new();
    let mut events = Vec::new();
    let orders = [
        SoldierKind::Tank,
        SoldierKind::Attack,
        SoldierKind::Tank,
        SoldierKind::Tank,
    ];
    for kind in orders.iter().cycle().take(40) {
        let before = query::money(&world, Faction::One);
        match world::apply(&mut world, Command::BuySoldier { kind: *kind }, &mut events) {
            Ok(()) => assert_eq!(
                query::money(&world, Faction::One),
                before - economy::soldier_cost(*kind)
            ),
            Err(error) => {
                assert_eq!(error, CommandError::Rejected(LegalityError::InsufficientFunds));
                assert!(before < economy::soldier_cost(*kind));
            }
        }
    }
    let ledger = query::ledger(&world, Faction::One);
    assert!(ledger.money < economy::soldier_cost(SoldierKind::Attack));
    assert_eq!(
        query::soldiers_by_kind(&world, Faction::One, SoldierKind::Attack)
            + query::soldiers_by_kind(&world, Faction::One, SoldierKind::Tank),
        ledger.total_units_built as usize
    );
}

#[test]
fn accepted_terrain_never_disconnects_castles() {
    let mut world = World::from_layout(&MapLayout::blank(6, 6)).expect("valid layout");
    let mut events = Vec::new();
    let mut severed = 0;

    for row in 0..6 {
        for column in 0..6 {
            let command = Command::PlaceTerrain {
                cell: CellCoord::new(row, column),
                terrain: Terrain::Obstacle(Obstacle::Mountain),
            };
            if let Err(CommandError::Rejected(LegalityError::PathWouldBeSevered)) =
                world::apply(&mut world, command, &mut events)
            {
                severed += 1;
            }
            assert!(castles_connected(&world));
        }
    }

    assert!(severed > 0, "flooding the grid must hit the connectivity guard");
    let lane = find_path(
        &query::passability_mask(&world),
        query::castle(&world, Faction::One),
        query::castle(&world, Faction::Two),
    )
    .expect("castles stay connected");
    assert_eq!(lane.len(), 11, "only a shortest corridor survives");
}

#[test]
fn editor_paints_terrain_but_never_seals_castles() {
    let mut world = World::from_layout(&MapLayout::blank(3, 3)).expect("valid layout");

    let _ = apply_ok(
        &mut world,
        Command::PlaceTerrain {
            cell: CellCoord::new(0, 1),
            terrain: Terrain::Obstacle(Obstacle::Mountain),
        },
    );
    expect_rejection(
        &mut world,
        Command::PlaceTerrain {
            cell: CellCoord::new(1, 0),
            terrain: Terrain::Obstacle(Obstacle::Water),
        },
        LegalityError::PathWouldBeSevered,
    );
    expect_rejection(
        &mut world,
        Command::PlaceTerrain {
            cell: CellCoord::new(2, 2),
            terrain: Terrain::Plain,
        },
        LegalityError::InvalidCell,
    );

    let _ = apply_ok(
        &mut world,
        Command::PlaceTerrain {
            cell: CellCoord::new(0, 1),
            terrain: Terrain::Plain,
        },
    );
    assert_eq!(query::cell(&world, CellCoord::new(0, 1)), Some(CellKind::Plain));
}

#[test]
fn castle_move_thresholds_differ_per_faction() {
    let mut world = World::from_layout(&MapLayout::blank(5, 5)).expect("valid layout");

    assert_eq!(
        query::can_move_castle(&world, Faction::One, CellCoord::new(3, 3)),
        Err(LegalityError::TooCloseToEnemyCastle)
    );
    assert_eq!(
        query::can_move_castle(&world, Faction::One, CellCoord::new(4, 4)),
        Err(LegalityError::InvalidCell)
    );
    assert_eq!(
        query::can_move_castle(&world, Faction::Two, CellCoord::new(1, 1)),
        Ok(())
    );

    let events = apply_ok(
        &mut world,
        Command::MoveCastle {
            faction: Faction::One,
            cell: CellCoord::new(0, 2),
        },
    );
    assert_eq!(events.len(), 1);
    assert_eq!(query::castle(&world, Faction::One), CellCoord::new(0, 2));
    assert_eq!(query::cell(&world, CellCoord::new(0, 0)), Some(CellKind::Plain));
    assert_eq!(query::castle_hitpoints(&world, Faction::One), 100);
}

#[test]
fn editor_locks_once_the_match_is_touched() {
    let mut world = World::new();
    let _ = apply_ok(&mut world, Command::SetStartingMoney { amount: 900 });
    assert_eq!(query::money(&world, Faction::Two), 900);

    let _ = apply_ok(&mut world, Command::BuySoldier { kind: SoldierKind::Attack });

    expect_rejection(
        &mut world,
        Command::SetStartingMoney { amount: 10 },
        LegalityError::WrongPhase,
    );
    expect_rejection(
        &mut world,
        Command::PlaceTerrain {
            cell: CellCoord::new(4, 4),
            terrain: Terrain::Obstacle(Obstacle::Water),
        },
        LegalityError::WrongPhase,
    );
}

#[test]
fn snapshot_round_trips_through_load() {
    let mut world = World::new();
    let _ = apply_ok(
        &mut world,
        Command::BuildTower {
            kind: TowerKind::Damage,
            cell: CellCoord::new(2, 2),
        },
    );
    let _ = apply_ok(&mut world, Command::UpgradeTower { cell: CellCoord::new(2, 2) });
    let _ = apply_ok(&mut world, Command::BuySoldier { kind: SoldierKind::Tank });
    let _ = apply_ok(&mut world, Command::BuySoldier { kind: SoldierKind::Attack });
    let _ = apply_ok(&mut world, Command::EndPhase);
    let snapshot = query::snapshot(&world);
    assert_eq!(snapshot.current, Faction::Two);

    let mut restored = World::new();
    let mut events = Vec::new();
    world::load(&mut restored, &snapshot, LoadTarget::Match, &mut events)
        .expect("captured snapshots are valid");

    assert_eq!(query::snapshot(&restored), snapshot);
    assert_eq!(query::phase(&restored), Phase::Build(Faction::Two));
    assert_eq!(
        query::soldiers_by_kind(&restored, Faction::One, SoldierKind::Tank),
        1
    );
    assert_eq!(
        events.last(),
        Some(&Event::PhaseChanged {
            phase: Phase::Build(Faction::Two)
        })
    );
}

#[test]
fn invalid_snapshots_leave_match_untouched() {
    let mut world = World::new();
    let _ = apply_ok(&mut world, Command::BuySoldier { kind: SoldierKind::Attack });
    let before = query::snapshot(&world);
    let mut events = Vec::new();

    let mut truncated = before.clone();
    let _ = truncated.cells.pop();
    assert_eq!(
        world::load(&mut world, &truncated, LoadTarget::Match, &mut events),
        Err(InvalidSavedStateError::CellCountMismatch {
            expected: 100,
            found: 99,
        })
    );

    let mut sealed = before.clone();
    for index in [1, 10, 11] {
        sealed.cells[index] = CellRecord::Mountain;
    }
    assert_eq!(
        world::load(&mut world, &sealed, LoadTarget::Match, &mut events),
        Err(InvalidSavedStateError::Disconnected)
    );

    let mut twin = before.clone();
    twin.cells[5] = twin.cells[0];
    assert_eq!(
        world::load(&mut world, &twin, LoadTarget::Match, &mut events),
        Err(InvalidSavedStateError::CastleCount {
            faction: Faction::One,
            found: 2,
        })
    );

    assert_eq!(
        world::load(&mut world, &before, LoadTarget::Editor, &mut events),
        Err(InvalidSavedStateError::OccupiedForEditor)
    );

    assert!(events.is_empty());
    assert_eq!(query::snapshot(&world), before);
}

#[test]
fn oversized_snapshots_are_rejected_before_loading() {
    let mut world = World::new();
    let before = query::snapshot(&world);
    let mut events = Vec::new();

    let mut crowded = before.clone();
    crowded.cells[0] = CellRecord::Castle {
        owner: Faction::One,
        hitpoints: 100,
        attack_soldiers: u32::MAX,
        tank_soldiers: 1,
    };
    assert_eq!(
        world::load(&mut world, &crowded, LoadTarget::Match, &mut events),
        Err(InvalidSavedStateError::QueuedSoldiers {
            cell: CellCoord::new(0, 0),
            count: u64::from(u32::MAX) + 1,
        })
    );

    let mut stretched = before.clone();
    stretched.rows = MAX_GRID_DIMENSION + 1;
    assert_eq!(
        world::load(&mut world, &stretched, LoadTarget::Match, &mut events),
        Err(InvalidSavedStateError::GridTooLarge {
            rows: MAX_GRID_DIMENSION + 1,
            columns: 10,
        })
    );
    assert!(events.is_empty());
    assert_eq!(query::snapshot(&world), before);

    let mut garrisoned = before.clone();
    garrisoned.cells[0] = CellRecord::Castle {
        owner: Faction::One,
        hitpoints: 100,
        attack_soldiers: MAX_QUEUED_SOLDIERS,
        tank_soldiers: 0,
    };
    world::load(&mut world, &garrisoned, LoadTarget::Match, &mut events)
        .expect("a full queue is still valid");
    assert_eq!(
        query::soldiers_by_kind(&world, Faction::One, SoldierKind::Attack),
        MAX_QUEUED_SOLDIERS as usize
    );
}
