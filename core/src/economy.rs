//! Prices, refunds and round income.

use crate::{Ledger, SoldierKind, TowerKind};

/// Money each faction holds when a match starts.
pub const STARTING_MONEY: u32 = 500;

const INCOME_PER_UNIT_BUILT: u32 = 5;
const INCOME_PER_KILL: u32 = 15;
const INCOME_BASE: u32 = 20;
const REFUND_PER_LEVEL: u32 = 20;

/// Price of constructing a tower.
#[must_use]
pub const fn tower_cost(kind: TowerKind) -> u32 {
    match kind {
        TowerKind::Ranged => 100,
        TowerKind::Damage => 200,
        TowerKind::Support => 150,
    }
}

/// Price of recruiting a soldier.
#[must_use]
pub const fn soldier_cost(kind: SoldierKind) -> u32 {
    match kind {
        SoldierKind::Attack => 30,
        SoldierKind::Tank => 50,
    }
}

/// Price of upgrading a tower currently at `level`.
///
/// The table carries a fifth entry per kind even though level 5 towers
/// cannot upgrade; levels outside `1..=5` have no price.
#[must_use]
pub const fn upgrade_cost(kind: TowerKind, level: u8) -> Option<u32> {
    let table: [u32; 5] = match kind {
        TowerKind::Ranged => [50, 100, 120, 140, 160],
        TowerKind::Damage => [80, 140, 160, 180, 200],
        TowerKind::Support => [70, 120, 140, 160, 170],
    };
    if level == 0 || level as usize > table.len() {
        return None;
    }
    Some(table[level as usize - 1])
}

/// Money returned when demolishing a tower at `level`.
#[must_use]
pub const fn removal_refund(kind: TowerKind, level: u8) -> u32 {
    tower_cost(kind) / 2 + level as u32 * REFUND_PER_LEVEL
}

/// Income credited to a faction when a combat phase ends.
#[must_use]
pub fn round_income(ledger: &Ledger) -> u32 {
    INCOME_PER_UNIT_BUILT
        .saturating_mul(ledger.total_units_built)
        .saturating_add(INCOME_PER_KILL.saturating_mul(ledger.kills_this_round))
        .saturating_add(INCOME_BASE)
}
