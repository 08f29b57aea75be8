//! Serializable save-game records exchanged with persistence adapters.
//!
//! A snapshot keeps ledgers, round bookkeeping and one record per cell. Soldiers
//! are reduced to per-kind counts waiting in their own castle, so individual
//! hitpoints and soldiers already marching are not carried across a save.

use serde::{Deserialize, Serialize};

use crate::{Faction, Ledger};

/// Complete save-game contents.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchSnapshot {
    /// Ledgers indexed by [`Faction::index`].
    pub ledgers: [LedgerRecord; 2],
    /// Current round number, starting at 1.
    pub round: u32,
    /// Faction whose build phase the match resumes in.
    pub current: Faction,
    /// Number of grid rows.
    pub rows: u32,
    /// Number of grid columns.
    pub columns: u32,
    /// Cell records in row-major order.
    pub cells: Vec<CellRecord>,
}

/// Persisted ledger counters.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct LedgerRecord {
    /// Money available for spending.
    pub money: u32,
    /// Soldiers recruited since the match began.
    pub total_units_built: u32,
    /// Enemy soldiers killed during the current round.
    pub kills_this_round: u32,
}

impl From<Ledger> for LedgerRecord {
    fn from(ledger: Ledger) -> Self {
        Self {
            money: ledger.money,
            total_units_built: ledger.total_units_built,
            kills_this_round: ledger.kills_this_round,
        }
    }
}

impl From<LedgerRecord> for Ledger {
    fn from(record: LedgerRecord) -> Self {
        Self {
            money: record.money,
            kills_this_round: record.kills_this_round,
            total_units_built: record.total_units_built,
        }
    }
}

/// Persisted tower fields shared by every tower kind.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TowerRecord {
    /// Owning faction.
    pub owner: Faction,
    /// Level in `1..=5`.
    pub level: u8,
    /// Manhattan reach.
    pub range: u32,
    /// Damage per attack.
    pub damage: u32,
    /// Attacks per tick.
    pub target_count: u32,
}

/// One persisted grid cell, tagged by type.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum CellRecord {
    /// Empty ground.
    Plain,
    /// Castle with its owner's waiting soldiers.
    Castle {
        /// Owning faction.
        owner: Faction,
        /// Remaining hitpoints.
        hitpoints: u32,
        /// Attack soldiers of the owner queued at the castle.
        attack_soldiers: u32,
        /// Tank soldiers of the owner queued at the castle.
        tank_soldiers: u32,
    },
    /// Mountain obstacle.
    Mountain,
    /// Water obstacle.
    Water,
    /// Ranged tower.
    RangedTower(TowerRecord),
    /// Damage tower.
    DamageTower(TowerRecord),
    /// Support tower with its heal amount.
    SupportTower {
        /// Shared tower fields.
        #[serde(flatten)]
        tower: TowerRecord,
        /// Castle hitpoints restored per kill.
        heal_amount: u32,
    },
}
