#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Scripted player that replays a per-round plan of build-phase orders.
//!
//! Plans are plain data and deserialize from configuration files, which lets
//! headless matches run without any interactive input.

use serde::{Deserialize, Serialize};
use tower_duel_core::{CellCoord, Command, Event, Faction, Phase, SoldierKind, TowerKind};

/// Tower construction order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TowerOrder {
    /// Kind of tower to construct.
    pub kind: TowerKind,
    /// Target cell.
    pub cell: CellCoord,
}

/// Orders a faction issues during one of its build phases.
///
/// Orders are submitted as removals, constructions, upgrades and then
/// purchases, followed by the end of the phase.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RoundOrders {
    /// Round the orders apply to, starting at 1.
    pub round: u32,
    /// Cells of towers to demolish.
    pub removals: Vec<CellCoord>,
    /// Towers to construct.
    pub towers: Vec<TowerOrder>,
    /// Cells of towers to upgrade by one level each.
    pub upgrades: Vec<CellCoord>,
    /// Soldiers to recruit, in queue order.
    pub soldiers: Vec<SoldierKind>,
}

impl RoundOrders {
    fn emit(&self, out: &mut Vec<Command>) {
        out.extend(
            self.removals
                .iter()
                .map(|cell| Command::RemoveTower { cell: *cell }),
        );
        out.extend(self.towers.iter().map(|order| Command::BuildTower {
            kind: order.kind,
            cell: order.cell,
        }));
        out.extend(
            self.upgrades
                .iter()
                .map(|cell| Command::UpgradeTower { cell: *cell }),
        );
        out.extend(
            self.soldiers
                .iter()
                .map(|kind| Command::BuySoldier { kind: *kind }),
        );
    }
}

/// Complete plan of a scripted faction.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Plan {
    /// Orders keyed by their round number.
    pub rounds: Vec<RoundOrders>,
    /// Replays the highest-numbered entry for rounds past the end of the plan.
    pub repeat_last: bool,
}

impl Plan {
    /// Orders scheduled for `round`, if any.
    #[must_use]
    pub fn orders_for(&self, round: u32) -> Option<&RoundOrders> {
        if let Some(orders) = self.rounds.iter().find(|orders| orders.round == round) {
            return Some(orders);
        }
        if !self.repeat_last {
            return None;
        }
        self.rounds
            .iter()
            .filter(|orders| orders.round < round)
            .max_by_key(|orders| orders.round)
    }
}

/// Pure system that submits a faction's planned orders whenever its build
/// phase begins.
#[derive(Debug, Clone)]
pub struct ScriptedPlayer {
    faction: Faction,
    plan: Plan,
}

impl ScriptedPlayer {
    /// Creates a scripted player acting for `faction`.
    #[must_use]
    pub const fn new(faction: Faction, plan: Plan) -> Self {
        Self { faction, plan }
    }

    /// Faction the script plays.
    #[must_use]
    pub const fn faction(&self) -> Faction {
        self.faction
    }

    /// Consumes world events and emits the orders for the current round.
    ///
    /// `round` should mirror the world's `query::round`. The emitted batch
    /// always ends with [`Command::EndPhase`], even when nothing is planned.
    pub fn handle(&mut self, events: &[Event], round: u32, out: &mut Vec<Command>) {
        let my_turn = events.iter().any(|event| {
            matches!(
                event,
                Event::PhaseChanged {
                    phase: Phase::Build(faction)
                } if *faction == self.faction
            )
        });
        if !my_turn {
            return;
        }

        if let Some(orders) = self.plan.orders_for(round) {
            orders.emit(out);
        }
        out.push(Command::EndPhase);
    }
}
