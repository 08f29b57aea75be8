//! Headless match loop wiring the world to the scripted players and the tick driver.

use std::{thread, time::Duration};

use anyhow::{bail, Context, Result};
use tower_duel_core::{Command, Event, Faction, Phase};
use tower_duel_persistence::{FilePersistence, Persistence};
use tower_duel_system_script::ScriptedPlayer;
use tower_duel_system_tick_driver::{Config as DriverConfig, TickDriver};
use tower_duel_world::{self as world, query, CommandError, LoadTarget, World};

use crate::config::Settings;

/// Final state reported once the loop stops.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct Summary {
    pub(crate) phase: Phase,
    pub(crate) round: u32,
    pub(crate) ticks: u64,
    pub(crate) hitpoints: [u32; 2],
    pub(crate) money: [u32; 2],
}

pub(crate) struct Runner {
    world: World,
    driver: TickDriver,
    players: [ScriptedPlayer; 2],
    pending: Vec<Event>,
    tick_interval: Duration,
    realtime: bool,
}

impl Runner {
    /// Starts a new match from the settings, or resumes the configured save file.
    pub(crate) fn new(settings: &Settings) -> Result<Self> {
        let mut world = World::new();
        let mut pending = Vec::new();

        match &settings.load {
            Some(path) => {
                let snapshot = FilePersistence::new()
                    .load(path)
                    .with_context(|| format!("failed to read save file {}", path.display()))?;
                world::load(&mut world, &snapshot, LoadTarget::Match, &mut pending)
                    .with_context(|| format!("save file {} is unusable", path.display()))?;
            }
            None => {
                let layout = settings.layout()?;
                world::apply(&mut world, Command::NewMatch { layout }, &mut pending)
                    .context("failed to start match")?;
            }
        }

        let [one, two] = settings.plans.clone();
        Ok(Self {
            world,
            driver: TickDriver::new(DriverConfig::new(settings.tick_interval)),
            players: [
                ScriptedPlayer::new(Faction::One, one),
                ScriptedPlayer::new(Faction::Two, two),
            ],
            pending,
            tick_interval: settings.tick_interval,
            realtime: settings.realtime,
        })
    }

    pub(crate) fn world(&self) -> &World {
        &self.world
    }

    /// Plays until the match ends or `max_ticks` combat ticks have run.
    pub(crate) fn run(&mut self, max_ticks: u64) -> Result<Summary> {
        let mut ticks = 0;
        loop {
            let phase = query::phase(&self.world);
            let mut commands = Vec::new();
            match phase {
                Phase::GameOver(_) => break,
                Phase::Simulation => {
                    if ticks >= max_ticks {
                        tracing::warn!(ticks, "tick limit reached before the match ended");
                        break;
                    }
                    self.driver
                        .handle(&self.pending, self.tick_interval, &mut commands);
                    if self.realtime {
                        thread::sleep(self.tick_interval);
                    }
                }
                Phase::Build(_) => {
                    let round = query::round(&self.world);
                    for player in &mut self.players {
                        player.handle(&self.pending, round, &mut commands);
                    }
                    self.driver
                        .handle(&self.pending, Duration::ZERO, &mut Vec::new());
                }
            }

            if commands.is_empty() {
                bail!("nothing drove the match forward during {phase:?}");
            }
            self.pending.clear();
            for command in commands {
                if command == Command::Tick {
                    ticks += 1;
                }
                self.submit(command)?;
            }
        }

        Ok(self.summary(ticks))
    }

    fn submit(&mut self, command: Command) -> Result<()> {
        match world::apply(&mut self.world, command.clone(), &mut self.pending) {
            Ok(()) => Ok(()),
            Err(CommandError::Rejected(reason)) => {
                tracing::warn!(?command, %reason, "scripted order rejected");
                Ok(())
            }
            Err(error) => Err(error).with_context(|| format!("{command:?} failed")),
        }
    }

    fn summary(&self, ticks: u64) -> Summary {
        let per_faction = |read: fn(&World, Faction) -> u32| {
            [read(&self.world, Faction::One), read(&self.world, Faction::Two)]
        };
        Summary {
            phase: query::phase(&self.world),
            round: query::round(&self.world),
            ticks,
            hitpoints: per_faction(query::castle_hitpoints),
            money: per_faction(query::money),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use tower_duel_core::{Outcome, SoldierKind};
    use tower_duel_system_script::{Plan, RoundOrders};

    use super::*;

    fn settings(plans: [Plan; 2], load: Option<PathBuf>) -> Settings {
        Settings {
            rows: 5,
            columns: 5,
            seed: None,
            starting_money: 500,
            tick_interval: Duration::from_millis(10),
            max_ticks: 500,
            realtime: false,
            plans,
            load,
            save: None,
            print_transfer: false,
        }
    }

    fn attackers(count: usize) -> Plan {
        Plan {
            rounds: vec![RoundOrders {
                round: 1,
                soldiers: vec![SoldierKind::Attack; count],
                ..RoundOrders::default()
            }],
            repeat_last: true,
        }
    }

    #[test]
    fn idle_scripts_cycle_rounds_until_tick_limit() {
        let mut runner =
            Runner::new(&settings([Plan::default(), Plan::default()], None)).expect("new match");

        let summary = runner.run(3).expect("loop runs");

        assert_eq!(summary.ticks, 3, "each empty combat phase costs one tick");
        assert_eq!(summary.round, 4);
        assert_eq!(summary.money, [560, 560]);
    }

    #[test]
    fn relentless_attacker_wins() {
        let mut runner =
            Runner::new(&settings([attackers(2), Plan::default()], None)).expect("new match");

        let summary = runner.run(10_000).expect("loop runs");

        assert_eq!(summary.phase, Phase::GameOver(Outcome::Winner(Faction::One)));
        assert_eq!(summary.hitpoints[1], 0);
        assert_eq!(summary.hitpoints[0], 100);
    }

    #[test]
    fn saved_match_resumes_from_file() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("slot.json");
        let mut first =
            Runner::new(&settings([attackers(1), Plan::default()], None)).expect("new match");
        let _ = first.run(9).expect("loop runs");
        FilePersistence::new()
            .save(&path, &query::snapshot(first.world()))
            .expect("save succeeds");

        let resumed =
            Runner::new(&settings([Plan::default(), Plan::default()], Some(path))).expect("resume");

        assert_eq!(
            query::snapshot(resumed.world()),
            query::snapshot(first.world())
        );
        assert_eq!(query::castle_hitpoints(resumed.world(), Faction::Two), 90);
    }
}
