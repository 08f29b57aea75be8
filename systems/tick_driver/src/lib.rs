#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Fixed-cadence driver that converts elapsed time into combat tick commands.

use std::time::Duration;

use tower_duel_core::{Command, Event, Phase};

/// Cadence used when no interval is configured.
pub const DEFAULT_TICK_INTERVAL: Duration = Duration::from_secs(1);

/// Configuration parameters required to construct the tick driver.
#[derive(Clone, Copy, Debug)]
pub struct Config {
    tick_interval: Duration,
}

impl Config {
    /// Creates a new configuration using the provided tick cadence.
    #[must_use]
    pub const fn new(tick_interval: Duration) -> Self {
        Self { tick_interval }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new(DEFAULT_TICK_INTERVAL)
    }
}

/// Pure system that emits [`Command::Tick`] while a combat phase is running.
///
/// Pausing only stops the flow of ticks; the match itself never observes it.
#[derive(Debug)]
pub struct TickDriver {
    tick_interval: Duration,
    accumulator: Duration,
    phase: Option<Phase>,
    paused: bool,
}

impl TickDriver {
    /// Creates a new driver using the supplied configuration.
    #[must_use]
    pub fn new(config: Config) -> Self {
        Self {
            tick_interval: config.tick_interval,
            accumulator: Duration::ZERO,
            phase: None,
            paused: false,
        }
    }

    /// Stops emitting ticks until [`TickDriver::resume`] is called.
    pub fn pause(&mut self) {
        self.paused = true;
    }

    /// Restarts tick emission after a pause.
    pub fn resume(&mut self) {
        self.paused = false;
    }

    /// Reports whether the driver is paused.
    #[must_use]
    pub const fn is_paused(&self) -> bool {
        self.paused
    }

    /// Time carried over toward the next tick.
    #[must_use]
    pub const fn pending(&self) -> Duration {
        self.accumulator
    }

    /// Consumes world events and elapsed time to emit tick commands.
    ///
    /// Phase changes are tracked from the events; leaving combat discards any
    /// accumulated time so the next combat phase starts from a clean cadence.
    pub fn handle(&mut self, events: &[Event], dt: Duration, out: &mut Vec<Command>) {
        for event in events {
            if let Event::PhaseChanged { phase } = event {
                self.phase = Some(*phase);
            }
        }

        if self.phase != Some(Phase::Simulation) {
            self.accumulator = Duration::ZERO;
            return;
        }

        if self.paused || self.tick_interval.is_zero() || dt.is_zero() {
            return;
        }

        self.accumulator = self.accumulator.saturating_add(dt);
        while self.accumulator >= self.tick_interval {
            self.accumulator -= self.tick_interval;
            out.push(Command::Tick);
        }
    }
}
