//! Match settings merged from the optional TOML match file and command-line flags.

use std::{fs, path::PathBuf, time::Duration};

use anyhow::{Context, Result};
use serde::Deserialize;
use tower_duel_core::{economy, MapLayout};
use tower_duel_system_map_generation::{Config as GenerationConfig, MapGeneration};
use tower_duel_system_script::Plan;
use tower_duel_system_tick_driver::DEFAULT_TICK_INTERVAL;

use crate::Args;

const DEFAULT_ROWS: u32 = 10;
const DEFAULT_COLUMNS: u32 = 10;
const DEFAULT_MAX_TICKS: u64 = 1_000;

/// Contents of a TOML match file. Every key is optional.
#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub(crate) struct MatchFile {
    rows: Option<u32>,
    columns: Option<u32>,
    seed: Option<u64>,
    starting_money: Option<u32>,
    tick_interval_ms: Option<u64>,
    max_ticks: Option<u64>,
    faction_one: Plan,
    faction_two: Plan,
}

impl MatchFile {
    pub(crate) fn parse(source: &str) -> Result<Self> {
        toml::from_str(source).context("match file is not valid TOML")
    }
}

/// Fully resolved run settings; flags take precedence over the match file.
#[derive(Debug)]
pub(crate) struct Settings {
    pub(crate) rows: u32,
    pub(crate) columns: u32,
    pub(crate) seed: Option<u64>,
    pub(crate) starting_money: u32,
    pub(crate) tick_interval: Duration,
    pub(crate) max_ticks: u64,
    pub(crate) realtime: bool,
    pub(crate) plans: [Plan; 2],
    pub(crate) load: Option<PathBuf>,
    pub(crate) save: Option<PathBuf>,
    pub(crate) print_transfer: bool,
}

impl Settings {
    pub(crate) fn resolve(args: &Args) -> Result<Self> {
        let file = match &args.config {
            Some(path) => {
                let source = fs::read_to_string(path)
                    .with_context(|| format!("failed to read match file {}", path.display()))?;
                MatchFile::parse(&source)
                    .with_context(|| format!("failed to parse match file {}", path.display()))?
            }
            None => MatchFile::default(),
        };
        Ok(Self::merge(args, file))
    }

    fn merge(args: &Args, file: MatchFile) -> Self {
        let tick_interval = args
            .tick_interval_ms
            .or(file.tick_interval_ms)
            .map_or(DEFAULT_TICK_INTERVAL, Duration::from_millis);

        Self {
            rows: args.rows.or(file.rows).unwrap_or(DEFAULT_ROWS),
            columns: args.cols.or(file.columns).unwrap_or(DEFAULT_COLUMNS),
            seed: args.seed.or(file.seed),
            starting_money: file.starting_money.unwrap_or(economy::STARTING_MONEY),
            tick_interval,
            max_ticks: args.max_ticks.or(file.max_ticks).unwrap_or(DEFAULT_MAX_TICKS),
            realtime: args.realtime,
            plans: [file.faction_one, file.faction_two],
            load: args.load.clone(),
            save: args.save.clone(),
            print_transfer: args.print_transfer,
        }
    }

    /// Layout for a new match: generated when a seed is known, blank otherwise.
    pub(crate) fn layout(&self) -> Result<MapLayout> {
        match self.seed {
            Some(seed) => {
                let config = GenerationConfig::new(seed).with_starting_money(self.starting_money);
                MapGeneration::new(config)
                    .generate(self.rows, self.columns)
                    .context("failed to generate map")
            }
            None => {
                let mut layout = MapLayout::blank(self.rows, self.columns);
                layout.starting_money = self.starting_money;
                Ok(layout)
            }
        }
    }
}
