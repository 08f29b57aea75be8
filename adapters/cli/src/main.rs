#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Command-line adapter that plays scripted Tower Duel matches headlessly.

mod config;
mod runner;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tower_duel_core::{Faction, Outcome, Phase, MAX_GRID_DIMENSION};
use tower_duel_persistence::{transfer, FilePersistence, Persistence};
use tower_duel_world::query;
use tracing_subscriber::EnvFilter;

use crate::{config::Settings, runner::Runner};

#[derive(Parser, Debug)]
#[command(name = "tower-duel")]
#[command(about = "Plays a scripted two-player Tower Duel match")]
struct Args {
    /// TOML match file with map settings and scripted plans
    #[arg(long)]
    config: Option<PathBuf>,

    /// Seed for a randomly generated map; a blank map is used when omitted
    #[arg(long)]
    seed: Option<u64>,

    /// Number of grid rows
    #[arg(long, value_parser = grid_side())]
    rows: Option<u32>,

    /// Number of grid columns
    #[arg(long, value_parser = grid_side())]
    cols: Option<u32>,

    /// Combat ticks to run before giving up
    #[arg(long)]
    max_ticks: Option<u64>,

    /// Write the final match state to this JSON file
    #[arg(long)]
    save: Option<PathBuf>,

    /// Resume from a JSON save file instead of starting a new match
    #[arg(long)]
    load: Option<PathBuf>,

    /// Milliseconds between combat ticks
    #[arg(long)]
    tick_interval_ms: Option<u64>,

    /// Sleep for the tick interval between combat ticks
    #[arg(long)]
    realtime: bool,

    /// Print the final match state as a single-line transfer string
    #[arg(long)]
    print_transfer: bool,
}

fn grid_side() -> clap::builder::RangedI64ValueParser<u32> {
    clap::value_parser!(u32).range(1..=i64::from(MAX_GRID_DIMENSION))
}

/// Entry point for the Tower Duel command-line interface.
fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();
    let settings = Settings::resolve(&args)?;
    let mut runner = Runner::new(&settings)?;
    let summary = runner.run(settings.max_ticks)?;

    let verdict = match summary.phase {
        Phase::GameOver(Outcome::Winner(Faction::One)) => "faction one wins",
        Phase::GameOver(Outcome::Winner(Faction::Two)) => "faction two wins",
        Phase::GameOver(Outcome::Draw) => "draw",
        Phase::Build(_) | Phase::Simulation => "unfinished",
    };
    println!(
        "{verdict} after {} ticks in round {}: castles {}/{}, money {}/{}",
        summary.ticks,
        summary.round,
        summary.hitpoints[0],
        summary.hitpoints[1],
        summary.money[0],
        summary.money[1],
    );

    let snapshot = query::snapshot(runner.world());
    if let Some(path) = &settings.save {
        FilePersistence::pretty()
            .save(path, &snapshot)
            .with_context(|| format!("failed to write save file {}", path.display()))?;
        tracing::info!(path = %path.display(), "match saved");
    }
    if settings.print_transfer {
        println!("{}", transfer::encode(&snapshot).context("failed to encode match")?);
    }
    Ok(())
}
