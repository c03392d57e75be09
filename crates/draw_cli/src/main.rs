//! CLI driver for the draw engine.
//!
//! Owns everything the engine leaves to its driver: stepping the state
//! machine, session retries on infeasible dead-ends, and rendering progress
//! and results.

use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::warn;
use tracing_subscriber::EnvFilter;

use draw_core::{DrawConfig, DrawEngine, DrawError, DrawState, StepResult};

#[derive(Parser)]
#[command(name = "draw_cli")]
#[command(about = "Run a pot-based tournament draw", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a full draw session to completion
    Run {
        /// RNG seed; identical seeds replay identical draws
        #[arg(long, default_value = "0")]
        seed: u64,

        /// Sessions to attempt (seed, seed+1, ...) before giving up;
        /// a greedy draw can dead-end and needs a fresh session to retry
        #[arg(long, default_value = "100")]
        attempts: u64,

        /// Pot configuration JSON ({"pots": [["A", "B"], ...]});
        /// defaults to the 36-club Champions League preset
        #[arg(long)]
        config: Option<PathBuf>,

        /// Write the final results as JSON
        #[arg(long)]
        json: Option<PathBuf>,

        /// Narrate every engine transition
        #[arg(long, default_value = "false")]
        show_steps: bool,
    },

    /// Print the pot configuration without drawing
    Pots {
        /// Pot configuration JSON; defaults to the Champions League preset
        #[arg(long)]
        config: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .init();

    match Cli::parse().command {
        Commands::Run { seed, attempts, config, json, show_steps } => {
            run(seed, attempts, config, json, show_steps)
        }
        Commands::Pots { config } => {
            let config = load_config(config)?;
            for (pot, names) in config.pots.iter().enumerate() {
                println!("Pot {}: {}", pot + 1, names.join(", "));
            }
            Ok(())
        }
    }
}

fn load_config(path: Option<PathBuf>) -> Result<DrawConfig> {
    match path {
        Some(path) => {
            let raw = fs::read_to_string(&path)
                .with_context(|| format!("reading config {}", path.display()))?;
            Ok(DrawConfig::from_json(&raw)?)
        }
        None => Ok(DrawConfig::champions_league()),
    }
}

fn run(
    seed: u64,
    attempts: u64,
    config: Option<PathBuf>,
    json: Option<PathBuf>,
    show_steps: bool,
) -> Result<()> {
    let config = load_config(config)?;
    let mut engine = DrawEngine::new(&config, seed)?;

    let mut completed = false;
    for attempt in 0..attempts.max(1) {
        engine.start_draw_with_seed(seed + attempt);
        match drive_session(&mut engine, show_steps) {
            Ok(()) => {
                completed = true;
                break;
            }
            Err(err @ DrawError::InsufficientAdmissibleOpponents { .. }) => {
                warn!(seed = engine.seed(), %err, "session dead-ended, retrying");
            }
            Err(err) => return Err(err.into()),
        }
    }
    if !completed {
        anyhow::bail!("no completing draw in {attempts} session(s) starting at seed {seed}");
    }

    println!("Draw complete (seed {}).", engine.seed());
    print_progress(&engine);
    print_results(&engine);

    if let Some(path) = json {
        let view = engine.results_view();
        fs::write(&path, serde_json::to_string_pretty(&view)?)
            .with_context(|| format!("writing results {}", path.display()))?;
        println!("Results written to {}", path.display());
    }
    Ok(())
}

/// Step one session to completion, narrating transitions when asked.
fn drive_session(engine: &mut DrawEngine, show_steps: bool) -> Result<(), DrawError> {
    let mut pot = engine.current_pot();
    while !engine.is_complete() {
        let result = engine.step()?;
        if show_steps {
            narrate(engine, &result, &mut pot);
        }
    }
    Ok(())
}

fn narrate(engine: &DrawEngine, result: &StepResult, last_pot: &mut usize) {
    let roster = engine.roster();
    if result.pot != *last_pot {
        println!("-- Pot {} finished, moving to pot {} --", *last_pot + 1, result.pot + 1);
        *last_pot = result.pot;
    }
    match result.state {
        DrawState::ShowOpponents => {
            let team = result.team.expect("drawer in ShowOpponents");
            let admissible = result.admissible.as_ref().expect("snapshot in ShowOpponents");
            let names: Vec<&str> =
                admissible.all().into_iter().map(|id| roster.name(id)).collect();
            println!(
                "Pot {}: drew {} ({} admissible: {})",
                result.pot + 1,
                roster.name(team),
                names.len(),
                names.join(", ")
            );
        }
        DrawState::DrawOpponents => {
            if let Some(pairing) = &result.pairing {
                let side = |id: Option<draw_core::TeamId>| {
                    id.map(|id| roster.name(id)).unwrap_or("-")
                };
                println!("  -> home {}, away {}", side(pairing.home), side(pairing.away));
            }
        }
        DrawState::Complete => println!("-- Draw complete --"),
        DrawState::SelectTeam => {}
    }
}

fn print_progress(engine: &DrawEngine) {
    let progress = engine.progress();
    let roster = engine.roster();
    for (pot, done) in progress.iter().enumerate() {
        println!("Pot {}: {}/{}", pot + 1, done, roster.pot_members(pot).len());
    }
}

fn print_results(engine: &DrawEngine) {
    let view = engine.results_view();
    let mut current_pot = 0;
    for row in &view {
        if row.pot != current_pot {
            current_pot = row.pot;
            println!("\n== Pot {} ==", current_pot);
        }
        let fixtures: Vec<String> = row
            .slots
            .iter()
            .enumerate()
            .map(|(pot, slot)| {
                format!(
                    "P{} H:{} A:{}",
                    pot + 1,
                    slot.home.as_deref().unwrap_or("-"),
                    slot.away.as_deref().unwrap_or("-")
                )
            })
            .collect();
        println!("{:<20} | {}", row.team, fixtures.join(" | "));
    }
}
