use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use tracing::{debug, info, warn};

use common::config::SimConfig;
use sim::{
    config::{init_tracing, load_config},
    exit_autopilot,
    simulation::{Outcome, Simulation},
    systems::enemies::AiState,
};

// ============================================================================
// CLI Argument Parsing
// ============================================================================

#[derive(Parser)]
#[command(author, version, about = "Headless maze horror simulation", long_about = None)]
struct Args {
    /// JSON config file; missing fields keep their defaults
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Random seed for maze generation and spawning
    #[arg(long)]
    seed: Option<u64>,

    /// Maze width in cells
    #[arg(long)]
    width: Option<usize>,

    /// Maze height in cells
    #[arg(long)]
    height: Option<usize>,

    /// Number of enemies to place
    #[arg(long)]
    enemies: Option<usize>,

    /// Maximum number of ticks to run
    #[arg(long, default_value_t = 3000)]
    ticks: u64,

    /// Seconds per tick
    #[arg(long, default_value_t = 0.05)]
    dt: f32,

    /// Log filter, e.g. "info" or "sim=debug"
    #[arg(long)]
    log_filter: Option<String>,
}

fn build_config(args: &Args) -> Result<SimConfig> {
    let mut config = match &args.config {
        Some(path) => load_config(path)?,
        None => SimConfig::default(),
    };
    if let Some(seed) = args.seed {
        config.seed = seed;
    }
    if let Some(width) = args.width {
        config.maze.width = width;
    }
    if let Some(height) = args.height {
        config.maze.height = height;
    }
    if let Some(enemies) = args.enemies {
        config.spawn.num_enemies = enemies;
    }
    Ok(config)
}

// ============================================================================
// Main
// ============================================================================

fn main() -> Result<()> {
    let args = Args::parse();
    init_tracing(args.log_filter.as_deref());

    let config = build_config(&args)?;
    info!("seed {}, {}x{} maze", config.seed, config.maze.width, config.maze.height);

    let mut sim = Simulation::new(config);
    if !sim.shortfall().is_empty() {
        warn!("level is missing entities: {:?}", sim.shortfall());
    }

    let dt = if args.dt > 0.0 {
        args.dt
    } else {
        warn!("dt {} must be positive, using 0.05", args.dt);
        0.05
    };

    let mut event_count = 0usize;
    while sim.tick_count() < args.ticks && !sim.is_finished() {
        let command = exit_autopilot(&sim, dt);
        for event in sim.tick(dt, &command) {
            event_count += 1;
            if event.is_terminal() {
                info!("tick {}: {event}", sim.tick_count());
            } else {
                debug!("tick {}: {event}", sim.tick_count());
            }
        }
    }

    let player = sim.player();
    let chasing = sim
        .enemies()
        .iter()
        .filter(|enemy| enemy.state() == AiState::Chasing)
        .count();
    let outcome = match sim.outcome() {
        Some(Outcome::Escaped) => "escaped",
        Some(Outcome::Died) => "died",
        None => "time ran out",
    };

    println!("outcome:      {outcome}");
    println!("ticks:        {} ({:.1}s simulated)", sim.tick_count(), sim.elapsed());
    println!("events:       {event_count}");
    println!("health:       {}", player.health);
    println!("battery:      {:.1}", player.battery);
    println!("enemies:      {} ({chasing} chasing)", sim.enemies().len());
    println!("pickups left: {}", sim.pickups().len());
    Ok(())
}
