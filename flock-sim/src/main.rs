use std::io::{self, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use flock_shared::Scenario;
use flock_sim::{load_scenario, scenario::validate_scenario, Simulation};

#[derive(Parser, Debug)]
#[command(author, version, about = "Headless boid flock simulation", long_about = None)]
struct Args {
    /// Scenario JSON file (settings, obstacles, timed events). Built-in defaults when omitted
    #[arg(short, long)]
    scenario: Option<PathBuf>,

    /// Number of ticks to run (overrides the scenario)
    #[arg(short, long)]
    ticks: Option<u64>,

    /// Initial boid count (overrides the scenario)
    #[arg(short, long)]
    boids: Option<usize>,

    /// Seconds per tick (overrides the scenario)
    #[arg(long)]
    dt: Option<f32>,

    /// Random seed (overrides the scenario)
    #[arg(long)]
    seed: Option<u64>,

    /// Print a JSON status line every N ticks
    #[arg(long, default_value_t = 60)]
    status_every: u64,

    /// Compute accelerations on a background worker thread
    #[arg(short, long)]
    pipelined: bool,

    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,
}

fn build_scenario(args: &Args) -> Result<Scenario> {
    let mut scenario = match &args.scenario {
        Some(path) => load_scenario(path)?,
        None => Scenario::default(),
    };

    if let Some(ticks) = args.ticks {
        scenario.ticks = ticks;
    }
    if let Some(boids) = args.boids {
        scenario.initial_count = boids;
    }
    if let Some(dt) = args.dt {
        scenario.dt = dt;
    }
    if let Some(seed) = args.seed {
        scenario.seed = seed;
    }

    validate_scenario(&scenario).context("Invalid command line overrides")?;
    Ok(scenario)
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    if args.debug {
        env_logger::Builder::from_default_env()
            .filter_level(log::LevelFilter::Debug)
            .init();
    } else {
        env_logger::Builder::from_default_env()
            .filter_level(log::LevelFilter::Info)
            .init();
    }

    log::info!("Flock simulation starting...");
    if let Some(path) = &args.scenario {
        log::info!("Scenario: {}", path.display());
    }

    let scenario = build_scenario(&args)?;
    let ticks = scenario.ticks;
    let mut simulation =
        Simulation::new(scenario, args.pipelined).context("Failed to initialize simulation")?;

    let stdout = io::stdout();
    let mut out = stdout.lock();
    simulation
        .run(ticks, args.status_every, |status| {
            let line = serde_json::to_string(status).context("Failed to encode status")?;
            writeln!(out, "{}", line).context("Failed to write status")?;
            Ok(())
        })
        .context("Simulation error")?;

    let remaining = simulation.shutdown();
    log::debug!("{} entities left after shutdown", remaining.live_count());

    Ok(())
}
