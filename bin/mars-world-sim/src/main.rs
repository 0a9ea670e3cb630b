/*
 * Copyright (C) 2023 Asim Ihsan
 * SPDX-License-Identifier: AGPL-3.0-only
 *
 * This program is free software: you can redistribute it and/or modify it under
 * the terms of the GNU Affero General Public License as published by the Free
 * Software Foundation, version 3.
 *
 * This program is distributed in the hope that it will be useful, but WITHOUT ANY
 * WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS FOR A
 * PARTICULAR PURPOSE. See the GNU Affero General Public License for more details.
 *
 * You should have received a copy of the GNU Affero General Public License along
 * with this program. If not, see <https://www.gnu.org/licenses/>
 */

use std::path::PathBuf;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use mars_world::agents::{ReflexCollector, SweepingBurner};
use mars_world::{
    AgentId, BoxedAgent, MarsConfig, MarsEnvironment, Object, SearchPattern, Simulation,
};
use rand::SeedableRng;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

/// Run the burner and the collector on a Mars world until it is clean.
#[derive(Parser, Debug)]
#[command(name = "mars-world-sim")]
#[command(about = "Simulate a burner and a collector cleaning debris off a grid", long_about = None)]
struct Args {
    /// JSON file with a MarsConfig. Flags below override its values.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Seed for placement, coin flips and the collector's wandering
    #[arg(short, long)]
    seed: Option<u64>,

    /// Width and height of the grid
    #[arg(short, long)]
    grid_size: Option<usize>,

    /// Debris placed at the start
    #[arg(short, long)]
    debris: Option<usize>,

    /// Failed picks or burns in a row before the next one always works
    #[arg(short, long)]
    max_errors: Option<u32>,

    /// Sweep pattern (left-right, top-down, zig-zag-left-right, zig-zag-top-down)
    #[arg(short, long)]
    pattern: Option<SearchPattern>,

    /// Maximum time steps
    #[arg(long, default_value = "1000")]
    steps: u32,

    /// Pause after every time step, in milliseconds
    #[arg(long, default_value = "0")]
    delay_ms: u64,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Print the percepts after every time step as JSON lines
    #[arg(long)]
    json: bool,
}

fn load_config(args: &Args) -> anyhow::Result<MarsConfig> {
    let mut config = match &args.config {
        Some(path) => {
            let contents = std::fs::read_to_string(path)
                .with_context(|| format!("failed to read config {}", path.display()))?;
            serde_json::from_str(&contents)
                .with_context(|| format!("failed to parse config {}", path.display()))?
        }
        None => MarsConfig::default(),
    };

    if let Some(seed) = args.seed {
        config.seed = Some(seed);
    }
    if let Some(grid_size) = args.grid_size {
        config.grid_size = grid_size;
    }
    if let Some(debris) = args.debris {
        config.debris_amount = debris;
    }
    if let Some(max_errors) = args.max_errors {
        config.max_errors = max_errors;
    }
    if let Some(pattern) = args.pattern {
        config.search_pattern = pattern;
    }

    // fix the seed up front so the collector can derive its own from it
    if config.seed.is_none() {
        config.seed = Some(rand::random());
    }

    config.validate()?;
    Ok(config)
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let level = if args.verbose { Level::DEBUG } else { Level::INFO };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .context("failed to set tracing subscriber")?;

    let config = load_config(&args)?;
    info!(?config, "starting");
    let seed = config.seed.unwrap_or_default();

    let environment = MarsEnvironment::new(config)?;
    println!("{}", environment.world());

    let collector_rng = rand_pcg::Pcg64::seed_from_u64(seed.wrapping_mul(0x9e3779b97f4a7c15));
    let collector: BoxedAgent<MarsEnvironment> =
        Box::new(ReflexCollector::new(collector_rng, config.grid_size));
    let burner: BoxedAgent<MarsEnvironment> = Box::new(SweepingBurner::new());
    let mut simulation = Simulation::new(
        environment,
        vec![(AgentId::Collector, collector), (AgentId::Burner, burner)],
        args.steps,
    );

    while simulation.step()? {
        if args.json {
            println!(
                "{}",
                serde_json::to_string(&simulation.environment().percepts())?
            );
        }
        if args.delay_ms > 0 {
            std::thread::sleep(Duration::from_millis(args.delay_ms));
        }
    }

    let environment = simulation.environment();
    println!("{}", environment.world());
    println!("steps: {}", simulation.steps_taken());
    println!("burned: {}", environment.burned());
    println!(
        "remaining: {}",
        environment.world().count(Object::Debris)
            + usize::from(environment.world().agent(AgentId::Collector).carrying)
    );
    println!("score: {}", simulation.score());
    Ok(())
}
