//! Vanguard - Headless Combat Simulation
//!
//! Runs the combat core against a line of enemies and logs the totals.
//!
//! Usage: `vanguard-sim [config.toml]`

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(clippy::unwrap_used)]

mod config;
mod sim;

use anyhow::Result;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use config::{SimConfig, CONFIG_FILE};
use sim::{load_gameplay, Simulation};

fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::from_default_env().add_directive("vanguard=info".parse()?))
        .init();

    info!("Vanguard simulation starting...");
    info!("Version: {}", env!("CARGO_PKG_VERSION"));

    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| CONFIG_FILE.to_string());
    let config = SimConfig::load_from(&config_path);
    info!(
        "Running {} frames ({:.1}s) against {} enemies",
        config.frames,
        config.duration(),
        config.enemy_count
    );

    let gameplay = load_gameplay(&config);
    let mut simulation = Simulation::new(config, &gameplay);
    let summary = simulation.run();

    info!("Summary: {summary}");
    info!("Stats: {}", summary.stats_line);
    info!(
        "Player health {:.1} with {} item kinds",
        simulation.player().health(),
        simulation.inventory().items().len()
    );
    Ok(())
}
