//! CLI entry point for vibenode.
//!
//! Runs the acquisition → analysis → publish pipeline against mock hardware
//! and a simulated broker link, so the full node can be exercised on a
//! development machine. Real deployments swap in a concrete `Accelerometer`
//! and `BrokerLink` at the two wiring points in `run_node`.
//!
//! # Usage
//!
//! Run the node:
//! ```bash
//! vibenode run --config config/config.toml
//! ```
//!
//! Validate a configuration file:
//! ```bash
//! vibenode check-config --config config/config.toml
//! ```

use anyhow::{anyhow, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use vibenode::acquisition::AcquisitionScheduler;
use vibenode::config::NodeConfig;
use vibenode::dsp::{RmsMode, SignalProcessor};
use vibenode::hardware::MockAccelerometer;
use vibenode::net::{ConnectivityManager, SimulatedLink};
use vibenode::orchestrator::Orchestrator;
use vibenode::publish::TelemetryPublisher;
use vibenode::source::VibrationSource;
use vibenode::trace;

#[derive(Parser)]
#[command(name = "vibenode")]
#[command(about = "Vibration telemetry node", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the telemetry pipeline
    Run {
        /// Path to the configuration file
        #[arg(long, default_value = "config/config.toml")]
        config: PathBuf,
    },

    /// Load and validate a configuration file, then exit
    CheckConfig {
        /// Path to the configuration file
        #[arg(long, default_value = "config/config.toml")]
        config: PathBuf,
    },
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Run { config } => run_node(config).await,
        Commands::CheckConfig { config } => check_config(config),
    }
}

fn load_config(path: &PathBuf) -> Result<NodeConfig> {
    let config = NodeConfig::load_from(path)?;
    config.validate().map_err(|e| anyhow!(e))?;
    Ok(config)
}

fn check_config(path: PathBuf) -> Result<()> {
    let config = load_config(&path)?;
    println!("✅ {} is valid", path.display());
    println!("   device: {}", config.node.device_id);
    println!(
        "   window: {} samples @ {} Hz target",
        config.acquisition.sample_count, config.acquisition.target_rate_hz
    );
    Ok(())
}

async fn run_node(path: PathBuf) -> Result<()> {
    let config = load_config(&path)?;
    trace::init_from_config(&config).map_err(|e| anyhow!(e))?;

    println!("🚀 vibenode - vibration telemetry node");
    println!("   device: {}", config.node.device_id);
    println!(
        "   broker: {}:{} (simulated link)",
        config.broker.host, config.broker.port
    );
    println!();

    // Wiring point 1: the accelerometer driver
    let sensor = MockAccelerometer::new(config.acquisition.target_rate_hz).with_noise(0.02);
    let scheduler = AcquisitionScheduler::new(
        sensor,
        config.acquisition.sample_count,
        config.inter_sample_pause(),
    );
    let processor = SignalProcessor::new(config.acquisition.sample_count, RmsMode::Raw);
    let source = VibrationSource::new(scheduler, processor);

    // Wiring point 2: the transport
    let link = SimulatedLink::new().with_flaky_startup(1, 1);
    let connectivity = ConnectivityManager::new(link, &config);

    let publisher = TelemetryPublisher::new(&config.node.device_id, config.publish.min_interval);

    let mut orchestrator =
        Orchestrator::new(connectivity, source, publisher, config.node.cycle_pause);
    orchestrator.run().await?;
    Ok(())
}
