//! # Rig HAL Binary
//!
//! Streams servo angles to one board and reads distances from another, once
//! per frame.
//!
//! # Usage
//!
//! ```bash
//! # Run against hardware
//! rig_hal --config config/rig.toml
//!
//! # Run without hardware (simulated boards)
//! rig_hal --config config/rig.toml --simulate
//!
//! # Only the distance reader, 600 frames, verbose
//! rig_hal --config config/rig.toml --component distance --frames 600 -v
//!
//! # Show serial devices
//! rig_hal --list-ports
//! ```

#![deny(warnings)]

use clap::Parser;
use rig_common::config::{ConfigLoader, LogLevel};
use rig_common::rig::config::RigConfig;
use rig_common::serial::LinkOpener;
use rig_hal::ComponentRegistry;
use rig_hal::core::RigCore;
use rig_hal::input;
use rig_hal::transport::{PortOpener, SimulatedOpener, list_ports};
use std::path::PathBuf;
use std::sync::atomic::Ordering;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

/// Rig HAL - serial servo driver and distance reader
#[derive(Parser, Debug)]
#[command(name = "rig_hal")]
#[command(author = "RTS007")]
#[command(version)]
#[command(about = "Serial servo driver and distance reader driven by a frame loop")]
#[command(long_about = None)]
struct Args {
    /// Path to the rig configuration file.
    #[arg(short, long, default_value = rig_common::consts::DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    /// Back every port with a simulated board instead of real hardware
    #[arg(short = 's', long)]
    simulate: bool,

    /// Run only these components (can be specified multiple times).
    /// Defaults to every component with a config section.
    #[arg(long = "component", action = clap::ArgAction::Append)]
    components: Vec<String>,

    /// Stop after this many frames
    #[arg(long)]
    frames: Option<u64>,

    /// List serial devices and exit
    #[arg(long)]
    list_ports: bool,

    /// Enable verbose logging (overrides the configured log level)
    #[arg(short, long)]
    verbose: bool,

    /// Output logs in JSON format
    #[arg(long)]
    json: bool,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    if let Err(e) = run() {
        error!("Rig stopped with error: {}", e);
        eprintln!("rig_hal: {e}");
        std::process::exit(1);
    }
    Ok(())
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    if args.list_ports {
        let ports = list_ports()?;
        if ports.is_empty() {
            println!("No serial ports found");
        }
        for port in ports {
            println!("{port}");
        }
        return Ok(());
    }

    let config = RigConfig::load(&args.config)
        .map_err(|e| format!("{}: {}", args.config.display(), e))?;

    setup_tracing(&args, config.shared.log_level);
    info!("Rig HAL v{} starting...", env!("CARGO_PKG_VERSION"));
    info!("Loaded configuration from {:?}", args.config);

    let opener: Box<dyn LinkOpener> = if args.simulate {
        info!("Simulation mode enabled");
        Box::new(SimulatedOpener::new(config.simulation.clone()))
    } else {
        Box::new(PortOpener)
    };

    let names: Vec<&str> = if args.components.is_empty() {
        config.enabled_components()
    } else {
        info!("Components from CLI: {:?}", args.components);
        args.components.iter().map(String::as_str).collect()
    };

    let mut pointer = input::from_config(&config);
    let mut core = RigCore::new(config)?;

    let running = core.running_flag();
    ctrlc::set_handler(move || {
        info!("Received shutdown signal");
        running.store(false, Ordering::SeqCst);
    })?;

    // A failed init has already run the shutdown sequence.
    core.init(&ComponentRegistry::with_builtin(), &names, opener.as_ref())?;

    let outcome = core.run(pointer.as_mut(), args.frames);
    if let Err(e) = &outcome {
        error!("Frame loop error: {}", e);
    }

    core.shutdown()?;
    info!("Rig HAL shutdown complete");
    outcome.map_err(Into::into)
}

/// Setup tracing subscriber from CLI arguments and the configured level.
fn setup_tracing(args: &Args, configured: LogLevel) {
    let level = if args.verbose {
        LogLevel::Debug
    } else {
        configured
    };

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level.as_directive()));

    if args.json {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}
