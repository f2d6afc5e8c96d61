// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! anglecast bridge CLI
//!
//! Relays inclinometer lines from a serial device to the anglecast hub.
//!
//! # Usage
//!
//! ```bash
//! # Linux / macOS / Windows
//! anglecast-bridge /dev/ttyACM0 9600
//! anglecast-bridge /dev/tty.usbmodem11 9600
//! anglecast-bridge COM3 9600
//!
//! # List serial ports
//! anglecast-bridge --list
//!
//! # Remote hub, config file
//! anglecast-bridge --hub http://hub.local:3000
//! anglecast-bridge --config bridge.toml
//! ```

use anglecast_bridge::{
    list_ports, ports, spawn_reader, BridgeConfig, ConfigError, LineIngestor, Relay,
    RelayOutcome, SessionStats, SessionStatsSnapshot, UplinkTransmitter, LINE_CHANNEL_CAPACITY,
};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

/// anglecast serial bridge
#[derive(Parser, Debug)]
#[command(name = "anglecast-bridge")]
#[command(about = "Relay serial inclinometer data to the anglecast hub")]
#[command(version)]
struct Args {
    /// Serial device path [default: /dev/ttyACM0]
    port: Option<String>,

    /// Baud rate [default: 9600]
    baud: Option<u32>,

    /// Hub base URL [default: http://localhost:3000]
    #[arg(long)]
    hub: Option<String>,

    /// Configuration file path
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// List available serial ports and exit
    #[arg(short, long)]
    list: bool,

    /// Log the 1st and every Nth consecutive hub failure [default: 10]
    #[arg(long)]
    failure_log_every: Option<u32>,

    /// Per-request timeout for hub pushes, in milliseconds [default: 5000]
    #[arg(long)]
    timeout_ms: Option<u64>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Generate example configuration file
    GenConfig {
        /// Output file path
        #[arg(short, long, default_value = "bridge.toml")]
        output: PathBuf,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();

    if let Some(Commands::GenConfig { output }) = &args.command {
        return match cmd_gen_config(output) {
            Ok(()) => ExitCode::SUCCESS,
            Err(e) => {
                eprintln!("Failed to write {}: {}", output.display(), e);
                ExitCode::FAILURE
            }
        };
    }

    let config = match build_config(&args) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Configuration invalid: {}", e);
            return ExitCode::FAILURE;
        }
    };

    // Initialize logging
    let filter = EnvFilter::try_new(&config.log_level).unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    if args.list {
        return cmd_list(config.baud_rate);
    }

    run(config).await
}

async fn run(config: BridgeConfig) -> ExitCode {
    println!("anglecast bridge v{}", env!("CARGO_PKG_VERSION"));
    println!("=====================================");
    println!("  Port:      {}", config.port);
    println!("  Baud Rate: {}", config.baud_rate);
    println!("  Hub:       {}", config.ingest_url());
    println!();

    let stats = Arc::new(SessionStats::new());
    let uplink = match UplinkTransmitter::new(&config, stats.clone()) {
        Ok(uplink) => uplink,
        Err(e) => {
            error!("HTTP client setup failed: {}", e);
            return ExitCode::FAILURE;
        }
    };

    info!("Checking hub connectivity...");
    uplink.probe_health().await;

    info!(
        "Connecting to {} @ {} baud...",
        config.port, config.baud_rate
    );
    let lines = match LineIngestor::open(&config.port, config.baud_rate, config.read_timeout())
        .and_then(|ingestor| spawn_reader(ingestor, LINE_CHANNEL_CAPACITY))
    {
        Ok(lines) => lines,
        Err(e) => {
            error!("{}", e);
            print_troubleshooting(&config.port);
            return ExitCode::FAILURE;
        }
    };

    info!("Waiting for data from the device...");
    println!("Press Ctrl+C to stop...");
    println!();

    let mut relay = Relay::new(uplink, config.status_interval());

    tokio::select! {
        outcome = relay.run(lines) => match outcome {
            Ok(RelayOutcome::TransportClosed(snapshot)) => {
                print_stats(&snapshot);
                ExitCode::SUCCESS
            }
            Err(e) => {
                error!("{}", e);
                print_troubleshooting(&config.port);
                ExitCode::FAILURE
            }
        },
        interrupted = tokio::signal::ctrl_c() => {
            if let Err(e) = interrupted {
                error!("Failed to listen for Ctrl+C: {}", e);
            }
            println!();
            println!("Shutting down...");
            print_stats(&stats.snapshot());
            ExitCode::SUCCESS
        }
    }
}

/// File values first, then command-line overrides.
fn build_config(args: &Args) -> Result<BridgeConfig, ConfigError> {
    let mut config = match &args.config {
        Some(path) => BridgeConfig::from_file(path)?,
        None => BridgeConfig::default(),
    };

    if let Some(port) = &args.port {
        config.port = port.clone();
    }
    if let Some(baud) = args.baud {
        config.baud_rate = baud;
    }
    if let Some(hub) = &args.hub {
        config.hub_url = hub.clone();
    }
    if let Some(every) = args.failure_log_every {
        config.failure_log_every = every;
    }
    if let Some(timeout_ms) = args.timeout_ms {
        config.request_timeout_ms = timeout_ms;
    }
    if let Some(level) = &args.log_level {
        config.log_level = level.clone();
    }

    config.validate()?;
    Ok(config)
}

fn cmd_list(baud: u32) -> ExitCode {
    match list_ports() {
        Ok(found) => {
            ports::print_ports(&found, baud);
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("Error listing ports: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn cmd_gen_config(output: &Path) -> Result<(), ConfigError> {
    let toml_str = BridgeConfig::default().to_toml()?;

    let content = format!(
        r#"# anglecast bridge configuration
# Generated by anglecast-bridge gen-config
# Command-line flags override these values.

{}"#,
        toml_str
    );

    std::fs::write(output, content)?;
    println!("Generated configuration file: {}", output.display());
    Ok(())
}

fn print_troubleshooting(port: &str) {
    eprintln!();
    eprintln!("Troubleshooting:");
    eprintln!("  1. Check that the device is connected to USB");
    eprintln!("  2. Verify the port name: {}", port);
    eprintln!("  3. Make sure no other application is using this port");
    eprintln!("  4. List available ports: anglecast-bridge --list");
    eprintln!();
}

fn print_stats(stats: &SessionStatsSnapshot) {
    println!();
    println!("Statistics:");
    println!("  Total Packets Relayed: {}", stats.relayed);
    println!("  Errors:                {}", stats.failures);
    println!("  Lines Rejected:        {}", stats.decode_rejected);
    println!(
        "  Rate:                  {:.1} packets/s",
        stats.packets_per_second()
    );
}
