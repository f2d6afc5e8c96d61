// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! anglecast hub server.
//!
//! # Usage
//!
//! ```bash
//! # Listen on 0.0.0.0:3000
//! anglecast-hub
//!
//! # Custom port, re-broadcast viewer messages verbatim
//! anglecast-hub --port 8080 --echo raw
//! ```

use anglecast_hub::{build_router, AppState, EchoPolicy, HubConfig};
use clap::Parser;
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

/// anglecast hub
#[derive(Parser, Debug)]
#[command(name = "anglecast-hub")]
#[command(about = "anglecast hub - fan out orientation telemetry to WebSocket viewers")]
#[command(version)]
struct Args {
    /// HTTP/WebSocket port
    #[arg(short, long, default_value = "3000")]
    port: u16,

    /// Bind address
    #[arg(short, long, default_value = "0.0.0.0")]
    bind: String,

    /// Maximum concurrent viewer connections
    #[arg(long, default_value = "100")]
    max_clients: usize,

    /// Envelopes buffered per viewer before it is dropped as stalled
    #[arg(long, default_value = "256")]
    queue_depth: usize,

    /// Treatment of messages sent by viewers
    #[arg(long, value_enum, default_value_t = EchoPolicy::Validated)]
    echo: EchoPolicy,

    /// Milliseconds a viewer socket write may block before the viewer is dropped
    #[arg(long, default_value = "5000")]
    send_timeout_ms: u64,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    log_level: String,
}

impl From<Args> for HubConfig {
    fn from(args: Args) -> Self {
        Self {
            bind: args.bind,
            port: args.port,
            max_clients: args.max_clients,
            queue_depth: args.queue_depth,
            echo: args.echo,
            send_timeout_ms: args.send_timeout_ms,
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    // Setup logging
    let filter = EnvFilter::try_new(&args.log_level).unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    let config = HubConfig::from(args);
    config.validate()?;

    let addr = config.listen_addr();
    info!("anglecast hub v{}", env!("CARGO_PKG_VERSION"));
    info!("Viewer page: http://{}/", addr);
    info!("WebSocket endpoint: ws://{}/ws", addr);
    info!("REST API: POST http://{}/api/angles", addr);
    info!("Health check: GET http://{}/health", addr);
    info!("Viewer echo: {:?}", config.echo);

    let state = Arc::new(AppState::new(config));
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Hub stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Cannot listen for Ctrl+C: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutting down...");
}
