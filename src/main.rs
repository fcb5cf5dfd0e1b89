//! Gym API gateway.
//!
//! # Architecture Overview
//!
//! ```text
//!                  ┌──────────────────────────────────────────────────┐
//!                  │                    GATEWAY                        │
//!   Client         │  ┌──────────┐   ┌───────────┐   ┌─────────────┐  │
//!   ───────────────┼─▶│  authn   │──▶│   relay   │──▶│  handlers   │  │
//!   Bearer token   │  │ (JWT)    │   │ X-User-*  │   │             │  │
//!                  │  └──────────┘   └───────────┘   └──────┬──────┘  │
//!                  │                                        │         │
//!                  │                              ┌─────────▼───────┐ │
//!                  │                              │  aggregation    │ │──▶ member-service
//!                  │                              │  engine (join!) │ │──▶ class-service
//!                  │                              └─────────────────┘ │──▶ payment-service
//!                  │  ┌────────┐ ┌───────────┐ ┌──────────────────┐   │
//!                  │  │ config │ │ discovery │ │  observability   │   │
//!                  │  └────────┘ └───────────┘ └──────────────────┘   │
//!                  └──────────────────────────────────────────────────┘
//! ```

use std::path::PathBuf;
use clap::Parser;
use tokio::net::TcpListener;
use tokio::sync::mpsc;

use gym_gateway::config::{load_config, validated, watcher::ConfigWatcher, GatewayConfig};
use gym_gateway::http::HttpServer;
use gym_gateway::lifecycle::{spawn_signal_handler, Shutdown};
use gym_gateway::observability::{logging, metrics};

#[derive(Parser)]
#[command(name = "gym-gateway")]
#[command(about = "API gateway with identity relay and member aggregation", long_about = None)]
struct Args {
    /// Path to the TOML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => load_config(path)?,
        None => validated(GatewayConfig::default())?,
    };

    logging::init_logging(&config.observability);
    tracing::info!(version = env!("CARGO_PKG_VERSION"), "gym-gateway starting");
    tracing::info!(
        bind_address = %config.listener.bind_address,
        services = config.services.len(),
        request_timeout_secs = config.timeouts.request_secs,
        downstream_timeout_secs = config.downstream.timeout_secs,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    // The watcher must outlive the server; dropping it stops notifications.
    let (_watcher, config_updates) = match &args.config {
        Some(path) => {
            let (watcher, updates) = ConfigWatcher::new(path);
            (Some(watcher.run()?), updates)
        }
        None => {
            let (_, updates) = mpsc::unbounded_channel();
            (None, updates)
        }
    };

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let shutdown = Shutdown::new();
    spawn_signal_handler(shutdown.clone());

    let server = HttpServer::new(config)?;
    server.run(listener, config_updates, shutdown.subscribe()).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
