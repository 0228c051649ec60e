//! Edge API gateway.
//!
//! # Architecture Overview
//!
//! ```text
//!                         ┌───────────────────────────────────────────────────┐
//!                         │                    EDGE GATEWAY                   │
//!                         │                                                   │
//!     Client Request      │  ┌──────────┐   ┌────────────┐   ┌────────────┐   │
//!     ────────────────────┼─▶│  http    │──▶│ dispatcher │──▶│  routing   │   │
//!                         │  │  server  │   │            │   │   table    │   │
//!                         │  └──────────┘   └─────┬──────┘   └────────────┘   │
//!                         │                       │                           │
//!                         │                       ▼ pipeline                  │
//!                         │   ┌───────────┐  ┌───────────┐  ┌───────────┐     │
//!                         │   │ admission │─▶│   cache   │─▶│  forward  │─────┼──▶ Backend
//!                         │   │ (limiter) │  │ (TTL)     │  │ (pooled)  │◀────┼─── Service
//!                         │   └─────┬─────┘  └─────┬─────┘  └───────────┘     │
//!                         │         ▼              ▼                          │
//!                         │   ┌─────────────────────────┐                     │
//!                         │   │  store (memory | redis) │                     │
//!                         │   └─────────────────────────┘                     │
//!                         └───────────────────────────────────────────────────┘
//! ```

use std::net::SocketAddr;
use std::path::PathBuf;

use clap::Parser;
use tokio::net::TcpListener;

use edge_gateway::config::{load_config, validate_config, ConfigError, GatewayConfig};
use edge_gateway::lifecycle::signals::spawn_signal_handler;
use edge_gateway::lifecycle::StartupError;
use edge_gateway::observability::{logging, metrics};
use edge_gateway::{HttpServer, Shutdown};

#[derive(Parser, Debug)]
#[command(name = "edge-gateway")]
#[command(about = "API gateway with rate limiting and response caching", long_about = None)]
struct Args {
    /// Path to a TOML config file. Defaults apply when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Log level override (trace, debug, info, warn, error).
    #[arg(short, long)]
    log_level: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => load_config(path)?,
        None => {
            let config = GatewayConfig::default();
            validate_config(&config).map_err(ConfigError::Validation)?;
            config
        }
    };

    let level = args
        .log_level
        .as_deref()
        .unwrap_or(&config.observability.log_level);
    logging::init_logging(level);

    tracing::info!(version = env!("CARGO_PKG_VERSION"), "edge-gateway starting");
    tracing::info!(
        bind_address = %config.listener.bind_address,
        services = config.services.len(),
        store = ?config.store.backend,
        rate_limit = config.rate_limit.enabled,
        cache = config.cache.enabled,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse::<SocketAddr>() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let address: SocketAddr =
        config
            .listener
            .bind_address
            .parse()
            .map_err(|_| StartupError::Address {
                address: config.listener.bind_address.clone(),
            })?;
    let listener = TcpListener::bind(address)
        .await
        .map_err(|source| StartupError::Bind { address, source })?;

    let shutdown = Shutdown::new();
    let server = HttpServer::new(config)?;
    let shutdown_rx = shutdown.subscribe();
    spawn_signal_handler(shutdown);

    server.run(listener, shutdown_rx).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
