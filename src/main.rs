//! edge-dispatch server.
//!
//! ```text
//!     Client Request
//!     ───────────────▶ axum listener ──▶ request id / trace / timeout
//!                                              │
//!                                              ▼
//!                                      SharedRouter snapshot
//!                                              │  first match in
//!                                              │  registration order
//!                                              ▼
//!                          ┌──────────┬──────────┬──────────┬──────────┐
//!                          │   json   │   ping   │ redirect │ forward  │──▶ upstream
//!                          └──────────┴──────────┴──────────┴──────────┘
//!                                              │
//!     Client Response                          ▼
//!     ◀─────────────── Response (or JSON 404 / 500)
//!
//!     config file ──notify──▶ reload ──▶ rebuild table ──▶ atomic swap
//! ```

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use tokio::net::TcpListener;
use tokio::sync::mpsc;

use edge_dispatch::config::{load_config, ConfigWatcher, DispatchConfig};
use edge_dispatch::lifecycle::{signals, Shutdown};
use edge_dispatch::observability::{logging, metrics};
use edge_dispatch::HttpServer;

#[derive(Parser)]
#[command(name = "edge-dispatch", version, about = "Minimal HTTP route dispatcher")]
struct Args {
    /// Path to the TOML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Reload the route table when the config file changes.
    #[arg(long)]
    watch: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => load_config(path)?,
        None => DispatchConfig::default(),
    };

    logging::init_logging(&config.observability)?;
    tracing::info!("edge-dispatch v{} starting", env!("CARGO_PKG_VERSION"));

    tracing::info!(
        bind_address = %config.listener.bind_address,
        environment = %config.environment.name,
        routes = config.routes.len(),
        request_timeout_secs = config.timeouts.request_secs,
        "Configuration loaded"
    );
    if config.routes.is_empty() {
        tracing::warn!("No routes configured; every request will get a 404");
    }

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let (_watcher, config_updates) = match (&args.config, args.watch) {
        (Some(path), true) => {
            let (watcher, updates) = ConfigWatcher::new(path);
            (Some(watcher.run()?), updates)
        }
        _ => {
            let (_, updates) = mpsc::unbounded_channel();
            (None, updates)
        }
    };

    let shutdown = Arc::new(Shutdown::new());
    let server_shutdown = shutdown.subscribe();
    let signal_shutdown = shutdown.clone();
    tokio::spawn(async move { signals::trigger_on_signal(&signal_shutdown).await });

    let server = HttpServer::new(config)?;
    server.run(listener, config_updates, server_shutdown).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
