//! Taxon Home web-service daemon.
//!
//! # Architecture Overview
//!
//! ```text
//!     Client Request
//!     ──────────────▶ http (router, request id, trace, timeout, body limit)
//!                        │
//!                        ▼
//!                     webservice (verb dispatch, field limit, result envelope)
//!                        │
//!          ┌─────────────┼──────────────┐
//!          ▼             ▼              ▼
//!      genelinks      search     searchHistory
//!          │             │              │
//!          └─────────────┴──────────────┘
//!                        ▼
//!                      store (tables, transactions, JSON snapshot)
//! ```

use std::path::PathBuf;

use clap::Parser;

use taxon_home::config::{load_config, AppConfig};
use taxon_home::lifecycle::{signals, startup, Shutdown};
use taxon_home::observability::logging;

#[derive(Parser)]
#[command(name = "taxon-home")]
#[command(about = "Gene-link and image search web services", long_about = None)]
struct Cli {
    /// Path to a TOML config file; built-in defaults are used when absent.
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => load_config(path)?,
        None => AppConfig::default(),
    };

    logging::init_logging(&config.observability);
    tracing::info!(version = env!("CARGO_PKG_VERSION"), "taxon-home starting");
    tracing::info!(
        bind_address = %config.listener.bind_address,
        request_timeout_secs = config.timeouts.request_secs,
        snapshot = ?config.store.snapshot_path,
        admin_enabled = config.admin.enabled,
        "Configuration loaded"
    );

    let shutdown = Shutdown::new();
    signals::spawn_signal_listener(shutdown.clone());

    startup::run(config, shutdown).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
