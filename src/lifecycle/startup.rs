//! Startup orchestration.
//!
//! # Responsibilities
//! - Open the catalogue store
//! - Start the metrics exporter when enabled
//! - Bind the listener and serve until shutdown
//! - Bound the drain by the configured grace period
//! - Write the catalogue snapshot on the way out
//!
//! # Design Decisions
//! - Fail fast: any startup error is fatal
//! - Listener binds last (traffic only when ready)

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tokio::net::TcpListener;

use crate::config::AppConfig;
use crate::http::HttpServer;
use crate::lifecycle::shutdown::Shutdown;
use crate::observability::metrics;
use crate::store::{Store, StoreError};

/// Errors that abort startup.
#[derive(Debug, Error)]
pub enum StartupError {
    #[error("failed to open store: {0}")]
    Store(#[from] StoreError),

    #[error("failed to bind {address}: {source}")]
    Bind {
        address: String,
        #[source]
        source: std::io::Error,
    },

    #[error("server error: {0}")]
    Serve(#[source] std::io::Error),
}

/// Run the service until `shutdown` is triggered.
pub async fn run(config: AppConfig, shutdown: Shutdown) -> Result<(), StartupError> {
    let store = Arc::new(Store::open(&config.store)?);

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse::<SocketAddr>() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let address = config.listener.bind_address.clone();
    let listener = TcpListener::bind(&address)
        .await
        .map_err(|source| StartupError::Bind {
            address: address.clone(),
            source,
        })?;
    tracing::info!(address = %address, "Listening for connections");

    let grace = Duration::from_secs(config.timeouts.shutdown_grace_secs);
    let mut signalled = shutdown.subscribe();
    let server = HttpServer::new(config, store.clone());
    let mut serving = tokio::spawn(server.run(listener, shutdown.subscribe()));

    let joined = tokio::select! {
        joined = &mut serving => joined,
        _ = signalled.recv() => match tokio::time::timeout(grace, &mut serving).await {
            Ok(joined) => joined,
            Err(_) => {
                tracing::warn!(grace_secs = grace.as_secs(), "Grace period elapsed, aborting requests");
                serving.abort();
                Ok(Ok(()))
            }
        },
    };
    let served = joined.unwrap_or_else(|e| Err(std::io::Error::other(e)));

    if let Err(e) = store.save() {
        tracing::error!(error = %e, "Failed to write catalogue snapshot");
    }
    served.map_err(StartupError::Serve)
}
