//! Startup orchestration.
//!
//! Initializes subsystems in dependency order and serves until a shutdown
//! signal arrives.

use std::net::SocketAddr;

use thiserror::Error;
use tokio::net::TcpListener;

use crate::config::GatewayConfig;
use crate::http::{AppState, GatewayServer};
use crate::lifecycle::{wait_for_signal, Shutdown};
use crate::observability::metrics;
use crate::quota::{QuotaSweeper, StoreError};
use crate::upstream::UpstreamError;

/// Errors that abort startup or serving.
#[derive(Debug, Error)]
pub enum StartupError {
    #[error("Quota store: {0}")]
    Store(#[from] StoreError),

    #[error("Upstream client: {0}")]
    Upstream(#[from] UpstreamError),

    #[error("Listener: {0}")]
    Io(#[from] std::io::Error),
}

/// Run the gateway with `config` until SIGINT/SIGTERM.
pub async fn start(config: GatewayConfig) -> Result<(), StartupError> {
    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse::<SocketAddr>() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let state = AppState::from_config(&config)?;
    let shutdown = Shutdown::new();

    let sweeper = QuotaSweeper::new(state.limiter.clone(), config.quota.sweep_interval())
        .spawn(shutdown.subscribe());

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    let server = GatewayServer::new(config, state);
    let server_shutdown = shutdown.subscribe();

    let signal_shutdown = shutdown.clone();
    tokio::spawn(async move {
        wait_for_signal().await;
        signal_shutdown.trigger();
    });

    server.run(listener, server_shutdown).await?;

    shutdown.trigger();
    if let Err(e) = sweeper.await {
        tracing::warn!(error = %e, "Quota sweeper task ended abnormally");
    }
    Ok(())
}
