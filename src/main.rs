//! FakeML image gateway.
//!
//! # Architecture Overview
//!
//! ```text
//!                     ┌──────────────────────────────────────────────────┐
//!                     │                    GATEWAY                        │
//!                     │                                                   │
//!   Client Request    │  ┌────────┐   ┌─────────┐   ┌────────┐            │
//!   ──────────────────┼─▶│  http  │──▶│  quota  │──▶│ upload │            │
//!                     │  │dispatch│   │ limiter │   │ parser │            │
//!                     │  └────────┘   └─────────┘   └───┬────┘            │
//!                     │                                 │                 │
//!                     │                                 ▼                 │
//!   Client Response   │  ┌────────┐                ┌──────────┐           │
//!   ◀─────────────────┼──│response│◀───────────────│ upstream │◀──────────┼── Image API
//!                     │  │ format │                │  client  │           │
//!                     │  └────────┘                └──────────┘           │
//!                     │                                                   │
//!                     │  config · observability · lifecycle (sweeper)     │
//!                     └──────────────────────────────────────────────────┘
//! ```

use std::path::PathBuf;

use clap::Parser;

use fakeml_gateway::config::{load_config, GatewayConfig};
use fakeml_gateway::lifecycle;
use fakeml_gateway::observability::logging;

#[derive(Parser)]
#[command(name = "fakeml-gateway")]
#[command(about = "Quota-limited gateway to the FakeML image API", long_about = None)]
struct Args {
    /// Path to a TOML config file. Defaults apply when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => load_config(path)?,
        None => GatewayConfig::default(),
    };

    logging::init_logging(&config.observability);

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        bind_address = %config.listener.bind_address,
        daily_limit = config.quota.daily_limit,
        store = ?config.quota.store,
        "Configuration loaded"
    );

    lifecycle::start(config).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
