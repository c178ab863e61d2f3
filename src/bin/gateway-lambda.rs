//! Serverless entry point: the same router behind the Lambda HTTP runtime.
//!
//! API Gateway and Function URL events arrive with base64 bodies already
//! decoded by `lambda_http`. The quota store only lives as long as the warm
//! container unless `quota.store = "redis"`.

use fakeml_gateway::config::{load_config, GatewayConfig};
use fakeml_gateway::observability::logging;
use fakeml_gateway::quota::QuotaSweeper;
use fakeml_gateway::{AppState, GatewayServer, Shutdown};

const CONFIG_ENV: &str = "GATEWAY_CONFIG";

#[tokio::main]
async fn main() -> Result<(), lambda_http::Error> {
    let config = match std::env::var_os(CONFIG_ENV) {
        Some(path) => load_config(std::path::Path::new(&path))?,
        None => GatewayConfig::default(),
    };
    logging::init_logging(&config.observability);

    let state = AppState::from_config(&config)?;
    let shutdown = Shutdown::new();
    let _sweeper = QuotaSweeper::new(state.limiter.clone(), config.quota.sweep_interval())
        .spawn(shutdown.subscribe());

    let router = GatewayServer::new(config, state).router();
    tracing::info!("Lambda runtime starting");
    lambda_http::run(router).await
}
