//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create the Axum Router with the single method-dispatched endpoint
//! - Wire up middleware (request ID, tracing, CORS headers, metrics)
//! - Bind server to listener and drain on shutdown

use std::net::SocketAddr;
use std::sync::Arc;

use axum::http::header::{
    ACCESS_CONTROL_ALLOW_HEADERS, ACCESS_CONTROL_ALLOW_METHODS, ACCESS_CONTROL_ALLOW_ORIGIN,
};
use axum::routing::get;
use axum::Router;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower::ServiceBuilder;
use tower_http::request_id::{PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::set_header::SetResponseHeaderLayer;
use tower_http::trace::TraceLayer;

use crate::config::GatewayConfig;
use crate::http::handlers;
use crate::http::request::{request_span, track_requests, MakeRequestUuidV4};
use crate::http::response::{ALLOW_HEADERS, ALLOW_METHODS, ALLOW_ORIGIN};
use crate::lifecycle::StartupError;
use crate::quota::QuotaLimiter;
use crate::upstream::UpstreamClient;

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<GatewayConfig>,
    pub limiter: QuotaLimiter,
    pub upstream: UpstreamClient,
}

impl AppState {
    pub fn new(config: GatewayConfig, limiter: QuotaLimiter, upstream: UpstreamClient) -> Self {
        Self {
            config: Arc::new(config),
            limiter,
            upstream,
        }
    }

    /// Build the limiter and upstream client described by `config`.
    pub fn from_config(config: &GatewayConfig) -> Result<Self, StartupError> {
        let limiter = QuotaLimiter::from_config(&config.quota)?;
        let upstream = UpstreamClient::new(&config.upstream)?;
        Ok(Self::new(config.clone(), limiter, upstream))
    }
}

/// HTTP server for the gateway.
pub struct GatewayServer {
    router: Router,
    config: GatewayConfig,
}

impl GatewayServer {
    pub fn new(config: GatewayConfig, state: AppState) -> Self {
        let router = Self::build_router(&config, state);
        Self { router, config }
    }

    /// Build the Axum router with all middleware layers.
    pub fn build_router(config: &GatewayConfig, state: AppState) -> Router {
        let endpoint = get(handlers::quota_status)
            .post(handlers::generate)
            .options(handlers::preflight)
            .head(handlers::method_not_allowed)
            .fallback(handlers::method_not_allowed);

        Router::new()
            .route(&config.http.path, endpoint)
            .with_state(state)
            .layer(
                ServiceBuilder::new()
                    .layer(SetRequestIdLayer::x_request_id(MakeRequestUuidV4))
                    .layer(TraceLayer::new_for_http().make_span_with(request_span))
                    .layer(PropagateRequestIdLayer::x_request_id())
                    .layer(SetResponseHeaderLayer::overriding(
                        ACCESS_CONTROL_ALLOW_ORIGIN,
                        ALLOW_ORIGIN,
                    ))
                    .layer(SetResponseHeaderLayer::overriding(
                        ACCESS_CONTROL_ALLOW_METHODS,
                        ALLOW_METHODS,
                    ))
                    .layer(SetResponseHeaderLayer::overriding(
                        ACCESS_CONTROL_ALLOW_HEADERS,
                        ALLOW_HEADERS,
                    ))
                    .layer(axum::middleware::from_fn(track_requests)),
            )
    }

    /// A clone of the router, for driving requests in-process.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Run the server until `shutdown` fires, then drain in-flight requests.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            path = %self.config.http.path,
            upstream = %self.config.upstream.endpoint,
            "HTTP server starting"
        );

        let app = self
            .router
            .into_make_service_with_connect_info::<SocketAddr>();

        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }
}
