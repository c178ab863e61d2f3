//! Image generation gateway with a per-client daily quota.

pub mod config;
pub mod error;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod quota;
pub mod upload;
pub mod upstream;

pub use config::GatewayConfig;
pub use error::{BadRequest, GatewayError, GatewayResult};
pub use http::{AppState, GatewayServer};
pub use lifecycle::Shutdown;
