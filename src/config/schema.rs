//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the gateway.
//! All types derive Serde traits for deserialization from config files.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Root configuration for the gateway.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct GatewayConfig {
    /// Listener configuration (bind address).
    pub listener: ListenerConfig,

    /// Endpoint settings.
    pub http: HttpConfig,

    /// Daily quota settings.
    pub quota: QuotaConfig,

    /// External image API settings.
    pub upstream: UpstreamConfig,

    /// Request size limits.
    pub security: SecurityConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
        }
    }
}

/// Endpoint configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct HttpConfig {
    /// Path the single method-dispatched endpoint is mounted on.
    pub path: String,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            path: "/api/generate".to_string(),
        }
    }
}

/// Which backend holds quota records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum StoreKind {
    /// In-process map, lost on restart and not shared between instances.
    #[default]
    Memory,
    /// Shared Redis instance.
    Redis,
}

/// Quota configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct QuotaConfig {
    /// Successful generations allowed per client per window.
    pub daily_limit: u32,

    /// Window length in seconds, anchored at first request after reset.
    pub window_secs: u64,

    /// Interval between sweeps of expired records, in seconds.
    pub sweep_interval_secs: u64,

    /// Fall back to the TCP peer address when no client IP header is present.
    pub use_peer_address: bool,

    /// Store backend.
    pub store: StoreKind,

    /// Redis URL, required when `store = "redis"`.
    pub redis_url: Option<String>,

    /// Prefix for Redis keys.
    pub redis_key_prefix: String,
}

impl QuotaConfig {
    pub fn window(&self) -> Duration {
        Duration::from_secs(self.window_secs)
    }

    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_secs)
    }
}

impl Default for QuotaConfig {
    fn default() -> Self {
        Self {
            daily_limit: 100,
            window_secs: 24 * 60 * 60,
            sweep_interval_secs: 60 * 60,
            use_peer_address: false,
            store: StoreKind::Memory,
            redis_url: None,
            redis_key_prefix: "quota".to_string(),
        }
    }
}

/// External image API configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct UpstreamConfig {
    /// Endpoint receiving the multipart `image` + `username` submission.
    pub endpoint: String,

    /// Total request timeout in seconds. Unset means the client default.
    pub timeout_secs: Option<u64>,

    /// Prefix of the attachment file name returned to callers.
    pub filename_prefix: String,

    /// User-Agent sent upstream.
    pub user_agent: String,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://api.zenzxz.my.id/api/maker/fakeml".to_string(),
            timeout_secs: None,
            filename_prefix: "FakeML".to_string(),
            user_agent: concat!("fakeml-gateway/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

/// Request size limits.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SecurityConfig {
    /// Maximum inbound body size in bytes.
    pub max_body_size: usize,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            max_body_size: 10 * 1024 * 1024, // 10MB
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Log output format.
    pub log_format: LogFormat,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}
