//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (limits, windows and intervals > 0)
//! - Check addresses and the upstream URL parse
//! - Check store settings are complete
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: GatewayConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::fmt;
use std::net::SocketAddr;

use crate::config::schema::{GatewayConfig, StoreKind};

/// A single semantic problem with a configuration value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub field: &'static str,
    pub message: String,
}

impl ValidationError {
    fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Validate a parsed configuration.
pub fn validate_config(config: &GatewayConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::new(
            "listener.bind_address",
            format!("'{}' is not a socket address", config.listener.bind_address),
        ));
    }

    if !config.http.path.starts_with('/') {
        errors.push(ValidationError::new("http.path", "must start with '/'"));
    }

    if config.quota.daily_limit == 0 {
        errors.push(ValidationError::new("quota.daily_limit", "must be greater than 0"));
    }
    if config.quota.window_secs == 0 {
        errors.push(ValidationError::new("quota.window_secs", "must be greater than 0"));
    }
    if config.quota.sweep_interval_secs == 0 {
        errors.push(ValidationError::new(
            "quota.sweep_interval_secs",
            "must be greater than 0",
        ));
    }
    if config.quota.store == StoreKind::Redis
        && config.quota.redis_url.as_deref().map_or(true, str::is_empty)
    {
        errors.push(ValidationError::new(
            "quota.redis_url",
            "required when store = \"redis\"",
        ));
    }

    match url::Url::parse(&config.upstream.endpoint) {
        Ok(url) if matches!(url.scheme(), "http" | "https") => {}
        Ok(url) => errors.push(ValidationError::new(
            "upstream.endpoint",
            format!("unsupported scheme '{}'", url.scheme()),
        )),
        Err(e) => errors.push(ValidationError::new(
            "upstream.endpoint",
            format!("invalid URL: {}", e),
        )),
    }
    if config.upstream.timeout_secs == Some(0) {
        errors.push(ValidationError::new(
            "upstream.timeout_secs",
            "must be greater than 0 when set",
        ));
    }

    if config.security.max_body_size == 0 {
        errors.push(ValidationError::new(
            "security.max_body_size",
            "must be greater than 0",
        ));
    }

    if config.observability.metrics_enabled
        && config
            .observability
            .metrics_address
            .parse::<SocketAddr>()
            .is_err()
    {
        errors.push(ValidationError::new(
            "observability.metrics_address",
            format!(
                "'{}' is not a socket address",
                config.observability.metrics_address
            ),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(validate_config(&GatewayConfig::default()).is_ok());
    }

    #[test]
    fn test_collects_every_error() {
        let mut config = GatewayConfig::default();
        config.quota.daily_limit = 0;
        config.http.path = "generate".into();
        config.upstream.endpoint = "ftp://example.com/upload".into();

        let errors = validate_config(&config).unwrap_err();
        let fields: Vec<_> = errors.iter().map(|e| e.field).collect();
        assert_eq!(
            fields,
            vec!["http.path", "quota.daily_limit", "upstream.endpoint"]
        );
    }

    #[test]
    fn test_redis_store_requires_url() {
        let mut config = GatewayConfig::default();
        config.quota.store = StoreKind::Redis;

        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors[0].field, "quota.redis_url");

        config.quota.redis_url = Some("redis://127.0.0.1:6379".into());
        assert!(validate_config(&config).is_ok());
    }
}
