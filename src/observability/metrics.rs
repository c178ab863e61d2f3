//! Metrics collection and exposition.
//!
//! # Metrics
//! - `gateway_requests_total` (counter): requests by method, status
//! - `gateway_request_duration_seconds` (histogram): end-to-end latency
//! - `gateway_quota_rejections_total` (counter): 429 responses
//! - `gateway_upstream_requests_total` (counter): upstream calls by outcome
//! - `gateway_upstream_duration_seconds` (histogram): upstream latency
//! - `gateway_quota_swept_total` (counter): expired records removed by the sweeper

use std::net::SocketAddr;
use std::time::Instant;

use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus exporter listening on `addr`.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics exporter listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_request(method: &str, status: u16, start: Instant) {
    metrics::counter!(
        "gateway_requests_total",
        "method" => method.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
    metrics::histogram!("gateway_request_duration_seconds").record(start.elapsed().as_secs_f64());
}

pub fn record_quota_rejected() {
    metrics::counter!("gateway_quota_rejections_total").increment(1);
}

pub fn record_upstream(outcome: &'static str, start: Instant) {
    metrics::counter!("gateway_upstream_requests_total", "outcome" => outcome).increment(1);
    metrics::histogram!("gateway_upstream_duration_seconds").record(start.elapsed().as_secs_f64());
}

pub fn record_quota_swept(removed: usize) {
    metrics::counter!("gateway_quota_swept_total").increment(removed as u64);
}
