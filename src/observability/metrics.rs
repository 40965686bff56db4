//! Metrics collection and exposition.
//!
//! # Metrics
//! - `proxy_requests_total` (counter): requests by method, status, backend
//! - `proxy_request_duration_seconds` (histogram): end-to-end latency
//! - `proxy_retries_total` (counter): retries by backend and failure class
//! - `proxy_upstream_failures_total` (counter): terminal failures by backend and class
//!
//! Recording is a no-op until a recorder is installed, so tests and
//! deployments without the exporter pay nothing beyond the macro call.

use std::net::SocketAddr;
use std::time::Instant;

use metrics_exporter_prometheus::PrometheusBuilder;

use crate::http::forwarder::FailureClass;

/// Install the Prometheus recorder and its scrape listener.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics endpoint listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

/// Record a finished request.
pub fn record_request(method: &str, status: u16, backend: &str, start: Instant) {
    metrics::counter!(
        "proxy_requests_total",
        "method" => method.to_string(),
        "status" => status.to_string(),
        "backend" => backend.to_string()
    )
    .increment(1);
    metrics::histogram!(
        "proxy_request_duration_seconds",
        "method" => method.to_string(),
        "backend" => backend.to_string()
    )
    .record(start.elapsed().as_secs_f64());
}

/// Record a retry about to be attempted.
pub fn record_retry(backend: &str, class: FailureClass) {
    metrics::counter!(
        "proxy_retries_total",
        "backend" => backend.to_string(),
        "class" => class.as_str()
    )
    .increment(1);
}

/// Record a request that ended in a terminal upstream failure.
pub fn record_upstream_failure(backend: &str, class: FailureClass) {
    metrics::counter!(
        "proxy_upstream_failures_total",
        "backend" => backend.to_string(),
        "class" => class.as_str()
    )
    .increment(1);
}
