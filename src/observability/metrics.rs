//! Metrics collection and exposition.
//!
//! # Metrics
//! - `broker_cache_lookups_total` (counter): result cache outcome (hit, miss, expired, store_error)
//! - `broker_secret_fetches_total` (counter): secret lookup outcome (hit, refreshed, stale, failed)
//! - `broker_failed_attempts_total` (counter): failed upstream attempts by operation and class
//! - `broker_requests_total` (counter): instrumented invocations by function and success
//! - `broker_operation_duration_seconds` (histogram): latency per operation
//!
//! Recording is a no-op until a recorder is installed, so library users and
//! tests pay nothing unless `init_metrics` runs.

use std::net::SocketAddr;
use std::time::Duration;

use metrics_exporter_prometheus::PrometheusBuilder;

use crate::resilience::classify::ErrorClass;

/// Install the Prometheus exporter with an HTTP listener on `addr`.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics exporter listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_cache_lookup(outcome: &'static str) {
    metrics::counter!("broker_cache_lookups_total", "outcome" => outcome).increment(1);
}

pub fn record_secret_fetch(outcome: &'static str) {
    metrics::counter!("broker_secret_fetches_total", "outcome" => outcome).increment(1);
}

pub fn record_failed_attempt(operation: &str, class: ErrorClass) {
    metrics::counter!(
        "broker_failed_attempts_total",
        "operation" => operation.to_string(),
        "class" => class.as_str()
    )
    .increment(1);
}

pub fn record_request(function: &str, success: bool) {
    metrics::counter!(
        "broker_requests_total",
        "function" => function.to_string(),
        "success" => if success { "true" } else { "false" }
    )
    .increment(1);
}

pub fn record_duration(operation: &str, duration: Duration) {
    metrics::histogram!(
        "broker_operation_duration_seconds",
        "operation" => operation.to_string()
    )
    .record(duration.as_secs_f64());
}
