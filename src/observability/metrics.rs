//! Metrics collection and exposition.
//!
//! # Metrics
//! - `zulu_requests_total` (counter): requests by method, status, route
//! - `zulu_request_duration_seconds` (histogram): time to response headers
//! - `zulu_pipeline_stages_total` (counter): spawned stages by launcher
//! - `zulu_spawn_failures_total` (counter): stages that failed to start
//!
//! # Design Decisions
//! - Recording goes through the `metrics` facade and is a no-op until an
//!   exporter is installed
//! - The Prometheus endpoint is opt-in

use std::net::SocketAddr;
use std::time::Instant;

use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus exporter listening on `addr`.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics endpoint listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

/// Record a finished request.
pub fn record_request(method: &str, status: u16, route: &str, start: Instant) {
    let labels = [
        ("method", method.to_string()),
        ("status", status.to_string()),
        ("route", route.to_string()),
    ];
    metrics::counter!("zulu_requests_total", &labels).increment(1);
    metrics::histogram!("zulu_request_duration_seconds", &labels)
        .record(start.elapsed().as_secs_f64());
}

/// Record a spawned pipeline stage.
pub fn record_stage(launcher: &'static str) {
    metrics::counter!("zulu_pipeline_stages_total", "launcher" => launcher).increment(1);
}

/// Record a stage that could not be started.
pub fn record_spawn_failure() {
    metrics::counter!("zulu_spawn_failures_total").increment(1);
}
