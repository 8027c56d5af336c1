//! Metrics collection and exposition.
//!
//! # Metrics
//! - `gateway_requests_total` (counter): dispatched events by method, status
//! - `gateway_request_duration_seconds` (histogram): dispatch latency
//! - `gateway_invalid_requests_total` (counter): validation failures
//! - `gateway_unauthenticated_requests_total` (counter): 401 terminal states
//! - `gateway_auth_cache_hits_total` (counter): tokens served from cache
//!
//! # Design Decisions
//! - Low-overhead metric updates (atomic operations)
//! - The exporter is optional; recording without it installed is a no-op

use std::net::SocketAddr;
use std::time::Instant;

use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus exporter on its own listener.
pub fn init_metrics(addr: SocketAddr) {
    if let Err(error) = PrometheusBuilder::new().with_http_listener(addr).install() {
        tracing::error!(error = %error, "Failed to install Prometheus exporter");
    } else {
        tracing::info!(address = %addr, "Metrics endpoint started");
    }
}

/// Record one completed dispatch.
pub fn record_dispatch(method: &str, status: u16, start: Instant) {
    metrics::counter!(
        "gateway_requests_total",
        "method" => method.to_string(),
        "status" => status.to_string(),
    )
    .increment(1);
    metrics::histogram!("gateway_request_duration_seconds")
        .record(start.elapsed().as_secs_f64());
}

pub fn record_invalid_request() {
    metrics::counter!("gateway_invalid_requests_total").increment(1);
}

pub fn record_unauthenticated_request() {
    metrics::counter!("gateway_unauthenticated_requests_total").increment(1);
}

pub fn record_auth_cache_hit() {
    metrics::counter!("gateway_auth_cache_hits_total").increment(1);
}
