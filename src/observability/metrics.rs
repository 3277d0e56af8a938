//! Metrics collection and exposition.
//!
//! # Metrics
//! - `taxon_requests_total` (counter): web-service requests by resource, method, status
//! - `taxon_request_duration_seconds` (histogram): handler latency by resource
//! - `taxon_domain_errors_total` (counter): domain errors by resource and code
//!
//! # Design Decisions
//! - Recording without an installed exporter is a no-op, so tests need no setup
//! - Prometheus exporter runs its own listener when enabled in config

use std::net::SocketAddr;
use std::time::Instant;

use metrics_exporter_prometheus::PrometheusBuilder;

use crate::webservice::errors::ErrorCode;

/// Install the Prometheus exporter listening on `addr`.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics exporter listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

/// Record one dispatched web-service request.
pub fn record_request(resource: &'static str, method: &str, status: u16, start: Instant) {
    metrics::counter!(
        "taxon_requests_total",
        "resource" => resource,
        "method" => method.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
    metrics::histogram!("taxon_request_duration_seconds", "resource" => resource)
        .record(start.elapsed().as_secs_f64());
}

/// Record a domain error returned by a handler.
pub fn record_domain_error(resource: &'static str, code: ErrorCode) {
    metrics::counter!(
        "taxon_domain_errors_total",
        "resource" => resource,
        "code" => code.as_str()
    )
    .increment(1);
}
