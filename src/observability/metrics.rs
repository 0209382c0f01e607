//! Metrics collection and exposition.
//!
//! # Metrics
//! - `mockgate_requests_total` (counter): requests by mode (mock, proxy) and status
//! - `mockgate_request_duration_seconds` (histogram): latency by mode, mock delay included
//! - `mockgate_upstream_errors_total` (counter): proxy failures by kind
//!
//! # Design Decisions
//! - Recording is a no-op until a recorder is installed
//! - The Prometheus listener is only started when `metrics_enabled` is set

use std::net::SocketAddr;
use std::time::Instant;

use metrics::{counter, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;

pub const MODE_MOCK: &str = "mock";
pub const MODE_PROXY: &str = "proxy";

const REQUESTS_TOTAL: &str = "mockgate_requests_total";
const REQUEST_DURATION_SECONDS: &str = "mockgate_request_duration_seconds";
const UPSTREAM_ERRORS_TOTAL: &str = "mockgate_upstream_errors_total";

/// Install the Prometheus recorder and its scrape listener.
///
/// Must be called from within a Tokio runtime.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics exporter listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

/// Record one handled request.
pub fn record_request(mode: &'static str, status: u16, start: Instant) {
    counter!(REQUESTS_TOTAL, "mode" => mode, "status" => status.to_string()).increment(1);
    histogram!(REQUEST_DURATION_SECONDS, "mode" => mode).record(start.elapsed().as_secs_f64());
}

/// Record a failed forward.
pub fn record_upstream_error(kind: &'static str) {
    counter!(UPSTREAM_ERRORS_TOTAL, "kind" => kind).increment(1);
}
