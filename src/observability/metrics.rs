//! Metrics collection and exposition.
//!
//! # Metrics
//! - `redirect_lookups_total` (counter): redirect lookups by result (hit/miss)
//! - `redirect_mappings_added_total` (counter): mappings added by source
//! - `redirect_mappings` (gauge): current number of mappings
//! - `redirect_request_duration_seconds` (histogram): handler latency by route
//!
//! Without an installed recorder every call here is a no-op.

use std::net::SocketAddr;
use std::time::Instant;

use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;

/// Start the Prometheus exporter on `addr`.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics exporter listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_lookup(hit: bool) {
    let result = if hit { "hit" } else { "miss" };
    counter!("redirect_lookups_total", "result" => result).increment(1);
}

pub fn record_mappings_added(source: &'static str, count: usize) {
    counter!("redirect_mappings_added_total", "source" => source).increment(count as u64);
}

pub fn record_store_size(size: usize) {
    gauge!("redirect_mappings").set(size as f64);
}

pub fn record_request(route: &'static str, status: u16, start: Instant) {
    histogram!(
        "redirect_request_duration_seconds",
        "route" => route,
        "status" => status.to_string()
    )
    .record(start.elapsed().as_secs_f64());
}
