//! Metrics collection and exposition.
//!
//! # Metrics
//! - `gateway_requests_total` (counter): requests by service, status
//! - `gateway_request_duration_seconds` (histogram): latency by service
//! - `gateway_rate_limited_total` (counter): requests denied admission
//! - `gateway_cache_lookups_total` (counter): lookups by result
//!   (hit, miss, error)
//! - `gateway_backend_errors_total` (counter): transport failures by kind
//! - `gateway_store_errors_total` (counter): store failures by store
//!   (counter, cache)

use std::net::SocketAddr;
use std::time::Instant;

use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus recorder and its scrape listener.
///
/// Failure is logged and leaves metrics disabled; the gateway keeps serving.
pub fn init_metrics(address: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(address).install() {
        Ok(()) => tracing::info!(address = %address, "Metrics endpoint listening"),
        Err(e) => tracing::error!(address = %address, error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_request(service: &str, status: u16, started: Instant) {
    let service = service.to_string();
    metrics::counter!(
        "gateway_requests_total",
        "service" => service.clone(),
        "status" => status.to_string()
    )
    .increment(1);
    metrics::histogram!("gateway_request_duration_seconds", "service" => service)
        .record(started.elapsed().as_secs_f64());
}

pub fn record_rate_limited() {
    metrics::counter!("gateway_rate_limited_total").increment(1);
}

pub fn record_cache_lookup(result: &'static str) {
    metrics::counter!("gateway_cache_lookups_total", "result" => result).increment(1);
}

pub fn record_backend_error(kind: &'static str) {
    metrics::counter!("gateway_backend_errors_total", "kind" => kind).increment(1);
}

pub fn record_store_error(store: &'static str) {
    metrics::counter!("gateway_store_errors_total", "store" => store).increment(1);
}
