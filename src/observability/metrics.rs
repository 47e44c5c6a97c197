//! Metrics collection and exposition.
//!
//! # Metrics
//! - `gateway_requests_total` (counter): requests by method, status
//! - `gateway_upstream_duration_seconds` (histogram): time to upstream response head
//! - `gateway_upstream_errors_total` (counter): failed upstream connections
//! - `gateway_reports_total` (counter): ingested reports by outcome

use std::net::SocketAddr;
use std::time::Instant;

use metrics::{counter, histogram};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};

/// Install the Prometheus recorder and its HTTP scrape endpoint.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    tracing::info!(address = %addr, "Metrics endpoint listening");
    Ok(())
}

pub fn record_request(method: &str, status: u16) {
    counter!(
        "gateway_requests_total",
        "method" => method.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
}

pub fn record_upstream(started: Instant, ok: bool) {
    histogram!("gateway_upstream_duration_seconds").record(started.elapsed().as_secs_f64());
    if !ok {
        counter!("gateway_upstream_errors_total").increment(1);
    }
}

/// `outcome` is one of `stored`, `rejected`, `failed`.
pub fn record_report(outcome: &'static str) {
    counter!("gateway_reports_total", "outcome" => outcome).increment(1);
}
