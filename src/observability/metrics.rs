//! Metrics collection and exposition.
//!
//! # Metrics
//! - `news_connections_total` (counter): accepted connections
//! - `news_requests_total` (counter): replies sent, by status
//! - `news_request_duration_seconds` (histogram): accept-to-reply latency
//! - `news_connections_dropped_total` (counter): closed without a reply
//! - `news_skipped_rows_total` (counter): malformed dataset rows skipped
//!
//! Without an installed recorder every call is a no-op.

use std::net::SocketAddr;
use std::time::Instant;

use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus recorder and its scrape endpoint.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics endpoint listening"),
        Err(e) => {
            tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter")
        }
    }
}

pub fn record_connection() {
    ::metrics::counter!("news_connections_total").increment(1);
}

/// Record one reply and its latency since `start`.
pub fn record_response(status: u16, start: Instant) {
    ::metrics::counter!("news_requests_total", "status" => status.to_string()).increment(1);
    ::metrics::histogram!("news_request_duration_seconds").record(start.elapsed().as_secs_f64());
}

/// Record a connection closed without a reply, labelled by reason.
pub fn record_dropped(reason: &'static str) {
    ::metrics::counter!("news_connections_dropped_total", "reason" => reason).increment(1);
}

pub fn record_skipped_rows(count: u64) {
    ::metrics::counter!("news_skipped_rows_total").increment(count);
}
