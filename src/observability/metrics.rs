//! Metrics collection and exposition.
//!
//! # Metrics
//! - `securelink_decisions_total` (counter): link decisions by outcome and reason
//! - `proxy_requests_total` (counter): forwarded requests by method, status
//! - `proxy_request_duration_seconds` (histogram): upstream latency
//!
//! # Design Decisions
//! - Facade macros only; the Prometheus recorder is optional
//! - Labels are bounded sets (outcome, reason, method, status)

use std::net::SocketAddr;
use std::time::Instant;

use metrics::{counter, histogram};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};

use crate::securelink::Outcome;

/// Install the Prometheus recorder and its HTTP listener.
///
/// Must be called from within a Tokio runtime.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    tracing::info!(address = %addr, "Metrics endpoint listening");
    Ok(())
}

/// Count one secure link decision.
pub fn record_decision(outcome: &Outcome) {
    let reason = match outcome {
        Outcome::Forbid(reason) => reason.as_str(),
        _ => "none",
    };
    counter!(
        "securelink_decisions_total",
        "outcome" => outcome.label(),
        "reason" => reason
    )
    .increment(1);
}

/// Count one forwarded request and its latency.
pub fn record_request(method: &str, status: u16, start: Instant) {
    counter!(
        "proxy_requests_total",
        "method" => method.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
    histogram!("proxy_request_duration_seconds", "method" => method.to_string())
        .record(start.elapsed().as_secs_f64());
}
