//! Metrics collection.
//!
//! # Metrics
//! - `orchestrator_requests_total` (counter): calls by method, outcome
//! - `orchestrator_request_duration_seconds` (histogram): round-trip latency
//! - `orchestrator_in_flight` (gauge): tracked calls in the registry
//! - `orchestrator_cancelled_total` (counter): cancellations by path (manual, bulk)
//! - `orchestrator_reauth_prompts_total` (counter): re-login prompts shown
//!
//! # Design Decisions
//! - Uses the `metrics` facade; without an installed recorder every call is a no-op
//! - Labels are low-cardinality (no URLs)

use std::time::Instant;

use ::metrics::{counter, gauge, histogram};

/// Outcome label of a finished call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Resolved,
    Rejected,
    TransportFailed,
    Cancelled,
    Raw,
}

impl Outcome {
    pub fn as_str(self) -> &'static str {
        match self {
            Outcome::Resolved => "resolved",
            Outcome::Rejected => "rejected",
            Outcome::TransportFailed => "transport_failed",
            Outcome::Cancelled => "cancelled",
            Outcome::Raw => "raw",
        }
    }
}

pub fn record_request(method: &'static str, outcome: Outcome, start: Instant) {
    counter!(
        "orchestrator_requests_total",
        "method" => method,
        "outcome" => outcome.as_str()
    )
    .increment(1);
    histogram!("orchestrator_request_duration_seconds", "method" => method)
        .record(start.elapsed().as_secs_f64());
}

pub fn record_in_flight(count: usize) {
    gauge!("orchestrator_in_flight").set(count as f64);
}

pub fn record_cancelled(path: &'static str, count: usize) {
    counter!("orchestrator_cancelled_total", "path" => path).increment(count as u64);
}

pub fn record_reauth_prompt() {
    counter!("orchestrator_reauth_prompts_total").increment(1);
}
