//! Metrics and observability utilities
//!
//! Counters and latency histograms for remote calls and intake lifecycle
//! transitions. Without an installed recorder every macro is a no-op.

use crate::session::IntakePhase;
use metrics::{counter, describe_counter, describe_histogram, histogram, Unit};
use std::time::Instant;

/// Metrics prefix for all Pulse metrics
pub const METRICS_PREFIX: &str = "pulse";

/// Register all metric descriptions
pub fn register_metrics() {
    describe_counter!(
        format!("{}_remote_calls_total", METRICS_PREFIX),
        Unit::Count,
        "Total remote API calls by operation and outcome"
    );

    describe_histogram!(
        format!("{}_remote_call_duration_seconds", METRICS_PREFIX),
        Unit::Seconds,
        "Remote API call latency in seconds"
    );

    describe_counter!(
        format!("{}_intake_transitions_total", METRICS_PREFIX),
        Unit::Count,
        "Intake lifecycle transitions by target phase"
    );

    describe_counter!(
        format!("{}_uploads_total", METRICS_PREFIX),
        Unit::Count,
        "Successful intake uploads by kind"
    );

    tracing::info!("Metrics registered");
}

/// Outcome label for a finished remote call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallOutcome {
    Success,
    Remote,
    Transport,
    Parse,
}

impl CallOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            CallOutcome::Success => "success",
            CallOutcome::Remote => "remote_error",
            CallOutcome::Transport => "transport_error",
            CallOutcome::Parse => "parse_error",
        }
    }
}

/// Helper to record remote call metrics
pub struct RemoteCallMetrics {
    start: Instant,
    operation: &'static str,
}

impl RemoteCallMetrics {
    /// Start tracking a call
    pub fn start(operation: &'static str) -> Self {
        Self {
            start: Instant::now(),
            operation,
        }
    }

    /// Record call completion
    pub fn finish(self, outcome: CallOutcome) {
        let duration = self.start.elapsed().as_secs_f64();

        counter!(
            format!("{}_remote_calls_total", METRICS_PREFIX),
            "operation" => self.operation,
            "outcome" => outcome.as_str()
        )
        .increment(1);

        histogram!(
            format!("{}_remote_call_duration_seconds", METRICS_PREFIX),
            "operation" => self.operation
        )
        .record(duration);
    }
}

/// Helper to record an intake phase change
pub fn record_transition(phase: IntakePhase) {
    counter!(
        format!("{}_intake_transitions_total", METRICS_PREFIX),
        "phase" => phase.to_string()
    )
    .increment(1);
}

/// Helper to record a successful upload ("file" or "text")
pub fn record_upload(kind: &'static str) {
    counter!(
        format!("{}_uploads_total", METRICS_PREFIX),
        "kind" => kind
    )
    .increment(1);
}
