//! Interpretation and session metrics.

use std::time::Duration;

use metrics::{counter, histogram};

/// Metric names as constants for consistency.
pub mod names {
    pub const INTERPRETATIONS_TOTAL: &str = "emo_interpretations_total";
    pub const INTERPRETATION_DURATION_SECONDS: &str = "emo_interpretation_duration_seconds";
    pub const SESSIONS_TOTAL: &str = "emo_sessions_total";
}

/// Outcome label for one interpreted moment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InterpretationOutcome {
    Success,
    Failed,
    Timeout,
    /// No payload or the session was cancelled before the call
    Skipped,
}

impl InterpretationOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            InterpretationOutcome::Success => "success",
            InterpretationOutcome::Failed => "failed",
            InterpretationOutcome::Timeout => "timeout",
            InterpretationOutcome::Skipped => "skipped",
        }
    }
}

/// Record one moment's interpretation, retries included in the duration.
pub fn record_interpretation(outcome: InterpretationOutcome, elapsed: Duration) {
    let labels = [("outcome", outcome.as_str().to_string())];
    counter!(names::INTERPRETATIONS_TOTAL, &labels).increment(1);
    if outcome != InterpretationOutcome::Skipped {
        histogram!(names::INTERPRETATION_DURATION_SECONDS, &labels).record(elapsed.as_secs_f64());
    }
}

/// Record a finished session ("completed", "cancelled" or "failed").
pub fn record_session(outcome: &str) {
    let labels = [("outcome", outcome.to_string())];
    counter!(names::SESSIONS_TOTAL, &labels).increment(1);
}
