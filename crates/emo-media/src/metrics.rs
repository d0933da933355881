//! Sampler metrics.
//!
//! Recorded through the `metrics` facade; nothing is exported unless the host
//! process installs a recorder.

use metrics::counter;

/// Metric names as constants for consistency.
pub mod names {
    pub const FRAMES_EXAMINED_TOTAL: &str = "emo_frames_examined_total";
    pub const FRAMES_SKIPPED_TOTAL: &str = "emo_frames_skipped_total";
    pub const MOMENTS_SELECTED_TOTAL: &str = "emo_moments_selected_total";
}

/// Record a frame run through the extractor.
pub fn record_frame_examined() {
    counter!(names::FRAMES_EXAMINED_TOTAL).increment(1);
}

/// Record an examined frame that produced no usable landmarks.
pub fn record_frame_skipped(reason: &str) {
    let labels = [("reason", reason.to_string())];
    counter!(names::FRAMES_SKIPPED_TOTAL, &labels).increment(1);
}

/// Record a selected moment.
pub fn record_moment_selected(kind: &str) {
    let labels = [("kind", kind.to_string())];
    counter!(names::MOMENTS_SELECTED_TOTAL, &labels).increment(1);
}
