//! Shared data models for EmoTrace analysis.
//!
//! This crate provides Serde-serializable types for:
//! - Landmark snapshots produced by the external landmark model
//! - Gesture labels and significance scores
//! - Selected moments, their encoded payloads and AI interpretation
//! - Landmark-based stress estimates
//! - Timelines and analysis reports handed to presentation/storage

pub mod interpretation;
pub mod landmarks;
pub mod moment;
pub mod payload;
pub mod report;
pub mod stress;
pub mod timeline;
pub mod timestamp;

// Re-export common types
pub use interpretation::{ConfidenceLevel, ConfidenceLevelParseError, Interpretation};
pub use landmarks::{LandmarkSnapshot, PersonLandmarks, Point3};
pub use moment::{
    AnchorKind, GestureLabel, Moment, MomentKind, SignificanceScore, INTERPRETATION_UNAVAILABLE,
};
pub use payload::PreparedImage;
pub use report::{AnalysisReport, SamplingStats, SamplingWarning, SessionId, WarningKind};
pub use stress::{StressAssessment, StressComponents, StressLevel, StressTrend};
pub use timeline::{DominantEmotion, Timeline, TimelineEntry};
pub use timestamp::{format_seconds, frame_timestamp};
