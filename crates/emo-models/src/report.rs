//! Analysis session report and warnings.

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::timeline::Timeline;

/// Unique identifier for an analysis session.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(transparent)]
pub struct SessionId(pub String);

impl SessionId {
    /// Generate a new random session ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Create from an existing string.
    pub fn from_string(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Recoverable problem absorbed during a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum WarningKind {
    /// Extractor found no face in an examined frame
    NoFace,
    /// Extractor failed on a single frame
    ExtractionFailed,
    /// Remote interpretation exceeded its timeout
    InterpretationTimeout,
    /// Remote interpretation returned an error
    InterpretationFailed,
}

impl WarningKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            WarningKind::NoFace => "no_face",
            WarningKind::ExtractionFailed => "extraction_failed",
            WarningKind::InterpretationTimeout => "interpretation_timeout",
            WarningKind::InterpretationFailed => "interpretation_failed",
        }
    }

    /// Whether this warning means a frame was skipped by the sampler.
    pub fn is_frame_skip(&self) -> bool {
        matches!(self, WarningKind::NoFace | WarningKind::ExtractionFailed)
    }
}

/// A warning returned alongside the timeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct SamplingWarning {
    pub frame_index: u64,
    pub timestamp: f64,
    pub kind: WarningKind,
    pub message: String,
}

impl SamplingWarning {
    pub fn new(frame_index: u64, timestamp: f64, kind: WarningKind, message: impl Into<String>) -> Self {
        Self {
            frame_index,
            timestamp,
            kind,
            message: message.into(),
        }
    }
}

/// Counters describing a sampling pass.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize, JsonSchema)]
pub struct SamplingStats {
    /// Frames reported by the source
    pub frames_total: u64,
    /// Frames run through landmark extraction
    pub frames_examined: u64,
    /// Examined frames skipped (no face or extraction failure)
    pub frames_skipped: u64,
    /// Frame stride used for the scan
    pub stride: u64,
}

/// Complete output of one analysis session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct AnalysisReport {
    pub session_id: SessionId,
    pub timeline: Timeline,
    pub warnings: Vec<SamplingWarning>,
    pub stats: SamplingStats,
    pub created_at: DateTime<Utc>,
}

impl AnalysisReport {
    pub fn new(
        session_id: SessionId,
        timeline: Timeline,
        warnings: Vec<SamplingWarning>,
        stats: SamplingStats,
    ) -> Self {
        Self {
            session_id,
            timeline,
            warnings,
            stats,
            created_at: Utc::now(),
        }
    }

    /// Number of warnings of the given kind.
    pub fn warning_count(&self, kind: WarningKind) -> usize {
        self.warnings.iter().filter(|w| w.kind == kind).count()
    }

    /// Number of frames skipped by the sampler, as reported through warnings.
    pub fn skipped_frame_warnings(&self) -> usize {
        self.warnings.iter().filter(|w| w.kind.is_frame_skip()).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_id_unique() {
        assert_ne!(SessionId::new(), SessionId::new());
        assert_eq!(SessionId::from_string("abc").to_string(), "abc");
    }

    #[test]
    fn test_warning_counts() {
        let report = AnalysisReport::new(
            SessionId::from_string("s"),
            Timeline::default(),
            vec![
                SamplingWarning::new(1, 0.1, WarningKind::NoFace, "no face"),
                SamplingWarning::new(2, 0.2, WarningKind::ExtractionFailed, "boom"),
                SamplingWarning::new(0, 0.0, WarningKind::InterpretationTimeout, "slow"),
            ],
            SamplingStats::default(),
        );

        assert_eq!(report.skipped_frame_warnings(), 2);
        assert_eq!(report.warning_count(WarningKind::InterpretationTimeout), 1);
    }

    #[test]
    fn test_warning_kind_serialization() {
        let json = serde_json::to_string(&WarningKind::InterpretationTimeout).unwrap();
        assert_eq!(json, "\"interpretation_timeout\"");
        assert_eq!(WarningKind::NoFace.as_str(), "no_face");
    }
}
