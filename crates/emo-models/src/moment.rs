//! Moments: frames selected for AI interpretation.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::interpretation::Interpretation;
use crate::stress::StressAssessment;

/// Normalized measure of landmark change between consecutive snapshots.
///
/// Always within [0, 1]; construction clamps out-of-range and NaN input.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize, JsonSchema)]
#[serde(transparent)]
pub struct SignificanceScore(f64);

impl SignificanceScore {
    pub const ZERO: SignificanceScore = SignificanceScore(0.0);
    pub const MAX: SignificanceScore = SignificanceScore(1.0);

    pub fn new(value: f64) -> Self {
        if value.is_nan() {
            return Self::ZERO;
        }
        Self(value.clamp(0.0, 1.0))
    }

    /// Convert a raw landmark distance using a reference scale.
    pub fn from_distance(distance: f64, reference_scale: f64) -> Self {
        if reference_scale <= 0.0 {
            return Self::ZERO;
        }
        Self::new(distance / reference_scale)
    }

    pub fn value(&self) -> f64 {
        self.0
    }

    pub fn meets(&self, threshold: f64) -> bool {
        self.0 >= threshold
    }
}

impl fmt::Display for SignificanceScore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.3}", self.0)
    }
}

/// A geometry-derived gesture/expression label.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct GestureLabel {
    pub label: String,
    /// Confidence in [0, 1]
    pub confidence: f64,
}

impl GestureLabel {
    pub fn new(label: impl Into<String>, confidence: f64) -> Self {
        Self {
            label: label.into(),
            confidence: confidence.clamp(0.0, 1.0),
        }
    }
}

/// Structural anchor positions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum AnchorKind {
    Start,
    Middle,
    End,
}

impl AnchorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            AnchorKind::Start => "start",
            AnchorKind::Middle => "middle",
            AnchorKind::End => "end",
        }
    }
}

impl fmt::Display for AnchorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Why a moment was selected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "type", content = "anchor", rename_all = "snake_case")]
pub enum MomentKind {
    /// Mandatory structural moment, included regardless of score
    Anchor(AnchorKind),
    /// Score met the significance threshold
    Significant,
}

impl MomentKind {
    pub fn is_anchor(&self) -> bool {
        matches!(self, MomentKind::Anchor(_))
    }
}

/// Text shown in place of an interpretation that failed.
pub const INTERPRETATION_UNAVAILABLE: &str = "AI interpretation unavailable";

/// A frame selected for AI interpretation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Moment {
    /// Frame index within the input
    pub frame_index: u64,

    /// Timestamp in seconds
    pub timestamp: f64,

    /// Significance relative to the previously examined snapshot
    pub significance: SignificanceScore,

    /// Selection reason
    pub kind: MomentKind,

    /// Gesture labels from the classifier
    #[serde(default)]
    pub labels: Vec<GestureLabel>,

    /// AI interpretation, attached after selection
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interpretation: Option<Interpretation>,

    /// Interpretation failure, if the remote call did not succeed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interpretation_error: Option<String>,

    /// Stress estimate from the same landmarks as the labels
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stress: Option<StressAssessment>,
}

impl Moment {
    pub fn new(
        frame_index: u64,
        timestamp: f64,
        significance: SignificanceScore,
        kind: MomentKind,
        labels: Vec<GestureLabel>,
    ) -> Self {
        Self {
            frame_index,
            timestamp,
            significance,
            kind,
            labels,
            interpretation: None,
            interpretation_error: None,
            stress: None,
        }
    }

    pub fn with_stress(mut self, stress: Option<StressAssessment>) -> Self {
        self.stress = stress;
        self
    }

    /// Attach a successful interpretation.
    pub fn attach_interpretation(&mut self, interpretation: Interpretation) {
        self.interpretation = Some(interpretation);
        self.interpretation_error = None;
    }

    /// Record a failed interpretation; the moment is kept.
    pub fn attach_failure(&mut self, error: impl Into<String>) {
        self.interpretation = None;
        self.interpretation_error = Some(error.into());
    }

    /// Text shown for this moment. Failed interpretations show a placeholder;
    /// pending ones are empty.
    pub fn ai_text(&self) -> &str {
        match (&self.interpretation, &self.interpretation_error) {
            (Some(interpretation), _) => &interpretation.text,
            (None, Some(_)) => INTERPRETATION_UNAVAILABLE,
            (None, None) => "",
        }
    }

    /// Label names, gesture labels first then AI labels, without duplicates.
    pub fn label_names(&self) -> Vec<String> {
        let mut names: Vec<String> = Vec::new();
        let ai_labels = self
            .interpretation
            .iter()
            .flat_map(|i| i.labels.iter().cloned());
        for name in self.labels.iter().map(|l| l.label.clone()).chain(ai_labels) {
            if !names.contains(&name) {
                names.push(name);
            }
        }
        names
    }

    pub fn is_anchor(&self) -> bool {
        self.kind.is_anchor()
    }
}
