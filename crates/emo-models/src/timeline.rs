//! Timeline presentation schema.
//!
//! The aggregation itself lives in `emo-media::timeline`; these are the
//! shapes handed to presentation and storage collaborators.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::moment::{Moment, SignificanceScore};
use crate::stress::{StressAssessment, StressTrend};

/// One chronological entry of the timeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct TimelineEntry {
    /// Timestamp in seconds
    pub timestamp: f64,
    pub significance: SignificanceScore,
    /// Gesture and AI labels
    pub labels: Vec<String>,
    /// AI interpretation text (empty when unavailable)
    pub ai_text: String,
    /// Landmark stress estimate, when the frame had enough landmarks
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stress: Option<StressAssessment>,
}

impl From<&Moment> for TimelineEntry {
    fn from(moment: &Moment) -> Self {
        Self {
            timestamp: moment.timestamp,
            significance: moment.significance,
            labels: moment.label_names(),
            ai_text: moment.ai_text().to_string(),
            stress: moment.stress.clone(),
        }
    }
}

/// A label and how many moments carried it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct DominantEmotion {
    pub label: String,
    pub count: u32,
}

/// Ordered summary of a video analysis session.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize, JsonSchema)]
pub struct Timeline {
    /// Entries in strictly increasing timestamp order
    pub entries: Vec<TimelineEntry>,

    /// Most frequent labels, highest count first
    pub dominant_emotions: Vec<DominantEmotion>,

    /// The sampler stopped accepting moments before the input ended
    #[serde(default)]
    pub budget_exceeded: bool,

    /// Direction of the stress estimate across entries
    #[serde(default)]
    pub stress_trend: StressTrend,

    /// Full moments, including anchors and interpretation errors
    #[serde(default)]
    pub moments: Vec<Moment>,
}

impl Timeline {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Check the ordering invariant.
    pub fn is_strictly_ordered(&self) -> bool {
        self.entries
            .windows(2)
            .all(|w| w[0].timestamp < w[1].timestamp)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::moment::{GestureLabel, MomentKind};

    #[test]
    fn test_entry_from_moment() {
        let moment = Moment::new(
            3,
            1.5,
            SignificanceScore::new(0.7),
            MomentKind::Significant,
            vec![GestureLabel::new("frown", 0.9)],
        );
        let entry = TimelineEntry::from(&moment);

        assert_eq!(entry.timestamp, 1.5);
        assert_eq!(entry.labels, vec!["frown"]);
        assert!(entry.ai_text.is_empty());
    }

    #[test]
    fn test_ordering_check() {
        let entry = |t: f64| TimelineEntry {
            timestamp: t,
            significance: SignificanceScore::ZERO,
            labels: vec![],
            ai_text: String::new(),
            stress: None,
        };
        let ordered = Timeline {
            entries: vec![entry(0.0), entry(1.0)],
            ..Default::default()
        };
        let unordered = Timeline {
            entries: vec![entry(1.0), entry(1.0)],
            ..Default::default()
        };

        assert!(ordered.is_strictly_ordered());
        assert!(!unordered.is_strictly_ordered());
    }
}
