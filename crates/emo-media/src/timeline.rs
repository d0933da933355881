//! Timeline aggregation and export.

use std::collections::HashMap;
use std::io::Write;
use std::path::Path;

use emo_models::{DominantEmotion, Moment, Timeline, TimelineEntry};
use tracing::{info, warn};

use crate::error::MediaResult;
use crate::gestures::stress::stress_trend;

/// Number of dominant emotions reported by default.
pub const DEFAULT_TOP_EMOTIONS: usize = 5;

/// Folds moments into a [`Timeline`].
#[derive(Debug, Clone, Copy)]
pub struct TimelineAggregator {
    top_n: usize,
}

impl Default for TimelineAggregator {
    fn default() -> Self {
        Self {
            top_n: DEFAULT_TOP_EMOTIONS,
        }
    }
}

impl TimelineAggregator {
    pub fn new(top_n: usize) -> Self {
        Self { top_n }
    }

    /// Build the timeline. Moments are ordered by timestamp; a moment sharing
    /// a timestamp with an earlier one is dropped.
    pub fn aggregate(&self, mut moments: Vec<Moment>, budget_exceeded: bool) -> Timeline {
        moments.sort_by(|a, b| a.timestamp.total_cmp(&b.timestamp));
        let before = moments.len();
        moments.dedup_by(|later, earlier| later.timestamp == earlier.timestamp);
        if moments.len() != before {
            warn!(
                dropped = before - moments.len(),
                "Dropped moments with duplicate timestamps"
            );
        }

        let entries: Vec<TimelineEntry> = moments.iter().map(TimelineEntry::from).collect();
        let dominant_emotions = dominant_emotions(&moments, self.top_n);
        let stress: Vec<u8> = moments
            .iter()
            .filter_map(|m| m.stress.as_ref().map(|s| s.percentage))
            .collect();

        Timeline {
            entries,
            dominant_emotions,
            budget_exceeded,
            stress_trend: stress_trend(&stress),
            moments,
        }
    }
}

/// Most frequent labels across moments.
///
/// Each label counts once per moment, whether it came from the gesture
/// classifier, the interpretation, or both. Ties keep first-seen order.
pub fn dominant_emotions(moments: &[Moment], top_n: usize) -> Vec<DominantEmotion> {
    let mut order: Vec<String> = Vec::new();
    let mut counts: HashMap<String, u32> = HashMap::new();

    for moment in moments {
        for label in moment.label_names() {
            let count = counts.entry(label.clone()).or_insert(0);
            if *count == 0 {
                order.push(label);
            }
            *count += 1;
        }
    }

    let mut tally: Vec<DominantEmotion> = order
        .into_iter()
        .map(|label| {
            let count = counts.get(&label).copied().unwrap_or(0);
            DominantEmotion { label, count }
        })
        .collect();
    // Stable sort keeps first occurrence ahead on ties
    tally.sort_by(|a, b| b.count.cmp(&a.count));
    tally.truncate(top_n);
    tally
}

/// Timeline exporter.
pub struct TimelineExporter;

impl TimelineExporter {
    pub fn to_json(timeline: &Timeline) -> serde_json::Result<String> {
        serde_json::to_string_pretty(timeline)
    }

    /// Write the timeline as pretty JSON.
    pub fn write_json<P: AsRef<Path>>(timeline: &Timeline, path: P) -> MediaResult<()> {
        let json = Self::to_json(timeline)?;
        let mut file = std::fs::File::create(path.as_ref())?;
        file.write_all(json.as_bytes())?;

        info!(
            path = %path.as_ref().display(),
            entries = timeline.entries.len(),
            "Wrote timeline"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use emo_models::{
        ConfidenceLevel, GestureLabel, Interpretation, MomentKind, SignificanceScore,
        StressAssessment, StressComponents, StressLevel, StressTrend,
    };

    fn moment(timestamp: f64, labels: &[&str], ai_labels: &[&str]) -> Moment {
        let mut moment = Moment::new(
            (timestamp * 30.0) as u64,
            timestamp,
            SignificanceScore::new(0.5),
            MomentKind::Significant,
            labels.iter().map(|l| GestureLabel::new(*l, 0.8)).collect(),
        );
        if !ai_labels.is_empty() {
            moment.attach_interpretation(
                Interpretation::new("text", ConfidenceLevel::Medium)
                    .with_labels(ai_labels.iter().map(|l| l.to_string()).collect()),
            );
        }
        moment
    }

    #[test]
    fn test_entries_sorted() {
        let timeline = TimelineAggregator::default().aggregate(
            vec![moment(3.0, &[], &[]), moment(1.0, &[], &[]), moment(2.0, &[], &[])],
            false,
        );
        assert!(timeline.is_strictly_ordered());
        assert_eq!(timeline.entries[0].timestamp, 1.0);
        assert_eq!(timeline.moments.len(), 3);
    }

    #[test]
    fn test_duplicate_timestamps_dropped() {
        let timeline = TimelineAggregator::default().aggregate(
            vec![moment(1.0, &["smile"], &[]), moment(1.0, &["frown"], &[])],
            false,
        );
        assert_eq!(timeline.len(), 1);
        assert_eq!(timeline.entries[0].labels, vec!["smile"]);
    }

    #[test]
    fn test_dominant_counts_once_per_moment() {
        let moments = vec![
            moment(0.0, &["smile", "joy"], &["joy", "calm"]),
            moment(1.0, &["frown"], &["calm"]),
            moment(2.0, &["smile"], &[]),
        ];
        let dominant = dominant_emotions(&moments, 5);
        let pairs: Vec<(&str, u32)> = dominant.iter().map(|d| (d.label.as_str(), d.count)).collect();
        assert_eq!(
            pairs,
            vec![("smile", 2), ("calm", 2), ("joy", 1), ("frown", 1)]
        );
    }

    #[test]
    fn test_dominant_truncated() {
        let moments = vec![moment(0.0, &["a", "b", "c", "d", "e", "f", "g"], &[])];
        assert_eq!(dominant_emotions(&moments, 5).len(), 5);
        assert!(dominant_emotions(&[], 5).is_empty());
    }

    #[test]
    fn test_stress_trend_follows_timestamps() {
        let stressed = |timestamp: f64, percentage: u8| {
            moment(timestamp, &[], &[]).with_stress(Some(StressAssessment {
                percentage,
                level: StressLevel::from_percentage(percentage),
                components: StressComponents::default(),
                indicators: vec![],
                recommendations: vec![],
            }))
        };
        // Arrives out of order; rises once sorted
        let timeline = TimelineAggregator::default().aggregate(
            vec![stressed(3.0, 70), stressed(1.0, 10), moment(2.0, &[], &[])],
            false,
        );
        assert_eq!(timeline.stress_trend, StressTrend::Increasing);
        assert_eq!(timeline.entries[0].stress.as_ref().map(|s| s.percentage), Some(10));
        assert!(timeline.entries[1].stress.is_none());

        let flat = TimelineAggregator::default().aggregate(vec![stressed(1.0, 50)], false);
        assert_eq!(flat.stress_trend, StressTrend::InsufficientData);
    }

    #[test]
    fn test_write_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("timeline.json");
        let timeline =
            TimelineAggregator::default().aggregate(vec![moment(1.5, &["smile"], &[])], true);

        TimelineExporter::write_json(&timeline, &path).unwrap();

        let loaded: Timeline =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(loaded, timeline);
        assert!(loaded.budget_exceeded);
    }
}
