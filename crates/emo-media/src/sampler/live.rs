//! Live gate for webcam feeds.
//!
//! Frames arrive one at a time and there is no known end, so there are no
//! anchors. A frame is emitted when its score reaches the threshold and the
//! cooldown since the previous emission has passed, or when its set of
//! gesture labels differs from the last emitted one. Timing follows frame
//! timestamps, not the wall clock.

use std::collections::BTreeSet;
use std::time::Duration;

use emo_models::{
    GestureLabel, LandmarkSnapshot, Moment, MomentKind, SamplingWarning, SignificanceScore,
    StressAssessment, WarningKind,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::config::{DistanceMetric, SamplerConfig};
use super::significance::{self, PersonBaselines};
use super::SelectedMoment;
use crate::downscale::prepare_for_interpretation;
use crate::error::{MediaError, MediaResult};
use crate::gestures;
use crate::landmarks::LandmarkExtractor;
use crate::metrics;
use crate::source::Frame;

/// Configuration for the live gate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LiveGateConfig {
    pub threshold: f64,
    /// Minimum time between score-triggered emissions
    pub cooldown: Duration,
    /// Emissions per session
    pub max_moments: usize,
    pub reference_scale: f64,
    pub distance_metric: DistanceMetric,
    pub target_resolution: (u32, u32),
}

impl Default for LiveGateConfig {
    fn default() -> Self {
        Self::from_sampler(&SamplerConfig::default())
    }
}

impl LiveGateConfig {
    /// Share thresholds and scaling with a sampler configuration.
    pub fn from_sampler(config: &SamplerConfig) -> Self {
        Self {
            threshold: config.threshold,
            cooldown: Duration::from_secs(5),
            max_moments: config.max_moments,
            reference_scale: config.reference_scale,
            distance_metric: config.distance_metric,
            target_resolution: config.target_resolution,
        }
    }

    pub fn with_cooldown(mut self, cooldown: Duration) -> Self {
        self.cooldown = cooldown;
        self
    }
}

/// Stateful gate over a live stream of frames.
pub struct LiveGate {
    config: LiveGateConfig,
    baselines: PersonBaselines,
    last_emit_at: Option<f64>,
    last_labels: Option<BTreeSet<String>>,
    emitted: usize,
    budget_exceeded: bool,
    warnings: Vec<SamplingWarning>,
}

impl LiveGate {
    pub fn new(config: LiveGateConfig) -> Self {
        Self {
            config,
            baselines: PersonBaselines::new(),
            last_emit_at: None,
            last_labels: None,
            emitted: 0,
            budget_exceeded: false,
            warnings: Vec::new(),
        }
    }

    pub fn emitted(&self) -> usize {
        self.emitted
    }

    pub fn budget_exceeded(&self) -> bool {
        self.budget_exceeded
    }

    pub fn warnings(&self) -> &[SamplingWarning] {
        &self.warnings
    }

    pub fn take_warnings(&mut self) -> Vec<SamplingWarning> {
        std::mem::take(&mut self.warnings)
    }

    /// Offer one frame. Returns the moment if the frame passed the gate.
    pub fn push<E: LandmarkExtractor + ?Sized>(
        &mut self,
        frame: &Frame,
        extractor: &mut E,
    ) -> MediaResult<Option<SelectedMoment>> {
        metrics::record_frame_examined();

        let persons = match extractor.extract(frame) {
            Ok(Some(persons)) => persons,
            Ok(None) => {
                self.skip(frame, WarningKind::NoFace, "no face detected");
                return Ok(None);
            }
            Err(MediaError::Cancelled) => return Err(MediaError::Cancelled),
            Err(e) => {
                warn!(frame_index = frame.index, error = %e, "Live landmark extraction failed");
                self.skip(frame, WarningKind::ExtractionFailed, e.to_string());
                return Ok(None);
            }
        };

        let snapshot = LandmarkSnapshot::new(frame.index, frame.timestamp, persons);
        let score = significance::score(
            &self.baselines,
            &snapshot,
            self.config.distance_metric,
            self.config.reference_scale,
        );
        let labels = gestures::classify(&snapshot);
        let stress = gestures::stress::assess(&snapshot);
        self.baselines.update(&snapshot);

        let label_set: BTreeSet<String> = labels.iter().map(|l| l.label.clone()).collect();
        let labels_changed = self.last_labels.as_ref() != Some(&label_set);
        let cooled_down = self
            .last_emit_at
            .map_or(true, |t| frame.timestamp - t >= self.config.cooldown.as_secs_f64());
        let spike = score.meets(self.config.threshold) && cooled_down;

        if !(spike || labels_changed) {
            return Ok(None);
        }
        if self.emitted >= self.config.max_moments {
            if !self.budget_exceeded {
                debug!(frame_index = frame.index, "Live moment budget exhausted");
            }
            self.budget_exceeded = true;
            return Ok(None);
        }

        Ok(Some(self.emit(frame, score, labels, label_set, stress)))
    }

    fn emit(
        &mut self,
        frame: &Frame,
        score: SignificanceScore,
        labels: Vec<GestureLabel>,
        label_set: BTreeSet<String>,
        stress: Option<StressAssessment>,
    ) -> SelectedMoment {
        self.emitted += 1;
        self.last_emit_at = Some(frame.timestamp);
        self.last_labels = Some(label_set);
        metrics::record_moment_selected("live");

        let payload = match prepare_for_interpretation(&frame.image, self.config.target_resolution)
        {
            Ok(payload) => Some(payload),
            Err(e) => {
                warn!(frame_index = frame.index, error = %e, "Failed to encode live payload");
                None
            }
        };
        debug!(
            frame_index = frame.index,
            significance = %score,
            labels = labels.len(),
            "Live moment emitted"
        );

        SelectedMoment {
            moment: Moment::new(
                frame.index,
                frame.timestamp,
                score,
                MomentKind::Significant,
                labels,
            )
            .with_stress(stress),
            payload,
        }
    }

    fn skip(&mut self, frame: &Frame, kind: WarningKind, message: impl Into<String>) {
        metrics::record_frame_skipped(kind.as_str());
        self.warnings
            .push(SamplingWarning::new(frame.index, frame.timestamp, kind, message));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::landmarks::EmbeddedLandmarks;
    use emo_models::{PersonLandmarks, Point3};
    use image::DynamicImage;

    fn frame(index: u64, timestamp: f64, offset: Option<f64>) -> Frame {
        let frame = Frame::new(index, timestamp, DynamicImage::new_rgb8(8, 8));
        match offset {
            Some(offset) => frame.with_landmarks(vec![PersonLandmarks::new(
                0,
                (0..4).map(|i| Point3::new(0.1 * i as f64 + offset, 0.5, 0.0)).collect(),
            )]),
            None => frame,
        }
    }

    #[test]
    fn test_first_face_emits_then_steady_holds() {
        let mut gate = LiveGate::new(LiveGateConfig::default());
        let mut extractor = EmbeddedLandmarks;

        assert!(gate.push(&frame(0, 0.0, Some(0.0)), &mut extractor).unwrap().is_some());
        assert!(gate.push(&frame(1, 0.1, Some(0.0)), &mut extractor).unwrap().is_none());
        assert_eq!(gate.emitted(), 1);
    }

    #[test]
    fn test_cooldown_blocks_spikes() {
        let mut gate = LiveGate::new(LiveGateConfig::default());
        let mut extractor = EmbeddedLandmarks;

        gate.push(&frame(0, 0.0, Some(0.0)), &mut extractor).unwrap();
        // Large jump within the cooldown window
        assert!(gate.push(&frame(1, 1.0, Some(0.1)), &mut extractor).unwrap().is_none());
        // Another jump after the cooldown
        let moment = gate
            .push(&frame(2, 6.0, Some(0.2)), &mut extractor)
            .unwrap()
            .unwrap();
        assert_eq!(moment.moment.significance, SignificanceScore::MAX);
        assert!(moment.payload.is_some());
    }

    #[test]
    fn test_no_face_recorded_and_budget_capped() {
        let config = LiveGateConfig {
            max_moments: 1,
            ..Default::default()
        }
        .with_cooldown(Duration::ZERO);
        let mut gate = LiveGate::new(config);
        let mut extractor = EmbeddedLandmarks;

        assert!(gate.push(&frame(0, 0.0, None), &mut extractor).unwrap().is_none());
        assert_eq!(gate.warnings().len(), 1);
        assert_eq!(gate.warnings()[0].kind, WarningKind::NoFace);

        assert!(gate.push(&frame(1, 0.1, Some(0.0)), &mut extractor).unwrap().is_some());
        assert!(gate.push(&frame(2, 0.2, Some(0.3)), &mut extractor).unwrap().is_none());
        assert!(gate.budget_exceeded());
        assert_eq!(gate.take_warnings().len(), 1);
        assert!(gate.warnings().is_empty());
    }
}
