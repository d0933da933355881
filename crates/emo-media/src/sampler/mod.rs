//! Frame significance sampler.
//!
//! Decides which frames of an input are worth a remote interpretation call.
//! One sequential pass per input:
//!
//! 1. Plan the stride and reserve the start/middle/end anchors
//! 2. Extract landmarks for examined frames only
//! 3. Score each person against where they were last seen
//! 4. Feed the score to the selection state machine
//! 5. Downscale and encode the frames that were selected
//!
//! Frames without a face and per-frame extraction failures are absorbed into
//! warnings. A failing source aborts the pass.
//!
//! # Usage
//! ```rust,ignore
//! use emo_media::{CancelFlag, FrameSignificanceSampler, ImageSequenceSource, PrecomputedExtractor, SamplerConfig};
//!
//! let sampler = FrameSignificanceSampler::new(SamplerConfig::default())?;
//! let source = ImageSequenceSource::open("frames/", 30.0)?;
//! let mut extractor = PrecomputedExtractor::from_json_file("landmarks.json")?;
//! let outcome = sampler.run(source, &mut extractor, &CancelFlag::new())?;
//! ```

mod config;
pub mod live;
mod plan;
pub mod significance;
mod state;

#[cfg(test)]
mod tests;

use std::time::Instant;

use emo_models::{
    AnchorKind, GestureLabel, LandmarkSnapshot, Moment, MomentKind, PreparedImage, SamplingStats,
    SamplingWarning, SignificanceScore, StressAssessment, WarningKind,
};
use tracing::{debug, info, warn};

pub use config::{DistanceMetric, SamplerConfig};
pub use plan::{compute_stride, reserve_anchors, AnchorSlot, ScanPlan};
pub use state::{SelectionState, Selector};

use crate::cancel::CancelFlag;
use crate::downscale::prepare_for_interpretation;
use crate::error::{MediaError, MediaResult};
use crate::gestures;
use crate::landmarks::LandmarkExtractor;
use crate::metrics;
use crate::source::{Frame, FrameSource};
use significance::PersonBaselines;

/// A selected moment and its encoded frame.
#[derive(Debug, Clone)]
pub struct SelectedMoment {
    pub moment: Moment,
    /// Downscaled JPEG; `None` if encoding failed
    pub payload: Option<PreparedImage>,
}

/// Result of one sampling pass.
#[derive(Debug, Clone, Default)]
pub struct SamplingOutcome {
    /// Selected moments in frame order
    pub moments: Vec<SelectedMoment>,
    /// Frames skipped during the scan
    pub warnings: Vec<SamplingWarning>,
    /// Qualifying frames were refused or the time budget ran out
    pub budget_exceeded: bool,
    pub stats: SamplingStats,
}

impl SamplingOutcome {
    pub fn moment_count(&self) -> usize {
        self.moments.len()
    }

    /// Frame indices of the selected moments.
    pub fn frame_indices(&self) -> Vec<u64> {
        self.moments.iter().map(|m| m.moment.frame_index).collect()
    }

    pub fn into_moments(self) -> Vec<Moment> {
        self.moments.into_iter().map(|m| m.moment).collect()
    }
}

/// Selects significant frames from a stream of frames.
#[derive(Debug, Clone)]
pub struct FrameSignificanceSampler {
    config: SamplerConfig,
}

impl FrameSignificanceSampler {
    /// Create a sampler. Fails if the configuration is out of range.
    pub fn new(config: SamplerConfig) -> MediaResult<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &SamplerConfig {
        &self.config
    }

    /// Scan `source` once and select moments.
    ///
    /// The source is consumed; it is dropped when the pass returns on any path.
    /// A source reporting a non-positive frame rate is rejected before any
    /// frame is read.
    pub fn run<S, E>(
        &self,
        mut source: S,
        extractor: &mut E,
        cancel: &CancelFlag,
    ) -> MediaResult<SamplingOutcome>
    where
        S: FrameSource,
        E: LandmarkExtractor + ?Sized,
    {
        let info = source.info();
        info.validate()?;
        let plan = ScanPlan::new(&info, &self.config);
        let mut selector = Selector::new(
            self.config.threshold,
            plan.spike_budget(self.config.max_moments),
        );
        let mut pass = SamplingPass::new(&self.config, info.frame_count, plan.stride);
        let started = Instant::now();

        info!(
            frame_count = info.frame_count,
            fps = info.fps,
            stride = plan.stride,
            anchors = plan.anchors.len(),
            threshold = self.config.threshold,
            max_moments = self.config.max_moments,
            "Starting sampling pass"
        );

        for position in 0..info.frame_count {
            cancel.check()?;

            if let Some(limit) = self.config.max_processing_time {
                if !selector.is_exhausted() && started.elapsed() >= limit {
                    warn!(
                        position,
                        state = selector.state().name(),
                        elapsed_ms = started.elapsed().as_millis() as u64,
                        "Processing time budget exhausted, examining anchors only"
                    );
                    selector.time_exhausted();
                }
            }

            if selector.state() == &SelectionState::BudgetExhausted
                && !plan.has_anchor_from(position)
            {
                debug!(position, "No anchors left to examine, ending scan");
                break;
            }

            let anchor = plan.anchor_at(position);
            if !selector.should_examine(anchor.is_some(), plan.on_stride(position)) {
                if !source.skip_frame()? {
                    break;
                }
                continue;
            }

            let Some(frame) = source.next_frame()? else {
                break;
            };
            pass.examine(frame, anchor, extractor, &mut selector)?;
        }

        debug!(state = selector.state().name(), "Scan finished");
        if let Some(kind) = selector.finish() {
            pass.promote_pending(kind);
        }

        let outcome = pass.finish(selector.budget_exceeded());
        info!(
            moments = outcome.moments.len(),
            frames_examined = outcome.stats.frames_examined,
            frames_skipped = outcome.stats.frames_skipped,
            budget_exceeded = outcome.budget_exceeded,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Sampling pass complete"
        );
        Ok(outcome)
    }
}

/// Last examined frame that had a face, kept for end-anchor promotion.
struct LastValid {
    frame: Frame,
    score: SignificanceScore,
    labels: Vec<GestureLabel>,
    stress: Option<StressAssessment>,
    selected: bool,
}

/// Mutable state of one pass.
struct SamplingPass<'a> {
    config: &'a SamplerConfig,
    baselines: PersonBaselines,
    last_valid: Option<LastValid>,
    moments: Vec<SelectedMoment>,
    warnings: Vec<SamplingWarning>,
    stats: SamplingStats,
}

impl<'a> SamplingPass<'a> {
    fn new(config: &'a SamplerConfig, frames_total: u64, stride: u64) -> Self {
        Self {
            config,
            baselines: PersonBaselines::new(),
            last_valid: None,
            moments: Vec::new(),
            warnings: Vec::new(),
            stats: SamplingStats {
                frames_total,
                stride,
                ..Default::default()
            },
        }
    }

    fn examine<E: LandmarkExtractor + ?Sized>(
        &mut self,
        frame: Frame,
        anchor: Option<AnchorKind>,
        extractor: &mut E,
        selector: &mut Selector,
    ) -> MediaResult<()> {
        self.stats.frames_examined += 1;
        metrics::record_frame_examined();

        let persons = match extractor.extract(&frame) {
            Ok(Some(persons)) => persons,
            Ok(None) => {
                debug!(frame_index = frame.index, "No face detected, skipping frame");
                self.skip(&frame, WarningKind::NoFace, "no face detected");
                selector.frame_skipped(anchor);
                return Ok(());
            }
            Err(MediaError::Cancelled) => return Err(MediaError::Cancelled),
            Err(e) => {
                warn!(frame_index = frame.index, error = %e, "Landmark extraction failed, skipping frame");
                self.skip(&frame, WarningKind::ExtractionFailed, e.to_string());
                selector.frame_skipped(anchor);
                return Ok(());
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

        let selected = match selector.frame_scored(anchor, score) {
            Some(kind) => {
                self.select(&frame, score, kind, labels.clone(), stress.clone());
                true
            }
            None => false,
        };

        self.baselines.update(&snapshot);
        self.last_valid = Some(LastValid {
            frame,
            score,
            labels,
            stress,
            selected,
        });
        Ok(())
    }

    fn skip(&mut self, frame: &Frame, kind: WarningKind, message: impl Into<String>) {
        self.stats.frames_skipped += 1;
        metrics::record_frame_skipped(kind.as_str());
        self.warnings
            .push(SamplingWarning::new(frame.index, frame.timestamp, kind, message));
    }

    fn select(
        &mut self,
        frame: &Frame,
        score: SignificanceScore,
        kind: MomentKind,
        labels: Vec<GestureLabel>,
        stress: Option<StressAssessment>,
    ) {
        let payload = match prepare_for_interpretation(&frame.image, self.config.target_resolution)
        {
            Ok(payload) => Some(payload),
            Err(e) => {
                warn!(frame_index = frame.index, error = %e, "Failed to encode moment payload");
                None
            }
        };

        let kind_name = match kind {
            MomentKind::Anchor(anchor) => anchor.as_str(),
            MomentKind::Significant => "significant",
        };
        metrics::record_moment_selected(kind_name);
        debug!(
            frame_index = frame.index,
            timestamp = frame.timestamp,
            significance = %score,
            kind = kind_name,
            labels = labels.len(),
            "Selected moment"
        );

        self.moments.push(SelectedMoment {
            moment: Moment::new(frame.index, frame.timestamp, score, kind, labels)
                .with_stress(stress),
            payload,
        });
    }

    /// Place an anchor that never found a frame with a face after its position.
    fn promote_pending(&mut self, kind: AnchorKind) {
        if kind != AnchorKind::End {
            debug!(anchor = %kind, "Dropping anchor with no later frame containing a face");
            return;
        }
        let Some(last) = self.last_valid.take() else {
            debug!("No frame with a face to carry the end anchor");
            return;
        };
        if last.selected {
            debug!(
                frame_index = last.frame.index,
                "Last frame with a face is already a moment, dropping end anchor"
            );
            return;
        }
        self.select(
            &last.frame,
            last.score,
            MomentKind::Anchor(AnchorKind::End),
            last.labels,
            last.stress,
        );
    }

    fn finish(self, budget_exceeded: bool) -> SamplingOutcome {
        SamplingOutcome {
            moments: self.moments,
            warnings: self.warnings,
            budget_exceeded,
            stats: self.stats,
        }
    }
}
