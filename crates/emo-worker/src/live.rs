//! Live session over webcam frames.
//!
//! Frames are pushed one at a time. The live gate decides which ones become
//! moments; each emitted moment is interpreted before `push_frame` returns.

use std::sync::Arc;

use emo_media::{CancelFlag, Frame, LandmarkExtractor, LiveGate, LiveGateConfig, TimelineAggregator};
use emo_models::{AnalysisReport, Moment, SamplingStats, SamplingWarning, SessionId};
use emo_vision_client::InterpretationClient;

use crate::config::WorkerConfig;
use crate::error::{WorkerError, WorkerResult};
use crate::interpretation::InterpretationStage;
use crate::logging::SessionLogger;
use crate::metrics::{self, InterpretationOutcome};
use crate::retry::FailureTracker;
use crate::session::SessionHandle;

/// Interpretation failures logged before the rest are suppressed.
const MAX_LOGGED_FAILURES: u32 = 3;

pub struct LiveSession {
    session_id: SessionId,
    gate: LiveGate,
    extractor: Box<dyn LandmarkExtractor>,
    stage: InterpretationStage,
    cancel: CancelFlag,
    logger: SessionLogger,
    failures: FailureTracker,
    moments: Vec<Moment>,
    warnings: Vec<SamplingWarning>,
    frames_seen: u64,
}

impl LiveSession {
    pub fn new(
        config: WorkerConfig,
        client: Arc<dyn InterpretationClient>,
        extractor: Box<dyn LandmarkExtractor>,
    ) -> WorkerResult<Self> {
        config.validate()?;
        let session_id = SessionId::new();
        let gate_config = LiveGateConfig::from_sampler(&config.sampler).with_cooldown(config.live_cooldown);
        let logger = SessionLogger::new(&session_id, "live");
        logger.log_start(&format!("cooldown={:?}", config.live_cooldown));

        Ok(Self {
            session_id,
            gate: LiveGate::new(gate_config),
            extractor,
            stage: InterpretationStage::new(client, &config),
            cancel: CancelFlag::new(),
            logger,
            failures: FailureTracker::new(MAX_LOGGED_FAILURES),
            moments: Vec::new(),
            warnings: Vec::new(),
            frames_seen: 0,
        })
    }

    pub fn session_id(&self) -> &SessionId {
        &self.session_id
    }

    pub fn handle(&self) -> SessionHandle {
        SessionHandle::new(self.session_id.clone(), self.cancel.clone())
    }

    /// Moments emitted so far, in arrival order.
    pub fn moments(&self) -> &[Moment] {
        &self.moments
    }

    /// Offer a frame. Returns the interpreted moment if the gate emitted one.
    pub async fn push_frame(&mut self, frame: Frame) -> WorkerResult<Option<Moment>> {
        self.cancel.check()?;
        self.frames_seen += 1;

        let selected = self.gate.push(&frame, self.extractor.as_mut())?;
        self.warnings.extend(self.gate.take_warnings());
        let Some(selected) = selected else {
            return Ok(None);
        };

        let result = self.stage.interpret_one(selected, &self.cancel).await;
        if self.cancel.is_cancelled() {
            return Err(WorkerError::Cancelled);
        }

        match result.outcome {
            InterpretationOutcome::Success => self.failures.record_success(),
            _ => {
                if self.failures.record_failure() {
                    self.logger.log_warning(&format!(
                        "interpretation failed at frame {}",
                        result.moment.frame_index
                    ));
                }
            }
        }
        self.warnings.extend(result.warning);
        self.moments.push(result.moment.clone());
        Ok(Some(result.moment))
    }

    /// End the session and aggregate everything emitted.
    pub fn finish(self) -> AnalysisReport {
        let skipped = self.warnings.iter().filter(|w| w.kind.is_frame_skip()).count() as u64;
        let stats = SamplingStats {
            frames_total: self.frames_seen,
            frames_examined: self.frames_seen,
            frames_skipped: skipped,
            stride: 1,
        };
        let timeline = TimelineAggregator::default().aggregate(self.moments, self.gate.budget_exceeded());

        metrics::record_session("completed");
        self.logger.log_completion(&format!(
            "{} moments from {} frames",
            timeline.len(),
            self.frames_seen
        ));
        AnalysisReport::new(self.session_id, timeline, self.warnings, stats)
    }
}
