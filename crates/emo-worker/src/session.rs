//! Analysis session: sampling, interpretation, aggregation.

use std::sync::Arc;

use emo_media::{
    CancelFlag, FrameSignificanceSampler, FrameSource, LandmarkExtractor, TimelineAggregator,
};
use emo_models::{AnalysisReport, SessionId};
use emo_vision_client::InterpretationClient;
use tracing::Instrument;

use crate::config::WorkerConfig;
use crate::error::{WorkerError, WorkerResult};
use crate::interpretation::InterpretationStage;
use crate::logging::SessionLogger;
use crate::metrics;

/// Cancels a running session from another task.
#[derive(Debug, Clone)]
pub struct SessionHandle {
    session_id: SessionId,
    cancel: CancelFlag,
}

impl SessionHandle {
    pub(crate) fn new(session_id: SessionId, cancel: CancelFlag) -> Self {
        Self { session_id, cancel }
    }

    pub fn session_id(&self) -> &SessionId {
        &self.session_id
    }

    /// Stop the session. The sampler aborts at its next frame and no new
    /// interpretation calls are issued.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }
}

/// One analysis of one input.
pub struct AnalysisSession {
    session_id: SessionId,
    config: WorkerConfig,
    sampler: FrameSignificanceSampler,
    stage: InterpretationStage,
    cancel: CancelFlag,
    logger: SessionLogger,
}

impl AnalysisSession {
    pub fn new(config: WorkerConfig, client: Arc<dyn InterpretationClient>) -> WorkerResult<Self> {
        Self::with_id(SessionId::new(), config, client)
    }

    pub fn with_id(
        session_id: SessionId,
        config: WorkerConfig,
        client: Arc<dyn InterpretationClient>,
    ) -> WorkerResult<Self> {
        config.validate()?;
        let sampler = FrameSignificanceSampler::new(config.sampler.clone())?;
        let stage = InterpretationStage::new(client, &config);
        let logger = SessionLogger::new(&session_id, "video_analysis");
        Ok(Self {
            session_id,
            config,
            sampler,
            stage,
            cancel: CancelFlag::new(),
            logger,
        })
    }

    pub fn session_id(&self) -> &SessionId {
        &self.session_id
    }

    pub fn config(&self) -> &WorkerConfig {
        &self.config
    }

    pub fn handle(&self) -> SessionHandle {
        SessionHandle::new(self.session_id.clone(), self.cancel.clone())
    }

    /// Run the session to completion.
    ///
    /// The sampler runs on a blocking thread; the source and extractor are
    /// moved there and dropped when it finishes.
    pub async fn run<S, E>(&self, source: S, extractor: E) -> WorkerResult<AnalysisReport>
    where
        S: FrameSource + 'static,
        E: LandmarkExtractor + 'static,
    {
        let span = self.logger.create_span();
        let result = self.run_inner(source, extractor).instrument(span).await;

        match &result {
            Ok(report) => {
                metrics::record_session("completed");
                self.logger.log_completion(&format!(
                    "{} moments, {} warnings",
                    report.timeline.len(),
                    report.warnings.len()
                ));
            }
            Err(WorkerError::Cancelled) => {
                metrics::record_session("cancelled");
                self.logger.log_warning("cancelled");
            }
            Err(e) => {
                metrics::record_session("failed");
                self.logger.log_error(&e.to_string());
            }
        }
        result
    }

    async fn run_inner<S, E>(&self, source: S, mut extractor: E) -> WorkerResult<AnalysisReport>
    where
        S: FrameSource + 'static,
        E: LandmarkExtractor + 'static,
    {
        self.logger.log_start(&format!(
            "threshold={} max_moments={} max_inflight={}",
            self.config.sampler.threshold, self.config.sampler.max_moments, self.config.max_inflight
        ));
        self.cancel.check()?;

        let sampler = self.sampler.clone();
        let cancel = self.cancel.clone();
        let outcome = tokio::task::spawn_blocking(move || {
            sampler.run(source, &mut extractor, &cancel)
        })
        .await
        .map_err(|e| WorkerError::task_failed(format!("Sampler task failed: {}", e)))??;

        self.logger.log_progress(&format!(
            "sampled {} moments from {} examined frames",
            outcome.moments.len(),
            outcome.stats.frames_examined
        ));

        let budget_exceeded = outcome.budget_exceeded;
        let stats = outcome.stats;
        let mut warnings = outcome.warnings;

        let interpreted = self.stage.run(outcome.moments, &self.cancel).await?;
        warnings.extend(interpreted.warnings);

        let timeline = TimelineAggregator::default().aggregate(interpreted.moments, budget_exceeded);
        Ok(AnalysisReport::new(
            self.session_id.clone(),
            timeline,
            warnings,
            stats,
        ))
    }
}
