//! Interpretation stage: send selected moments to the vision model.
//!
//! Calls run with bounded concurrency and results come back in input order,
//! whatever order the calls complete in. Each attempt has its own timeout;
//! retryable errors are retried with backoff. A moment whose interpretation
//! fails is kept with a placeholder text and a warning.

use std::sync::Arc;
use std::time::{Duration, Instant};

use emo_media::{CancelFlag, SelectedMoment};
use emo_models::{Moment, SamplingWarning, WarningKind};
use emo_vision_client::{moment_context, ClientError, InterpretationClient};
use futures::stream::{self, StreamExt};
use tracing::{debug, warn};

use crate::config::WorkerConfig;
use crate::error::{WorkerError, WorkerResult};
use crate::metrics::{self, InterpretationOutcome};
use crate::retry::{retry_async, RetryConfig};

/// Moments after interpretation, with the warnings raised on the way.
#[derive(Debug, Default)]
pub struct StageOutput {
    pub moments: Vec<Moment>,
    pub warnings: Vec<SamplingWarning>,
}

/// Result of interpreting one moment.
#[derive(Debug)]
pub struct InterpretedMoment {
    pub moment: Moment,
    pub warning: Option<SamplingWarning>,
    pub outcome: InterpretationOutcome,
}

/// Runs interpretation calls for a session.
#[derive(Clone)]
pub struct InterpretationStage {
    client: Arc<dyn InterpretationClient>,
    max_inflight: usize,
    timeout: Duration,
    retry: RetryConfig,
    scenario: Option<String>,
}

impl InterpretationStage {
    pub fn new(client: Arc<dyn InterpretationClient>, config: &WorkerConfig) -> Self {
        Self {
            client,
            max_inflight: config.max_inflight.max(1),
            timeout: config.interpretation_timeout,
            retry: RetryConfig::new("interpret_moment")
                .with_max_retries(config.max_retries)
                .with_base_delay(config.retry_base_delay),
            scenario: config.scenario.clone(),
        }
    }

    /// Interpret all moments, preserving their order.
    ///
    /// Once `cancel` is set no further calls are issued and the stage
    /// returns [`WorkerError::Cancelled`].
    pub async fn run(
        &self,
        selected: Vec<SelectedMoment>,
        cancel: &CancelFlag,
    ) -> WorkerResult<StageOutput> {
        debug!(
            moments = selected.len(),
            max_inflight = self.max_inflight,
            client = self.client.name(),
            "Starting interpretation stage"
        );

        let results: Vec<InterpretedMoment> = stream::iter(selected)
            .map(|selected| self.interpret_one(selected, cancel))
            .buffered(self.max_inflight)
            .collect()
            .await;

        if cancel.is_cancelled() {
            return Err(WorkerError::Cancelled);
        }

        let mut output = StageOutput::default();
        for result in results {
            output.warnings.extend(result.warning);
            output.moments.push(result.moment);
        }
        Ok(output)
    }

    /// Interpret a single moment. Never fails; failures are recorded on the moment.
    pub async fn interpret_one(
        &self,
        selected: SelectedMoment,
        cancel: &CancelFlag,
    ) -> InterpretedMoment {
        let SelectedMoment {
            mut moment,
            payload,
        } = selected;
        let started = Instant::now();

        if cancel.is_cancelled() {
            metrics::record_interpretation(InterpretationOutcome::Skipped, started.elapsed());
            return InterpretedMoment {
                moment,
                warning: None,
                outcome: InterpretationOutcome::Skipped,
            };
        }

        let Some(image) = payload else {
            let message = "frame payload unavailable";
            moment.attach_failure(message);
            metrics::record_interpretation(InterpretationOutcome::Skipped, started.elapsed());
            let warning = SamplingWarning::new(
                moment.frame_index,
                moment.timestamp,
                WarningKind::InterpretationFailed,
                message,
            );
            return InterpretedMoment {
                moment,
                warning: Some(warning),
                outcome: InterpretationOutcome::Skipped,
            };
        };

        let gesture_labels: Vec<String> = moment.labels.iter().map(|l| l.label.clone()).collect();
        let context = moment_context(self.scenario.as_deref(), &gesture_labels);
        let (client, image, context) = (&self.client, &image, context.as_str());
        let timeout = self.timeout;

        let result = retry_async(
            &self.retry,
            || async move {
                match tokio::time::timeout(timeout, client.interpret(image, context)).await {
                    Ok(result) => result,
                    Err(_) => Err(ClientError::Timeout(timeout)),
                }
            },
            |e: &ClientError| e.is_retryable() && !cancel.is_cancelled(),
        )
        .await;
        let attempts = result.attempts();

        match result.into_result() {
            Ok(interpretation) => {
                moment.attach_interpretation(interpretation);
                metrics::record_interpretation(InterpretationOutcome::Success, started.elapsed());
                debug!(
                    frame_index = moment.frame_index,
                    attempts,
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "Moment interpreted"
                );
                InterpretedMoment {
                    moment,
                    warning: None,
                    outcome: InterpretationOutcome::Success,
                }
            }
            Err(e) => {
                let (kind, outcome) = match e {
                    ClientError::Timeout(_) => (
                        WarningKind::InterpretationTimeout,
                        InterpretationOutcome::Timeout,
                    ),
                    _ => (
                        WarningKind::InterpretationFailed,
                        InterpretationOutcome::Failed,
                    ),
                };
                warn!(
                    frame_index = moment.frame_index,
                    attempts,
                    error = %e,
                    "Interpretation failed, keeping moment with placeholder"
                );
                metrics::record_interpretation(outcome, started.elapsed());
                moment.attach_failure(e.to_string());
                let warning = SamplingWarning::new(
                    moment.frame_index,
                    moment.timestamp,
                    kind,
                    e.to_string(),
                );
                InterpretedMoment {
                    moment,
                    warning: Some(warning),
                    outcome,
                }
            }
        }
    }
}
