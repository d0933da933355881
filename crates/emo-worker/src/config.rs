//! Worker configuration.

use std::time::Duration;

use emo_media::{DistanceMetric, SamplerConfig};

use crate::error::{WorkerError, WorkerResult};

/// Session configuration.
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    /// Sampler settings
    pub sampler: SamplerConfig,
    /// Interpretation calls in flight at once
    pub max_inflight: usize,
    /// Timeout for each interpretation attempt
    pub interpretation_timeout: Duration,
    /// Retries for retryable interpretation errors (not including the first attempt)
    pub max_retries: u32,
    /// Base delay for retry backoff
    pub retry_base_delay: Duration,
    /// Scenario text passed to the vision model (e.g. "job interview")
    pub scenario: Option<String>,
    /// Minimum time between score-triggered live emissions
    pub live_cooldown: Duration,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            sampler: SamplerConfig::default(),
            max_inflight: 3,
            interpretation_timeout: Duration::from_secs(30),
            max_retries: 2,
            retry_base_delay: Duration::from_millis(500),
            scenario: None,
            live_cooldown: Duration::from_secs(5),
        }
    }
}

impl WorkerConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        // Individual EMO_* settings override the preset
        let defaults = std::env::var("EMO_SAMPLER_PRESET")
            .ok()
            .and_then(|s| sampler_preset(&s))
            .unwrap_or_default();
        let sampler = SamplerConfig {
            threshold: env_parse("EMO_THRESHOLD").unwrap_or(defaults.threshold),
            max_moments: env_parse("EMO_MAX_MOMENTS").unwrap_or(defaults.max_moments),
            max_duration_minutes: env_parse("EMO_MAX_DURATION_MINUTES")
                .unwrap_or(defaults.max_duration_minutes),
            long_sample_interval_secs: env_parse("EMO_LONG_SAMPLE_INTERVAL_SECS")
                .unwrap_or(defaults.long_sample_interval_secs),
            max_examined_frames: env_parse("EMO_MAX_EXAMINED_FRAMES")
                .unwrap_or(defaults.max_examined_frames),
            reference_scale: env_parse("EMO_REFERENCE_SCALE").unwrap_or(defaults.reference_scale),
            distance_metric: std::env::var("EMO_DISTANCE_METRIC")
                .ok()
                .and_then(|s| parse_distance_metric(&s))
                .unwrap_or(defaults.distance_metric),
            max_processing_time: env_parse::<u64>("EMO_MAX_PROCESSING_SECS")
                .map(Duration::from_secs),
            ..defaults
        };

        Self {
            sampler,
            max_inflight: env_parse("EMO_MAX_INFLIGHT").unwrap_or(3),
            interpretation_timeout: Duration::from_secs(
                env_parse("EMO_INTERPRET_TIMEOUT_SECS").unwrap_or(30),
            ),
            max_retries: env_parse("EMO_INTERPRET_MAX_RETRIES").unwrap_or(2),
            retry_base_delay: Duration::from_millis(
                env_parse("EMO_INTERPRET_RETRY_DELAY_MS").unwrap_or(500),
            ),
            scenario: std::env::var("EMO_SCENARIO")
                .ok()
                .filter(|s| !s.trim().is_empty()),
            live_cooldown: Duration::from_secs(env_parse("EMO_LIVE_COOLDOWN_SECS").unwrap_or(5)),
        }
    }

    pub fn with_scenario(mut self, scenario: impl Into<String>) -> Self {
        self.scenario = Some(scenario.into());
        self
    }

    pub fn validate(&self) -> WorkerResult<()> {
        self.sampler
            .validate()
            .map_err(|e| WorkerError::config_error(e.to_string()))?;
        if self.max_inflight == 0 {
            return Err(WorkerError::config_error("max_inflight must be at least 1"));
        }
        if self.interpretation_timeout.is_zero() {
            return Err(WorkerError::config_error(
                "interpretation_timeout must be positive",
            ));
        }
        Ok(())
    }
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|s| s.trim().parse().ok())
}

fn sampler_preset(raw: &str) -> Option<SamplerConfig> {
    match raw.trim().to_lowercase().as_str() {
        "default" => Some(SamplerConfig::default()),
        "conservative" => Some(SamplerConfig::conservative()),
        "thorough" => Some(SamplerConfig::thorough()),
        _ => None,
    }
}

fn parse_distance_metric(raw: &str) -> Option<DistanceMetric> {
    match raw.trim().to_lowercase().as_str() {
        "key_landmarks" | "key" => Some(DistanceMetric::KeyLandmarks),
        "all_points" | "all" => Some(DistanceMetric::AllPoints),
        _ => None,
    }
}
