//! Sampler configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{MediaError, MediaResult};

/// How landmark change between two snapshots is measured.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DistanceMetric {
    /// Mean distance over mouth, brow, eye, nose and jaw landmarks
    #[default]
    KeyLandmarks,
    /// Mean distance over every point both snapshots share
    AllPoints,
}

impl DistanceMetric {
    pub fn as_str(&self) -> &'static str {
        match self {
            DistanceMetric::KeyLandmarks => "key_landmarks",
            DistanceMetric::AllPoints => "all_points",
        }
    }
}

/// Configuration for the frame significance sampler.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SamplerConfig {
    /// Minimum significance score for a moment (0.0-1.0, inclusive)
    pub threshold: f64,

    /// Maximum moments per input, anchors included
    pub max_moments: usize,

    /// Inputs up to this length are scanned densely
    pub max_duration_minutes: u32,

    /// Stride for dense scans
    pub dense_stride: u64,

    /// Seconds between examined frames on long inputs
    pub long_sample_interval_secs: f64,

    /// Upper bound on frames run through the extractor
    pub max_examined_frames: u64,

    /// Landmark distance that maps to a score of 1.0
    pub reference_scale: f64,

    pub distance_metric: DistanceMetric,

    /// Bounding box (width, height) for interpretation payloads
    pub target_resolution: (u32, u32),

    /// Wall-clock budget for the scan; when it elapses only anchors are examined
    pub max_processing_time: Option<Duration>,
}

impl Default for SamplerConfig {
    fn default() -> Self {
        Self {
            threshold: 0.3,
            max_moments: 10,
            max_duration_minutes: 3,
            dense_stride: 1,
            long_sample_interval_secs: 2.0,
            max_examined_frames: 900,
            reference_scale: 0.05,
            distance_metric: DistanceMetric::KeyLandmarks,
            target_resolution: (640, 480),
            max_processing_time: None,
        }
    }
}

impl SamplerConfig {
    /// Fewer, more pronounced moments; cheaper on interpretation calls.
    pub fn conservative() -> Self {
        Self {
            threshold: 0.5,
            max_moments: 6,
            ..Default::default()
        }
    }

    /// More moments at a lower threshold.
    pub fn thorough() -> Self {
        Self {
            threshold: 0.2,
            max_moments: 20,
            max_examined_frames: 1800,
            ..Default::default()
        }
    }

    /// Check value ranges.
    pub fn validate(&self) -> MediaResult<()> {
        if !(0.0..=1.0).contains(&self.threshold) {
            return Err(MediaError::invalid_config(format!(
                "threshold must be within [0, 1], got {}",
                self.threshold
            )));
        }
        if self.max_moments == 0 {
            return Err(MediaError::invalid_config("max_moments must be at least 1"));
        }
        if self.dense_stride == 0 {
            return Err(MediaError::invalid_config("dense_stride must be at least 1"));
        }
        if self.long_sample_interval_secs.is_nan() || self.long_sample_interval_secs <= 0.0 {
            return Err(MediaError::invalid_config(
                "long_sample_interval_secs must be positive",
            ));
        }
        if self.max_examined_frames == 0 {
            return Err(MediaError::invalid_config(
                "max_examined_frames must be at least 1",
            ));
        }
        if self.reference_scale.is_nan() || self.reference_scale <= 0.0 {
            return Err(MediaError::invalid_config("reference_scale must be positive"));
        }
        let (w, h) = self.target_resolution;
        if w == 0 || h == 0 {
            return Err(MediaError::invalid_config(format!(
                "target_resolution must be non-zero, got {}x{}",
                w, h
            )));
        }
        Ok(())
    }
}
