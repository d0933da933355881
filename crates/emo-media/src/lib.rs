//! Landmark-driven frame sampling for emotion analysis.
//!
//! This crate provides:
//! - Frame sources over in-memory frames and image sequences
//! - Landmark extraction seams for the external face/pose model
//! - The frame significance sampler and the live gate
//! - Rule-based gesture classification and stress estimates on face and pose landmarks
//! - Downscaling of selected frames for interpretation
//! - Timeline aggregation and JSON export

pub mod cancel;
pub mod downscale;
pub mod error;
pub mod gestures;
pub mod landmarks;
pub mod metrics;
pub mod sampler;
pub mod source;
pub mod timeline;

pub use cancel::CancelFlag;
pub use downscale::{fit_within, prepare_for_interpretation};
pub use error::{MediaError, MediaResult};
pub use landmarks::{EmbeddedLandmarks, LandmarkExtractor, PrecomputedExtractor};
pub use sampler::live::{LiveGate, LiveGateConfig};
pub use sampler::{
    DistanceMetric, FrameSignificanceSampler, SamplerConfig, SamplingOutcome, SelectedMoment,
};
pub use source::{Frame, FrameSource, ImageSequenceSource, MemoryFrameSource, StreamInfo};
pub use timeline::{dominant_emotions, TimelineAggregator, TimelineExporter};
