//! Analysis session orchestration.
//!
//! This crate provides:
//! - `AnalysisSession`: sampler on a blocking thread, bounded-concurrency
//!   interpretation, timeline aggregation
//! - `LiveSession` for frames pushed from a webcam
//! - Cancellation handles, retry utilities and structured session logging

pub mod config;
pub mod error;
pub mod interpretation;
pub mod live;
pub mod logging;
pub mod metrics;
pub mod retry;
pub mod session;

pub use config::WorkerConfig;
pub use error::{WorkerError, WorkerResult};
pub use interpretation::{InterpretationStage, StageOutput};
pub use live::LiveSession;
pub use logging::SessionLogger;
pub use session::{AnalysisSession, SessionHandle};
