//! Worker error types.

use emo_media::MediaError;
use emo_vision_client::ClientError;
use thiserror::Error;

pub type WorkerResult<T> = Result<T, WorkerError>;

#[derive(Debug, Error)]
pub enum WorkerError {
    #[error("Session cancelled")]
    Cancelled,

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Sampling failed: {0}")]
    Media(MediaError),

    #[error("Vision client error: {0}")]
    Client(#[from] ClientError),

    #[error("Background task failed: {0}")]
    TaskFailed(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

// Cancellation surfaces the same way whichever stage observed it.
impl From<MediaError> for WorkerError {
    fn from(err: MediaError) -> Self {
        match err {
            MediaError::Cancelled => WorkerError::Cancelled,
            other => WorkerError::Media(other),
        }
    }
}

impl WorkerError {
    pub fn config_error(msg: impl Into<String>) -> Self {
        Self::ConfigError(msg.into())
    }

    pub fn task_failed(msg: impl Into<String>) -> Self {
        Self::TaskFailed(msg.into())
    }

    /// Check if the session may succeed when run again.
    pub fn is_retryable(&self) -> bool {
        match self {
            WorkerError::Client(e) => e.is_retryable(),
            WorkerError::Io(_) | WorkerError::TaskFailed(_) => true,
            WorkerError::Media(MediaError::StreamRead { .. }) => true,
            _ => false,
        }
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, WorkerError::Cancelled)
    }
}
