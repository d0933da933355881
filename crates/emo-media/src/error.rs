//! Error types for media operations.

use std::path::PathBuf;
use thiserror::Error;

/// Result type for media operations.
pub type MediaResult<T> = Result<T, MediaError>;

/// Errors that can occur while reading frames, extracting landmarks or sampling.
#[derive(Debug, Error)]
pub enum MediaError {
    /// Landmark extraction failed for a single frame. Recoverable: the frame is skipped.
    #[error("Landmark extraction failed on frame {frame_index}: {message}")]
    ExtractionFailure { frame_index: u64, message: String },

    /// The input stream could not be read. Fatal for the whole sampling pass.
    #[error("Stream read failed: {message}")]
    StreamRead {
        message: String,
        path: Option<PathBuf>,
    },

    #[error("File not found: {0}")]
    FileNotFound(PathBuf),

    #[error("Operation cancelled")]
    Cancelled,

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON parse error: {0}")]
    JsonParse(#[from] serde_json::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl MediaError {
    /// Create a per-frame extraction failure.
    pub fn extraction_failed(frame_index: u64, message: impl Into<String>) -> Self {
        Self::ExtractionFailure {
            frame_index,
            message: message.into(),
        }
    }

    /// Create a stream read failure.
    pub fn stream_read(message: impl Into<String>) -> Self {
        Self::StreamRead {
            message: message.into(),
            path: None,
        }
    }

    /// Create a stream read failure tied to a file.
    pub fn stream_read_at(message: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self::StreamRead {
            message: message.into(),
            path: Some(path.into()),
        }
    }

    /// Create an invalid configuration error.
    pub fn invalid_config(message: impl Into<String>) -> Self {
        Self::InvalidConfig(message.into())
    }

    /// Create an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// Whether the error only affects a single frame and scanning may continue.
    pub fn is_frame_local(&self) -> bool {
        matches!(self, MediaError::ExtractionFailure { .. })
    }
}
