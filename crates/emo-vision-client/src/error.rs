//! Error types for the vision client.

use thiserror::Error;

/// Result type for interpretation calls.
pub type ClientResult<T> = Result<T, ClientError>;

/// Errors from a single interpretation call.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("Request timed out after {0:?}")]
    Timeout(std::time::Duration),

    #[error("Vision API returned {status}: {body}")]
    Http { status: u16, body: String },

    #[error("Request failed: {0}")]
    Request(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl ClientError {
    pub fn http(status: u16, body: impl Into<String>) -> Self {
        Self::Http {
            status,
            body: body.into(),
        }
    }

    pub fn request(msg: impl Into<String>) -> Self {
        Self::Request(msg.into())
    }

    pub fn invalid_response(msg: impl Into<String>) -> Self {
        Self::InvalidResponse(msg.into())
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Check if a later attempt may succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            ClientError::Timeout(_) | ClientError::Request(_) => true,
            ClientError::Http { status, .. } => *status == 429 || *status >= 500,
            ClientError::InvalidResponse(_) | ClientError::Config(_) => false,
        }
    }

    /// Short kind name for metrics and warnings.
    pub fn kind(&self) -> &'static str {
        match self {
            ClientError::Timeout(_) => "timeout",
            ClientError::Http { .. } => "http",
            ClientError::Request(_) => "request",
            ClientError::InvalidResponse(_) => "invalid_response",
            ClientError::Config(_) => "config",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_retryable_classification() {
        assert!(ClientError::Timeout(Duration::from_secs(30)).is_retryable());
        assert!(ClientError::request("connection reset").is_retryable());
        assert!(ClientError::http(503, "unavailable").is_retryable());
        assert!(ClientError::http(429, "slow down").is_retryable());
        assert!(!ClientError::http(400, "bad request").is_retryable());
        assert!(!ClientError::invalid_response("not json").is_retryable());
        assert!(!ClientError::config("missing key").is_retryable());
    }

    #[test]
    fn test_display() {
        assert_eq!(
            ClientError::http(500, "boom").to_string(),
            "Vision API returned 500: boom"
        );
        assert_eq!(ClientError::http(500, "").kind(), "http");
    }
}
