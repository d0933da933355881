//! Vision client configuration.

use std::fmt;
use std::time::Duration;

use crate::error::{ClientError, ClientResult};

pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";

/// Models tried in order until one answers.
pub const DEFAULT_MODELS: &[&str] = &["gemini-2.5-flash", "gemini-2.5-flash-lite", "gemini-2.5-pro"];

/// Configuration for [`crate::GeminiVisionClient`].
#[derive(Clone)]
pub struct VisionClientConfig {
    pub api_key: String,
    pub models: Vec<String>,
    pub base_url: String,
    /// Timeout applied by the HTTP client to each request
    pub timeout: Duration,
}

impl VisionClientConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            models: DEFAULT_MODELS.iter().map(|m| m.to_string()).collect(),
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: Duration::from_secs(30),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_models<I, S>(mut self, models: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.models = models.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Create config from environment variables.
    ///
    /// `GEMINI_API_KEY` is required. `GEMINI_MODELS` is a comma-separated
    /// fallback list.
    pub fn from_env() -> ClientResult<Self> {
        let api_key = std::env::var("GEMINI_API_KEY")
            .ok()
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| ClientError::config("GEMINI_API_KEY not set"))?;

        let mut config = Self::new(api_key);
        if let Some(models) = std::env::var("GEMINI_MODELS")
            .ok()
            .map(|s| parse_model_list(&s))
            .filter(|m| !m.is_empty())
        {
            config.models = models;
        }
        if let Ok(base_url) = std::env::var("GEMINI_BASE_URL") {
            config.base_url = base_url;
        }
        config.timeout = Duration::from_secs(
            std::env::var("GEMINI_TIMEOUT_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(30),
        );
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> ClientResult<()> {
        if self.api_key.trim().is_empty() {
            return Err(ClientError::config("API key is empty"));
        }
        if self.models.is_empty() {
            return Err(ClientError::config("at least one model is required"));
        }
        if self.timeout.is_zero() {
            return Err(ClientError::config("timeout must be positive"));
        }
        Ok(())
    }
}

// Keep the key out of logs.
impl fmt::Debug for VisionClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VisionClientConfig")
            .field("api_key", &"<redacted>")
            .field("models", &self.models)
            .field("base_url", &self.base_url)
            .field("timeout", &self.timeout)
            .finish()
    }
}

fn parse_model_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|m| !m.is_empty())
        .map(String::from)
        .collect()
}
