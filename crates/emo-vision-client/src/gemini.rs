//! Gemini vision client.
//!
//! Sends the prompt and the JPEG frame to `generateContent`, asking for a
//! JSON answer, and walks a fallback list of models until one succeeds.

use async_trait::async_trait;
use base64::Engine;
use emo_models::{ConfidenceLevel, Interpretation, PreparedImage};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::client::InterpretationClient;
use crate::config::VisionClientConfig;
use crate::error::{ClientError, ClientResult};
use crate::prompt::build_prompt;

/// Gemini API client for frame interpretation.
pub struct GeminiVisionClient {
    config: VisionClientConfig,
    client: Client,
}

#[derive(Debug, Serialize)]
struct GeminiRequest {
    contents: Vec<Content>,
    #[serde(rename = "generationConfig")]
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize)]
struct Content {
    parts: Vec<Part>,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
enum Part {
    Text { text: String },
    InlineData { inline_data: InlineData },
}

#[derive(Debug, Serialize)]
struct InlineData {
    mime_type: String,
    data: String,
}

#[derive(Debug, Serialize)]
struct GenerationConfig {
    #[serde(rename = "responseMimeType")]
    response_mime_type: String,
}

#[derive(Debug, Deserialize)]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: ResponseContent,
}

#[derive(Debug, Deserialize)]
struct ResponseContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    #[serde(default)]
    text: Option<String>,
}

/// JSON object the prompt asks the model to return.
#[derive(Debug, Deserialize)]
struct AnalysisPayload {
    #[serde(default)]
    facial_expressions: Vec<String>,
    #[serde(default)]
    body_language: Vec<String>,
    #[serde(default)]
    emotional_state: Option<String>,
    #[serde(default)]
    confidence_level: Option<String>,
    #[serde(default)]
    detailed_analysis: Option<String>,
}

impl AnalysisPayload {
    fn into_interpretation(self) -> ClientResult<Interpretation> {
        let emotional_state = self
            .emotional_state
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty());
        let text = self
            .detailed_analysis
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .or_else(|| emotional_state.clone())
            .ok_or_else(|| ClientError::invalid_response("analysis has no text"))?;

        let mut labels: Vec<String> = Vec::new();
        for raw in self.facial_expressions.iter().chain(&self.body_language) {
            let label = raw.trim().to_lowercase();
            if !label.is_empty() && !labels.contains(&label) {
                labels.push(label);
            }
        }

        let confidence = self
            .confidence_level
            .as_deref()
            .map(ConfidenceLevel::parse_lenient)
            .unwrap_or_default();

        let mut interpretation = Interpretation::new(text, confidence).with_labels(labels);
        if let Some(state) = emotional_state {
            interpretation = interpretation.with_emotional_state(state);
        }
        Ok(interpretation)
    }
}

impl GeminiVisionClient {
    pub fn new(config: VisionClientConfig) -> ClientResult<Self> {
        config.validate()?;
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| ClientError::config(format!("Failed to build HTTP client: {}", e)))?;
        Ok(Self { config, client })
    }

    /// Create a client from `GEMINI_*` environment variables.
    pub fn from_env() -> ClientResult<Self> {
        Self::new(VisionClientConfig::from_env()?)
    }

    pub fn config(&self) -> &VisionClientConfig {
        &self.config
    }

    fn build_request(image: &PreparedImage, context: &str) -> GeminiRequest {
        let data = base64::engine::general_purpose::STANDARD.encode(&image.data);
        GeminiRequest {
            contents: vec![Content {
                parts: vec![
                    Part::Text {
                        text: build_prompt(context),
                    },
                    Part::InlineData {
                        inline_data: InlineData {
                            mime_type: image.mime_type.to_string(),
                            data,
                        },
                    },
                ],
            }],
            generation_config: GenerationConfig {
                response_mime_type: "application/json".to_string(),
            },
        }
    }

    async fn call_model(&self, model: &str, request: &GeminiRequest) -> ClientResult<Interpretation> {
        let url = format!(
            "{}/v1beta/models/{}:generateContent",
            self.config.base_url.trim_end_matches('/'),
            model
        );

        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", &self.config.api_key)
            .json(request)
            .send()
            .await
            .map_err(|e| self.map_reqwest_error(e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ClientError::http(status.as_u16(), body));
        }

        let gemini_response: GeminiResponse = response.json().await.map_err(|e| {
            if e.is_timeout() {
                ClientError::Timeout(self.config.timeout)
            } else {
                ClientError::invalid_response(format!("Failed to parse Gemini response: {}", e))
            }
        })?;

        let text = gemini_response
            .candidates
            .first()
            .and_then(|c| c.content.parts.iter().find_map(|p| p.text.as_deref()))
            .ok_or_else(|| ClientError::invalid_response("No content in Gemini response"))?;

        parse_analysis(text)
    }

    fn map_reqwest_error(&self, e: reqwest::Error) -> ClientError {
        if e.is_timeout() {
            ClientError::Timeout(self.config.timeout)
        } else {
            ClientError::request(e.to_string())
        }
    }
}

#[async_trait]
impl InterpretationClient for GeminiVisionClient {
    async fn interpret(&self, image: &PreparedImage, context: &str) -> ClientResult<Interpretation> {
        let request = Self::build_request(image, context);
        let mut last_error = None;

        for model in &self.config.models {
            debug!(model = %model, bytes = image.len(), "Requesting frame interpretation");
            match self.call_model(model, &request).await {
                Ok(interpretation) => {
                    info!(
                        model = %model,
                        labels = interpretation.labels.len(),
                        confidence = %interpretation.confidence,
                        "Frame interpreted"
                    );
                    return Ok(interpretation);
                }
                Err(e) => {
                    warn!(model = %model, error = %e, "Gemini model failed, trying next");
                    last_error = Some(e);
                }
            }
        }

        Err(last_error.unwrap_or_else(|| ClientError::config("no models configured")))
    }

    fn name(&self) -> &str {
        "gemini"
    }
}

/// Remove a surrounding Markdown code fence, with or without a language tag.
pub fn strip_code_fences(text: &str) -> &str {
    let text = text.trim();
    let Some(rest) = text.strip_prefix("```") else {
        return text;
    };
    let rest = match rest.find('\n') {
        Some(newline) if rest[..newline].chars().all(|c| c.is_ascii_alphanumeric()) => {
            &rest[newline + 1..]
        }
        _ => rest,
    };
    rest.trim_end().strip_suffix("```").unwrap_or(rest).trim()
}

/// Parse the model's JSON answer into an interpretation.
pub fn parse_analysis(text: &str) -> ClientResult<Interpretation> {
    let payload: AnalysisPayload = serde_json::from_str(strip_code_fences(text))
        .map_err(|e| ClientError::invalid_response(format!("Failed to parse analysis JSON: {}", e)))?;
    payload.into_interpretation()
}
