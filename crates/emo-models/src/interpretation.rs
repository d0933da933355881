//! AI interpretation results attached to moments.

use schemars::JsonSchema;
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Confidence reported by the remote vision model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, JsonSchema, Default)]
#[serde(rename_all = "snake_case")]
pub enum ConfidenceLevel {
    #[default]
    Low,
    Medium,
    High,
}

impl ConfidenceLevel {
    pub const ALL: &'static [ConfidenceLevel] = &[
        ConfidenceLevel::Low,
        ConfidenceLevel::Medium,
        ConfidenceLevel::High,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ConfidenceLevel::Low => "low",
            ConfidenceLevel::Medium => "medium",
            ConfidenceLevel::High => "high",
        }
    }

    /// Lenient parse used for model output: unknown values degrade to `Low`.
    pub fn parse_lenient(s: &str) -> Self {
        s.parse().unwrap_or_default()
    }
}

impl fmt::Display for ConfidenceLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for ConfidenceLevel {
    type Err = ConfidenceLevelParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "low" => Ok(ConfidenceLevel::Low),
            "medium" | "med" | "moderate" => Ok(ConfidenceLevel::Medium),
            "high" => Ok(ConfidenceLevel::High),
            _ => Err(ConfidenceLevelParseError(s.to_string())),
        }
    }
}

// Model output is not trusted to use the exact casing.
impl<'de> Deserialize<'de> for ConfidenceLevel {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        Ok(ConfidenceLevel::parse_lenient(&raw))
    }
}

#[derive(Debug, Error)]
#[error("Unknown confidence level: {0}")]
pub struct ConfidenceLevelParseError(String);

/// Natural-language interpretation of a moment by the vision model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema, Default)]
pub struct Interpretation {
    /// Labels reported by the model (expressions and body language)
    #[serde(default)]
    pub labels: Vec<String>,

    /// Free-text analysis
    pub text: String,

    /// Model-reported confidence
    #[serde(default)]
    pub confidence: ConfidenceLevel,

    /// Primary emotional state, when the model names one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub emotional_state: Option<String>,
}

impl Interpretation {
    pub fn new(text: impl Into<String>, confidence: ConfidenceLevel) -> Self {
        Self {
            labels: Vec::new(),
            text: text.into(),
            confidence,
            emotional_state: None,
        }
    }

    pub fn with_labels(mut self, labels: Vec<String>) -> Self {
        self.labels = labels;
        self
    }

    pub fn with_emotional_state(mut self, state: impl Into<String>) -> Self {
        self.emotional_state = Some(state.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_confidence_parse() {
        assert_eq!("high".parse::<ConfidenceLevel>().unwrap(), ConfidenceLevel::High);
        assert_eq!("Medium".parse::<ConfidenceLevel>().unwrap(), ConfidenceLevel::Medium);
        assert_eq!(" LOW ".parse::<ConfidenceLevel>().unwrap(), ConfidenceLevel::Low);
        assert!("certain".parse::<ConfidenceLevel>().is_err());
    }

    #[test]
    fn test_confidence_lenient_deserialize() {
        let level: ConfidenceLevel = serde_json::from_str("\"HIGH\"").unwrap();
        assert_eq!(level, ConfidenceLevel::High);

        let level: ConfidenceLevel = serde_json::from_str("\"high/medium/low\"").unwrap();
        assert_eq!(level, ConfidenceLevel::Low);
    }

    #[test]
    fn test_confidence_display() {
        assert_eq!(ConfidenceLevel::Medium.to_string(), "medium");
        assert_eq!(ConfidenceLevel::ALL.len(), 3);
    }
}
