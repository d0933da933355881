//! Landmark-based stress estimate.
//!
//! Four components, each in [0, 1], are folded into a percentage with fixed
//! weights. The geometry behind the components lives in
//! `emo-media::gestures::stress`.

use std::fmt;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Stress band for a percentage.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, JsonSchema,
)]
#[serde(rename_all = "snake_case")]
pub enum StressLevel {
    VeryLow,
    Low,
    Moderate,
    High,
    VeryHigh,
}

impl StressLevel {
    pub fn from_percentage(percentage: u8) -> Self {
        match percentage {
            80..=u8::MAX => StressLevel::VeryHigh,
            60..=79 => StressLevel::High,
            40..=59 => StressLevel::Moderate,
            20..=39 => StressLevel::Low,
            _ => StressLevel::VeryLow,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            StressLevel::VeryLow => "very_low",
            StressLevel::Low => "low",
            StressLevel::Moderate => "moderate",
            StressLevel::High => "high",
            StressLevel::VeryHigh => "very_high",
        }
    }
}

impl fmt::Display for StressLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Per-region tension scores, each in [0, 1].
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize, JsonSchema)]
pub struct StressComponents {
    pub forehead: f64,
    pub lip: f64,
    pub fidget: f64,
    pub eye: f64,
}

impl StressComponents {
    pub const FOREHEAD_WEIGHT: f64 = 0.35;
    pub const LIP_WEIGHT: f64 = 0.25;
    pub const FIDGET_WEIGHT: f64 = 0.25;
    pub const EYE_WEIGHT: f64 = 0.15;

    /// Weighted sum of the components.
    pub fn weighted(&self) -> f64 {
        self.forehead * Self::FOREHEAD_WEIGHT
            + self.lip * Self::LIP_WEIGHT
            + self.fidget * Self::FIDGET_WEIGHT
            + self.eye * Self::EYE_WEIGHT
    }

    /// Weighted score as a whole percentage, truncated and capped at 100.
    pub fn percentage(&self) -> u8 {
        (self.weighted() * 100.0).clamp(0.0, 100.0) as u8
    }
}

/// Stress estimate for one snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct StressAssessment {
    /// 0..=100
    pub percentage: u8,
    pub level: StressLevel,
    pub components: StressComponents,
    /// Cues that contributed, e.g. "frown_lines", "lip_compression"
    #[serde(default)]
    pub indicators: Vec<String>,
    #[serde(default)]
    pub recommendations: Vec<String>,
}

/// Direction of stress over a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum StressTrend {
    /// Fewer than two assessed moments
    #[default]
    InsufficientData,
    Increasing,
    Decreasing,
    Stable,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_bands() {
        assert_eq!(StressLevel::from_percentage(0), StressLevel::VeryLow);
        assert_eq!(StressLevel::from_percentage(19), StressLevel::VeryLow);
        assert_eq!(StressLevel::from_percentage(20), StressLevel::Low);
        assert_eq!(StressLevel::from_percentage(59), StressLevel::Moderate);
        assert_eq!(StressLevel::from_percentage(60), StressLevel::High);
        assert_eq!(StressLevel::from_percentage(100), StressLevel::VeryHigh);
    }

    #[test]
    fn test_weighted_percentage() {
        let components = StressComponents {
            forehead: 0.7,
            lip: 0.7,
            fidget: 0.0,
            eye: 0.5,
        };
        // 0.245 + 0.175 + 0.075
        assert!((components.weighted() - 0.495).abs() < 1e-9);
        assert_eq!(components.percentage(), 49);
        assert_eq!(StressComponents::default().percentage(), 0);
    }

    #[test]
    fn test_serde_names() {
        let json = serde_json::to_string(&StressLevel::VeryHigh).unwrap();
        assert_eq!(json, "\"very_high\"");
        let trend: StressTrend = serde_json::from_str("\"increasing\"").unwrap();
        assert_eq!(trend, StressTrend::Increasing);
    }
}
