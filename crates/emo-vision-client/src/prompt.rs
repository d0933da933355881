//! Prompt construction for contextual emotion analysis.

/// Context line sent with a moment: the scenario plus the gesture labels
/// the classifier already found.
pub fn moment_context(scenario: Option<&str>, labels: &[String]) -> String {
    let scenario = scenario.map(str::trim).filter(|s| !s.is_empty());
    match (scenario, labels.is_empty()) {
        (Some(s), true) => s.to_string(),
        (Some(s), false) => format!("{s}. Detected cues: {}", labels.join(", ")),
        (None, false) => format!("Detected cues: {}", labels.join(", ")),
        (None, true) => String::new(),
    }
}

/// Build the analysis prompt for one frame.
pub fn build_prompt(context: &str) -> String {
    let context = context.trim();
    let context_line = if context.is_empty() {
        "Analyze this image for facial expressions and emotions.".to_string()
    } else {
        format!("Analyze this image for facial expressions and emotions with the following context: {context}")
    };

    format!(
        r#"{context_line}

Provide detailed analysis focusing on:
- Specific facial expressions and micro-expressions
- Body language patterns visible
- Emotional state relevant to the given context
- Confidence levels and authenticity
- Stress or anxiety indicators
- Overall psychological assessment for this scenario

Return ONLY a single JSON object with:
{{
    "facial_expressions": ["expression1", "expression2"],
    "body_language": ["pattern1", "pattern2"],
    "emotional_state": "primary emotional state - be specific and avoid neutral",
    "confidence_level": "high/medium/low",
    "detailed_analysis": "analysis in 4-6 sentences describing what you observe in relation to the context"
}}"#
    )
}
