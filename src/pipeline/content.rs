//! Generated text and token usage extraction.

use super::envelope::{GenerateContentResponse, ValidatedCandidate};
use crate::error::PipelineError;

/// Text of the first candidate plus the envelope's token count.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedContent {
    pub text: String,
    pub tokens_used: u32,
}

/// Pull the first part's text out of a validated candidate.
///
/// The text is returned as generated; only the emptiness check trims it.
pub fn extract(
    envelope: &GenerateContentResponse,
    validated: &ValidatedCandidate<'_>,
) -> Result<ExtractedContent, PipelineError> {
    let parts = validated
        .candidate
        .content
        .as_ref()
        .map(|c| c.parts.as_slice())
        .unwrap_or_default();

    let Some(first) = parts.first() else {
        tracing::warn!("No parts found in the response content");
        return Err(PipelineError::EmptyContent);
    };

    let text = first.text().unwrap_or_default();
    if text.trim().is_empty() {
        tracing::warn!("First response part has no text");
        return Err(PipelineError::EmptyContent);
    }

    tracing::debug!("Extracted {} characters of content", text.chars().count());

    Ok(ExtractedContent {
        text: text.to_string(),
        tokens_used: token_usage(envelope),
    })
}

/// Total token count, 0 when the envelope does not report one.
pub fn token_usage(envelope: &GenerateContentResponse) -> u32 {
    let Some(usage) = &envelope.usage_metadata else {
        return 0;
    };
    let total = usage.total_token_count.unwrap_or(0);
    tracing::debug!(
        "Token usage - prompt: {}, candidates: {}, total: {}",
        usage.prompt_token_count.unwrap_or(0),
        usage.candidates_token_count.unwrap_or(0),
        total
    );
    total
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::envelope::validate;
    use serde_json::json;

    fn run(value: serde_json::Value) -> Result<ExtractedContent, PipelineError> {
        let env: GenerateContentResponse = serde_json::from_value(value).unwrap();
        let validated = validate(&env)?;
        extract(&env, &validated)
    }

    #[test]
    fn test_extracts_text_and_tokens() {
        let content = run(json!({
            "candidates": [{
                "content": { "parts": [{ "text": "Test AI response" }] },
                "finishReason": "STOP"
            }],
            "usageMetadata": { "promptTokenCount": 20, "candidatesTokenCount": 30, "totalTokenCount": 50 }
        }))
        .unwrap();
        assert_eq!(content.text, "Test AI response");
        assert_eq!(content.tokens_used, 50);
    }

    #[test]
    fn test_missing_usage_defaults_to_zero() {
        let content = run(json!({
            "candidates": [{ "content": { "parts": [{ "text": "Response without token info" }] } }]
        }))
        .unwrap();
        assert_eq!(content.tokens_used, 0);
    }

    #[test]
    fn test_text_is_not_trimmed() {
        let content = run(json!({
            "candidates": [{ "content": { "parts": [{ "text": "  padded\n" }] } }]
        }))
        .unwrap();
        assert_eq!(content.text, "  padded\n");
    }

    #[test]
    fn test_empty_content_cases() {
        for candidate in [
            json!({ "finishReason": "STOP" }),
            json!({ "content": {} }),
            json!({ "content": { "parts": [] } }),
            json!({ "content": { "parts": [{ "text": "" }] } }),
            json!({ "content": { "parts": [{ "text": " \n\t" }] } }),
            json!({ "content": { "parts": [{ "inlineData": { "data": "AA==" } }, { "text": "late" }] } }),
        ] {
            let result = run(json!({ "candidates": [candidate] }));
            assert_eq!(result.unwrap_err(), PipelineError::EmptyContent);
        }
    }
}
