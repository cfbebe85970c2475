//! `generateContent` response envelope and candidate validation.

use crate::error::PipelineError;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use std::fmt;

const LOG_BODY_LIMIT: usize = 1000;

/// Top-level `generateContent` response envelope.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentResponse {
    #[serde(default, deserialize_with = "null_as_empty")]
    pub candidates: Vec<Candidate>,
    #[serde(default, deserialize_with = "lenient")]
    pub usage_metadata: Option<UsageMetadata>,
    #[serde(default, deserialize_with = "lenient")]
    pub prompt_feedback: Option<PromptFeedback>,
}

/// Candidate completion item returned by Gemini.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Candidate {
    #[serde(default)]
    pub content: Option<Content>,
    #[serde(default)]
    pub finish_reason: Option<String>,
}

/// Gemini content container.
#[derive(Debug, Clone, Deserialize)]
pub struct Content {
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub parts: Vec<Part>,
}

/// Untagged union of content parts.
///
/// Variant order matters for `#[serde(untagged)]` decoding; `Other` absorbs
/// anything that is neither text nor inline media.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum Part {
    Text {
        text: String,
    },
    InlineData {
        #[serde(rename = "inlineData")]
        inline_data: serde_json::Value,
    },
    Other(serde_json::Value),
}

impl Part {
    pub fn text(&self) -> Option<&str> {
        match self {
            Part::Text { text } => Some(text),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UsageMetadata {
    #[serde(default, deserialize_with = "lenient")]
    pub prompt_token_count: Option<u32>,
    #[serde(default, deserialize_with = "lenient")]
    pub candidates_token_count: Option<u32>,
    #[serde(default, deserialize_with = "lenient")]
    pub total_token_count: Option<u32>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PromptFeedback {
    #[serde(default)]
    pub block_reason: Option<String>,
}

fn null_as_empty<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Option::<Vec<T>>::deserialize(deserializer)?.unwrap_or_default())
}

/// Decode when the value has the expected shape, `None` otherwise.
fn lenient<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(value.and_then(|v| serde_json::from_value(v).ok()))
}

/// Why the model stopped generating.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FinishReason {
    Stop,
    MaxTokens,
    Safety,
    Recitation,
    Other,
    Unspecified,
    Unrecognized(String),
}

impl FinishReason {
    pub fn parse(raw: Option<&str>) -> Self {
        match raw.map(str::trim).unwrap_or_default() {
            "" => FinishReason::Unspecified,
            "STOP" => FinishReason::Stop,
            "MAX_TOKENS" => FinishReason::MaxTokens,
            "SAFETY" => FinishReason::Safety,
            "RECITATION" => FinishReason::Recitation,
            "OTHER" => FinishReason::Other,
            other => FinishReason::Unrecognized(other.to_string()),
        }
    }
}

impl fmt::Display for FinishReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FinishReason::Stop => f.write_str("STOP"),
            FinishReason::MaxTokens => f.write_str("MAX_TOKENS"),
            FinishReason::Safety => f.write_str("SAFETY"),
            FinishReason::Recitation => f.write_str("RECITATION"),
            FinishReason::Other => f.write_str("OTHER"),
            FinishReason::Unspecified => f.write_str("<unset>"),
            FinishReason::Unrecognized(raw) => f.write_str(raw),
        }
    }
}

/// The usable first candidate of an envelope.
#[derive(Debug, Clone)]
pub struct ValidatedCandidate<'a> {
    pub candidate: &'a Candidate,
    pub finish_reason: FinishReason,
}

impl ValidatedCandidate<'_> {
    /// True when generation hit the output token limit.
    pub fn is_truncated(&self) -> bool {
        self.finish_reason == FinishReason::MaxTokens
    }
}

/// Parse a raw response body into an envelope.
pub fn parse(raw: &str) -> Result<GenerateContentResponse, PipelineError> {
    tracing::debug!("Gemini response: {}", truncate_for_log(raw));

    serde_json::from_str(raw).map_err(|e| {
        tracing::error!("Failed to parse Gemini response envelope: {}", e);
        PipelineError::MalformedEnvelope(e.to_string())
    })
}

/// Select the first candidate and classify its finish reason.
///
/// Later candidates are ignored.
pub fn validate(
    envelope: &GenerateContentResponse,
) -> Result<ValidatedCandidate<'_>, PipelineError> {
    let Some(candidate) = envelope.candidates.first() else {
        match envelope
            .prompt_feedback
            .as_ref()
            .and_then(|f| f.block_reason.as_deref())
        {
            Some(reason) => tracing::warn!("No candidates; prompt blocked ({})", reason),
            None => tracing::warn!("No candidates found in the API response"),
        }
        return Err(PipelineError::NoCandidates);
    };

    let finish_reason = FinishReason::parse(candidate.finish_reason.as_deref());
    match &finish_reason {
        FinishReason::Stop | FinishReason::Unspecified => {}
        FinishReason::MaxTokens => {
            tracing::warn!("Response truncated by the output token limit");
        }
        FinishReason::Safety => {
            tracing::warn!("Response blocked by safety filters");
            return Err(PipelineError::SafetyBlocked);
        }
        FinishReason::Recitation => {
            tracing::warn!("Response blocked for possible content recitation");
            return Err(PipelineError::RecitationBlocked);
        }
        FinishReason::Other => {
            tracing::warn!("Response finished for an unknown reason");
            return Err(PipelineError::UnknownTermination);
        }
        FinishReason::Unrecognized(raw) => {
            tracing::warn!("Unexpected finish reason: {}", raw);
        }
    }

    Ok(ValidatedCandidate {
        candidate,
        finish_reason,
    })
}

pub(crate) fn truncate_for_log(body: &str) -> String {
    match body.char_indices().nth(LOG_BODY_LIMIT) {
        Some((idx, _)) => format!("{}... [truncated]", &body[..idx]),
        None => body.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn envelope(value: serde_json::Value) -> GenerateContentResponse {
        serde_json::from_value(value).unwrap()
    }

    fn with_reason(reason: &str) -> GenerateContentResponse {
        envelope(json!({
            "candidates": [{
                "content": { "parts": [{ "text": "hello" }] },
                "finishReason": reason
            }]
        }))
    }

    #[test]
    fn test_zero_candidates_is_no_candidates() {
        for body in [
            json!({ "candidates": [] }),
            json!({}),
            json!({ "candidates": null, "usageMetadata": { "totalTokenCount": 9 } }),
            json!({ "candidates": [], "promptFeedback": { "blockReason": "SAFETY" } }),
        ] {
            let env = envelope(body);
            assert_eq!(validate(&env).unwrap_err(), PipelineError::NoCandidates);
        }
    }

    #[test]
    fn test_finish_reason_classification() {
        assert!(validate(&with_reason("STOP")).is_ok());
        assert!(validate(&with_reason("")).is_ok());
        assert_eq!(
            validate(&with_reason("SAFETY")).unwrap_err(),
            PipelineError::SafetyBlocked
        );
        assert_eq!(
            validate(&with_reason("RECITATION")).unwrap_err(),
            PipelineError::RecitationBlocked
        );
        assert_eq!(
            validate(&with_reason("OTHER")).unwrap_err(),
            PipelineError::UnknownTermination
        );
    }

    #[test]
    fn test_max_tokens_is_usable_but_truncated() {
        let env = with_reason("MAX_TOKENS");
        let validated = validate(&env).unwrap();
        assert!(validated.is_truncated());
    }

    #[test]
    fn test_unrecognized_reason_is_usable() {
        let env = with_reason("BLOCKLIST_V2");
        let validated = validate(&env).unwrap();
        assert_eq!(
            validated.finish_reason,
            FinishReason::Unrecognized("BLOCKLIST_V2".to_string())
        );
        assert!(!validated.is_truncated());
    }

    #[test]
    fn test_missing_finish_reason_is_unspecified() {
        let env = envelope(json!({
            "candidates": [{ "content": { "parts": [{ "text": "x" }] } }]
        }));
        assert_eq!(
            validate(&env).unwrap().finish_reason,
            FinishReason::Unspecified
        );
    }

    #[test]
    fn test_only_first_candidate_is_considered() {
        let env = envelope(json!({
            "candidates": [
                { "finishReason": "SAFETY" },
                { "content": { "parts": [{ "text": "fine" }] }, "finishReason": "STOP" }
            ]
        }));
        assert_eq!(validate(&env).unwrap_err(), PipelineError::SafetyBlocked);
    }

    #[test]
    fn test_parse_rejects_non_envelopes() {
        assert!(matches!(
            parse("not json"),
            Err(PipelineError::MalformedEnvelope(_))
        ));
        assert!(matches!(
            parse("[1, 2]"),
            Err(PipelineError::MalformedEnvelope(_))
        ));
        assert!(matches!(
            parse(r#"{"candidates": "nope"}"#),
            Err(PipelineError::MalformedEnvelope(_))
        ));
    }

    #[test]
    fn test_parse_tolerates_odd_usage_metadata() {
        let env = parse(
            r#"{"candidates": [], "usageMetadata": {"totalTokenCount": -3, "promptTokenCount": 4}}"#,
        )
        .unwrap();
        let usage = env.usage_metadata.unwrap();
        assert_eq!(usage.total_token_count, None);
        assert_eq!(usage.prompt_token_count, Some(4));

        let env = parse(r#"{"candidates": [], "usageMetadata": "n/a"}"#).unwrap();
        assert!(env.usage_metadata.is_none());
    }

    #[test]
    fn test_parts_decode_by_shape() {
        let env = envelope(json!({
            "candidates": [{
                "content": { "parts": [
                    { "inlineData": { "mimeType": "image/png", "data": "AA==" } },
                    { "text": "caption" },
                    { "functionCall": { "name": "f" } }
                ]}
            }]
        }));
        let parts = &env.candidates[0].content.as_ref().unwrap().parts;
        assert!(matches!(parts[0], Part::InlineData { .. }));
        assert_eq!(parts[1].text(), Some("caption"));
        assert!(matches!(parts[2], Part::Other(_)));
    }

    #[test]
    fn test_truncate_for_log_respects_char_boundaries() {
        let body = "é".repeat(LOG_BODY_LIMIT + 5);
        let logged = truncate_for_log(&body);
        assert!(logged.ends_with("... [truncated]"));
        assert_eq!(logged.chars().filter(|c| *c == 'é').count(), LOG_BODY_LIMIT);
        assert_eq!(truncate_for_log("short"), "short");
    }
}
