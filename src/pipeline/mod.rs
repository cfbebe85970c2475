//! Response interpretation pipeline
//!
//! Turns a raw `generateContent` body into a typed result:
//! envelope validation, content extraction, structured payload extraction
//! with keyword fallback, and result assembly. Everything here is pure and
//! synchronous; the network call happens elsewhere.

pub mod assembler;
pub mod content;
pub mod envelope;
pub mod fallback;
pub mod structured;

pub use content::ExtractedContent;
pub use envelope::{FinishReason, GenerateContentResponse};
pub use structured::ExtractionMode;

use crate::config::{ProfileTable, TruncationPolicy, UseCase};
use crate::error::PipelineError;
use crate::models::{
    CallMeta, ChatRequest, ChatResult, ClassificationRequest, ClassificationResult,
    PayloadSource, SentimentRequest, SentimentResult, SummaryRequest, SummaryResult,
};

/// Stateless interpreter holding the per-use-case policy table.
#[derive(Debug, Clone, Default)]
pub struct Interpreter {
    profiles: ProfileTable,
    extraction: ExtractionMode,
}

impl Interpreter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_profiles(mut self, profiles: ProfileTable) -> Self {
        self.profiles = profiles;
        self
    }

    pub fn with_truncation_policy(mut self, use_case: UseCase, policy: TruncationPolicy) -> Self {
        self.profiles.set_truncation(use_case, policy);
        self
    }

    pub fn with_extraction_mode(mut self, mode: ExtractionMode) -> Self {
        self.extraction = mode;
        self
    }

    pub fn profiles(&self) -> &ProfileTable {
        &self.profiles
    }

    /// Envelope → validated candidate → truncation policy → content.
    fn prepare(
        &self,
        raw: &str,
        use_case: UseCase,
    ) -> Result<(ExtractedContent, bool), PipelineError> {
        let envelope = envelope::parse(raw)?;
        let validated = envelope::validate(&envelope)?;
        let truncated = assembler::resolve_truncation(
            use_case,
            self.profiles.get(use_case).truncation,
            &validated,
        )?;
        let content = content::extract(&envelope, &validated)?;
        Ok((content, truncated))
    }

    pub fn interpret_chat(
        &self,
        raw: &str,
        _request: &ChatRequest,
        meta: &CallMeta,
    ) -> Result<ChatResult, PipelineError> {
        let _span = tracing::debug_span!("interpret", use_case = "chat").entered();
        let (content, truncated) = self.prepare(raw, UseCase::Chat)?;
        Ok(assembler::chat(content, truncated, meta))
    }

    pub fn interpret_summary(
        &self,
        raw: &str,
        _request: &SummaryRequest,
        meta: &CallMeta,
    ) -> Result<SummaryResult, PipelineError> {
        let _span = tracing::debug_span!("interpret", use_case = "summary").entered();
        let (content, truncated) = self.prepare(raw, UseCase::Summary)?;
        Ok(assembler::summary(content, truncated, meta))
    }

    pub fn interpret_sentiment(
        &self,
        raw: &str,
        request: &SentimentRequest,
        meta: &CallMeta,
    ) -> Result<SentimentResult, PipelineError> {
        let _span = tracing::debug_span!("interpret", use_case = "sentiment").entered();
        let (content, truncated) = self.prepare(raw, UseCase::Sentiment)?;

        let (payload, source) = match structured::extract_sentiment(&content.text, self.extraction)
        {
            Ok(payload) => (payload, PayloadSource::Structured),
            Err(PipelineError::NoStructuredPayload) if self.has_fallback(UseCase::Sentiment) => {
                (fallback::sentiment(&content.text), PayloadSource::Fallback)
            }
            Err(e) => return Err(e),
        };

        Ok(assembler::sentiment(
            payload,
            source,
            request,
            content.tokens_used,
            truncated,
            meta,
        ))
    }

    pub fn interpret_classification(
        &self,
        raw: &str,
        request: &ClassificationRequest,
        meta: &CallMeta,
    ) -> Result<ClassificationResult, PipelineError> {
        let _span = tracing::debug_span!("interpret", use_case = "classification").entered();
        let (content, truncated) = self.prepare(raw, UseCase::Classification)?;

        let (payload, source) =
            match structured::extract_classification(&content.text, self.extraction) {
                Ok(payload) => (payload, PayloadSource::Structured),
                Err(PipelineError::NoStructuredPayload)
                    if self.has_fallback(UseCase::Classification) =>
                {
                    (
                        fallback::classification(&content.text, &request.product_name),
                        PayloadSource::Fallback,
                    )
                }
                Err(e) => return Err(e),
            };

        Ok(assembler::classification(
            payload,
            source,
            request,
            content.tokens_used,
            truncated,
            meta,
        ))
    }

    fn has_fallback(&self, use_case: UseCase) -> bool {
        self.profiles.get(use_case).has_fallback
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::UseCaseProfile;
    use crate::models::{SentimentLabel, TangibilityType};
    use chrono::{TimeZone, Utc};
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn meta() -> CallMeta {
        CallMeta::new("gemini-pro", Utc.with_ymd_and_hms(2025, 1, 2, 3, 4, 5).unwrap())
    }

    fn body(text: &str, reason: &str) -> String {
        json!({
            "candidates": [{
                "content": { "parts": [{ "text": text }] },
                "finishReason": reason
            }],
            "usageMetadata": { "totalTokenCount": 42 }
        })
        .to_string()
    }

    #[test]
    fn test_chat_result_carries_meta() {
        let request = ChatRequest {
            message: "Oi".to_string(),
            context: None,
        };
        let result = Interpreter::new()
            .interpret_chat(&body("Olá!", "STOP"), &request, &meta())
            .unwrap();
        assert_eq!(result.response, "Olá!");
        assert_eq!(result.model, "gemini-pro");
        assert_eq!(result.tokens_used, 42);
        assert!(!result.truncated);
        assert_eq!(result.timestamp, meta().received_at);
    }

    #[test]
    fn test_chat_accepts_truncated_output_by_default() {
        let request = ChatRequest {
            message: "Oi".to_string(),
            context: None,
        };
        let result = Interpreter::new()
            .interpret_chat(&body("Olá, eu", "MAX_TOKENS"), &request, &meta())
            .unwrap();
        assert!(result.truncated);
    }

    #[test]
    fn test_summary_rejects_truncated_output_by_default() {
        let request = SummaryRequest {
            text: "texto".to_string(),
            max_sentences: 3,
            style: Default::default(),
        };
        let err = Interpreter::new()
            .interpret_summary(&body("Resumo parcial", "MAX_TOKENS"), &request, &meta())
            .unwrap_err();
        assert_eq!(err, PipelineError::TruncatedByLength);

        let result = Interpreter::new()
            .with_truncation_policy(UseCase::Summary, TruncationPolicy::AcceptDegraded)
            .interpret_summary(&body("Resumo parcial", "MAX_TOKENS"), &request, &meta())
            .unwrap();
        assert!(result.truncated);
        assert_eq!(result.summary, "Resumo parcial");
    }

    #[test]
    fn test_sentiment_structured_path() {
        let request = SentimentRequest::new("Adorei o produto");
        let text = r#"Relatório: {"sentiment":"POSITIVE","confidence":0.9,"explanation":"ok"}"#;
        let result = Interpreter::new()
            .interpret_sentiment(&body(text, "STOP"), &request, &meta())
            .unwrap();
        assert_eq!(result.sentiment, SentimentLabel::Positive);
        assert_eq!(result.confidence, 0.9);
        assert_eq!(result.explanation, "ok");
        assert_eq!(result.source, PayloadSource::Structured);
        assert_eq!(result.original_text, "Adorei o produto");
    }

    #[test]
    fn test_sentiment_fallback_path() {
        let request = SentimentRequest::new("Qualquer coisa");
        let result = Interpreter::new()
            .interpret_sentiment(&body("não há dados suficientes", "STOP"), &request, &meta())
            .unwrap();
        assert_eq!(result.sentiment, SentimentLabel::Neutral);
        assert_eq!(result.confidence, 0.6);
        assert_eq!(result.source, PayloadSource::Fallback);
    }

    #[test]
    fn test_sentiment_without_fallback_surfaces_error() {
        let mut profiles = ProfileTable::default();
        profiles.set(
            UseCase::Sentiment,
            UseCaseProfile {
                has_fallback: false,
                ..UseCase::Sentiment.default_profile()
            },
        );
        let err = Interpreter::new()
            .with_profiles(profiles)
            .interpret_sentiment(
                &body("sem json", "STOP"),
                &SentimentRequest::new("x"),
                &meta(),
            )
            .unwrap_err();
        assert_eq!(err, PipelineError::NoStructuredPayload);
    }

    #[test]
    fn test_safety_block_never_reaches_fallback() {
        let err = Interpreter::new()
            .interpret_sentiment(
                &body("texto bom e feliz", "SAFETY"),
                &SentimentRequest::new("x"),
                &meta(),
            )
            .unwrap_err();
        assert_eq!(err, PipelineError::SafetyBlocked);
    }

    #[test]
    fn test_classification_fallback_path() {
        let request = ClassificationRequest::new("Cadeira");
        let result = Interpreter::new()
            .interpret_classification(&body("produto físico", "STOP"), &request, &meta())
            .unwrap();
        assert_eq!(result.tangibility_type, TangibilityType::Tangible);
        assert_eq!(result.confidence, 0.7);
        assert_eq!(result.source, PayloadSource::Fallback);
        assert_eq!(result.product_name, "Cadeira");
        assert_eq!(result.tokens_used, 42);

        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["productPriceCategory"], "NA");
        assert_eq!(json["lifeCycle"], "NA");
        assert_eq!(json["tangibilitySubtype"], "NON_DURABLE");
    }

    #[test]
    fn test_classification_rejects_truncated_output_by_default() {
        let err = Interpreter::new()
            .interpret_classification(
                &body(r#"{"tangibilityType":"TANGIBLE""#, "MAX_TOKENS"),
                &ClassificationRequest::new("Cadeira"),
                &meta(),
            )
            .unwrap_err();
        assert_eq!(err, PipelineError::TruncatedByLength);
    }

    #[test]
    fn test_sentiment_reports_truncation() {
        let request = SentimentRequest::new("Adorei");
        let text = r#"{"sentiment":"POSITIVE","confidence":0.9}"#;
        let interpreter = Interpreter::new();

        let clean = interpreter
            .interpret_sentiment(&body(text, "STOP"), &request, &meta())
            .unwrap();
        let cut = interpreter
            .interpret_sentiment(&body(text, "MAX_TOKENS"), &request, &meta())
            .unwrap();

        assert!(!clean.truncated);
        assert!(cut.truncated);
        assert_eq!(cut.sentiment, SentimentLabel::Positive);
        assert_ne!(clean, cut);
    }

    #[test]
    fn test_classification_reports_truncation_when_accepted() {
        let request = ClassificationRequest::new("Cadeira");
        let text = r#"{"tangibilityType":"TANGIBLE","confidence":0.8}"#;
        let result = Interpreter::new()
            .with_truncation_policy(UseCase::Classification, TruncationPolicy::AcceptDegraded)
            .interpret_classification(&body(text, "MAX_TOKENS"), &request, &meta())
            .unwrap();

        assert!(result.truncated);
        assert_eq!(result.tangibility_type, TangibilityType::Tangible);
        assert_eq!(result.source, PayloadSource::Structured);

        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["truncated"], true);
    }

    #[test]
    fn test_balanced_mode_reads_nested_classification_payload() {
        let request = ClassificationRequest::new("Editor de fotos");
        let text = r#"Resultado:
{"tangibilityType":"INTANGIBLE","tangibilitySubtype":"DIGITAL","confidence":0.85,"explanation":"Aplicativo","details":{"platform":"web"},"characteristics":["download"]}"#;
        let raw = body(text, "STOP");

        let flat = Interpreter::new()
            .interpret_classification(&raw, &request, &meta())
            .unwrap();
        assert_eq!(flat.source, PayloadSource::Fallback);

        let result = Interpreter::new()
            .with_extraction_mode(ExtractionMode::Balanced)
            .interpret_classification(&raw, &request, &meta())
            .unwrap();
        assert_eq!(result.source, PayloadSource::Structured);
        assert_eq!(result.tangibility_type, TangibilityType::Intangible);
        assert_eq!(
            result.tangibility_subtype,
            Some(crate::models::TangibilitySubtype::Digital)
        );
        assert_eq!(result.confidence, 0.85);
        assert_eq!(result.explanation, "Aplicativo");
        assert_eq!(result.characteristics, vec!["download".to_string()]);
    }

    #[test]
    fn test_malformed_and_empty_envelopes() {
        let interpreter = Interpreter::new();
        let request = SentimentRequest::new("x");
        assert!(matches!(
            interpreter.interpret_sentiment("<html>502</html>", &request, &meta()),
            Err(PipelineError::MalformedEnvelope(_))
        ));
        assert_eq!(
            interpreter
                .interpret_sentiment(r#"{"candidates": []}"#, &request, &meta())
                .unwrap_err(),
            PipelineError::NoCandidates
        );
        assert_eq!(
            interpreter
                .interpret_sentiment(&body("   ", "STOP"), &request, &meta())
                .unwrap_err(),
            PipelineError::EmptyContent
        );
    }

    #[test]
    fn test_interpretation_is_idempotent() {
        let interpreter = Interpreter::new();
        let request = ClassificationRequest::new("Curso de Rust");
        let raw = body("Trata-se de um curso online", "STOP");

        let first = interpreter.interpret_classification(&raw, &request, &meta());
        let second = interpreter.interpret_classification(&raw, &request, &meta());
        assert_eq!(first, second);
    }
}
