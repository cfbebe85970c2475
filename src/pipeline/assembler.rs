//! Final result assembly and the truncation policy decision.

use super::content::ExtractedContent;
use super::envelope::ValidatedCandidate;
use crate::config::{TruncationPolicy, UseCase};
use crate::error::PipelineError;
use crate::models::{
    CallMeta, ChatResult, ClassificationPayload, ClassificationRequest, ClassificationResult,
    PayloadSource, SentimentPayload, SentimentRequest, SentimentResult, SummaryResult,
};

/// Apply the use case's truncation policy.
///
/// Returns whether the accepted output is truncated.
pub fn resolve_truncation(
    use_case: UseCase,
    policy: TruncationPolicy,
    validated: &ValidatedCandidate<'_>,
) -> Result<bool, PipelineError> {
    if !validated.is_truncated() {
        return Ok(false);
    }
    match policy {
        TruncationPolicy::AcceptDegraded => {
            tracing::info!("Accepting truncated {} output", use_case);
            Ok(true)
        }
        TruncationPolicy::Reject => {
            tracing::warn!("Rejecting truncated {} output", use_case);
            Err(PipelineError::TruncatedByLength)
        }
    }
}

pub fn chat(content: ExtractedContent, truncated: bool, meta: &CallMeta) -> ChatResult {
    ChatResult {
        response: content.text,
        model: meta.model.clone(),
        tokens_used: content.tokens_used,
        truncated,
        timestamp: meta.received_at,
    }
}

pub fn summary(content: ExtractedContent, truncated: bool, meta: &CallMeta) -> SummaryResult {
    SummaryResult {
        summary: content.text,
        model: meta.model.clone(),
        tokens_used: content.tokens_used,
        truncated,
        timestamp: meta.received_at,
    }
}

pub fn sentiment(
    payload: SentimentPayload,
    source: PayloadSource,
    request: &SentimentRequest,
    tokens_used: u32,
    truncated: bool,
    meta: &CallMeta,
) -> SentimentResult {
    SentimentResult {
        sentiment: payload.label,
        confidence: payload.confidence,
        explanation: payload.explanation,
        original_text: request.text.clone(),
        source,
        tokens_used,
        truncated,
        timestamp: meta.received_at,
    }
}

pub fn classification(
    payload: ClassificationPayload,
    source: PayloadSource,
    request: &ClassificationRequest,
    tokens_used: u32,
    truncated: bool,
    meta: &CallMeta,
) -> ClassificationResult {
    ClassificationResult {
        product_name: request.product_name.clone(),
        tangibility_type: payload.tangibility_type,
        tangibility_subtype: payload.tangibility_subtype,
        confidence: payload.confidence,
        explanation: payload.explanation,
        characteristics: payload.characteristics,
        product_price_category: payload.price_category,
        life_cycle: payload.life_cycle,
        source,
        tokens_used,
        truncated,
        timestamp: meta.received_at,
    }
}
