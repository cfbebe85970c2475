//! Extraction of the JSON payload embedded in free-text completions.
//!
//! Models wrap the requested JSON in prose or code fences. The payload is
//! located first, then decoded into a lenient DTO and mapped onto the typed
//! payload. Any failure is reported as `NoStructuredPayload` so callers can
//! fall back to the keyword heuristics.

use crate::error::PipelineError;
use crate::models::{
    ClassificationPayload, LifeCycle, PriceCategory, SentimentLabel, SentimentPayload,
    TangibilitySubtype, TangibilityType,
};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};

/// First `{` up to the first `}` after it. Cannot capture nested objects.
static FLAT_OBJECT: Lazy<Regex> = Lazy::new(|| Regex::new(r"\{[^}]*\}").expect("valid regex"));

/// How the payload is located inside the generated text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExtractionMode {
    /// First `{...}` containing no `}`. Objects nested inside the payload
    /// cut the capture short and make the parse fail.
    #[default]
    FirstFlatObject,
    /// First `{` through its balancing `}`, skipping braces inside JSON
    /// string literals.
    Balanced,
}

/// Locate the candidate payload substring.
pub fn locate(text: &str, mode: ExtractionMode) -> Option<&str> {
    match mode {
        ExtractionMode::FirstFlatObject => FLAT_OBJECT.find(text).map(|m| m.as_str()),
        ExtractionMode::Balanced => balanced_object(text),
    }
}

fn balanced_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (offset, ch) in text[start..].char_indices() {
        if in_string {
            if escaped {
                escaped = false;
            } else if ch == '\\' {
                escaped = true;
            } else if ch == '"' {
                in_string = false;
            }
            continue;
        }
        match ch {
            '"' => in_string = true,
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(&text[start..start + offset + 1]);
                }
            }
            _ => {}
        }
    }

    // Unbalanced, usually a truncated generation.
    None
}

fn decode<T: DeserializeOwned>(text: &str, mode: ExtractionMode) -> Result<T, PipelineError> {
    let Some(raw) = locate(text, mode) else {
        tracing::debug!("No JSON object found in generated text");
        return Err(PipelineError::NoStructuredPayload);
    };

    serde_json::from_str(raw).map_err(|e| {
        tracing::warn!("Failed to parse embedded JSON payload: {}", e);
        PipelineError::NoStructuredPayload
    })
}

#[derive(Debug, Deserialize)]
struct SentimentDto {
    #[serde(default)]
    sentiment: Option<String>,
    #[serde(default, deserialize_with = "lenient_number")]
    confidence: Option<f64>,
    #[serde(default)]
    explanation: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ClassificationDto {
    #[serde(default)]
    tangibility_type: Option<String>,
    #[serde(default)]
    tangibility_subtype: Option<String>,
    #[serde(default, deserialize_with = "lenient_number")]
    confidence: Option<f64>,
    #[serde(default)]
    explanation: Option<String>,
    #[serde(default)]
    product_price_category: Option<String>,
    #[serde(default)]
    life_cycle: Option<String>,
    #[serde(default)]
    characteristics: Option<Vec<String>>,
}

/// Accepts numbers and numeric strings; anything else reads as absent.
fn lenient_number<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(serde_json::Value::Number(n)) => n.as_f64(),
        Some(serde_json::Value::String(s)) => s.trim().parse().ok(),
        _ => None,
    })
}

/// Missing or non-finite confidence reads as 0.0; out-of-range is clamped.
fn normalize_confidence(raw: Option<f64>) -> f64 {
    match raw {
        Some(c) if c.is_finite() => {
            if !(0.0..=1.0).contains(&c) {
                tracing::debug!("Clamping out-of-range confidence {}", c);
            }
            c.clamp(0.0, 1.0)
        }
        _ => 0.0,
    }
}

/// Parse a vocabulary word such as `non-durable` or `High Cost` through the
/// enum's serde names.
fn parse_vocab<T: DeserializeOwned>(raw: &str) -> Option<T> {
    let normalized = raw.trim().to_uppercase().replace(['-', ' '], "_");
    serde_json::from_value(serde_json::Value::String(normalized)).ok()
}

fn optional_vocab<T: DeserializeOwned>(field: &str, raw: Option<&str>) -> Option<T> {
    let raw = raw.filter(|r| !r.trim().is_empty())?;
    let parsed = parse_vocab(raw);
    if parsed.is_none() {
        tracing::debug!("Ignoring unrecognized {} value '{}'", field, raw);
    }
    parsed
}

pub fn extract_sentiment(
    text: &str,
    mode: ExtractionMode,
) -> Result<SentimentPayload, PipelineError> {
    let dto: SentimentDto = decode(text, mode)?;

    let label = dto
        .sentiment
        .as_deref()
        .and_then(parse_vocab::<SentimentLabel>)
        .ok_or_else(|| {
            tracing::warn!("Sentiment payload has no usable label: {:?}", dto.sentiment);
            PipelineError::NoStructuredPayload
        })?;

    Ok(SentimentPayload {
        label,
        confidence: normalize_confidence(dto.confidence),
        explanation: dto.explanation.unwrap_or_default(),
    })
}

pub fn extract_classification(
    text: &str,
    mode: ExtractionMode,
) -> Result<ClassificationPayload, PipelineError> {
    let dto: ClassificationDto = decode(text, mode)?;

    let tangibility_type = dto
        .tangibility_type
        .as_deref()
        .and_then(parse_vocab::<TangibilityType>)
        .ok_or_else(|| {
            tracing::warn!(
                "Classification payload has no usable tangibility type: {:?}",
                dto.tangibility_type
            );
            PipelineError::NoStructuredPayload
        })?;

    Ok(ClassificationPayload {
        tangibility_type,
        tangibility_subtype: optional_vocab::<TangibilitySubtype>(
            "tangibilitySubtype",
            dto.tangibility_subtype.as_deref(),
        ),
        confidence: normalize_confidence(dto.confidence),
        explanation: dto.explanation.unwrap_or_default(),
        characteristics: dto.characteristics.unwrap_or_default(),
        price_category: optional_vocab(
            "productPriceCategory",
            dto.product_price_category.as_deref(),
        )
        .unwrap_or(PriceCategory::NotApplicable),
        life_cycle: optional_vocab("lifeCycle", dto.life_cycle.as_deref())
            .unwrap_or(LifeCycle::NotApplicable),
    })
}
