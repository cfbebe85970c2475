//! Data models and structures
//!
//! Request DTOs for the four use cases, the typed results the pipeline
//! produces, and the reply document used by outer surfaces.

use crate::{Error, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

// Requests

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChatRequest {
    pub message: String,
    #[serde(default)]
    pub context: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SentimentRequest {
    pub text: String,
    #[serde(default = "default_language")]
    pub language: String,
}

fn default_language() -> String {
    "pt".to_string()
}

/// Deserialization goes through `SummaryStyle::parse`, so unknown values
/// become `Concise` instead of failing.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(from = "String")]
pub enum SummaryStyle {
    #[default]
    #[serde(rename = "conciso")]
    Concise,
    #[serde(rename = "detalhado")]
    Detailed,
    #[serde(rename = "bullet-points")]
    BulletPoints,
}

impl SummaryStyle {
    /// Lenient parse; anything unrecognized is `Concise`.
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_lowercase().as_str() {
            "detalhado" | "detailed" => SummaryStyle::Detailed,
            "bullet-points" | "bullets" => SummaryStyle::BulletPoints,
            _ => SummaryStyle::Concise,
        }
    }
}

impl From<String> for SummaryStyle {
    fn from(raw: String) -> Self {
        SummaryStyle::parse(&raw)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SummaryRequest {
    pub text: String,
    #[serde(default = "default_max_sentences")]
    pub max_sentences: u32,
    #[serde(default)]
    pub style: SummaryStyle,
}

fn default_max_sentences() -> u32 {
    3
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ClassificationRequest {
    pub product_name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
}

fn require_text(field: &str, value: &str, max_chars: usize) -> Result<()> {
    if value.trim().is_empty() {
        return Err(Error::InvalidInput(format!("{} cannot be empty", field)));
    }
    check_length(field, value, max_chars)
}

fn check_length(field: &str, value: &str, max_chars: usize) -> Result<()> {
    let len = value.chars().count();
    if len > max_chars {
        return Err(Error::InvalidInput(format!(
            "{} must be at most {} characters (got {})",
            field, max_chars, len
        )));
    }
    Ok(())
}

impl ChatRequest {
    pub fn validate(&self) -> Result<()> {
        require_text("message", &self.message, 2000)
    }
}

impl SentimentRequest {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            language: default_language(),
        }
    }

    pub fn validate(&self) -> Result<()> {
        require_text("text", &self.text, 5000)
    }
}

impl SummaryRequest {
    pub fn validate(&self) -> Result<()> {
        require_text("text", &self.text, 10_000)?;
        if !(1..=10).contains(&self.max_sentences) {
            return Err(Error::InvalidInput(format!(
                "maxSentences must be between 1 and 10 (got {})",
                self.max_sentences
            )));
        }
        Ok(())
    }
}

impl ClassificationRequest {
    pub fn new(product_name: impl Into<String>) -> Self {
        Self {
            product_name: product_name.into(),
            description: None,
            category: None,
        }
    }

    pub fn validate(&self) -> Result<()> {
        require_text("productName", &self.product_name, 200)?;
        if let Some(description) = &self.description {
            check_length("description", description, 1000)?;
        }
        if let Some(category) = &self.category {
            check_length("category", category, 100)?;
        }
        Ok(())
    }
}

// Payload vocabulary

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SentimentLabel {
    Positive,
    Negative,
    Neutral,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TangibilityType {
    Tangible,
    Intangible,
    Hybrid,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TangibilitySubtype {
    Durable,
    NonDurable,
    Consumable,
    Service,
    Digital,
    Experience,
    Knowledge,
    Mixed,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PriceCategory {
    VeryHighCost,
    HighCost,
    MediumCost,
    LowCost,
    #[default]
    #[serde(rename = "NA")]
    NotApplicable,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LifeCycle {
    Short,
    Mid,
    Long,
    #[default]
    #[serde(rename = "NA")]
    NotApplicable,
}

/// Which path produced a sentiment or classification payload.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum PayloadSource {
    Structured,
    Fallback,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SentimentPayload {
    pub label: SentimentLabel,
    pub confidence: f64,
    pub explanation: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassificationPayload {
    pub tangibility_type: TangibilityType,
    pub tangibility_subtype: Option<TangibilitySubtype>,
    pub confidence: f64,
    pub explanation: String,
    pub characteristics: Vec<String>,
    pub price_category: PriceCategory,
    pub life_cycle: LifeCycle,
}

// Results

/// Request metadata attached to every result.
///
/// The timestamp is supplied by the caller so interpretation stays
/// reproducible.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallMeta {
    pub model: String,
    pub received_at: DateTime<Utc>,
}

impl CallMeta {
    pub fn new(model: impl Into<String>, received_at: DateTime<Utc>) -> Self {
        Self {
            model: model.into(),
            received_at,
        }
    }

    pub fn now(model: impl Into<String>) -> Self {
        Self::new(model, Utc::now())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatResult {
    pub response: String,
    pub model: String,
    pub tokens_used: u32,
    pub truncated: bool,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SummaryResult {
    pub summary: String,
    pub model: String,
    pub tokens_used: u32,
    pub truncated: bool,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SentimentResult {
    pub sentiment: SentimentLabel,
    pub confidence: f64,
    pub explanation: String,
    pub original_text: String,
    pub source: PayloadSource,
    pub tokens_used: u32,
    pub truncated: bool,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassificationResult {
    pub product_name: String,
    pub tangibility_type: TangibilityType,
    pub tangibility_subtype: Option<TangibilitySubtype>,
    pub confidence: f64,
    pub explanation: String,
    pub characteristics: Vec<String>,
    pub product_price_category: PriceCategory,
    pub life_cycle: LifeCycle,
    pub source: PayloadSource,
    pub tokens_used: u32,
    pub truncated: bool,
    pub timestamp: DateTime<Utc>,
}

/// Success/error document for callers that need a single serializable shape.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum Reply<T> {
    Success {
        #[serde(flatten)]
        data: T,
    },
    Error {
        code: String,
        message: String,
    },
}

impl<T> Reply<T> {
    pub fn is_success(&self) -> bool {
        matches!(self, Reply::Success { .. })
    }
}

impl<T> From<Result<T>> for Reply<T> {
    fn from(result: Result<T>) -> Self {
        match result {
            Ok(data) => Reply::Success { data },
            Err(e) => Reply::Error {
                code: e.code().to_string(),
                message: e.to_string(),
            },
        }
    }
}

impl fmt::Display for SentimentLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SentimentLabel::Positive => "POSITIVE",
            SentimentLabel::Negative => "NEGATIVE",
            SentimentLabel::Neutral => "NEUTRAL",
        };
        f.write_str(s)
    }
}
