//! Keyword heuristics used when no structured payload can be extracted.
//!
//! These never fail: any input lands in one of the branches below.

use crate::models::{
    ClassificationPayload, LifeCycle, PriceCategory, SentimentLabel, SentimentPayload,
    TangibilitySubtype, TangibilityType,
};

const POSITIVE_KEYWORDS: &[&str] = &["positiv", "bom", "feliz"];
const NEGATIVE_KEYWORDS: &[&str] = &["negativ", "ruim", "triste"];

const TANGIBLE_KEYWORDS: &[&str] = &[
    "físico",
    "material",
    "objeto",
    "produto",
    "item",
    "mercadoria",
    "equipamento",
    "aparelho",
    "dispositivo",
    "máquina",
];

const INTANGIBLE_KEYWORDS: &[&str] = &[
    "serviço",
    "consultoria",
    "software",
    "aplicativo",
    "curso",
    "experiência",
    "conhecimento",
    "licença",
    "digital",
];

fn contains_any(haystacks: &[&str], keywords: &[&str]) -> bool {
    keywords
        .iter()
        .any(|k| haystacks.iter().any(|h| h.contains(k)))
}

/// Positive keywords win over negative ones; neither means neutral.
pub fn sentiment(text: &str) -> SentimentPayload {
    let lower = text.to_lowercase();
    let haystack = [lower.as_str()];

    let (label, confidence, explanation) = if contains_any(&haystack, POSITIVE_KEYWORDS) {
        (
            SentimentLabel::Positive,
            0.7,
            "Keyword-based fallback analysis: positive keywords found",
        )
    } else if contains_any(&haystack, NEGATIVE_KEYWORDS) {
        (
            SentimentLabel::Negative,
            0.7,
            "Keyword-based fallback analysis: negative keywords found",
        )
    } else {
        (
            SentimentLabel::Neutral,
            0.6,
            "Keyword-based fallback analysis: no sentiment keywords, assuming neutral",
        )
    };

    tracing::info!("Sentiment fallback classified text as {}", label);

    SentimentPayload {
        label,
        confidence,
        explanation: explanation.to_string(),
    }
}

/// Scans both the generated text and the product name. Price and life
/// cycle are never estimated.
pub fn classification(text: &str, product_name: &str) -> ClassificationPayload {
    let lower_text = text.to_lowercase();
    let lower_name = product_name.to_lowercase();
    let haystacks = [lower_text.as_str(), lower_name.as_str()];

    let has_tangible = contains_any(&haystacks, TANGIBLE_KEYWORDS);
    let has_intangible = contains_any(&haystacks, INTANGIBLE_KEYWORDS);

    let (tangibility_type, subtype, confidence, explanation, characteristic) =
        match (has_tangible, has_intangible) {
            (true, true) => (
                TangibilityType::Hybrid,
                TangibilitySubtype::Mixed,
                0.6,
                "Keyword-based fallback classification: hybrid product",
                "Tangible and intangible elements identified",
            ),
            (true, false) => (
                TangibilityType::Tangible,
                TangibilitySubtype::NonDurable,
                0.7,
                "Keyword-based fallback classification: physical product",
                "Physical characteristics identified",
            ),
            (false, true) => (
                TangibilityType::Intangible,
                TangibilitySubtype::Service,
                0.7,
                "Keyword-based fallback classification: intangible product",
                "Service or digital characteristics identified",
            ),
            (false, false) => (
                TangibilityType::Tangible,
                TangibilitySubtype::NonDurable,
                0.5,
                "Default fallback classification: assuming a tangible product",
                "Uncertain classification",
            ),
        };

    tracing::info!(
        "Classification fallback for '{}': {:?}/{:?}",
        product_name,
        tangibility_type,
        subtype
    );

    ClassificationPayload {
        tangibility_type,
        tangibility_subtype: Some(subtype),
        confidence,
        explanation: explanation.to_string(),
        characteristics: vec![characteristic.to_string()],
        price_category: PriceCategory::NotApplicable,
        life_cycle: LifeCycle::NotApplicable,
    }
}
