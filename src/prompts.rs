//! Prompt construction for each use case.

use crate::config::UseCase;
use crate::models::{
    ChatRequest, ClassificationRequest, SentimentRequest, SummaryRequest, SummaryStyle,
};

pub const SENTIMENT: &str = include_str!("../data/prompts/sentiment.txt");
pub const SUMMARY: &str = include_str!("../data/prompts/summary.txt");
pub const CLASSIFICATION: &str = include_str!("../data/prompts/classification.txt");

/// A typed request tagged with its use case.
#[derive(Debug, Clone, Copy)]
pub enum PromptRequest<'a> {
    Chat(&'a ChatRequest),
    Sentiment(&'a SentimentRequest),
    Summary(&'a SummaryRequest),
    Classification(&'a ClassificationRequest),
}

impl PromptRequest<'_> {
    pub fn use_case(&self) -> UseCase {
        match self {
            PromptRequest::Chat(_) => UseCase::Chat,
            PromptRequest::Sentiment(_) => UseCase::Sentiment,
            PromptRequest::Summary(_) => UseCase::Summary,
            PromptRequest::Classification(_) => UseCase::Classification,
        }
    }
}

/// Replace `{{key}}` placeholders in a template string.
///
/// Single pass over the template: substituted values are never rescanned,
/// so user text containing `{{...}}` is inserted verbatim. Unknown
/// placeholders are left as-is.
pub fn render(template: &str, vars: &[(&str, &str)]) -> String {
    let mut result = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(start) = rest.find("{{") {
        result.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        let Some(end) = after.find("}}") else {
            rest = &rest[start..];
            break;
        };

        let key = &after[..end];
        match vars.iter().find(|(k, _)| *k == key) {
            Some((_, value)) => result.push_str(value),
            None => result.push_str(&rest[start..start + end + 4]),
        }
        rest = &after[end + 2..];
    }

    result.push_str(rest);
    result
}

pub fn build_prompt(request: PromptRequest<'_>) -> String {
    match request {
        PromptRequest::Chat(r) => chat_prompt(r),
        PromptRequest::Sentiment(r) => render(
            SENTIMENT,
            &[("language", r.language.as_str()), ("text", r.text.as_str())],
        ),
        PromptRequest::Summary(r) => render(
            SUMMARY,
            &[
                ("style", style_instruction(r.style)),
                ("max_sentences", &r.max_sentences.to_string()),
                ("text", r.text.as_str()),
            ],
        ),
        PromptRequest::Classification(r) => {
            render(CLASSIFICATION, &[("product", &product_info(r))])
        }
    }
}

fn chat_prompt(request: &ChatRequest) -> String {
    let mut prompt = String::new();
    if let Some(context) = non_blank(request.context.as_deref()) {
        prompt.push_str("Contexto: ");
        prompt.push_str(context);
        prompt.push_str("\n\n");
    }
    prompt.push_str("Pergunta: ");
    prompt.push_str(&request.message);
    prompt
}

fn style_instruction(style: SummaryStyle) -> &'static str {
    match style {
        SummaryStyle::Concise => "Crie um resumo conciso e direto",
        SummaryStyle::Detailed => "Crie um resumo detalhado e explicativo",
        SummaryStyle::BulletPoints => "Crie um resumo em formato de bullet points (•)",
    }
}

fn product_info(request: &ClassificationRequest) -> String {
    let mut info = format!("Nome: {}", request.product_name);
    if let Some(description) = non_blank(request.description.as_deref()) {
        info.push_str("\nDescrição: ");
        info.push_str(description);
    }
    if let Some(category) = non_blank(request.category.as_deref()) {
        info.push_str("\nCategoria: ");
        info.push_str(category);
    }
    info
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_does_not_expand_user_values() {
        assert_eq!(
            render(
                "{{language}}|{{text}}|{{missing}}",
                &[("language", "{{text}}"), ("text", "segredo {{language}}")],
            ),
            "{{text}}|segredo {{language}}|{{missing}}"
        );
    }

    #[test]
    fn test_sentiment_prompt_keeps_language_literal() {
        let request = SentimentRequest {
            text: "Adorei".to_string(),
            language: "{{text}}".to_string(),
        };
        let prompt = build_prompt(PromptRequest::Sentiment(&request));
        assert!(prompt.contains("Idioma do texto: {{text}}"));
        assert_eq!(prompt.matches("Adorei").count(), 1);
    }

    #[test]
    fn test_render_multiple_vars() {
        assert_eq!(
            render("{{a}} and {{b}}", &[("a", "cats"), ("b", "dogs")]),
            "cats and dogs"
        );
    }

    #[test]
    fn test_templates_have_placeholders() {
        assert!(SENTIMENT.contains("{{text}}"));
        assert!(SUMMARY.contains("{{style}}"));
        assert!(SUMMARY.contains("{{max_sentences}}"));
        assert!(CLASSIFICATION.contains("{{product}}"));
    }

    #[test]
    fn test_chat_prompt_includes_context_when_present() {
        let request = ChatRequest {
            message: "What is AI?".to_string(),
            context: Some("Technology discussion".to_string()),
        };
        let prompt = build_prompt(PromptRequest::Chat(&request));
        assert!(prompt.contains("Contexto: Technology discussion"));
        assert!(prompt.contains("Pergunta: What is AI?"));
    }

    #[test]
    fn test_chat_prompt_skips_blank_context() {
        for context in [None, Some(String::new()), Some("   ".to_string())] {
            let request = ChatRequest {
                message: "Hello".to_string(),
                context,
            };
            let prompt = build_prompt(PromptRequest::Chat(&request));
            assert!(!prompt.contains("Contexto:"));
            assert_eq!(prompt, "Pergunta: Hello");
        }
    }

    #[test]
    fn test_summary_prompt_dispatches_on_style() {
        let mut request = SummaryRequest {
            text: "Um texto longo".to_string(),
            max_sentences: 2,
            style: SummaryStyle::BulletPoints,
        };
        let prompt = build_prompt(PromptRequest::Summary(&request));
        assert!(prompt.starts_with("Crie um resumo em formato de bullet points"));
        assert!(prompt.contains("no máximo 2 sentenças"));
        assert!(prompt.contains("Um texto longo"));

        request.style = SummaryStyle::Detailed;
        let prompt = build_prompt(PromptRequest::Summary(&request));
        assert!(prompt.starts_with("Crie um resumo detalhado"));
    }

    #[test]
    fn test_classification_prompt_lists_optional_fields() {
        let request = ClassificationRequest {
            product_name: "Cadeira".to_string(),
            description: Some("Cadeira de escritório".to_string()),
            category: Some(" ".to_string()),
        };
        let prompt = build_prompt(PromptRequest::Classification(&request));
        assert!(prompt.contains("Nome: Cadeira\nDescrição: Cadeira de escritório"));
        assert!(!prompt.contains("Categoria:"));
    }

    #[test]
    fn test_user_text_is_not_re_expanded() {
        let request = SentimentRequest {
            text: "literal {{language}}".to_string(),
            language: "pt".to_string(),
        };
        let prompt = build_prompt(PromptRequest::Sentiment(&request));
        assert!(prompt.contains("\"literal {{language}}\""));
    }

    #[test]
    fn test_use_case_tag() {
        let request = SentimentRequest::new("x");
        assert_eq!(
            PromptRequest::Sentiment(&request).use_case(),
            UseCase::Sentiment
        );
    }
}
