//! Gemini `generateContent` request payload.

use crate::config::GenerationConfig;
use serde::Serialize;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentRequest {
    pub contents: Vec<RequestContent>,
    pub generation_config: RequestGenerationConfig,
}

#[derive(Debug, Serialize)]
pub struct RequestContent {
    pub parts: Vec<TextPart>,
}

#[derive(Debug, Serialize)]
pub struct TextPart {
    pub text: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestGenerationConfig {
    pub temperature: f64,
    pub max_output_tokens: u32,
}

impl GenerateContentRequest {
    /// Single-turn text request using the config's sampling parameters.
    pub fn from_prompt(prompt: &str, config: &GenerationConfig) -> Self {
        Self {
            contents: vec![RequestContent {
                parts: vec![TextPart {
                    text: prompt.to_string(),
                }],
            }],
            generation_config: RequestGenerationConfig {
                temperature: config.temperature(),
                max_output_tokens: config.max_tokens(),
            },
        }
    }
}
