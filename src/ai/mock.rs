use super::GenerationClient;
use crate::config::GenerationConfig;
use crate::{Error, Result};
use async_trait::async_trait;
use std::sync::{Arc, Mutex};

/// Canned-response client for tests and offline runs.
///
/// Responses are served in order and cycle once exhausted. With no queued
/// responses every call fails with `AiProvider`.
#[derive(Clone, Default)]
pub struct MockGenerationClient {
    responses: Arc<Mutex<Vec<String>>>,
    prompts: Arc<Mutex<Vec<String>>>,
    configs: Arc<Mutex<Vec<GenerationConfig>>>,
}

impl MockGenerationClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_response(self, response: impl Into<String>) -> Self {
        self.responses.lock().unwrap().push(response.into());
        self
    }

    /// Queue a `generateContent` body with one text candidate.
    pub fn with_text_response(self, text: &str, finish_reason: &str, total_tokens: u32) -> Self {
        let body = serde_json::json!({
            "candidates": [{
                "content": { "parts": [{ "text": text }], "role": "model" },
                "finishReason": finish_reason
            }],
            "usageMetadata": { "totalTokenCount": total_tokens }
        });
        self.with_response(body.to_string())
    }

    pub fn get_call_count(&self) -> usize {
        self.prompts.lock().unwrap().len()
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }

    pub fn configs(&self) -> Vec<GenerationConfig> {
        self.configs.lock().unwrap().clone()
    }
}

#[async_trait]
impl GenerationClient for MockGenerationClient {
    async fn generate(&self, prompt: &str, config: &GenerationConfig) -> Result<String> {
        let call_index = {
            let mut prompts = self.prompts.lock().unwrap();
            prompts.push(prompt.to_string());
            prompts.len() - 1
        };
        self.configs.lock().unwrap().push(config.clone());

        let responses = self.responses.lock().unwrap();
        if responses.is_empty() {
            return Err(Error::AiProvider("No mock response configured".to_string()));
        }
        Ok(responses[call_index % responses.len()].clone())
    }
}
