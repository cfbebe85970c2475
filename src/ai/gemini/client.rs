use super::types::GenerateContentRequest;
use crate::ai::GenerationClient;
use crate::config::{GenerationConfig, DEFAULT_BASE_URL, DEFAULT_TIMEOUT_SECS};
use crate::pipeline::envelope::truncate_for_log;
use crate::{Error, Result};
use async_trait::async_trait;
use reqwest::Client;
use std::time::{Duration, Instant};

/// Lightweight Gemini REST client.
///
/// Model and credential come from the `GenerationConfig` of each call, so one
/// client can serve every use case.
pub struct GeminiClient {
    client: Client,
    base_url: String,
    timeout: Duration,
}

impl GeminiClient {
    pub fn new() -> Self {
        Self::new_with_client(Client::new(), Duration::from_secs(DEFAULT_TIMEOUT_SECS))
    }

    pub fn new_with_client(client: Client, timeout: Duration) -> Self {
        Self {
            client,
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout,
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// `generateContent` URL for a model ID, with or without a `models/` prefix.
    fn endpoint(&self, model: &str) -> String {
        let model = model.strip_prefix("models/").unwrap_or(model);
        format!("{}/v1beta/models/{}:generateContent", self.base_url, model)
    }
}

impl Default for GeminiClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl GenerationClient for GeminiClient {
    async fn generate(&self, prompt: &str, config: &GenerationConfig) -> Result<String> {
        let url = self.endpoint(config.model());
        let request = GenerateContentRequest::from_prompt(prompt, config);

        tracing::debug!("Calling Gemini endpoint: {}", url);
        if tracing::enabled!(tracing::Level::DEBUG) {
            if let Ok(body) = serde_json::to_string(&request) {
                tracing::debug!("Request body: {}", truncate_for_log(&body));
            }
        }

        let started = Instant::now();
        let response = self
            .client
            .post(&url)
            .timeout(self.timeout)
            .header("x-goog-api-key", config.credential())
            .header("Content-Type", "application/json")
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                tracing::error!(
                    "Failed to send request to Gemini after {}ms: {}",
                    started.elapsed().as_millis(),
                    e
                );
                e
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await?;
            tracing::error!("Gemini API error (status {}): {}", status, error_text);
            return Err(Error::AiProvider(format!(
                "Gemini API error (status {}): {}",
                status, error_text
            )));
        }

        let body = response.text().await?;
        tracing::debug!(
            "Gemini call completed in {}ms",
            started.elapsed().as_millis()
        );
        Ok(body)
    }
}
