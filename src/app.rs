//! Service facade wiring prompts, the generation client and the pipeline.

use crate::ai::{GeminiClient, GenerationClient};
use crate::config::{Settings, UseCase};
use crate::models::{
    CallMeta, ChatRequest, ChatResult, ClassificationRequest, ClassificationResult,
    SentimentRequest, SentimentResult, SummaryRequest, SummaryResult,
};
use crate::pipeline::Interpreter;
use crate::prompts::{build_prompt, PromptRequest};
use crate::{Error, Result};
use std::time::Instant;
use tracing::{error, info};

/// One entry point per use case: validate, prompt, generate, interpret.
pub struct AiService {
    client: Box<dyn GenerationClient>,
    settings: Settings,
    interpreter: Interpreter,
}

impl AiService {
    /// Build a service from concrete dependencies.
    ///
    /// This is primarily useful for tests that need to inject a mock client.
    pub fn with_client(client: Box<dyn GenerationClient>, settings: Settings) -> Self {
        let interpreter = Interpreter::new().with_profiles(settings.profiles.clone());
        Self {
            client,
            settings,
            interpreter,
        }
    }

    /// Construct a Gemini-backed service from environment configuration.
    pub fn from_env() -> Result<Self> {
        let settings = Settings::from_env()?;
        info!(
            "Gemini provider: model {}, endpoint {}",
            settings.model, settings.base_url
        );
        let client = GeminiClient::new_with_client(reqwest::Client::new(), settings.timeout)
            .with_base_url(settings.base_url.clone());
        Ok(Self::with_client(Box::new(client), settings))
    }

    pub fn with_interpreter(mut self, interpreter: Interpreter) -> Self {
        self.interpreter = interpreter;
        self
    }

    pub fn interpreter(&self) -> &Interpreter {
        &self.interpreter
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Send the prompt for `request` and return the raw body with its metadata.
    async fn generate(&self, request: PromptRequest<'_>) -> Result<(String, CallMeta)> {
        let use_case = request.use_case();
        let config = self.settings.config_for(use_case)?;
        let prompt = build_prompt(request);
        let raw = self.client.generate(&prompt, &config).await?;
        Ok((raw, CallMeta::now(config.model())))
    }

    pub async fn chat(&self, request: &ChatRequest) -> Result<ChatResult> {
        request.validate()?;
        let started = log_start(UseCase::Chat, &preview(&request.message));

        let outcome = async {
            let (raw, meta) = self.generate(PromptRequest::Chat(request)).await?;
            Ok::<_, Error>(self.interpreter.interpret_chat(&raw, request, &meta)?)
        }
        .await;

        log_outcome(UseCase::Chat, started, outcome, |r| r.tokens_used)
    }

    pub async fn analyze_sentiment(&self, request: &SentimentRequest) -> Result<SentimentResult> {
        request.validate()?;
        let started = log_start(UseCase::Sentiment, &preview(&request.text));

        let outcome = async {
            let (raw, meta) = self.generate(PromptRequest::Sentiment(request)).await?;
            Ok::<_, Error>(self.interpreter.interpret_sentiment(&raw, request, &meta)?)
        }
        .await;

        log_outcome(UseCase::Sentiment, started, outcome, |r| r.tokens_used)
    }

    pub async fn summarize(&self, request: &SummaryRequest) -> Result<SummaryResult> {
        request.validate()?;
        let started = log_start(
            UseCase::Summary,
            &format!("{} characters", request.text.chars().count()),
        );

        let outcome = async {
            let (raw, meta) = self.generate(PromptRequest::Summary(request)).await?;
            Ok::<_, Error>(self.interpreter.interpret_summary(&raw, request, &meta)?)
        }
        .await;

        log_outcome(UseCase::Summary, started, outcome, |r| r.tokens_used)
    }

    pub async fn classify_product(
        &self,
        request: &ClassificationRequest,
    ) -> Result<ClassificationResult> {
        request.validate()?;
        let started = log_start(
            UseCase::Classification,
            &format!("product {}", request.product_name),
        );

        let outcome = async {
            let (raw, meta) = self
                .generate(PromptRequest::Classification(request))
                .await?;
            Ok::<_, Error>(
                self.interpreter
                    .interpret_classification(&raw, request, &meta)?,
            )
        }
        .await;

        log_outcome(UseCase::Classification, started, outcome, |r| {
            r.tokens_used
        })
    }
}

fn preview(text: &str) -> String {
    text.chars().take(50).collect()
}

fn log_start(use_case: UseCase, details: &str) -> Instant {
    info!("Starting {} operation: {}", use_case, details);
    Instant::now()
}

fn log_outcome<T>(
    use_case: UseCase,
    started: Instant,
    outcome: Result<T>,
    tokens: impl Fn(&T) -> u32,
) -> Result<T> {
    let elapsed = started.elapsed().as_millis();
    match &outcome {
        Ok(result) => info!(
            "{} operation completed in {}ms, tokens used: {}",
            use_case,
            elapsed,
            tokens(result)
        ),
        Err(e) => error!(
            "{} operation failed after {}ms [{}]: {}",
            use_case,
            elapsed,
            e.code(),
            e
        ),
    }
    outcome
}
