//! Error handling and custom error types
//!
//! `PipelineError` is the tagged failure taxonomy of response interpretation.
//! `Error` is the crate-wide error that also covers transport, configuration
//! and request validation.

use thiserror::Error;

/// Violated `GenerationConfig` invariant.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ConfigError {
    #[error("temperature must be between 0.0 and 1.0 (got {0})")]
    TemperatureOutOfRange(f64),

    #[error("max tokens must be positive")]
    NonPositiveMaxTokens,

    #[error("model cannot be empty")]
    BlankModel,

    #[error("credential cannot be empty")]
    BlankCredential,
}

/// Failure classes produced while interpreting a raw generation response.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum PipelineError {
    #[error("invalid generation config: {0}")]
    InvalidConfig(#[from] ConfigError),

    #[error("the model returned no candidates")]
    NoCandidates,

    #[error("the response was blocked by safety filters")]
    SafetyBlocked,

    #[error("the response was blocked for possible content recitation")]
    RecitationBlocked,

    #[error("generation finished for an unknown reason")]
    UnknownTermination,

    #[error("the response was cut off by the token limit; try a shorter input")]
    TruncatedByLength,

    #[error("the model returned no content")]
    EmptyContent,

    #[error("no structured payload found in the generated text")]
    NoStructuredPayload,

    #[error("malformed response envelope: {0}")]
    MalformedEnvelope(String),
}

impl PipelineError {
    /// Stable machine-readable code for outer surfaces.
    pub fn code(&self) -> &'static str {
        match self {
            PipelineError::InvalidConfig(_) => "INVALID_CONFIG",
            PipelineError::NoCandidates => "NO_CANDIDATES",
            PipelineError::SafetyBlocked => "SAFETY_BLOCKED",
            PipelineError::RecitationBlocked => "RECITATION_BLOCKED",
            PipelineError::UnknownTermination => "UNKNOWN_TERMINATION",
            PipelineError::TruncatedByLength => "TRUNCATED_BY_LENGTH",
            PipelineError::EmptyContent => "EMPTY_CONTENT",
            PipelineError::NoStructuredPayload => "NO_STRUCTURED_PAYLOAD",
            PipelineError::MalformedEnvelope(_) => "MALFORMED_ENVELOPE",
        }
    }
}

#[derive(Error, Debug)]
pub enum Error {
    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Environment variable error: {0}")]
    EnvVar(#[from] dotenvy::Error),

    #[error("AI provider error: {0}")]
    AiProvider(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    Pipeline(#[from] PipelineError),
}

impl From<ConfigError> for Error {
    fn from(err: ConfigError) -> Self {
        Error::Pipeline(PipelineError::InvalidConfig(err))
    }
}

impl Error {
    /// Stable machine-readable code for outer surfaces.
    pub fn code(&self) -> &'static str {
        match self {
            Error::Pipeline(e) => e.code(),
            Error::InvalidInput(_) => "INVALID_INPUT",
            Error::Config(_) | Error::EnvVar(_) => "CONFIGURATION",
            Error::Http(_) | Error::AiProvider(_) => "PROVIDER_UNAVAILABLE",
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
