//! Generation parameters and per-use-case profiles
//!
//! `GenerationConfig` is the validated, immutable bundle sent with every
//! generation call. `Settings` holds the process-wide defaults loaded from the
//! environment and derives a `GenerationConfig` for each `UseCase`.

use crate::error::ConfigError;
use crate::{Error, Result};
use serde::{Serialize, Serializer};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::time::Duration;

pub const DEFAULT_MODEL: &str = "gemini-2.0-flash";
pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";
pub const DEFAULT_TEMPERATURE: f64 = 0.7;
pub const DEFAULT_MAX_TOKENS: u32 = 1000;
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Validated generation parameters.
///
/// Construction is atomic: either every invariant holds or no value exists.
/// The credential is redacted from `Debug`, `Display` and `Serialize`.
#[derive(Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationConfig {
    temperature: f64,
    max_tokens: u32,
    model: String,
    #[serde(serialize_with = "redact")]
    credential: String,
}

impl GenerationConfig {
    pub fn new(
        temperature: f64,
        max_tokens: u32,
        model: impl AsRef<str>,
        credential: impl AsRef<str>,
    ) -> std::result::Result<Self, ConfigError> {
        // NaN fails `contains`, so it is rejected here too.
        if !(0.0..=1.0).contains(&temperature) {
            return Err(ConfigError::TemperatureOutOfRange(temperature));
        }
        if max_tokens == 0 {
            return Err(ConfigError::NonPositiveMaxTokens);
        }
        let model = model.as_ref().trim();
        if model.is_empty() {
            return Err(ConfigError::BlankModel);
        }
        let credential = credential.as_ref().trim();
        if credential.is_empty() {
            return Err(ConfigError::BlankCredential);
        }

        Ok(Self {
            // -0.0 and 0.0 must hash identically
            temperature: if temperature == 0.0 { 0.0 } else { temperature },
            max_tokens,
            model: model.to_string(),
            credential: credential.to_string(),
        })
    }

    pub fn temperature(&self) -> f64 {
        self.temperature
    }

    pub fn max_tokens(&self) -> u32 {
        self.max_tokens
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn credential(&self) -> &str {
        &self.credential
    }
}

fn redact<S: Serializer>(_: &str, serializer: S) -> std::result::Result<S::Ok, S::Error> {
    serializer.serialize_str("***")
}

impl PartialEq for GenerationConfig {
    fn eq(&self, other: &Self) -> bool {
        self.temperature.to_bits() == other.temperature.to_bits()
            && self.max_tokens == other.max_tokens
            && self.model == other.model
            && self.credential == other.credential
    }
}

impl Eq for GenerationConfig {}

impl Hash for GenerationConfig {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.temperature.to_bits().hash(state);
        self.max_tokens.hash(state);
        self.model.hash(state);
        self.credential.hash(state);
    }
}

impl fmt::Debug for GenerationConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GenerationConfig")
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .field("model", &self.model)
            .field("credential", &"***")
            .finish()
    }
}

impl fmt::Display for GenerationConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "GenerationConfig{{temperature={}, maxTokens={}, model='{}', credential='***'}}",
            self.temperature, self.max_tokens, self.model
        )
    }
}

/// The four interpretation flows the pipeline supports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum UseCase {
    Chat,
    Sentiment,
    Summary,
    Classification,
}

impl UseCase {
    pub const ALL: [UseCase; 4] = [
        UseCase::Chat,
        UseCase::Sentiment,
        UseCase::Summary,
        UseCase::Classification,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            UseCase::Chat => "chat",
            UseCase::Sentiment => "sentiment",
            UseCase::Summary => "summary",
            UseCase::Classification => "classification",
        }
    }

    fn index(&self) -> usize {
        match self {
            UseCase::Chat => 0,
            UseCase::Sentiment => 1,
            UseCase::Summary => 2,
            UseCase::Classification => 3,
        }
    }

    /// Built-in generation profile for this use case.
    pub fn default_profile(&self) -> UseCaseProfile {
        match self {
            UseCase::Chat => UseCaseProfile {
                temperature: None,
                max_tokens: None,
                has_fallback: false,
                truncation: TruncationPolicy::AcceptDegraded,
            },
            UseCase::Sentiment => UseCaseProfile {
                temperature: Some(0.1),
                max_tokens: Some(500),
                has_fallback: true,
                truncation: TruncationPolicy::AcceptDegraded,
            },
            UseCase::Summary => UseCaseProfile {
                temperature: Some(0.3),
                max_tokens: Some(1000),
                has_fallback: false,
                truncation: TruncationPolicy::Reject,
            },
            UseCase::Classification => UseCaseProfile {
                temperature: Some(0.2),
                max_tokens: Some(1200),
                has_fallback: true,
                truncation: TruncationPolicy::Reject,
            },
        }
    }
}

impl fmt::Display for UseCase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for UseCase {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "chat" => Ok(UseCase::Chat),
            "sentiment" => Ok(UseCase::Sentiment),
            "summary" => Ok(UseCase::Summary),
            "classification" | "classify" => Ok(UseCase::Classification),
            other => Err(format!(
                "Unknown use case '{}'. Expected chat, sentiment, summary or classification",
                other
            )),
        }
    }
}

/// What to do with output whose finish reason is `MAX_TOKENS`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TruncationPolicy {
    /// Return the partial output and flag it as truncated.
    AcceptDegraded,
    /// Fail with `TruncatedByLength`.
    Reject,
}

/// Per-use-case generation parameters and interpretation policy.
///
/// `None` means "use the process default from `Settings`".
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UseCaseProfile {
    pub temperature: Option<f64>,
    pub max_tokens: Option<u32>,
    pub has_fallback: bool,
    pub truncation: TruncationPolicy,
}

/// `UseCase -> UseCaseProfile` table with overridable entries.
#[derive(Debug, Clone, PartialEq)]
pub struct ProfileTable {
    profiles: [UseCaseProfile; 4],
}

impl Default for ProfileTable {
    fn default() -> Self {
        Self {
            profiles: UseCase::ALL.map(|u| u.default_profile()),
        }
    }
}

impl ProfileTable {
    pub fn get(&self, use_case: UseCase) -> &UseCaseProfile {
        &self.profiles[use_case.index()]
    }

    pub fn set(&mut self, use_case: UseCase, profile: UseCaseProfile) {
        self.profiles[use_case.index()] = profile;
    }

    pub fn set_truncation(&mut self, use_case: UseCase, policy: TruncationPolicy) {
        self.profiles[use_case.index()].truncation = policy;
    }
}

/// Process-wide defaults, usually loaded from the environment.
#[derive(Clone)]
pub struct Settings {
    pub api_key: String,
    pub model: String,
    pub base_url: String,
    pub temperature: f64,
    pub max_tokens: u32,
    pub timeout: Duration,
    pub profiles: ProfileTable,
}

impl fmt::Debug for Settings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Settings")
            .field("api_key", &"***")
            .field("model", &self.model)
            .field("base_url", &self.base_url)
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl Settings {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            model: DEFAULT_MODEL.to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
            temperature: DEFAULT_TEMPERATURE,
            max_tokens: DEFAULT_MAX_TOKENS,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            profiles: ProfileTable::default(),
        }
    }

    pub fn from_env() -> Result<Self> {
        check_dotenv(dotenvy::dotenv())?;

        let api_key = std::env::var("GEMINI_API_KEY")
            .map_err(|_| Error::Config("GEMINI_API_KEY not set".to_string()))?;

        let mut settings = Self::new(api_key);
        if let Ok(model) = std::env::var("GEMINI_MODEL") {
            settings.model = model;
        }
        if let Ok(base_url) = std::env::var("GEMINI_API_URL") {
            settings.base_url = base_url.trim_end_matches('/').to_string();
        }
        if let Some(temperature) = parse_env::<f64>("GEMINI_TEMPERATURE")? {
            settings.temperature = temperature;
        }
        if let Some(max_tokens) = parse_env::<u32>("GEMINI_MAX_TOKENS")? {
            settings.max_tokens = max_tokens;
        }
        if let Some(secs) = parse_env::<u64>("GEMINI_TIMEOUT_SECS")? {
            settings.timeout = Duration::from_secs(secs);
        }

        // Surface bad defaults at startup rather than on the first request.
        settings.default_config()?;

        Ok(settings)
    }

    /// Config built purely from the process defaults.
    pub fn default_config(&self) -> std::result::Result<GenerationConfig, ConfigError> {
        GenerationConfig::new(
            self.temperature,
            self.max_tokens,
            &self.model,
            &self.api_key,
        )
    }

    /// Config for one use case: profile values where set and positive,
    /// process defaults otherwise.
    pub fn config_for(
        &self,
        use_case: UseCase,
    ) -> std::result::Result<GenerationConfig, ConfigError> {
        let profile = self.profiles.get(use_case);
        let temperature = profile
            .temperature
            .filter(|t| *t > 0.0)
            .unwrap_or(self.temperature);
        let max_tokens = profile
            .max_tokens
            .filter(|t| *t > 0)
            .unwrap_or(self.max_tokens);

        GenerationConfig::new(temperature, max_tokens, &self.model, &self.api_key)
    }
}

/// A missing `.env` file is fine; an unreadable or malformed one is not.
fn check_dotenv(loaded: std::result::Result<std::path::PathBuf, dotenvy::Error>) -> Result<()> {
    match loaded {
        Ok(_) => Ok(()),
        Err(e) if e.not_found() => Ok(()),
        Err(e) => Err(e.into()),
    }
}

fn parse_env<T: std::str::FromStr>(key: &str) -> Result<Option<T>> {
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|_| Error::Config(format!("{} has an invalid value: {}", key, raw))),
        Err(_) => Ok(None),
    }
}
