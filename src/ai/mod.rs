//! Generation clients
//!
//! A `GenerationClient` sends one prompt and returns the provider's raw
//! response body untouched. Interpretation of that body is the pipeline's
//! job, so clients only report transport-level failures.

pub mod gemini;
pub mod mock;

pub use gemini::GeminiClient;
pub use mock::MockGenerationClient;

use crate::config::GenerationConfig;
use crate::Result;
use async_trait::async_trait;

#[async_trait]
pub trait GenerationClient: Send + Sync {
    async fn generate(&self, prompt: &str, config: &GenerationConfig) -> Result<String>;
}
