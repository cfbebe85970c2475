//! Interpreter for Gemini `generateContent` responses
//!
//! Sends prompts for four use cases (chat, sentiment analysis, text summary,
//! product tangibility classification) and turns the model's free-form,
//! sometimes truncated or malformed output into typed results, falling back
//! to keyword heuristics when no structured payload can be extracted.

pub mod ai;
pub mod app;
pub mod config;
pub mod error;
pub mod models;
pub mod pipeline;
pub mod prompts;

pub use config::{GenerationConfig, Settings, TruncationPolicy, UseCase};
pub use error::{ConfigError, Error, PipelineError, Result};
pub use pipeline::Interpreter;
