//! Generative model access
//!
//! The pipeline talks to the model through [`ReviewModel`] so tests can swap
//! in a scripted implementation.

mod anthropic;

pub use anthropic::AnthropicClient;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::Result;

/// Reply of one model invocation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelResponse {
    /// Raw reply text, unvalidated
    pub raw: String,
    pub prompt_tokens: Option<i64>,
    pub completion_tokens: Option<i64>,
    pub latency_ms: i64,
}

/// A generative service able to produce a review
#[async_trait]
pub trait ReviewModel: Send + Sync {
    /// Send one prompt and return the raw reply
    async fn submit(&self, prompt: &str, model: &str) -> Result<ModelResponse>;
}
