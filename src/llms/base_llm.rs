//! Base LLM trait: the seam to the external reasoning capability.
//!
//! An implementation sends one prompt and returns one text completion. It
//! performs a single attempt; retry, backoff, pacing and timeouts are the
//! caller's concern (see [`crate::reasoning::ReasoningClient`]). Failures
//! must be classified so that rate limits are distinguishable from other
//! errors.

use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::utilities::errors::LLMError;

/// Model-name prefixes of reasoning-class models.
const REASONING_MODEL_PREFIXES: [&str; 3] = ["gpt-5", "o1", "o3"];

/// Whether `model` is a reasoning-class model. These take
/// `max_completion_tokens`, reject sampling parameters and need a larger
/// token allowance. A `provider/` prefix is ignored.
pub fn is_reasoning_model(model: &str) -> bool {
    let name = model.rsplit('/').next().unwrap_or(model);
    REASONING_MODEL_PREFIXES
        .iter()
        .any(|prefix| name.starts_with(prefix))
}

/// One prompt: a system directive plus the user message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompletionRequest {
    pub system: String,
    pub user: String,
    #[serde(default)]
    pub max_tokens: Option<u32>,
    #[serde(default)]
    pub temperature: Option<f64>,
}

impl CompletionRequest {
    pub fn new(system: impl Into<String>, user: impl Into<String>) -> Self {
        Self {
            system: system.into(),
            user: user.into(),
            max_tokens: None,
            temperature: None,
        }
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    pub fn with_temperature(mut self, temperature: f64) -> Self {
        self.temperature = Some(temperature);
        self
    }
}

/// Token counts reported for one completion.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenUsage {
    pub prompt_tokens: i64,
    pub completion_tokens: i64,
}

impl TokenUsage {
    pub fn total(&self) -> i64 {
        self.prompt_tokens + self.completion_tokens
    }
}

/// Text returned by the capability.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Completion {
    pub text: String,
    #[serde(default)]
    pub usage: Option<TokenUsage>,
}

impl Completion {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            usage: None,
        }
    }
}

/// Abstract base trait for LLM implementations.
#[async_trait]
pub trait BaseLLM: Send + Sync + fmt::Debug {
    /// Get the model identifier/name.
    fn model(&self) -> &str;

    /// Get the provider name.
    fn provider(&self) -> &str {
        "openai"
    }

    /// Whether the configured model is reasoning-class.
    fn is_reasoning_model(&self) -> bool {
        is_reasoning_model(self.model())
    }

    /// Send one request. Exactly one attempt is made.
    async fn complete(&self, request: &CompletionRequest) -> Result<Completion, LLMError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reasoning_model_detection() {
        assert!(is_reasoning_model("gpt-5-mini"));
        assert!(is_reasoning_model("o1-preview"));
        assert!(is_reasoning_model("openai/o3-mini"));
        assert!(!is_reasoning_model("gpt-4o-mini"));
        assert!(!is_reasoning_model("llama-3"));
    }

    #[test]
    fn test_request_builder() {
        let req = CompletionRequest::new("sys", "user")
            .with_max_tokens(200)
            .with_temperature(0.0);
        assert_eq!(req.max_tokens, Some(200));
        assert_eq!(req.temperature, Some(0.0));
    }
}
