//! OpenAI-compatible Chat Completions provider.
//!
//! Works against any endpoint exposing `POST {base_url}/chat/completions`.
//! One call is one HTTP attempt; status codes are mapped onto [`LLMError`] so
//! the reasoning client can decide what to retry.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, RETRY_AFTER};
use reqwest::StatusCode;
use serde_json::Value;

use crate::llms::base_llm::{is_reasoning_model, BaseLLM, Completion, CompletionRequest, TokenUsage};
use crate::utilities::errors::LLMError;
use crate::utilities::string_utils::truncate_chars;

/// Default API root.
pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
/// Environment variable holding the API key.
pub const API_KEY_ENV: &str = "OPENAI_API_KEY";

/// OpenAI native completion implementation.
#[derive(Debug, Clone)]
pub struct OpenAICompletion {
    model: String,
    api_key: Option<String>,
    base_url: String,
    organization: Option<String>,
    client: reqwest::Client,
}

impl OpenAICompletion {
    /// Create a new provider.
    ///
    /// `api_key` defaults to `OPENAI_API_KEY`, `base_url` to the public API.
    pub fn new(model: impl Into<String>, api_key: Option<String>, base_url: Option<String>) -> Self {
        Self {
            model: model.into(),
            api_key: api_key.or_else(|| std::env::var(API_KEY_ENV).ok()),
            base_url: base_url
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_string())
                .trim_end_matches('/')
                .to_string(),
            organization: std::env::var("OPENAI_ORGANIZATION").ok(),
            client: reqwest::Client::new(),
        }
    }

    pub fn api_base_url(&self) -> &str {
        &self.base_url
    }

    /// Build the request body for the Chat Completions API.
    ///
    /// Reasoning-class models get `max_completion_tokens` and no temperature.
    pub fn build_request_body(&self, request: &CompletionRequest) -> Value {
        let mut messages = Vec::with_capacity(2);
        if !request.system.is_empty() {
            messages.push(serde_json::json!({"role": "system", "content": request.system}));
        }
        messages.push(serde_json::json!({"role": "user", "content": request.user}));

        let mut body = serde_json::json!({
            "model": self.model,
            "messages": messages,
        });

        if is_reasoning_model(&self.model) {
            if let Some(max_tokens) = request.max_tokens {
                body["max_completion_tokens"] = serde_json::json!(max_tokens);
            }
        } else {
            if let Some(max_tokens) = request.max_tokens {
                body["max_tokens"] = serde_json::json!(max_tokens);
            }
            if let Some(temp) = request.temperature {
                body["temperature"] = serde_json::json!(temp);
            }
        }
        body
    }

    /// Parse a Chat Completions API response.
    fn parse_completions_response(response: &Value) -> Result<Completion, LLMError> {
        let message = response
            .get("choices")
            .and_then(|c| c.get(0))
            .and_then(|c| c.get("message"))
            .ok_or_else(|| LLMError::Permanent("No message in OpenAI response".to_string()))?;

        let text = message
            .get("content")
            .and_then(|c| c.as_str())
            .unwrap_or("")
            .trim()
            .to_string();

        let usage = response.get("usage").map(|usage| {
            let field = |name: &str| usage.get(name).and_then(|v| v.as_i64()).unwrap_or(0);
            TokenUsage {
                prompt_tokens: field("prompt_tokens"),
                completion_tokens: field("completion_tokens"),
            }
        });
        if let Some(u) = usage {
            log::debug!(
                "OpenAI token usage: prompt={}, completion={}, total={}",
                u.prompt_tokens,
                u.completion_tokens,
                u.total()
            );
        }

        Ok(Completion { text, usage })
    }
}

/// Parse a `Retry-After` value given in (possibly fractional) seconds.
/// HTTP-date values are not supported and yield `None`.
pub fn parse_retry_after(value: &str) -> Option<Duration> {
    let secs: f64 = value.trim().parse().ok()?;
    Duration::try_from_secs_f64(secs).ok()
}

fn retry_after_header(headers: &HeaderMap) -> Option<Duration> {
    headers
        .get(RETRY_AFTER)
        .and_then(|v| v.to_str().ok())
        .and_then(parse_retry_after)
}

/// Map a non-success status onto an [`LLMError`].
fn classify_status(status: StatusCode, retry_after: Option<Duration>, body: &str) -> LLMError {
    let snippet = truncate_chars(body, 500);
    if status == StatusCode::TOO_MANY_REQUESTS {
        LLMError::RateLimited { retry_after }
    } else if status.is_server_error() || status == StatusCode::REQUEST_TIMEOUT {
        LLMError::Transient(format!("OpenAI API server error ({}): {}", status, snippet))
    } else {
        LLMError::Permanent(format!("OpenAI API error ({}): {}", status, snippet))
    }
}

#[async_trait]
impl BaseLLM for OpenAICompletion {
    fn model(&self) -> &str {
        &self.model
    }

    async fn complete(&self, request: &CompletionRequest) -> Result<Completion, LLMError> {
        let api_key = self.api_key.as_ref().ok_or_else(|| {
            LLMError::Permanent(format!(
                "OpenAI API key not set. Set {} or pass api_key to the constructor.",
                API_KEY_ENV
            ))
        })?;

        let body = self.build_request_body(request);
        let endpoint = format!("{}/chat/completions", self.base_url);
        log::debug!(
            "OpenAICompletion.complete: model={}, prompt_chars={}",
            self.model,
            request.system.len() + request.user.len()
        );

        let mut http = self
            .client
            .post(&endpoint)
            .header("Content-Type", "application/json")
            .header("Authorization", format!("Bearer {}", api_key));
        if let Some(ref org) = self.organization {
            http = http.header("OpenAI-Organization", org);
        }

        let response = http
            .json(&body)
            .send()
            .await
            .map_err(|e| LLMError::Transient(format!("OpenAI request failed: {}", e)))?;

        let status = response.status();
        let retry_after = retry_after_header(response.headers());
        let response_text = response
            .text()
            .await
            .map_err(|e| LLMError::Transient(format!("Failed to read OpenAI response: {}", e)))?;

        if !status.is_success() {
            return Err(classify_status(status, retry_after, &response_text));
        }

        let response_json: Value = serde_json::from_str(&response_text).map_err(|e| {
            LLMError::Permanent(format!(
                "Failed to parse OpenAI response: {} - Body: {}",
                e,
                truncate_chars(&response_text, 500)
            ))
        })?;

        Self::parse_completions_response(&response_json)
    }
}
