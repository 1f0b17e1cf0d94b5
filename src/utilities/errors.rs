//! Error types for the inference pipeline.
//!
//! Capacity and availability problems are surfaced as [`AssessmentError`].
//! Parsing problems on individual answers are never errors: they are recovered
//! locally and flagged on the answer itself.

use std::time::Duration;

use thiserror::Error;

use crate::types::ChannelKind;

/// Errors surfaced to callers of the sampler, engine, synthesizer and pipeline.
#[derive(Debug, Error)]
pub enum AssessmentError {
    /// The corpus had no usable text after exclusion.
    #[error("insufficient evidence for channel {channel}: no usable text units after exclusion")]
    InsufficientEvidence { channel: ChannelKind },

    /// Retries against the reasoning capability were exhausted.
    #[error("reasoning service still unavailable after {attempts} attempts: {last_error}")]
    RateLimited { attempts: u32, last_error: String },

    /// The reasoning capability rejected the request permanently.
    #[error("reasoning service error: {0}")]
    Service(String),

    /// The assessment was aborted at a batch boundary.
    #[error("assessment cancelled after {completed_batches} completed batches")]
    Cancelled { completed_batches: usize },

    /// Synthesis received no successful runs from any channel.
    #[error("no channel produced assessment results")]
    NoChannelResults,

    /// Invalid or unreadable configuration.
    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl AssessmentError {
    /// Whether a later attempt might succeed without changing any input.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::RateLimited { .. })
    }
}

/// Configuration loading and validation errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read configuration: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse configuration YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Failures reported by a [`crate::llms::BaseLLM`] implementation for a
/// single request.
#[derive(Debug, Clone, Error)]
pub enum LLMError {
    /// HTTP 429 or an equivalent quota signal.
    #[error("rate limited{}", retry_suffix(.retry_after))]
    RateLimited { retry_after: Option<Duration> },

    /// The request exceeded its deadline.
    #[error("request timed out after {0:?}")]
    Timeout(Duration),

    /// Connection resets, 5xx responses and similar.
    #[error("transient service failure: {0}")]
    Transient(String),

    /// Authentication failures, 4xx responses, malformed envelopes.
    #[error("permanent service failure: {0}")]
    Permanent(String),
}

fn retry_suffix(retry_after: &Option<Duration>) -> String {
    retry_after
        .map(|d| format!(" (retry after {}ms)", d.as_millis()))
        .unwrap_or_default()
}

impl LLMError {
    /// Whether the retry policy applies to this failure.
    pub fn is_retryable(&self) -> bool {
        !matches!(self, Self::Permanent(_))
    }

    /// Server-suggested delay, if any.
    pub fn retry_after(&self) -> Option<Duration> {
        match self {
            Self::RateLimited { retry_after } => *retry_after,
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_llm_error_retryable() {
        assert!(LLMError::Timeout(Duration::from_secs(1)).is_retryable());
        assert!(LLMError::RateLimited { retry_after: None }.is_retryable());
        assert!(LLMError::Transient("503".into()).is_retryable());
        assert!(!LLMError::Permanent("401".into()).is_retryable());
    }

    #[test]
    fn test_rate_limited_display() {
        let e = LLMError::RateLimited {
            retry_after: Some(Duration::from_millis(250)),
        };
        assert_eq!(e.to_string(), "rate limited (retry after 250ms)");
        assert_eq!(LLMError::RateLimited { retry_after: None }.to_string(), "rate limited");
    }

    #[test]
    fn test_assessment_error_display() {
        let e = AssessmentError::InsufficientEvidence {
            channel: ChannelKind::PrivateDyadic,
        };
        assert!(e.to_string().contains("private-dyadic"));
        assert!(!e.is_transient());
        let e = AssessmentError::RateLimited {
            attempts: 6,
            last_error: "rate limited".into(),
        };
        assert!(e.is_transient());
    }
}
