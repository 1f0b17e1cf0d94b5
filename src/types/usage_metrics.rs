//! Usage metrics for calls against the reasoning capability.

use serde::{Deserialize, Serialize};

/// Counters accumulated by a reasoning client across its lifetime.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UsageMetrics {
    /// Total number of tokens used.
    pub total_tokens: i64,
    /// Number of tokens used in prompts.
    pub prompt_tokens: i64,
    /// Number of tokens used in completions.
    pub completion_tokens: i64,
    /// Number of successful requests made.
    pub successful_requests: i64,
    /// Number of retried attempts (rate limits, timeouts, transient errors).
    pub retried_requests: i64,
    /// Number of item answers that fell back to the neutral midpoint.
    pub defaulted_answers: i64,
}

impl UsageMetrics {
    /// Create a new empty UsageMetrics.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add usage metrics from another UsageMetrics object.
    pub fn add_usage_metrics(&mut self, other: &UsageMetrics) {
        self.total_tokens += other.total_tokens;
        self.prompt_tokens += other.prompt_tokens;
        self.completion_tokens += other.completion_tokens;
        self.successful_requests += other.successful_requests;
        self.retried_requests += other.retried_requests;
        self.defaulted_answers += other.defaulted_answers;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_usage_metrics() {
        let mut a = UsageMetrics {
            total_tokens: 10,
            successful_requests: 1,
            ..Default::default()
        };
        let b = UsageMetrics {
            total_tokens: 5,
            retried_requests: 2,
            defaulted_answers: 1,
            ..Default::default()
        };
        a.add_usage_metrics(&b);
        assert_eq!(a.total_tokens, 15);
        assert_eq!(a.retried_requests, 2);
        assert_eq!(a.defaulted_answers, 1);
    }
}
