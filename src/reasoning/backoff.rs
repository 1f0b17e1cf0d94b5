//! Bounded exponential backoff with jitter.

use std::time::Duration;

use rand::Rng;
use serde::{Deserialize, Serialize};

/// Retry schedule for calls to the reasoning capability.
///
/// The delay before retry `n` (1-based) is `base_delay * 2^(n-1)`, scaled by
/// a random factor in `[1 - jitter, 1 + jitter]` and capped at `max_delay`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetryPolicy {
    /// Retries after the first attempt.
    pub max_retries: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
    pub jitter: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 5,
            base_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(60),
            jitter: 0.25,
        }
    }
}

impl RetryPolicy {
    /// Policy that never retries.
    pub fn none() -> Self {
        Self {
            max_retries: 0,
            ..Self::default()
        }
    }

    /// Total attempts including the first.
    pub fn max_attempts(&self) -> u32 {
        self.max_retries.saturating_add(1)
    }

    /// Un-jittered delay before retry number `retry` (1-based).
    pub fn nominal_delay(&self, retry: u32) -> Duration {
        let exp = retry.saturating_sub(1).min(30);
        self.base_delay
            .saturating_mul(1u32 << exp)
            .min(self.max_delay)
    }

    /// Delay before retry number `retry`. A server-suggested delay replaces
    /// the computed one and is only capped.
    pub fn delay_for(&self, retry: u32, suggested: Option<Duration>) -> Duration {
        if let Some(delay) = suggested {
            return delay.min(self.max_delay);
        }
        let nominal = self.nominal_delay(retry);
        let jitter = self.jitter.clamp(0.0, 1.0);
        if jitter == 0.0 || nominal.is_zero() {
            return nominal;
        }
        let factor = rand::thread_rng().gen_range((1.0 - jitter)..=(1.0 + jitter));
        nominal.mul_f64(factor).min(self.max_delay)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn policy(jitter: f64) -> RetryPolicy {
        RetryPolicy {
            max_retries: 5,
            base_delay: Duration::from_millis(100),
            max_delay: Duration::from_millis(1000),
            jitter,
        }
    }

    #[test]
    fn test_geometric_growth_is_capped() {
        let p = policy(0.0);
        assert_eq!(p.delay_for(1, None), Duration::from_millis(100));
        assert_eq!(p.delay_for(2, None), Duration::from_millis(200));
        assert_eq!(p.delay_for(4, None), Duration::from_millis(800));
        assert_eq!(p.delay_for(5, None), Duration::from_millis(1000));
        assert_eq!(p.delay_for(40, None), Duration::from_millis(1000));
    }

    #[test]
    fn test_jitter_stays_in_band() {
        let p = policy(0.25);
        for _ in 0..100 {
            let d = p.delay_for(2, None);
            assert!(d >= Duration::from_millis(150) && d <= Duration::from_millis(250));
        }
    }

    #[test]
    fn test_suggested_delay_overrides_and_is_capped() {
        let p = policy(0.25);
        assert_eq!(p.delay_for(1, Some(Duration::from_millis(700))), Duration::from_millis(700));
        assert_eq!(p.delay_for(1, Some(Duration::from_secs(30))), Duration::from_millis(1000));
    }

    #[test]
    fn test_attempt_count() {
        assert_eq!(policy(0.0).max_attempts(), 6);
        assert_eq!(RetryPolicy::none().max_attempts(), 1);
    }
}
