//! Pipeline configuration.
//!
//! Every tunable constant and every data table consumed by the pipeline is
//! loaded here from YAML. Each field has a built-in default, so an empty
//! document is a complete configuration.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::assessment::inventory::Inventory;
use crate::evidence::indicators::IndicatorTable;
use crate::evidence::sampler::SizeBudget;
use crate::persona::calibration::BiasTable;
use crate::reasoning::backoff::RetryPolicy;
use crate::types::{ChannelKind, TraitDimension};
use crate::utilities::errors::ConfigError;

/// Model used when neither the file nor the environment names one.
pub const DEFAULT_MODEL: &str = "gpt-4o-mini";
/// Environment variable overriding [`ReasoningConfig::model`].
pub const MODEL_ENV: &str = "PROBE_MODEL";
/// Environment variable overriding [`ReasoningConfig::base_url`].
pub const BASE_URL_ENV: &str = "OPENAI_BASE_URL";

// ============================================================================
// Root
// ============================================================================

/// Complete configuration for a [`crate::pipeline::ProfilePipeline`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProbeConfig {
    #[serde(default)]
    pub sampling: SamplingConfig,
    #[serde(default)]
    pub reasoning: ReasoningConfig,
    #[serde(default)]
    pub synthesis: SynthesisConfig,
    /// Per-channel bias table and authenticity weights.
    #[serde(default)]
    pub channels: BiasTable,
    /// The rating inventory administered in both modes.
    #[serde(default)]
    pub inventory: Inventory,
    /// Indicator phrases and exclusion rules used by the scorer.
    #[serde(default)]
    pub indicators: IndicatorTable,
}

impl ProbeConfig {
    /// Parse and validate a YAML document.
    pub fn from_yaml_str(yaml: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a YAML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::from_yaml_str(&content)
    }

    /// Apply `PROBE_MODEL` and `OPENAI_BASE_URL` from the environment.
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(model) = std::env::var(MODEL_ENV) {
            if !model.trim().is_empty() {
                self.reasoning.model = model.trim().to_string();
            }
        }
        if let Ok(url) = std::env::var(BASE_URL_ENV) {
            if !url.trim().is_empty() {
                self.reasoning.base_url = url.trim().to_string();
            }
        }
        self
    }

    /// Check structural constraints that serde cannot express.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |msg: &str| Err(ConfigError::Invalid(msg.to_string()));

        if self.sampling.max_units == 0 {
            return invalid("sampling.max_units must be at least 1");
        }
        if self.sampling.coverage_floor == 0 {
            return invalid("sampling.coverage_floor must be at least 1");
        }
        if self.reasoning.batch_size == 0 {
            return invalid("reasoning.batch_size must be at least 1");
        }
        if self.reasoning.max_concurrency == 0 {
            return invalid("reasoning.max_concurrency must be at least 1");
        }
        if !(0.0..=1.0).contains(&self.reasoning.jitter) {
            return invalid("reasoning.jitter must be within [0, 1]");
        }
        if self.synthesis.runs_per_channel == 0 {
            return invalid("synthesis.runs_per_channel must be at least 1");
        }
        if self.synthesis.min_half_width < 0.0 || self.synthesis.z <= 0.0 {
            return invalid("synthesis.min_half_width must be >= 0 and synthesis.z > 0");
        }
        if self.synthesis.dispersion_sensitivity < 0.0 {
            return invalid("synthesis.dispersion_sensitivity must be >= 0");
        }
        for dim in TraitDimension::ALL {
            if self.inventory.items_for(dim).next().is_none() {
                return Err(ConfigError::Invalid(format!(
                    "inventory has no items for {}",
                    dim
                )));
            }
        }
        for channel in ChannelKind::ALL {
            if self.channels.policy(channel).is_none() {
                return Err(ConfigError::Invalid(format!(
                    "channel table has no policy for {}",
                    channel
                )));
            }
        }
        Ok(())
    }
}

// ============================================================================
// Sampling
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SamplingConfig {
    /// Maximum number of units in one evidence set.
    #[serde(default = "default_max_units")]
    pub max_units: usize,
    /// Maximum estimated token footprint of one evidence set.
    #[serde(default = "default_max_tokens")]
    pub max_tokens: usize,
    /// Minimum contributing units per dimension (K).
    #[serde(default = "default_coverage_floor")]
    pub coverage_floor: usize,
}

fn default_max_units() -> usize {
    60
}

fn default_max_tokens() -> usize {
    8000
}

fn default_coverage_floor() -> usize {
    3
}

impl Default for SamplingConfig {
    fn default() -> Self {
        Self {
            max_units: default_max_units(),
            max_tokens: default_max_tokens(),
            coverage_floor: default_coverage_floor(),
        }
    }
}

impl SamplingConfig {
    pub fn budget(&self) -> SizeBudget {
        SizeBudget::new(self.max_units).with_max_tokens(self.max_tokens)
    }
}

// ============================================================================
// Reasoning
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReasoningConfig {
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Inventory items per request.
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
    /// Retries after the first attempt.
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    #[serde(default = "default_base_delay_ms")]
    pub base_delay_ms: u64,
    #[serde(default = "default_max_delay_ms")]
    pub max_delay_ms: u64,
    /// Relative jitter applied to each backoff delay.
    #[serde(default = "default_jitter")]
    pub jitter: f64,
    /// Fixed pause between consecutive batches of one assessment.
    #[serde(default = "default_pacing_ms")]
    pub pacing_ms: u64,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    /// Global ceiling on in-flight requests.
    #[serde(default = "default_max_concurrency")]
    pub max_concurrency: usize,
    /// Optional requests-per-minute cap enforced by the ceiling.
    #[serde(default)]
    pub max_rpm: Option<u32>,
    #[serde(default)]
    pub temperature: f64,
    /// Completion token allowance for ordinary models.
    #[serde(default = "default_completion_tokens")]
    pub max_tokens: u32,
}

fn default_model() -> String {
    DEFAULT_MODEL.to_string()
}

fn default_base_url() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_batch_size() -> usize {
    30
}

fn default_max_retries() -> u32 {
    5
}

fn default_base_delay_ms() -> u64 {
    1000
}

fn default_max_delay_ms() -> u64 {
    60_000
}

fn default_jitter() -> f64 {
    0.25
}

fn default_pacing_ms() -> u64 {
    150
}

fn default_request_timeout_secs() -> u64 {
    120
}

fn default_max_concurrency() -> usize {
    2
}

fn default_completion_tokens() -> u32 {
    200
}

impl Default for ReasoningConfig {
    fn default() -> Self {
        Self {
            model: default_model(),
            base_url: default_base_url(),
            batch_size: default_batch_size(),
            max_retries: default_max_retries(),
            base_delay_ms: default_base_delay_ms(),
            max_delay_ms: default_max_delay_ms(),
            jitter: default_jitter(),
            pacing_ms: default_pacing_ms(),
            request_timeout_secs: default_request_timeout_secs(),
            max_concurrency: default_max_concurrency(),
            max_rpm: None,
            temperature: 0.0,
            max_tokens: default_completion_tokens(),
        }
    }
}

impl ReasoningConfig {
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_retries: self.max_retries,
            base_delay: Duration::from_millis(self.base_delay_ms),
            max_delay: Duration::from_millis(self.max_delay_ms),
            jitter: self.jitter,
        }
    }

    pub fn pacing(&self) -> Duration {
        Duration::from_millis(self.pacing_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

// ============================================================================
// Synthesis
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SynthesisConfig {
    /// Independent (baseline, induced) runs per channel.
    #[serde(default = "default_runs_per_channel")]
    pub runs_per_channel: usize,
    /// Lower bound on every confidence-interval half-width.
    #[serde(default = "default_min_half_width")]
    pub min_half_width: f64,
    /// Normal quantile for interval width.
    #[serde(default = "default_z")]
    pub z: f64,
    /// Slope of the inverse-dispersion weight penalty.
    #[serde(default = "default_dispersion_sensitivity")]
    pub dispersion_sensitivity: f64,
    /// Keep completed batches when an assessment is cancelled.
    #[serde(default)]
    pub best_effort_partial: bool,
}

fn default_runs_per_channel() -> usize {
    3
}

fn default_min_half_width() -> f64 {
    0.05
}

fn default_z() -> f64 {
    1.96
}

fn default_dispersion_sensitivity() -> f64 {
    2.0
}

impl Default for SynthesisConfig {
    fn default() -> Self {
        Self {
            runs_per_channel: default_runs_per_channel(),
            min_half_width: default_min_half_width(),
            z: default_z(),
            dispersion_sensitivity: default_dispersion_sensitivity(),
            best_effort_partial: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_empty_document_is_default() {
        let config = ProbeConfig::from_yaml_str("{}").unwrap();
        assert_eq!(config.sampling.max_units, 60);
        assert_eq!(config.sampling.coverage_floor, 3);
        assert_eq!(config.reasoning.batch_size, 30);
        assert_eq!(config.reasoning.max_retries, 5);
        assert_eq!(config.reasoning.model, DEFAULT_MODEL);
        assert_eq!(config.synthesis.runs_per_channel, 3);
        assert_eq!(config.inventory.len(), 60);
    }

    #[test]
    fn test_partial_override() {
        let yaml = r#"
sampling:
  max_units: 12
reasoning:
  batch_size: 10
  jitter: 0.0
synthesis:
  z: 1.0
"#;
        let config = ProbeConfig::from_yaml_str(yaml).unwrap();
        assert_eq!(config.sampling.max_units, 12);
        assert_eq!(config.sampling.max_tokens, 8000);
        assert_eq!(config.reasoning.batch_size, 10);
        assert_eq!(config.reasoning.retry_policy().jitter, 0.0);
        assert_eq!(config.synthesis.z, 1.0);
    }

    #[test]
    fn test_validate_rejects_zero_batch() {
        let err = ProbeConfig::from_yaml_str("reasoning:\n  batch_size: 0\n").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn test_invalid_yaml() {
        let err = ProbeConfig::from_yaml_str("sampling: [1, 2").unwrap_err();
        assert!(matches!(err, ConfigError::Yaml(_)));
    }

    #[test]
    fn test_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "sampling:\n  coverage_floor: 2").unwrap();
        let config = ProbeConfig::from_file(file.path()).unwrap();
        assert_eq!(config.sampling.coverage_floor, 2);
    }

    #[test]
    fn test_missing_file() {
        let err = ProbeConfig::from_file("/nonexistent/probe.yaml").unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }

    #[test]
    fn test_budget_from_sampling() {
        let budget = SamplingConfig::default().budget();
        assert_eq!(budget.max_units, 60);
        assert_eq!(budget.max_tokens, Some(8000));
    }
}
