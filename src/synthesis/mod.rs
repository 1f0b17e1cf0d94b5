//! Multi-channel synthesis.
//!
//! Each channel's runs are reduced to a [`ChannelProfile`] (mean induced
//! scores and run-to-run dispersion). Channels are then combined with a
//! weight per dimension: the channel's base authenticity weight, reduced by
//! a [`ReliabilityModulation`] strategy as dispersion grows.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::assessment::AssessmentResult;
use crate::persona::BiasTable;
use crate::types::{ChannelKind, TraitDimension, TraitVector, SCALE_MAX, SCALE_MIN};
use crate::utilities::config::SynthesisConfig;
use crate::utilities::errors::AssessmentError;

// ============================================================================
// Channel profiles
// ============================================================================

/// All runs of one channel with their aggregate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChannelProfile {
    pub channel: ChannelKind,
    pub results: Vec<AssessmentResult>,
    /// Mean induced scores across runs.
    pub mean: TraitVector,
    /// Population standard deviation of induced scores across runs.
    pub dispersion: TraitVector,
}

impl ChannelProfile {
    /// `None` when `results` is empty.
    pub fn new(channel: ChannelKind, results: Vec<AssessmentResult>) -> Option<Self> {
        let induced: Vec<TraitVector> = results.iter().map(|r| r.induced_scores()).collect();
        let mean = TraitVector::mean_of(&induced)?;
        let dispersion = TraitVector::std_dev_of(&induced);
        Some(Self {
            channel,
            results,
            mean,
            dispersion,
        })
    }

    pub fn runs(&self) -> usize {
        self.results.len()
    }
}

// ============================================================================
// Reliability modulation
// ============================================================================

/// Maps a base weight and a dispersion to an effective weight. Must be
/// monotone non-increasing in `dispersion` and never negative.
pub trait ReliabilityModulation: Send + Sync + fmt::Debug {
    fn modulate(&self, base_weight: f64, dispersion: f64) -> f64;
}

/// `base / (1 + sensitivity * dispersion)`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InverseDispersion {
    pub sensitivity: f64,
}

impl Default for InverseDispersion {
    fn default() -> Self {
        Self { sensitivity: 2.0 }
    }
}

impl ReliabilityModulation for InverseDispersion {
    fn modulate(&self, base_weight: f64, dispersion: f64) -> f64 {
        let penalty = 1.0 + self.sensitivity.max(0.0) * dispersion.max(0.0);
        (base_weight / penalty).max(0.0)
    }
}

// ============================================================================
// Synthesized profile
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ConfidenceInterval {
    pub lower: f64,
    pub upper: f64,
    pub half_width: f64,
}

impl ConfidenceInterval {
    /// Interval around `center`, clamped to the rating scale.
    pub fn around(center: f64, half_width: f64) -> Self {
        Self {
            lower: (center - half_width).max(SCALE_MIN),
            upper: (center + half_width).min(SCALE_MAX),
            half_width,
        }
    }

    pub fn contains(&self, value: f64) -> bool {
        value >= self.lower && value <= self.upper
    }
}

/// What one channel contributed to the synthesis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChannelContribution {
    pub channel: ChannelKind,
    pub runs: usize,
    pub mean: TraitVector,
    pub dispersion: TraitVector,
    pub base_weight: f64,
    /// Normalized weight per dimension after reliability modulation.
    pub weights: TraitVector,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SynthesizedProfile {
    pub scores: TraitVector,
    pub intervals: BTreeMap<TraitDimension, ConfidenceInterval>,
    pub contributions: Vec<ChannelContribution>,
    /// Runs across all contributing channels.
    pub total_runs: usize,
}

impl SynthesizedProfile {
    pub fn interval(&self, dim: TraitDimension) -> Option<&ConfidenceInterval> {
        self.intervals.get(&dim)
    }
}

#[derive(Debug, Clone)]
pub struct MultiChannelSynthesizer {
    table: BiasTable,
    modulation: Arc<dyn ReliabilityModulation>,
    min_half_width: f64,
    z: f64,
}

impl MultiChannelSynthesizer {
    pub fn new(table: BiasTable, modulation: Arc<dyn ReliabilityModulation>) -> Self {
        let defaults = SynthesisConfig::default();
        Self {
            table,
            modulation,
            min_half_width: defaults.min_half_width,
            z: defaults.z,
        }
    }

    pub fn from_config(config: &SynthesisConfig, table: BiasTable) -> Self {
        Self {
            table,
            modulation: Arc::new(InverseDispersion {
                sensitivity: config.dispersion_sensitivity,
            }),
            min_half_width: config.min_half_width,
            z: config.z,
        }
    }

    pub fn with_interval(mut self, min_half_width: f64, z: f64) -> Self {
        self.min_half_width = min_half_width;
        self.z = z;
        self
    }

    /// Combine every channel with at least one run. Channels with no runs
    /// are skipped; if none remain the result is
    /// [`AssessmentError::NoChannelResults`].
    pub fn synthesize(
        &self,
        profiles: &BTreeMap<ChannelKind, Vec<AssessmentResult>>,
    ) -> Result<SynthesizedProfile, AssessmentError> {
        let channels: Vec<ChannelProfile> = profiles
            .iter()
            .filter_map(|(channel, results)| ChannelProfile::new(*channel, results.clone()))
            .collect();
        self.synthesize_profiles(&channels)
    }

    pub fn synthesize_profiles(
        &self,
        channels: &[ChannelProfile],
    ) -> Result<SynthesizedProfile, AssessmentError> {
        if channels.is_empty() {
            return Err(AssessmentError::NoChannelResults);
        }
        let total_runs: usize = channels.iter().map(ChannelProfile::runs).sum();

        // raw[c][d] = modulated weight of channel c on dimension d
        let raw: Vec<TraitVector> = channels
            .iter()
            .map(|p| {
                let base = self.table.authenticity_weight(p.channel);
                p.dispersion.map(|_, sd| self.modulation.modulate(base, sd))
            })
            .collect();

        let mut scores = TraitVector::zero();
        let mut weights = vec![TraitVector::zero(); channels.len()];
        let mut intervals = BTreeMap::new();

        for dim in TraitDimension::ALL {
            let total: f64 = raw.iter().map(|w| w[dim]).sum();
            for (i, w) in raw.iter().enumerate() {
                weights[i][dim] = if total > 0.0 {
                    w[dim] / total
                } else {
                    1.0 / channels.len() as f64
                };
            }

            let score: f64 = channels
                .iter()
                .zip(&weights)
                .map(|(p, w)| w[dim] * p.mean[dim])
                .sum();
            // mixture variance: within-channel dispersion plus disagreement
            // between channel means
            let variance: f64 = channels
                .iter()
                .zip(&weights)
                .map(|(p, w)| w[dim] * (p.dispersion[dim].powi(2) + (p.mean[dim] - score).powi(2)))
                .sum();
            let half_width = (self.z * variance.sqrt() / (total_runs as f64).sqrt())
                .max(self.min_half_width);

            scores[dim] = score;
            intervals.insert(dim, ConfidenceInterval::around(score, half_width));
        }

        let contributions = channels
            .iter()
            .zip(weights)
            .map(|(p, w)| ChannelContribution {
                channel: p.channel,
                runs: p.runs(),
                mean: p.mean,
                dispersion: p.dispersion,
                base_weight: self.table.authenticity_weight(p.channel),
                weights: w,
            })
            .collect();

        Ok(SynthesizedProfile {
            scores,
            intervals,
            contributions,
            total_runs,
        })
    }
}

// ============================================================================
// Cross-channel comparison
// ============================================================================

/// Magnitude label for a cross-channel difference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EffectSize {
    Minimal,
    Notable,
    Significant,
}

impl EffectSize {
    pub fn from_difference(diff: f64) -> Self {
        let abs = diff.abs();
        if abs < 0.3 {
            Self::Minimal
        } else if abs < 0.5 {
            Self::Notable
        } else {
            Self::Significant
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DimensionDifference {
    /// `b - a`.
    pub difference: f64,
    pub effect: EffectSize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChannelComparison {
    pub from: ChannelKind,
    pub to: ChannelKind,
    pub dimensions: BTreeMap<TraitDimension, DimensionDifference>,
}

impl ChannelComparison {
    /// Dimensions whose difference is at least notable.
    pub fn notable(&self) -> impl Iterator<Item = TraitDimension> + '_ {
        self.dimensions
            .iter()
            .filter(|(_, d)| d.effect != EffectSize::Minimal)
            .map(|(dim, _)| *dim)
    }
}

/// How the personality expressed in channel `b` differs from channel `a`.
pub fn compare_channels(a: &ChannelProfile, b: &ChannelProfile) -> ChannelComparison {
    let dimensions = TraitDimension::ALL
        .into_iter()
        .map(|dim| {
            let difference = b.mean[dim] - a.mean[dim];
            (
                dim,
                DimensionDifference {
                    difference,
                    effect: EffectSize::from_difference(difference),
                },
            )
        })
        .collect();
    ChannelComparison {
        from: a.channel,
        to: b.channel,
        dimensions,
    }
}
