//! Channel calibration: expected expression bias per channel and the
//! directive that carries it into induced prompts.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use super::summary::EvidenceSummary;
use crate::evidence::EvidenceSet;
use crate::types::{ChannelKind, TraitDimension, TraitVector};
use crate::utilities::errors::{AssessmentError, ConfigError};

/// How a channel distorts the apparent level of a trait.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BiasDirection {
    /// The channel makes the trait look stronger than it is.
    Amplifies,
    /// The channel hides the trait.
    Suppresses,
    Neutral,
}

impl fmt::Display for BiasDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Amplifies => "amplifies",
            Self::Suppresses => "suppresses",
            Self::Neutral => "neutral",
        })
    }
}

/// Expected bias on one dimension, in rating-scale levels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TraitBias {
    pub direction: BiasDirection,
    #[serde(default)]
    pub magnitude: f64,
}

impl TraitBias {
    pub const NEUTRAL: TraitBias = TraitBias {
        direction: BiasDirection::Neutral,
        magnitude: 0.0,
    };

    pub fn amplifies(magnitude: f64) -> Self {
        Self {
            direction: BiasDirection::Amplifies,
            magnitude,
        }
    }

    pub fn suppresses(magnitude: f64) -> Self {
        Self {
            direction: BiasDirection::Suppresses,
            magnitude,
        }
    }

    /// Positive when amplified, negative when suppressed.
    pub fn signed(&self) -> f64 {
        match self.direction {
            BiasDirection::Amplifies => self.magnitude,
            BiasDirection::Suppresses => -self.magnitude,
            BiasDirection::Neutral => 0.0,
        }
    }
}

/// Fixed policy for one channel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChannelPolicy {
    /// Base weight of this channel in multi-channel synthesis.
    pub authenticity_weight: f64,
    /// Dimensions not listed are neutral.
    #[serde(default)]
    pub biases: BTreeMap<TraitDimension, TraitBias>,
    /// Free-form guidance injected into induced prompts.
    #[serde(default)]
    pub guidance: String,
}

impl ChannelPolicy {
    pub fn bias(&self, dim: TraitDimension) -> TraitBias {
        self.biases.get(&dim).copied().unwrap_or(TraitBias::NEUTRAL)
    }
}

/// Per-channel policies, loaded from configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BiasTable {
    channels: BTreeMap<ChannelKind, ChannelPolicy>,
}

impl BiasTable {
    pub fn new(channels: BTreeMap<ChannelKind, ChannelPolicy>) -> Self {
        Self { channels }
    }

    pub fn policy(&self, channel: ChannelKind) -> Option<&ChannelPolicy> {
        self.channels.get(&channel)
    }

    /// Base synthesis weight of `channel`, zero when the table has no entry.
    pub fn authenticity_weight(&self, channel: ChannelKind) -> f64 {
        self.policy(channel).map_or(0.0, |p| p.authenticity_weight)
    }
}

impl Default for BiasTable {
    fn default() -> Self {
        let mut channels = BTreeMap::new();
        channels.insert(
            ChannelKind::BroadcastPublic,
            ChannelPolicy {
                authenticity_weight: 0.4,
                biases: BTreeMap::from([
                    (TraitDimension::Openness, TraitBias::amplifies(1.0)),
                    (TraitDimension::Conscientiousness, TraitBias::amplifies(1.0)),
                    (TraitDimension::Extraversion, TraitBias::amplifies(1.0)),
                    (TraitDimension::Neuroticism, TraitBias::amplifies(1.5)),
                ]),
                guidance: "Public posts amplify outgoing, emotional and creative expression. \
                           Rate on consistent patterns across posts, not on individual dramatic \
                           ones, and only discount a trait when the amplification is clearly visible."
                    .to_string(),
            },
        );
        channels.insert(
            ChannelKind::PrivateDyadic,
            ChannelPolicy {
                authenticity_weight: 0.6,
                biases: BTreeMap::new(),
                guidance: "Private messages generally reflect authentic personality. Emotional \
                           vulnerability here is normal rather than amplified; only discount \
                           extreme language that reads as momentary venting."
                    .to_string(),
            },
        );
        channels.insert(
            ChannelKind::ProfessionalBroadcast,
            ChannelPolicy {
                authenticity_weight: 0.45,
                biases: BTreeMap::from([
                    (TraitDimension::Conscientiousness, TraitBias::amplifies(1.0)),
                    (TraitDimension::Agreeableness, TraitBias::amplifies(0.5)),
                    (TraitDimension::Extraversion, TraitBias::amplifies(0.5)),
                    (TraitDimension::Neuroticism, TraitBias::suppresses(1.0)),
                ]),
                guidance: "Professional posts present a curated, achievement-oriented self. \
                           Expect organization and warmth to be overstated and worry or \
                           frustration to be hidden."
                    .to_string(),
            },
        );
        Self { channels }
    }
}

/// Calibration for one (evidence set, channel) pair. Immutable once built.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CalibrationDirective {
    channel: ChannelKind,
    biases: BTreeMap<TraitDimension, TraitBias>,
    authenticity_weight: f64,
    guidance: String,
    summary: EvidenceSummary,
}

impl CalibrationDirective {
    pub fn channel(&self) -> ChannelKind {
        self.channel
    }

    pub fn bias(&self, dim: TraitDimension) -> TraitBias {
        self.biases.get(&dim).copied().unwrap_or(TraitBias::NEUTRAL)
    }

    /// Signed expected bias on every dimension.
    pub fn signed_biases(&self) -> TraitVector {
        TraitVector::zero().map(|d, _| self.bias(d).signed())
    }

    pub fn authenticity_weight(&self) -> f64 {
        self.authenticity_weight
    }

    pub fn guidance(&self) -> &str {
        &self.guidance
    }

    pub fn summary(&self) -> &EvidenceSummary {
        &self.summary
    }

    /// Prompt section describing the channel correction and the evidence.
    pub fn render(&self) -> String {
        let mut lines = vec![format!("CHANNEL CALIBRATION ({}):", self.channel)];
        for dim in TraitDimension::ALL {
            let bias = self.bias(dim);
            let line = match bias.direction {
                BiasDirection::Neutral => format!("- {}: no expected channel bias.", dim),
                BiasDirection::Amplifies => format!(
                    "- {}: this channel amplifies it; lower your rating by up to {:.1} level(s) when the amplification is visible.",
                    dim, bias.magnitude
                ),
                BiasDirection::Suppresses => format!(
                    "- {}: this channel suppresses it; raise your rating by up to {:.1} level(s) when the restraint is visible.",
                    dim, bias.magnitude
                ),
            };
            lines.push(line);
        }
        if !self.guidance.is_empty() {
            lines.push(format!("Guidance: {}", self.guidance));
        }
        lines.push(format!("Evidence summary: {}.", self.summary.render()));
        lines.join("\n")
    }
}

/// Builds [`CalibrationDirective`]s from a [`BiasTable`]. Deterministic, no
/// external calls.
#[derive(Debug, Clone, Default)]
pub struct PersonaCalibrator {
    table: BiasTable,
}

impl PersonaCalibrator {
    pub fn new(table: BiasTable) -> Self {
        Self { table }
    }

    pub fn table(&self) -> &BiasTable {
        &self.table
    }

    pub fn calibrate(
        &self,
        evidence: &EvidenceSet,
        channel: ChannelKind,
    ) -> Result<CalibrationDirective, AssessmentError> {
        let policy = self.table.policy(channel).ok_or_else(|| {
            ConfigError::Invalid(format!("channel table has no policy for {}", channel))
        })?;
        let biases = TraitDimension::ALL
            .into_iter()
            .map(|d| (d, policy.bias(d)))
            .collect();
        Ok(CalibrationDirective {
            channel,
            biases,
            authenticity_weight: policy.authenticity_weight,
            guidance: policy.guidance.clone(),
            summary: EvidenceSummary::from_evidence(evidence),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::evidence::ScoredUnit;
    use crate::types::TextUnit;

    fn evidence(channel: ChannelKind) -> EvidenceSet {
        let member = ScoredUnit::new(
            TextUnit::new("so curious about the new exhibition haha", channel),
            TraitVector::new([0.6, 0.0, 0.0, 0.0, 0.0]),
            0.0,
        );
        EvidenceSet::new(channel, vec![member], 1, 0)
    }

    #[test]
    fn test_default_table_weights_private_above_broadcast() {
        let table = BiasTable::default();
        let private = table.authenticity_weight(ChannelKind::PrivateDyadic);
        assert!(private > table.authenticity_weight(ChannelKind::BroadcastPublic));
        assert!(private > table.authenticity_weight(ChannelKind::ProfessionalBroadcast));
    }

    #[test]
    fn test_directive_covers_every_dimension() {
        let calibrator = PersonaCalibrator::default();
        let directive = calibrator
            .calibrate(&evidence(ChannelKind::BroadcastPublic), ChannelKind::BroadcastPublic)
            .unwrap();
        assert_eq!(directive.bias(TraitDimension::Extraversion).direction, BiasDirection::Amplifies);
        assert_eq!(directive.bias(TraitDimension::Agreeableness), TraitBias::NEUTRAL);
        assert_eq!(directive.signed_biases().neuroticism, 1.5);

        let text = directive.render();
        for dim in TraitDimension::ALL {
            assert!(text.contains(dim.as_str()));
        }
        assert!(text.contains("broadcast-public"));
    }

    #[test]
    fn test_calibration_is_deterministic() {
        let calibrator = PersonaCalibrator::default();
        let ev = evidence(ChannelKind::ProfessionalBroadcast);
        let a = calibrator.calibrate(&ev, ChannelKind::ProfessionalBroadcast).unwrap();
        let b = calibrator.calibrate(&ev, ChannelKind::ProfessionalBroadcast).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.signed_biases().neuroticism, -1.0);
    }

    #[test]
    fn test_missing_channel_is_config_error() {
        let calibrator = PersonaCalibrator::new(BiasTable::new(BTreeMap::new()));
        let err = calibrator
            .calibrate(&evidence(ChannelKind::PrivateDyadic), ChannelKind::PrivateDyadic)
            .unwrap_err();
        assert!(matches!(err, AssessmentError::Config(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_bias_table_from_yaml() {
        let yaml = r#"
private-dyadic:
  authenticity_weight: 0.7
broadcast-public:
  authenticity_weight: 0.3
  biases:
    extraversion: { direction: amplifies, magnitude: 2.0 }
  guidance: discount loud posts
"#;
        let table: BiasTable = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(table.authenticity_weight(ChannelKind::PrivateDyadic), 0.7);
        let public = table.policy(ChannelKind::BroadcastPublic).unwrap();
        assert_eq!(public.bias(TraitDimension::Extraversion).signed(), 2.0);
        assert!(table.policy(ChannelKind::ProfessionalBroadcast).is_none());
    }
}
