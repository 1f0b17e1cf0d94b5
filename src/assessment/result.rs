//! Assessment outputs and their item-level audit log.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::reasoning::AnswerSource;
use crate::types::{ChannelKind, TraitDimension, TraitVector, SCALE_MIDPOINT};

/// Whether persona evidence is part of the prompt context.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssessmentMode {
    /// The capability rates itself; no evidence or directive is sent.
    Baseline,
    /// The capability answers as the author of the evidence.
    Induced,
}

impl fmt::Display for AssessmentMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Baseline => "baseline",
            Self::Induced => "induced",
        })
    }
}

/// Audit record for one administered item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemResponse {
    pub item_id: String,
    pub dimension: TraitDimension,
    pub reverse: bool,
    /// Response segment the answer was read from.
    pub raw: Option<String>,
    /// Ordinal answer before reverse scoring.
    pub value: u8,
    /// Contribution to the dimension after reverse scoring.
    pub scored: f64,
    pub source: AnswerSource,
}

impl ItemResponse {
    pub fn low_confidence(&self) -> bool {
        self.source == AnswerSource::NeutralDefault
    }
}

/// Scores and audit log for one mode of one run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModeAssessment {
    pub mode: AssessmentMode,
    /// Mean scored value per dimension.
    pub scores: TraitVector,
    /// Population standard deviation of item scores per dimension.
    pub item_dispersion: TraitVector,
    pub responses: Vec<ItemResponse>,
    /// Raw response text of every completed batch.
    pub raw_batches: Vec<String>,
    /// Cancellation cut the run short and only completed batches are scored.
    pub partial: bool,
}

impl ModeAssessment {
    /// Score `responses`. A dimension without any response sits at the
    /// scale midpoint.
    pub fn from_responses(
        mode: AssessmentMode,
        responses: Vec<ItemResponse>,
        raw_batches: Vec<String>,
        partial: bool,
    ) -> Self {
        let mut scores = TraitVector::neutral();
        let mut item_dispersion = TraitVector::zero();
        for dim in TraitDimension::ALL {
            let values: Vec<f64> = responses
                .iter()
                .filter(|r| r.dimension == dim)
                .map(|r| r.scored)
                .collect();
            if values.is_empty() {
                scores[dim] = SCALE_MIDPOINT;
                continue;
            }
            let n = values.len() as f64;
            let mean = values.iter().sum::<f64>() / n;
            let var = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
            scores[dim] = mean;
            item_dispersion[dim] = var.sqrt();
        }
        Self {
            mode,
            scores,
            item_dispersion,
            responses,
            raw_batches,
            partial,
        }
    }

    /// Items that fell back to the neutral default.
    pub fn defaulted_count(&self) -> usize {
        self.responses.iter().filter(|r| r.low_confidence()).count()
    }
}

/// Baseline and induced assessments for one (channel, run).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssessmentResult {
    pub channel: ChannelKind,
    pub run_id: Uuid,
    pub baseline: ModeAssessment,
    pub induced: ModeAssessment,
    pub completed_at: DateTime<Utc>,
}

impl AssessmentResult {
    pub fn new(channel: ChannelKind, baseline: ModeAssessment, induced: ModeAssessment) -> Self {
        Self {
            channel,
            run_id: Uuid::new_v4(),
            baseline,
            induced,
            completed_at: Utc::now(),
        }
    }

    pub fn baseline_scores(&self) -> TraitVector {
        self.baseline.scores
    }

    pub fn induced_scores(&self) -> TraitVector {
        self.induced.scores
    }

    /// Induced minus baseline per dimension.
    pub fn shift(&self) -> TraitVector {
        self.induced.scores.difference(&self.baseline.scores)
    }

    /// Induced scores with the capability's own deviation from the scale
    /// midpoint removed, clamped to the scale.
    pub fn drift_corrected(&self) -> TraitVector {
        let drift = self.baseline.scores.map(|_, v| v - SCALE_MIDPOINT);
        self.induced.scores.difference(&drift).clamp_likert()
    }

    /// Every item response of both modes, baseline first.
    pub fn responses(&self) -> impl Iterator<Item = (AssessmentMode, &ItemResponse)> {
        self.baseline
            .responses
            .iter()
            .map(|r| (AssessmentMode::Baseline, r))
            .chain(self.induced.responses.iter().map(|r| (AssessmentMode::Induced, r)))
    }
}
