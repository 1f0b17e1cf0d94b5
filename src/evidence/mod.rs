//! Evidence scoring and diversified sampling.
//!
//! [`EvidenceScorer`] rates each unit against the trait dimensions;
//! [`DiversifiedSampler`] condenses a corpus into an [`EvidenceSet`] that
//! fits a [`SizeBudget`] while keeping every dimension represented.

pub mod indicators;
pub mod sampler;
pub mod scorer;
pub mod set;

pub use indicators::{EmotionSignal, ExclusionRules, Indicator, IndicatorTable};
pub use sampler::{DiversifiedSampler, SizeBudget};
pub use scorer::{EvidenceScore, EvidenceScorer, ExclusionReason};
pub use set::{EvidenceSet, ScoredUnit};
