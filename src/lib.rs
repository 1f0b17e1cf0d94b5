//! # persona-probe
//!
//! Infers a five-factor personality profile from a person's informal
//! writing across several channels (public posts, private messages,
//! professional posts).
//!
//! The pipeline condenses each channel's corpus into a bounded,
//! trait-balanced evidence set, calibrates for the channel's expected
//! expression bias, administers a rating inventory to a reasoning service in
//! a baseline and an evidence-induced mode, and synthesizes the channels
//! into one profile with confidence intervals.
//!
//! - [`evidence`] - scoring, exclusion and diversified sampling
//! - [`persona`] - channel bias table and calibration directives
//! - [`llms`] - the reasoning-service seam and the OpenAI-compatible provider
//! - [`reasoning`] - batching, retry with backoff, answer recovery
//! - [`assessment`] - inventory, baseline/induced administration, results
//! - [`synthesis`] - reliability-weighted multi-channel synthesis
//! - [`pipeline`] - end-to-end orchestration

pub mod assessment;
pub mod context;
pub mod evidence;
pub mod llms;
pub mod persona;
pub mod pipeline;
pub mod reasoning;
pub mod synthesis;
pub mod types;
pub mod utilities;

pub use assessment::{AssessmentMode, AssessmentResult, Inventory, TraitAssessmentEngine};
pub use context::{CancelFlag, ProbeContext};
pub use evidence::{DiversifiedSampler, EvidenceScorer, EvidenceSet, SizeBudget};
pub use llms::base_llm::BaseLLM;
pub use persona::{CalibrationDirective, PersonaCalibrator};
pub use pipeline::{PipelineReport, ProfilePipeline};
pub use reasoning::ReasoningClient;
pub use synthesis::{MultiChannelSynthesizer, SynthesizedProfile};
pub use types::{ChannelKind, TextUnit, TraitDimension, TraitVector};
pub use utilities::config::ProbeConfig;
pub use utilities::errors::{AssessmentError, ConfigError, LLMError};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
