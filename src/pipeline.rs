//! End-to-end orchestration: sample, calibrate, assess and synthesize every
//! channel.
//!
//! ```text
//! corpus[channel] ─► DiversifiedSampler ─► EvidenceSet ─► PersonaCalibrator
//!                                                             │
//!            runs_per_channel × TraitAssessmentEngine::run ◄──┘
//!                                 │
//!               MultiChannelSynthesizer ─► PipelineReport
//! ```
//!
//! Channels and runs execute concurrently; the only shared resource is the
//! ceiling in the [`ProbeContext`].

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use futures::future::join_all;
use serde::Serialize;
use uuid::Uuid;

use crate::assessment::{AssessmentResult, TraitAssessmentEngine};
use crate::context::ProbeContext;
use crate::evidence::{DiversifiedSampler, EvidenceScorer, SizeBudget};
use crate::llms::BaseLLM;
use crate::persona::{CalibrationDirective, PersonaCalibrator};
use crate::reasoning::ReasoningClient;
use crate::synthesis::{
    compare_channels, ChannelComparison, ChannelProfile, MultiChannelSynthesizer, SynthesizedProfile,
};
use crate::types::{ChannelKind, TextUnit, TraitDimension, UsageMetrics};
use crate::utilities::config::ProbeConfig;
use crate::utilities::errors::{AssessmentError, ConfigError};

/// Group a flat corpus by channel, keeping corpus order within each channel.
pub fn group_by_channel(units: Vec<TextUnit>) -> BTreeMap<ChannelKind, Vec<TextUnit>> {
    let mut corpora: BTreeMap<ChannelKind, Vec<TextUnit>> = BTreeMap::new();
    for unit in units {
        corpora.entry(unit.channel()).or_default().push(unit);
    }
    corpora
}

/// Everything produced for one channel.
#[derive(Debug, Clone, Serialize)]
pub struct ChannelReport {
    pub channel: ChannelKind,
    pub evidence_units: usize,
    pub excluded_units: usize,
    pub coverage: BTreeMap<TraitDimension, usize>,
    pub coverage_gaps: Vec<TraitDimension>,
    pub directive: CalibrationDirective,
    pub results: Vec<AssessmentResult>,
    /// Runs that failed while others of this channel succeeded.
    pub failed_runs: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct PipelineReport {
    pub run_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub profile: SynthesizedProfile,
    pub channels: Vec<ChannelReport>,
    /// Channels that produced no result, with the reason.
    pub failures: BTreeMap<ChannelKind, String>,
    pub comparisons: Vec<ChannelComparison>,
    pub usage: UsageMetrics,
}

#[derive(Debug)]
pub struct ProfilePipeline {
    sampler: DiversifiedSampler,
    budget: SizeBudget,
    calibrator: PersonaCalibrator,
    client: Arc<ReasoningClient>,
    engine: TraitAssessmentEngine,
    synthesizer: MultiChannelSynthesizer,
    runs_per_channel: usize,
}

impl ProfilePipeline {
    pub fn from_config(config: &ProbeConfig, llm: Arc<dyn BaseLLM>) -> Result<Self, ConfigError> {
        config.validate()?;
        let scorer = Arc::new(EvidenceScorer::new(&config.indicators)?);
        let client = Arc::new(ReasoningClient::new(llm, &config.reasoning));
        let engine = TraitAssessmentEngine::new(client.clone(), Arc::new(config.inventory.clone()))
            .with_best_effort_partial(config.synthesis.best_effort_partial);
        Ok(Self {
            sampler: DiversifiedSampler::new(scorer, config.sampling.coverage_floor),
            budget: config.sampling.budget(),
            calibrator: PersonaCalibrator::new(config.channels.clone()),
            client,
            engine,
            synthesizer: MultiChannelSynthesizer::from_config(
                &config.synthesis,
                config.channels.clone(),
            ),
            runs_per_channel: config.synthesis.runs_per_channel.max(1),
        })
    }

    pub fn usage_metrics(&self) -> UsageMetrics {
        self.client.usage_metrics()
    }

    /// Run every channel concurrently and synthesize the survivors.
    ///
    /// A failing channel is reported in [`PipelineReport::failures`] and does
    /// not stop the others. Only when no channel succeeds is the result an
    /// error.
    pub async fn run(
        &self,
        corpora: &BTreeMap<ChannelKind, Vec<TextUnit>>,
        ctx: &ProbeContext,
    ) -> Result<PipelineReport, AssessmentError> {
        let started_at = Utc::now();
        log::info!(
            "profiling {} channels, {} runs each",
            corpora.len(),
            self.runs_per_channel
        );

        let outcomes = join_all(
            corpora
                .iter()
                .map(|(channel, units)| self.run_channel(*channel, units, ctx)),
        )
        .await;

        let mut channels = Vec::new();
        let mut failures = BTreeMap::new();
        for (channel, outcome) in corpora.keys().zip(outcomes) {
            match outcome {
                Ok(report) => channels.push(report),
                Err(e) => {
                    log::warn!("[{}] channel failed: {}", channel, e);
                    failures.insert(*channel, e.to_string());
                }
            }
        }

        let profiles: Vec<ChannelProfile> = channels
            .iter()
            .filter_map(|r| ChannelProfile::new(r.channel, r.results.clone()))
            .collect();
        let profile = self.synthesizer.synthesize_profiles(&profiles)?;

        let mut comparisons = Vec::new();
        for (i, a) in profiles.iter().enumerate() {
            for b in &profiles[i + 1..] {
                comparisons.push(compare_channels(a, b));
            }
        }

        Ok(PipelineReport {
            run_id: Uuid::new_v4(),
            started_at,
            finished_at: Utc::now(),
            profile,
            channels,
            failures,
            comparisons,
            usage: self.client.usage_metrics(),
        })
    }

    async fn run_channel(
        &self,
        channel: ChannelKind,
        units: &[TextUnit],
        ctx: &ProbeContext,
    ) -> Result<ChannelReport, AssessmentError> {
        let evidence = self.sampler.sample(channel, units, self.budget)?;
        let directive = self.calibrator.calibrate(&evidence, channel)?;
        log::debug!(
            "[{}] sampled {} units (~{} tokens)",
            channel,
            evidence.len(),
            evidence.estimated_tokens()
        );

        let runs = join_all(
            (0..self.runs_per_channel).map(|_| self.engine.run(&evidence, &directive, ctx)),
        )
        .await;

        let mut results = Vec::new();
        let mut first_error = None;
        let mut failed_runs = 0;
        for outcome in runs {
            match outcome {
                Ok(result) => results.push(result),
                Err(e) => {
                    failed_runs += 1;
                    log::warn!("[{}] assessment run failed: {}", channel, e);
                    first_error.get_or_insert(e);
                }
            }
        }
        if results.is_empty() {
            return Err(first_error.unwrap_or(AssessmentError::NoChannelResults));
        }

        Ok(ChannelReport {
            channel,
            evidence_units: evidence.len(),
            excluded_units: evidence.excluded_count(),
            coverage: evidence.coverage(),
            coverage_gaps: evidence.coverage_gaps(),
            directive,
            results,
            failed_runs,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llms::testing::ScriptedLLM;
    use crate::types::TraitVector;
    use crate::utilities::errors::LLMError;

    fn config(runs: usize) -> ProbeConfig {
        let mut config = ProbeConfig::default();
        config.reasoning.pacing_ms = 0;
        config.reasoning.base_delay_ms = 1;
        config.reasoning.max_delay_ms = 2;
        config.reasoning.max_retries = 1;
        config.synthesis.runs_per_channel = runs;
        config
    }

    fn corpus() -> Vec<TextUnit> {
        let public = [
            "Spent the whole weekend reading about ancient philosophy and art history",
            "Went hiking with a big group of friends and we talked the entire way up",
            "Finally finished organizing the garage after planning it for months",
        ];
        let private = [
            "honestly I worry about the interview tomorrow more than I should",
            "we should cook that pasta recipe again when you visit next month",
            "I keep thinking about that museum exhibit we saw together",
        ];
        public
            .iter()
            .map(|t| TextUnit::new(*t, ChannelKind::BroadcastPublic))
            .chain(private.iter().map(|t| TextUnit::new(*t, ChannelKind::PrivateDyadic)))
            .chain(std::iter::once(TextUnit::new("ok", ChannelKind::ProfessionalBroadcast)))
            .collect()
    }

    #[test]
    fn test_group_by_channel() {
        let grouped = group_by_channel(corpus());
        assert_eq!(grouped.len(), 3);
        assert_eq!(grouped[&ChannelKind::BroadcastPublic].len(), 3);
        assert_eq!(grouped[&ChannelKind::ProfessionalBroadcast].len(), 1);
    }

    #[tokio::test]
    async fn test_failed_channel_does_not_block_synthesis() {
        let llm = Arc::new(ScriptedLLM::uniform('C'));
        let pipeline = ProfilePipeline::from_config(&config(2), llm.clone()).unwrap();
        let ctx = ProbeContext::with_max_concurrency(2);

        let report = pipeline.run(&group_by_channel(corpus()), &ctx).await.unwrap();
        assert_eq!(report.channels.len(), 2);
        assert!(report.failures.contains_key(&ChannelKind::ProfessionalBroadcast));
        assert_eq!(report.profile.total_runs, 4);
        assert_eq!(report.profile.scores, TraitVector::neutral());
        assert_eq!(report.comparisons.len(), 1);
        // 2 channels x 2 runs x 2 modes x 2 batches
        assert_eq!(llm.calls(), 16);
        assert_eq!(report.usage.successful_requests, 16);
        assert!(ctx.ceiling.peak() <= 2);
    }

    #[tokio::test]
    async fn test_all_channels_failing_is_an_error() {
        let llm = Arc::new(ScriptedLLM::failing(LLMError::Permanent("401".into())));
        let pipeline = ProfilePipeline::from_config(&config(1), llm).unwrap();
        let ctx = ProbeContext::with_max_concurrency(1);
        let err = pipeline.run(&group_by_channel(corpus()), &ctx).await.unwrap_err();
        assert!(matches!(err, AssessmentError::NoChannelResults));
    }

    #[test]
    fn test_from_config_rejects_invalid() {
        let mut config = config(1);
        config.sampling.coverage_floor = 0;
        let llm = Arc::new(ScriptedLLM::uniform('C'));
        assert!(ProfilePipeline::from_config(&config, llm).is_err());
    }
}
