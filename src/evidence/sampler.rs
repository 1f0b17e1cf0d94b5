//! Diversified sampling of a corpus into a bounded evidence set.
//!
//! Selection order:
//! 1. score every unit and drop excluded ones;
//! 2. drop near-duplicates, keeping the highest-scoring occurrence;
//! 3. per-dimension floor picks, round-robin across dimensions so a tight
//!    budget still spreads across traits;
//! 4. remaining candidates by overall score.
//!
//! The budget is then applied by walking that priority order, so the lowest
//! priority candidates are the ones left out.

use std::collections::HashSet;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::scorer::EvidenceScorer;
use super::set::{EvidenceSet, ScoredUnit};
use crate::types::{ChannelKind, TextUnit, TraitDimension};
use crate::utilities::errors::AssessmentError;
use crate::utilities::string_utils::normalize_content;

/// Upper bound on the size of an evidence set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SizeBudget {
    pub max_units: usize,
    /// Optional cap on the estimated token footprint.
    pub max_tokens: Option<usize>,
}

impl SizeBudget {
    pub fn new(max_units: usize) -> Self {
        Self {
            max_units,
            max_tokens: None,
        }
    }

    pub fn with_max_tokens(mut self, max_tokens: usize) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    fn admits(&self, units: usize, tokens: usize) -> bool {
        units <= self.max_units && self.max_tokens.map_or(true, |max| tokens <= max)
    }
}

/// Selects a bounded, deduplicated, trait-balanced subset of a corpus.
#[derive(Debug, Clone)]
pub struct DiversifiedSampler {
    scorer: Arc<EvidenceScorer>,
    coverage_floor: usize,
}

impl DiversifiedSampler {
    pub fn new(scorer: Arc<EvidenceScorer>, coverage_floor: usize) -> Self {
        Self {
            scorer,
            coverage_floor,
        }
    }

    pub fn scorer(&self) -> &EvidenceScorer {
        &self.scorer
    }

    pub fn coverage_floor(&self) -> usize {
        self.coverage_floor
    }

    /// Sample `corpus` (units from `channel`) within `budget`.
    ///
    /// Returns [`AssessmentError::InsufficientEvidence`] when nothing usable
    /// remains after exclusion or the budget admits no unit at all.
    pub fn sample(
        &self,
        channel: ChannelKind,
        corpus: &[TextUnit],
        budget: SizeBudget,
    ) -> Result<EvidenceSet, AssessmentError> {
        let mut excluded = 0usize;
        let mut candidates: Vec<ScoredUnit> = Vec::with_capacity(corpus.len());
        for unit in corpus {
            let score = self.scorer.evaluate(unit);
            if score.is_excluded() {
                excluded += 1;
                continue;
            }
            candidates.push(ScoredUnit::new(
                unit.clone(),
                score.relevance,
                score.emotional_intensity,
            ));
        }
        log::debug!(
            "[{}] excluded {} of {} units before sampling",
            channel,
            excluded,
            corpus.len()
        );

        // Stable sort keeps corpus order among equal scores.
        candidates.sort_by(|a, b| b.overall().total_cmp(&a.overall()));
        let mut seen = HashSet::new();
        candidates.retain(|c| seen.insert(normalize_content(c.unit.content())));

        let order = self.priority_order(&candidates);
        let mut members = Vec::new();
        let mut tokens = 0usize;
        for idx in order {
            if members.len() >= budget.max_units {
                break;
            }
            let candidate = &candidates[idx];
            if !budget.admits(members.len() + 1, tokens + candidate.tokens) {
                continue;
            }
            tokens += candidate.tokens;
            members.push(candidate.clone());
        }

        if members.is_empty() {
            log::warn!("[{}] no usable evidence after exclusion and budgeting", channel);
            return Err(AssessmentError::InsufficientEvidence { channel });
        }

        let set = EvidenceSet::new(channel, members, self.coverage_floor, excluded);
        let gaps = set.coverage_gaps();
        if !gaps.is_empty() {
            let names: Vec<&str> = gaps.iter().map(|d| d.as_str()).collect();
            log::info!(
                "[{}] coverage gap: fewer than {} contributing units for {}",
                channel,
                self.coverage_floor,
                names.join(", ")
            );
        }
        Ok(set)
    }

    /// Indices into `candidates` (already sorted by overall score and
    /// deduplicated) in selection priority order.
    fn priority_order(&self, candidates: &[ScoredUnit]) -> Vec<usize> {
        let mut picked = vec![false; candidates.len()];
        let mut order = Vec::with_capacity(candidates.len());

        let ranked: Vec<(TraitDimension, Vec<usize>)> = TraitDimension::ALL
            .into_iter()
            .map(|dim| {
                let mut idx: Vec<usize> = (0..candidates.len())
                    .filter(|&i| candidates[i].contributes_to(dim))
                    .collect();
                idx.sort_by(|&a, &b| candidates[b].relevance[dim].total_cmp(&candidates[a].relevance[dim]));
                (dim, idx)
            })
            .collect();

        for _ in 0..self.coverage_floor {
            for (_, idx) in &ranked {
                if let Some(&next) = idx.iter().find(|&&i| !picked[i]) {
                    picked[next] = true;
                    order.push(next);
                }
            }
        }

        order.extend((0..candidates.len()).filter(|&i| !picked[i]));
        order
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::evidence::indicators::IndicatorTable;

    fn sampler(k: usize) -> DiversifiedSampler {
        let scorer = EvidenceScorer::new(&IndicatorTable::default()).unwrap();
        DiversifiedSampler::new(Arc::new(scorer), k)
    }

    fn units(texts: &[&str]) -> Vec<TextUnit> {
        texts
            .iter()
            .map(|t| TextUnit::new(*t, ChannelKind::BroadcastPublic))
            .collect()
    }

    #[test]
    fn test_promotional_corpus_keeps_only_relevant_units() {
        let corpus = units(&[
            "Use code SPRING for a discount on every order",
            "Huge giveaway this weekend, enter now",
            "Limited time offer on all our plans",
            "Link in bio for the full collection",
            "Shop now and get free shipping today",
            "This post is sponsored by our friends at Acme",
            "So curious about this new philosophy, talking with friends",
            "Went to a party and we discussed art for hours",
            "I keep exploring abstract theory with my friends",
            "Hang out at the concert tonight, such creative music",
        ]);
        let set = sampler(3)
            .sample(ChannelKind::BroadcastPublic, &corpus, SizeBudget::new(10))
            .unwrap();

        assert_eq!(set.len(), 4);
        assert_eq!(set.excluded_count(), 6);
        let kept: HashSet<&str> = set.units().map(|u| u.content()).collect();
        for text in &corpus[6..] {
            assert!(kept.contains(text.content()));
        }
        let gaps = set.coverage_gaps();
        assert_eq!(
            gaps,
            vec![
                TraitDimension::Conscientiousness,
                TraitDimension::Agreeableness,
                TraitDimension::Neuroticism,
            ]
        );
    }

    #[test]
    fn test_budget_and_no_duplicates() {
        let corpus = units(&[
            "I am curious about art and poetry",
            "I  am CURIOUS about art and poetry",
            "The deadline is tight but I planned the schedule",
            "Party with friends tonight, let's go",
            "Sorry, I appreciate your help so much",
            "I am so worried and stressed about tomorrow",
            "Another curious idea about philosophy",
        ]);
        for max in 1..=7 {
            let set = sampler(2)
                .sample(ChannelKind::BroadcastPublic, &corpus, SizeBudget::new(max))
                .unwrap();
            assert!(set.len() <= max);
            let normalized: HashSet<String> =
                set.units().map(|u| normalize_content(u.content())).collect();
            assert_eq!(normalized.len(), set.len());
        }
    }

    #[test]
    fn test_floor_guarantee_under_skewed_corpus() {
        // Openness dominates overall score, but each other dimension has
        // exactly two relevant units.
        let mut texts = vec![
            "curious creative imagination philosophy poetry art one",
            "curious creative imagination philosophy poetry art two",
            "curious creative imagination philosophy poetry art three",
            "curious creative imagination philosophy poetry art four",
            "curious creative imagination philosophy poetry art five",
            "curious creative imagination philosophy poetry art six",
        ];
        texts.extend([
            "the deadline moved again today",
            "I finished the checklist early",
            "party at my place this weekend",
            "dance class with the crowd",
            "I really appreciate that gesture",
            "happy to help with the move",
            "so anxious before the exam",
            "feeling lonely this evening again",
        ]);
        let corpus = units(&texts);
        let set = sampler(2)
            .sample(ChannelKind::BroadcastPublic, &corpus, SizeBudget::new(10))
            .unwrap();
        assert_eq!(set.len(), 10);
        assert!(set.coverage_gaps().is_empty());
        for (_, n) in set.coverage() {
            assert!(n >= 2);
        }
    }

    #[test]
    fn test_token_budget_skips_long_units() {
        let long = format!("I am curious about {}", "philosophy ".repeat(40));
        let corpus = units(&[long.as_str(), "so curious about poetry tonight"]);
        let budget = SizeBudget::new(5).with_max_tokens(20);
        let set = sampler(1)
            .sample(ChannelKind::BroadcastPublic, &corpus, budget)
            .unwrap();
        assert_eq!(set.len(), 1);
        assert!(set.estimated_tokens() <= 20);
        assert_eq!(set.members()[0].unit.content(), "so curious about poetry tonight");
    }

    #[test]
    fn test_empty_after_exclusion_is_insufficient() {
        let corpus = units(&["ok", "thanks", "<Media omitted>"]);
        let err = sampler(3)
            .sample(ChannelKind::PrivateDyadic, &corpus, SizeBudget::new(10))
            .unwrap_err();
        assert!(matches!(
            err,
            AssessmentError::InsufficientEvidence { channel: ChannelKind::PrivateDyadic }
        ));
        assert!(sampler(3)
            .sample(ChannelKind::PrivateDyadic, &[], SizeBudget::new(10))
            .is_err());
    }
}
