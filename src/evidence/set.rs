//! The bounded, trait-balanced evidence set.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::types::{ChannelKind, TextUnit, TraitDimension, TraitVector};
use crate::utilities::string_utils::{estimate_tokens, truncate_chars};

/// A selected unit together with its score.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoredUnit {
    pub unit: TextUnit,
    pub relevance: TraitVector,
    pub emotional_intensity: f64,
    /// Estimated token footprint of the content.
    pub tokens: usize,
}

impl ScoredUnit {
    pub fn new(unit: TextUnit, relevance: TraitVector, emotional_intensity: f64) -> Self {
        let tokens = estimate_tokens(unit.content());
        Self {
            unit,
            relevance,
            emotional_intensity,
            tokens,
        }
    }

    /// Sum of relevance across dimensions.
    pub fn overall(&self) -> f64 {
        self.relevance.sum()
    }

    /// A unit contributes to a dimension when its relevance there is positive.
    pub fn contributes_to(&self, dim: TraitDimension) -> bool {
        self.relevance[dim] > 0.0
    }
}

/// Ordered, size-bounded selection of units from one channel.
///
/// Coverage is always derived from the members on request; nothing about it
/// is stored.
#[derive(Debug, Clone, Serialize)]
pub struct EvidenceSet {
    channel: ChannelKind,
    members: Vec<ScoredUnit>,
    coverage_floor: usize,
    /// Units dropped by the exclusion rules before selection.
    excluded: usize,
}

impl EvidenceSet {
    pub fn new(
        channel: ChannelKind,
        members: Vec<ScoredUnit>,
        coverage_floor: usize,
        excluded: usize,
    ) -> Self {
        Self {
            channel,
            members,
            coverage_floor,
            excluded,
        }
    }

    pub fn channel(&self) -> ChannelKind {
        self.channel
    }

    pub fn members(&self) -> &[ScoredUnit] {
        &self.members
    }

    pub fn units(&self) -> impl Iterator<Item = &TextUnit> {
        self.members.iter().map(|m| &m.unit)
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn coverage_floor(&self) -> usize {
        self.coverage_floor
    }

    pub fn excluded_count(&self) -> usize {
        self.excluded
    }

    pub fn estimated_tokens(&self) -> usize {
        self.members.iter().map(|m| m.tokens).sum()
    }

    /// Number of contributing members per dimension.
    pub fn coverage(&self) -> BTreeMap<TraitDimension, usize> {
        TraitDimension::ALL
            .into_iter()
            .map(|d| (d, self.members.iter().filter(|m| m.contributes_to(d)).count()))
            .collect()
    }

    /// Dimensions with fewer contributing members than the coverage floor.
    pub fn coverage_gaps(&self) -> Vec<TraitDimension> {
        self.coverage()
            .into_iter()
            .filter(|(_, n)| *n < self.coverage_floor)
            .map(|(d, _)| d)
            .collect()
    }

    /// Mean relevance vector of the members.
    pub fn mean_relevance(&self) -> TraitVector {
        let vectors: Vec<TraitVector> = self.members.iter().map(|m| m.relevance).collect();
        TraitVector::mean_of(&vectors).unwrap_or_else(TraitVector::zero)
    }

    /// Numbered plain-text listing for prompt embedding, each unit cut to
    /// `max_chars_per_unit` characters.
    pub fn render_condensed(&self, max_chars_per_unit: usize) -> String {
        self.members
            .iter()
            .enumerate()
            .map(|(i, m)| {
                let flat = m.unit.content().split_whitespace().collect::<Vec<_>>().join(" ");
                format!("{}. {}", i + 1, truncate_chars(&flat, max_chars_per_unit))
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}
