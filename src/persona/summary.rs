//! Qualitative summary of an evidence set: register, themes, dominant
//! dimensions and emotional expressiveness.

use std::collections::{BTreeMap, HashSet};
use std::fmt;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::evidence::EvidenceSet;
use crate::types::TraitDimension;
use crate::utilities::string_utils::words;

static FORMAL_MARKERS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)\b(dear|sincerely|regards|respectfully|kindly|furthermore|moreover|consequently|therefore|nevertheless|however|although|regarding|concerning|i would like to|i am writing to|i would appreciate|please find)\b",
    )
    .unwrap()
});
static CASUAL_MARKERS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)\b(hey|hi|thanks|sure|okay|cool|awesome|gonna|wanna|kinda|sorta|lol|haha|yo|sup|nah|yep|omg|lmao|brb|ttyl)\b|[!?]{2,}",
    )
    .unwrap()
});

const STOPWORDS: &[&str] = &[
    "about", "after", "again", "also", "been", "being", "from", "have", "just", "like", "more",
    "much", "really", "some", "that", "than", "them", "then", "there", "these", "they", "this",
    "today", "tonight", "very", "want", "were", "what", "when", "where", "which", "while", "will",
    "with", "would", "your", "you're", "it's", "i'm", "that's", "don't", "can't", "didn't",
];

/// Number of recurring themes reported.
const MAX_THEMES: usize = 5;
/// Fraction of the strongest dimension's mean relevance a dimension needs to
/// count as dominant.
const DOMINANCE_RATIO: f64 = 0.8;

/// Communication register inferred from formality markers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Register {
    Formal,
    Mixed,
    Casual,
}

impl fmt::Display for Register {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Formal => "formal",
            Self::Mixed => "mixed",
            Self::Casual => "casual",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvidenceSummary {
    pub register: Register,
    /// Share of formality markers among all register markers, `0.5` when
    /// there are none.
    pub formality: f64,
    /// Most frequent content words, most frequent first.
    pub themes: Vec<String>,
    /// Dimensions with the strongest mean relevance.
    pub dominant: Vec<TraitDimension>,
    /// Share of units carrying an emotional-intensity signal.
    pub expressiveness: f64,
}

impl EvidenceSummary {
    pub fn from_evidence(evidence: &EvidenceSet) -> Self {
        let mut formal = 0usize;
        let mut casual = 0usize;
        let mut counts: BTreeMap<String, usize> = BTreeMap::new();
        let stop: HashSet<&str> = STOPWORDS.iter().copied().collect();

        for unit in evidence.units() {
            let content = unit.content();
            formal += FORMAL_MARKERS.find_iter(content).count();
            casual += CASUAL_MARKERS.find_iter(content).count();
            for word in words(content) {
                if word.len() >= 4 && !stop.contains(word.as_str()) {
                    *counts.entry(word).or_insert(0) += 1;
                }
            }
        }

        let formality = if formal + casual == 0 {
            0.5
        } else {
            formal as f64 / (formal + casual) as f64
        };
        let register = if formality >= 0.6 {
            Register::Formal
        } else if formality <= 0.4 {
            Register::Casual
        } else {
            Register::Mixed
        };

        // BTreeMap iteration is alphabetical, and the sort is stable, so ties
        // stay alphabetical.
        let mut ranked: Vec<(String, usize)> =
            counts.into_iter().filter(|(_, n)| *n >= 2).collect();
        ranked.sort_by(|a, b| b.1.cmp(&a.1));
        let themes = ranked.into_iter().take(MAX_THEMES).map(|(w, _)| w).collect();

        let mean = evidence.mean_relevance();
        let (_, top) = mean.max_dimension();
        let mut dominant: Vec<(TraitDimension, f64)> = if top > 0.0 {
            mean.iter().filter(|(_, v)| *v >= top * DOMINANCE_RATIO).collect()
        } else {
            Vec::new()
        };
        dominant.sort_by(|a, b| b.1.total_cmp(&a.1));

        let expressive = evidence
            .members()
            .iter()
            .filter(|m| m.emotional_intensity > 0.0)
            .count();
        let expressiveness = if evidence.is_empty() {
            0.0
        } else {
            expressive as f64 / evidence.len() as f64
        };

        Self {
            register,
            formality,
            themes,
            dominant: dominant.into_iter().map(|(d, _)| d).collect(),
            expressiveness,
        }
    }

    /// One-paragraph rendering for prompt embedding.
    pub fn render(&self) -> String {
        let mut parts = vec![format!("register {}", self.register)];
        if !self.themes.is_empty() {
            parts.push(format!("recurring themes: {}", self.themes.join(", ")));
        }
        if !self.dominant.is_empty() {
            let dims: Vec<&str> = self.dominant.iter().map(|d| d.as_str()).collect();
            parts.push(format!("strongest trait signals: {}", dims.join(", ")));
        }
        parts.push(format!(
            "emotional expressiveness {:.0}%",
            self.expressiveness * 100.0
        ));
        parts.join("; ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::evidence::ScoredUnit;
    use crate::types::{ChannelKind, TextUnit, TraitVector};

    fn set(items: &[(&str, [f64; 5], f64)]) -> EvidenceSet {
        let members = items
            .iter()
            .map(|(text, rel, emo)| {
                ScoredUnit::new(
                    TextUnit::new(*text, ChannelKind::PrivateDyadic),
                    TraitVector::new(*rel),
                    *emo,
                )
            })
            .collect();
        EvidenceSet::new(ChannelKind::PrivateDyadic, members, 1, 0)
    }

    #[test]
    fn test_casual_register_and_themes() {
        let evidence = set(&[
            ("hey lol the climbing trip was awesome", [0.0, 0.0, 0.6, 0.0, 0.0], 0.5),
            ("haha climbing again next weekend??", [0.0, 0.0, 0.5, 0.0, 0.0], 0.5),
            ("cool, the weekend climbing gym opens early", [0.2, 0.0, 0.1, 0.0, 0.0], 0.0),
        ]);
        let summary = EvidenceSummary::from_evidence(&evidence);
        assert_eq!(summary.register, Register::Casual);
        assert_eq!(summary.themes, vec!["climbing", "weekend"]);
        assert_eq!(summary.dominant, vec![TraitDimension::Extraversion]);
        assert!((summary.expressiveness - 2.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_formal_register() {
        let evidence = set(&[(
            "Dear team, I would like to share the plan. Furthermore, kindly review it. Regards",
            [0.0, 0.5, 0.0, 0.0, 0.0],
            0.0,
        )]);
        let summary = EvidenceSummary::from_evidence(&evidence);
        assert_eq!(summary.register, Register::Formal);
        assert_eq!(summary.expressiveness, 0.0);
        assert!(summary.render().starts_with("register formal"));
    }

    #[test]
    fn test_no_markers_is_mixed() {
        let evidence = set(&[("the plan for the garden", [0.0; 5], 0.0)]);
        let summary = EvidenceSummary::from_evidence(&evidence);
        assert_eq!(summary.register, Register::Mixed);
        assert!(summary.dominant.is_empty());
        assert!(summary.themes.is_empty());
    }
}
