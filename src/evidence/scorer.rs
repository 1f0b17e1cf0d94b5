//! Deterministic lexical scoring of text units against the trait dimensions.

use std::fmt;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use super::indicators::{ExclusionRules, IndicatorTable};
use crate::types::{TextUnit, TraitDimension, TraitVector};
use crate::utilities::errors::ConfigError;
use crate::utilities::string_utils::{mention_fraction, url_fraction};

static EMPHATIC_PUNCTUATION: Lazy<Regex> = Lazy::new(|| Regex::new(r"[!?]{2,}").unwrap());
static NUMERIC_WORD: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[\d:/.\-]+$").unwrap());

/// Why a unit was classified as non-evidence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExclusionReason {
    Empty,
    TooShort,
    Forwarded,
    MostlyLinks,
    MostlyMentions,
    MostlyNumeric,
    Logistics,
    Promotional,
    Boilerplate,
    SystemNotice,
}

impl fmt::Display for ExclusionReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Empty => "empty",
            Self::TooShort => "too short",
            Self::Forwarded => "forwarded",
            Self::MostlyLinks => "mostly links",
            Self::MostlyMentions => "mostly mentions",
            Self::MostlyNumeric => "mostly numeric",
            Self::Logistics => "logistics",
            Self::Promotional => "promotional",
            Self::Boilerplate => "boilerplate",
            Self::SystemNotice => "system notice",
        };
        f.write_str(s)
    }
}

/// Scoring outcome for one unit.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EvidenceScore {
    /// Per-dimension relevance in `[0, 1]`. All zero when excluded.
    pub relevance: TraitVector,
    /// Raw emotional-intensity signal (vocabulary hits and emphatic runs).
    pub emotional_intensity: f64,
    pub exclusion: Option<ExclusionReason>,
}

impl EvidenceScore {
    fn excluded(reason: ExclusionReason) -> Self {
        Self {
            relevance: TraitVector::zero(),
            emotional_intensity: 0.0,
            exclusion: Some(reason),
        }
    }

    pub fn is_excluded(&self) -> bool {
        self.exclusion.is_some()
    }

    /// Sum of relevance across dimensions.
    pub fn overall(&self) -> f64 {
        self.relevance.sum()
    }
}

#[derive(Debug)]
struct Matcher {
    dimension: TraitDimension,
    pattern: Regex,
    weight: f64,
}

#[derive(Debug)]
struct CompiledExclusion {
    rules: ExclusionRules,
    logistics: Vec<Regex>,
    promotional: Vec<String>,
    boilerplate: Vec<String>,
    system_notices: Vec<String>,
}

/// Scores units against a compiled [`IndicatorTable`].
#[derive(Debug)]
pub struct EvidenceScorer {
    matchers: Vec<Matcher>,
    emotion_words: Option<Regex>,
    emotion_word_weight: f64,
    punctuation_weight: f64,
    emotion_targets: Vec<TraitDimension>,
    saturation: f64,
    exclusion: CompiledExclusion,
}

fn phrase_pattern(phrase: &str) -> Result<Regex, ConfigError> {
    let escaped = regex::escape(phrase.trim());
    Regex::new(&format!(r"(?i)\b{}\b", escaped))
        .map_err(|e| ConfigError::Invalid(format!("indicator '{}': {}", phrase, e)))
}

impl EvidenceScorer {
    /// Compile `table`. Fails on an invalid logistics pattern or a
    /// non-positive saturation.
    pub fn new(table: &IndicatorTable) -> Result<Self, ConfigError> {
        if table.saturation <= 0.0 {
            return Err(ConfigError::Invalid(
                "indicators.saturation must be positive".to_string(),
            ));
        }

        let mut matchers = Vec::new();
        for (dimension, indicators) in &table.dimensions {
            for indicator in indicators {
                if indicator.phrase.trim().is_empty() || indicator.weight <= 0.0 {
                    continue;
                }
                matchers.push(Matcher {
                    dimension: *dimension,
                    pattern: phrase_pattern(&indicator.phrase)?,
                    weight: indicator.weight,
                });
            }
        }

        let emotion_words = if table.emotion.words.is_empty() {
            None
        } else {
            let alternation = table
                .emotion
                .words
                .iter()
                .map(|w| regex::escape(w.trim()))
                .collect::<Vec<_>>()
                .join("|");
            Some(
                Regex::new(&format!(r"(?i)\b(?:{})\b", alternation))
                    .map_err(|e| ConfigError::Invalid(format!("emotion words: {}", e)))?,
            )
        };

        let logistics = table
            .exclusion
            .logistics_patterns
            .iter()
            .map(|p| {
                Regex::new(p)
                    .map_err(|e| ConfigError::Invalid(format!("logistics pattern '{}': {}", p, e)))
            })
            .collect::<Result<Vec<_>, _>>()?;
        let lower = |items: &[String]| items.iter().map(|s| s.to_lowercase()).collect::<Vec<_>>();

        Ok(Self {
            matchers,
            emotion_words,
            emotion_word_weight: table.emotion.word_weight,
            punctuation_weight: table.emotion.punctuation_weight,
            emotion_targets: table.emotion.targets.clone(),
            saturation: table.saturation,
            exclusion: CompiledExclusion {
                logistics,
                promotional: lower(&table.exclusion.promotional_phrases),
                boilerplate: lower(&table.exclusion.boilerplate_phrases),
                system_notices: lower(&table.exclusion.system_notices),
                rules: table.exclusion.clone(),
            },
        })
    }

    /// Per-dimension relevance of `unit`; all zero when excluded.
    pub fn score(&self, unit: &TextUnit) -> TraitVector {
        self.evaluate(unit).relevance
    }

    /// Full scoring outcome including the exclusion decision.
    pub fn evaluate(&self, unit: &TextUnit) -> EvidenceScore {
        let content = unit.content();
        if let Some(reason) = self.exclusion_reason(content) {
            return EvidenceScore::excluded(reason);
        }

        let mut raw = TraitVector::zero();
        for m in &self.matchers {
            if m.pattern.is_match(content) {
                raw[m.dimension] += m.weight;
            }
        }

        let intensity = self.emotional_intensity(content);
        for dim in &self.emotion_targets {
            raw[*dim] += intensity;
        }

        EvidenceScore {
            relevance: raw.map(|_, v| (v / self.saturation).min(1.0)),
            emotional_intensity: intensity,
            exclusion: None,
        }
    }

    fn emotional_intensity(&self, content: &str) -> f64 {
        let words = self
            .emotion_words
            .as_ref()
            .map_or(0, |re| re.find_iter(content).count());
        let runs = EMPHATIC_PUNCTUATION.find_iter(content).count();
        words as f64 * self.emotion_word_weight + runs as f64 * self.punctuation_weight
    }

    /// Classify `content` as non-evidence, independent of trait scoring.
    pub fn exclusion_reason(&self, content: &str) -> Option<ExclusionReason> {
        let ex = &self.exclusion;
        let trimmed = content.trim();
        if trimmed.is_empty() {
            return Some(ExclusionReason::Empty);
        }
        let lower = trimmed.to_lowercase();

        if ex.system_notices.iter().any(|n| lower.contains(n.as_str())) {
            return Some(ExclusionReason::SystemNotice);
        }
        if ex
            .rules
            .forward_prefixes
            .iter()
            .any(|p| trimmed.starts_with(p.as_str()))
        {
            return Some(ExclusionReason::Forwarded);
        }
        if ex.logistics.iter().any(|re| re.is_match(&lower)) {
            return Some(ExclusionReason::Logistics);
        }
        if ex.promotional.iter().any(|p| lower.contains(p.as_str())) {
            return Some(ExclusionReason::Promotional);
        }
        if url_fraction(trimmed) > ex.rules.max_url_fraction {
            return Some(ExclusionReason::MostlyLinks);
        }
        if mention_fraction(trimmed) > ex.rules.max_mention_fraction {
            return Some(ExclusionReason::MostlyMentions);
        }

        let words: Vec<&str> = trimmed.split_whitespace().collect();
        let numeric = words
            .iter()
            .filter(|w| NUMERIC_WORD.is_match(w.trim_matches(|c: char| ",!?".contains(c))))
            .count();
        if numeric as f64 > words.len() as f64 * ex.rules.max_numeric_fraction {
            return Some(ExclusionReason::MostlyNumeric);
        }
        if words.len() < ex.rules.min_words {
            return Some(ExclusionReason::TooShort);
        }
        if words.len() < ex.rules.boilerplate_max_words
            && ex.boilerplate.iter().any(|p| lower.contains(p.as_str()))
        {
            return Some(ExclusionReason::Boilerplate);
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ChannelKind;

    fn scorer() -> EvidenceScorer {
        EvidenceScorer::new(&IndicatorTable::default()).unwrap()
    }

    fn unit(text: &str) -> TextUnit {
        TextUnit::new(text, ChannelKind::PrivateDyadic)
    }

    #[test]
    fn test_empty_content_is_excluded_with_zero_vector() {
        let s = scorer();
        for text in ["", "   \n\t "] {
            let score = s.evaluate(&unit(text));
            assert_eq!(score.exclusion, Some(ExclusionReason::Empty));
            assert_eq!(score.relevance, TraitVector::zero());
        }
    }

    #[test]
    fn test_exclusion_reasons() {
        let s = scorer();
        let cases = [
            ("ok", ExclusionReason::Logistics),
            ("on my way", ExclusionReason::Logistics),
            ("RT @someone this is a really curious idea", ExclusionReason::Forwarded),
            ("Use code SAVE20 for 20% off everything today", ExclusionReason::Promotional),
            ("https://example.com/some/very/long/link/path here", ExclusionReason::MostlyLinks),
            ("@alice @bob @carol @dave see", ExclusionReason::MostlyMentions),
            ("12 14 2023 yes", ExclusionReason::MostlyNumeric),
            ("great idea", ExclusionReason::TooShort),
            ("Congrats on the new role!", ExclusionReason::Boilerplate),
            ("<Media omitted>", ExclusionReason::SystemNotice),
        ];
        for (text, expected) in cases {
            assert_eq!(s.exclusion_reason(text), Some(expected), "{}", text);
        }
    }

    #[test]
    fn test_long_congratulation_is_kept() {
        let s = scorer();
        let text = "Congrats to the whole team, I was so worried about the launch but \
                    everyone pulled together and we planned every detail carefully";
        assert_eq!(s.exclusion_reason(text), None);
    }

    #[test]
    fn test_indicator_matching_is_case_insensitive_and_bounded() {
        let s = scorer();
        let v = s.score(&unit("I am so CURIOUS about this new philosophy of art and poetry"));
        assert!(v.openness > 0.0);
        assert!(v.openness <= 1.0);
        assert_eq!(v.conscientiousness, 0.0);
    }

    #[test]
    fn test_whole_word_matching() {
        let s = scorer();
        // "start" contains "art" but is not an indicator hit.
        let v = s.score(&unit("we should start the meeting soon"));
        assert_eq!(v.openness, 0.0);
    }

    #[test]
    fn test_emotional_intensity_raises_targets() {
        let s = scorer();
        let calm = s.evaluate(&unit("we went to the party with friends"));
        let loud = s.evaluate(&unit("we went to the party with friends, it was amazing!!!"));
        assert_eq!(calm.emotional_intensity, 0.0);
        assert!(loud.emotional_intensity > 0.0);
        assert!(loud.relevance.extraversion > calm.relevance.extraversion);
        assert!(loud.relevance.neuroticism > 0.0);
    }

    #[test]
    fn test_scoring_is_deterministic() {
        let s = scorer();
        let u = unit("stressed about the deadline but grateful for the help");
        assert_eq!(s.evaluate(&u), s.evaluate(&u));
    }

    #[test]
    fn test_non_positive_saturation_rejected() {
        let table = IndicatorTable {
            saturation: 0.0,
            ..IndicatorTable::default()
        };
        assert!(EvidenceScorer::new(&table).is_err());
    }
}
