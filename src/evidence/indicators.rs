//! Indicator phrase table and exclusion rules.
//!
//! This is configuration data: the scorer compiles whatever table it is
//! given and never branches on dimension or channel names itself.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::types::TraitDimension;

/// A phrase that signals a trait dimension, with its weight.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Indicator {
    pub phrase: String,
    #[serde(default = "default_weight")]
    pub weight: f64,
}

fn default_weight() -> f64 {
    1.0
}

impl Indicator {
    pub fn new(phrase: impl Into<String>, weight: f64) -> Self {
        Self {
            phrase: phrase.into(),
            weight,
        }
    }
}

/// Per-dimension indicator phrases plus the rules deciding which units are
/// not evidence at all.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndicatorTable {
    #[serde(default = "default_dimensions")]
    pub dimensions: BTreeMap<TraitDimension, Vec<Indicator>>,
    /// Summed weight at which a dimension's relevance reaches 1.0.
    #[serde(default = "default_saturation")]
    pub saturation: f64,
    #[serde(default)]
    pub emotion: EmotionSignal,
    #[serde(default)]
    pub exclusion: ExclusionRules,
}

fn default_saturation() -> f64 {
    3.0
}

impl Default for IndicatorTable {
    fn default() -> Self {
        Self {
            dimensions: default_dimensions(),
            saturation: default_saturation(),
            emotion: EmotionSignal::default(),
            exclusion: ExclusionRules::default(),
        }
    }
}

impl IndicatorTable {
    pub fn indicators(&self, dim: TraitDimension) -> &[Indicator] {
        self.dimensions.get(&dim).map(Vec::as_slice).unwrap_or(&[])
    }
}

fn table(entries: &[(&str, f64)]) -> Vec<Indicator> {
    entries
        .iter()
        .map(|(phrase, weight)| Indicator::new(*phrase, *weight))
        .collect()
}

fn default_dimensions() -> BTreeMap<TraitDimension, Vec<Indicator>> {
    let mut map = BTreeMap::new();
    map.insert(
        TraitDimension::Openness,
        table(&[
            ("curious", 1.0),
            ("imagine", 1.0),
            ("imagination", 1.0),
            ("creative", 1.0),
            ("idea", 0.7),
            ("ideas", 0.7),
            ("art", 0.7),
            ("poetry", 0.8),
            ("philosophy", 1.0),
            ("explore", 0.8),
            ("exploring", 0.8),
            ("theory", 0.7),
            ("abstract", 0.7),
            ("experiment", 0.7),
            ("wonder", 0.6),
            ("new perspective", 1.0),
            ("learned", 0.5),
            ("reading", 0.5),
            ("travel", 0.5),
        ]),
    );
    map.insert(
        TraitDimension::Conscientiousness,
        table(&[
            ("plan", 0.8),
            ("planned", 0.8),
            ("planning", 0.8),
            ("schedule", 1.0),
            ("deadline", 1.0),
            ("organized", 1.0),
            ("organize", 0.8),
            ("on time", 0.8),
            ("checklist", 1.0),
            ("finished", 0.6),
            ("prepared", 0.8),
            ("goal", 0.7),
            ("goals", 0.7),
            ("discipline", 1.0),
            ("careful", 0.7),
            ("details", 0.6),
            ("priority", 0.6),
            ("to-do", 0.8),
        ]),
    );
    map.insert(
        TraitDimension::Extraversion,
        table(&[
            ("party", 1.0),
            ("friends", 0.7),
            ("hang out", 1.0),
            ("meet up", 1.0),
            ("everyone", 0.5),
            ("crowd", 0.7),
            ("celebrate", 0.8),
            ("fun", 0.6),
            ("dance", 0.8),
            ("concert", 0.8),
            ("people", 0.4),
            ("social", 0.7),
            ("let's go", 0.8),
            ("talking", 0.5),
            ("gathering", 0.8),
        ]),
    );
    map.insert(
        TraitDimension::Agreeableness,
        table(&[
            ("appreciate", 0.8),
            ("sorry", 0.7),
            ("help", 0.6),
            ("helping", 0.7),
            ("kind", 0.7),
            ("support", 0.7),
            ("understand", 0.6),
            ("forgive", 1.0),
            ("care about", 1.0),
            ("grateful", 0.8),
            ("together", 0.5),
            ("no worries", 0.8),
            ("happy to help", 1.0),
            ("you're right", 0.8),
        ]),
    );
    map.insert(
        TraitDimension::Neuroticism,
        table(&[
            ("worried", 1.0),
            ("worry", 1.0),
            ("anxious", 1.0),
            ("stress", 0.8),
            ("stressed", 1.0),
            ("nervous", 1.0),
            ("afraid", 0.8),
            ("upset", 0.8),
            ("overwhelmed", 1.0),
            ("frustrated", 0.8),
            ("can't sleep", 1.0),
            ("panic", 1.0),
            ("sad", 0.7),
            ("lonely", 0.8),
            ("annoyed", 0.7),
        ]),
    );
    map
}

/// Emotional-intensity signal: emotional vocabulary and repeated `!`/`?`
/// runs add relevance to the target dimensions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmotionSignal {
    #[serde(default = "default_emotion_words")]
    pub words: Vec<String>,
    #[serde(default = "default_emotion_word_weight")]
    pub word_weight: f64,
    #[serde(default = "default_punctuation_weight")]
    pub punctuation_weight: f64,
    #[serde(default = "default_emotion_targets")]
    pub targets: Vec<TraitDimension>,
}

fn default_emotion_words() -> Vec<String> {
    [
        "love", "hate", "amazing", "awful", "terrible", "excited", "thrilled", "devastated",
        "furious", "miserable", "ecstatic", "heartbroken", "scared", "crying",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

fn default_emotion_word_weight() -> f64 {
    0.5
}

fn default_punctuation_weight() -> f64 {
    0.5
}

fn default_emotion_targets() -> Vec<TraitDimension> {
    vec![TraitDimension::Neuroticism, TraitDimension::Extraversion]
}

impl Default for EmotionSignal {
    fn default() -> Self {
        Self {
            words: default_emotion_words(),
            word_weight: default_emotion_word_weight(),
            punctuation_weight: default_punctuation_weight(),
            targets: default_emotion_targets(),
        }
    }
}

/// Rules classifying a unit as non-evidence.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExclusionRules {
    #[serde(default = "default_min_words")]
    pub min_words: usize,
    #[serde(default = "default_max_url_fraction")]
    pub max_url_fraction: f64,
    #[serde(default = "default_max_mention_fraction")]
    pub max_mention_fraction: f64,
    #[serde(default = "default_max_numeric_fraction")]
    pub max_numeric_fraction: f64,
    /// Prefixes marking reshared content.
    #[serde(default = "default_forward_prefixes")]
    pub forward_prefixes: Vec<String>,
    /// Whole-message regexes for pure logistics replies, matched against the
    /// trimmed lowercase content.
    #[serde(default = "default_logistics_patterns")]
    pub logistics_patterns: Vec<String>,
    /// Phrases marking promotional content; excluded regardless of length.
    #[serde(default = "default_promotional_phrases")]
    pub promotional_phrases: Vec<String>,
    /// Congratulation and announcement phrases; excluded only when the unit
    /// is shorter than `boilerplate_max_words`.
    #[serde(default = "default_boilerplate_phrases")]
    pub boilerplate_phrases: Vec<String>,
    #[serde(default = "default_boilerplate_max_words")]
    pub boilerplate_max_words: usize,
    /// System-generated notices.
    #[serde(default = "default_system_notices")]
    pub system_notices: Vec<String>,
}

fn default_min_words() -> usize {
    3
}

fn default_max_url_fraction() -> f64 {
    0.5
}

fn default_max_mention_fraction() -> f64 {
    0.4
}

fn default_max_numeric_fraction() -> f64 {
    0.5
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

fn default_forward_prefixes() -> Vec<String> {
    strings(&["RT @", "RT:", "Fwd:", "FW:"])
}

fn default_logistics_patterns() -> Vec<String> {
    strings(&[
        r"^(ok|okay|yes|no|yep|nope|sure|fine|alright)[.!]*$",
        r"^(thanks?|thank you|thx)[.!]*$",
        r"^(see you|bye|good night|good morning)[.!]*$",
        r"^\d{1,2}:\d{2}",
        r"^(on my way|omw|coming|reached)[.!]*$",
    ])
}

fn default_promotional_phrases() -> Vec<String> {
    strings(&[
        "use code",
        "promo code",
        "% off",
        "discount",
        "limited time",
        "link in bio",
        "click the link",
        "buy now",
        "shop now",
        "sign up now",
        "giveaway",
        "sponsored",
        "free shipping",
    ])
}

fn default_boilerplate_phrases() -> Vec<String> {
    strings(&[
        "congratulations",
        "congrats",
        "thank you for",
        "thanks for",
        "happy to announce",
        "pleased to share",
        "excited to share",
    ])
}

fn default_boilerplate_max_words() -> usize {
    15
}

fn default_system_notices() -> Vec<String> {
    strings(&[
        "<media omitted>",
        "image omitted",
        "video omitted",
        "this message was deleted",
        "you deleted this message",
        "messages and calls are end-to-end encrypted",
        "missed voice call",
        "missed video call",
    ])
}

impl Default for ExclusionRules {
    fn default() -> Self {
        Self {
            min_words: default_min_words(),
            max_url_fraction: default_max_url_fraction(),
            max_mention_fraction: default_max_mention_fraction(),
            max_numeric_fraction: default_max_numeric_fraction(),
            forward_prefixes: default_forward_prefixes(),
            logistics_patterns: default_logistics_patterns(),
            promotional_phrases: default_promotional_phrases(),
            boilerplate_phrases: default_boilerplate_phrases(),
            boilerplate_max_words: default_boilerplate_max_words(),
            system_notices: default_system_notices(),
        }
    }
}
