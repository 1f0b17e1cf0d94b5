//! The rating inventory administered in both assessment modes.

use serde::{Deserialize, Serialize};

use crate::reasoning::PromptItem;
use crate::types::{TraitDimension, SCALE_MAX, SCALE_MIN};

/// Invert a rating on the five-level scale: `(max + min) - value`.
pub fn reverse_score(value: f64) -> f64 {
    SCALE_MAX + SCALE_MIN - value
}

/// One statement rated on the five-level scale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InventoryItem {
    pub id: String,
    pub text: String,
    pub dimension: TraitDimension,
    /// Agreement indicates a *low* level of the dimension.
    #[serde(default)]
    pub reverse: bool,
}

impl InventoryItem {
    pub fn new(id: &str, text: &str, dimension: TraitDimension, reverse: bool) -> Self {
        Self {
            id: id.to_string(),
            text: text.to_string(),
            dimension,
            reverse,
        }
    }

    /// Contribution of an ordinal answer to this item's dimension.
    pub fn score(&self, value: u8) -> f64 {
        let value = f64::from(value);
        if self.reverse {
            reverse_score(value)
        } else {
            value
        }
    }

    pub fn prompt_item(&self) -> PromptItem {
        PromptItem::new(self.id.clone(), self.text.clone())
    }
}

/// Ordered item list. Loaded from configuration; the default is the
/// 60-statement five-factor inventory with twelve items per dimension.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Inventory {
    items: Vec<InventoryItem>,
}

impl Inventory {
    pub fn new(items: Vec<InventoryItem>) -> Self {
        Self { items }
    }

    pub fn items(&self) -> &[InventoryItem] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn items_for(&self, dim: TraitDimension) -> impl Iterator<Item = &InventoryItem> {
        self.items.iter().filter(move |i| i.dimension == dim)
    }

    pub fn get(&self, id: &str) -> Option<&InventoryItem> {
        self.items.iter().find(|i| i.id == id)
    }

    pub fn prompt_items(&self) -> Vec<PromptItem> {
        self.items.iter().map(InventoryItem::prompt_item).collect()
    }
}

const DEFAULT_ITEMS: &[(&str, &str, bool)] = &[
    ("O1", "You have an active imagination.", false),
    ("O2", "You are original and come up with new ideas.", false),
    ("O3", "You have few artistic interests.", true),
    ("O4", "You are curious about many different things.", false),
    ("O5", "You prefer routine over variety.", true),
    ("O6", "You appreciate art, music, or poetry.", false),
    ("O7", "You avoid abstract conversations.", true),
    ("O8", "You enjoy exploring new places.", false),
    ("O9", "You are uninterested in theories.", true),
    ("O10", "You like tackling complex problems.", false),
    ("O11", "You are conservative about new experiences.", true),
    ("O12", "You value creativity in your work.", false),
    ("C1", "You do a thorough job.", false),
    ("C2", "You can be somewhat careless.", true),
    ("C3", "You are reliable and get things done.", false),
    ("C4", "You keep things tidy and organized.", false),
    ("C5", "You leave tasks unfinished.", true),
    ("C6", "You follow schedules closely.", false),
    ("C7", "You procrastinate important work.", true),
    ("C8", "You pay attention to details.", false),
    ("C9", "You are impulsive with commitments.", true),
    ("C10", "You plan ahead before acting.", false),
    ("C11", "You misplace things often.", true),
    ("C12", "You stick to goals despite obstacles.", false),
    ("E1", "You are talkative.", false),
    ("E2", "You are reserved.", true),
    ("E3", "You are outgoing and sociable.", false),
    ("E4", "You are energetic and high-spirited.", false),
    ("E5", "You are quiet in groups.", true),
    ("E6", "You prefer being alone.", true),
    ("E7", "You are assertive in discussions.", false),
    ("E8", "You avoid being the center of attention.", true),
    ("E9", "You are enthusiastic with strangers.", false),
    ("E10", "You keep conversations short.", true),
    ("E11", "You enjoy parties and gatherings.", false),
    ("E12", "You say little in meetings.", true),
    ("A1", "You are considerate and kind to almost everyone.", false),
    ("A2", "You tend to find fault with others.", true),
    ("A3", "You are helpful and unselfish with others.", false),
    ("A4", "You stay polite even when stressed.", false),
    ("A5", "You are stubborn in disagreements.", true),
    ("A6", "You trust people easily.", false),
    ("A7", "You are skeptical of others' motives.", true),
    ("A8", "You are forgiving when wronged.", false),
    ("A9", "You enjoy competition more than cooperation.", true),
    ("A10", "You are patient with others' mistakes.", false),
    ("A11", "You are critical and blunt.", true),
    ("A12", "You are empathetic to others' feelings.", false),
    ("N1", "You are relaxed and handle stress well.", true),
    ("N2", "You get nervous easily.", false),
    ("N3", "You worry a lot.", false),
    ("N4", "Your mood changes frequently.", false),
    ("N5", "You are calm in emergencies.", true),
    ("N6", "You often feel down or blue.", false),
    ("N7", "You are rarely irritated.", true),
    ("N8", "You get frustrated easily.", false),
    ("N9", "You are emotionally stable day to day.", true),
    ("N10", "You ruminate over problems.", false),
    ("N11", "You take things in stride.", true),
    ("N12", "You feel overwhelmed by pressure.", false),
];

impl Default for Inventory {
    fn default() -> Self {
        let items = DEFAULT_ITEMS
            .iter()
            .filter_map(|(id, text, reverse)| {
                let dim = TraitDimension::parse(&id[..1])?;
                Some(InventoryItem::new(id, text, dim, *reverse))
            })
            .collect();
        Self { items }
    }
}
