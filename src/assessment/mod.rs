//! Trait assessment.
//!
//! The [`TraitAssessmentEngine`] administers the [`Inventory`] through the
//! reasoning client twice per run: once as a baseline with no persona
//! context and once induced with the calibration directive and evidence.
//! The mode is an explicit tag on every call.

pub mod engine;
pub mod inventory;
pub mod result;

pub use engine::{PromptContext, TraitAssessmentEngine, INVENTORY_SYSTEM_PROMPT};
pub use inventory::{reverse_score, Inventory, InventoryItem};
pub use result::{AssessmentMode, AssessmentResult, ItemResponse, ModeAssessment};
