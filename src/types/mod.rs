//! Shared value types.

pub mod channel;
pub mod text_unit;
pub mod trait_vector;
pub mod usage_metrics;

pub use channel::ChannelKind;
pub use text_unit::TextUnit;
pub use trait_vector::{TraitDimension, TraitVector, SCALE_MAX, SCALE_MIDPOINT, SCALE_MIN};
pub use usage_metrics::UsageMetrics;
