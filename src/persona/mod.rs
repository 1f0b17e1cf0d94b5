//! Persona calibration.
//!
//! Every channel distorts how personality shows up in writing. The
//! [`PersonaCalibrator`] looks up the channel's policy in a [`BiasTable`] and
//! combines it with a qualitative [`EvidenceSummary`] into a
//! [`CalibrationDirective`] for the induced assessment prompts.
//!
//! ```text
//! EvidenceSet ──► EvidenceSummary (register, themes, dominant dims)
//!                     │
//! ChannelKind ──► ChannelPolicy (bias per dim, weight, guidance)
//!                     ▼
//!              CalibrationDirective ──► render() ──► induced prompt
//! ```

pub mod calibration;
pub mod summary;

pub use calibration::{
    BiasDirection, BiasTable, CalibrationDirective, ChannelPolicy, PersonaCalibrator, TraitBias,
};
pub use summary::{EvidenceSummary, Register};
