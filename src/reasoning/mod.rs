//! Reasoning client: batched, retrying access to the external reasoning
//! capability.
//!
//! - [`backoff`] - exponential backoff with jitter
//! - [`parsing`] - response segmentation and the answer recovery chain
//! - [`client`] - [`ReasoningClient`], prompts and batch answers

pub mod backoff;
pub mod client;
pub mod parsing;

pub use backoff::RetryPolicy;
pub use client::{BatchAnswers, Evaluation, Prompt, PromptItem, ReasoningClient};
pub use parsing::{AnswerSource, StructuredAnswer, LIKERT_LETTERS, NEUTRAL_VALUE};
