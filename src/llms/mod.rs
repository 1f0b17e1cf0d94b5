//! LLM system.
//!
//! - [`base_llm`] - The async trait every reasoning backend implements
//! - [`providers`] - Concrete HTTP providers (OpenAI-compatible)

pub mod base_llm;
pub mod providers;

#[cfg(test)]
pub(crate) mod testing;

pub use base_llm::{is_reasoning_model, BaseLLM, Completion, CompletionRequest, TokenUsage};
pub use providers::OpenAICompletion;
