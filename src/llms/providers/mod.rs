//! LLM provider implementations.
//!
//! Each provider implements the [`BaseLLM`](crate::llms::base_llm::BaseLLM)
//! trait and handles authentication, request formatting and error
//! classification for its API.
//!
//! | Provider | Module |
//! |----------|--------|
//! | OpenAI-compatible Chat Completions | [`openai`] |

pub mod openai;

pub use openai::OpenAICompletion;
