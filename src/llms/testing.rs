//! Scripted [`BaseLLM`] used by unit tests across the crate.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;

use super::base_llm::{BaseLLM, Completion, CompletionRequest, TokenUsage};
use crate::utilities::errors::LLMError;

/// What to answer once the script is exhausted.
#[derive(Debug, Clone)]
pub enum Fallback {
    /// Same letter for every numbered item in the prompt.
    Uniform(char),
    /// Letter chosen from each item's text.
    ByItem(fn(&str) -> char),
    Fail(LLMError),
}

#[derive(Debug)]
pub struct ScriptedLLM {
    model: String,
    script: Mutex<VecDeque<Result<String, LLMError>>>,
    fallback: Fallback,
    delay: Duration,
    requests: Mutex<Vec<CompletionRequest>>,
    in_flight: AtomicUsize,
    peak: AtomicUsize,
}

impl ScriptedLLM {
    pub fn new(fallback: Fallback) -> Self {
        Self {
            model: "scripted".to_string(),
            script: Mutex::new(VecDeque::new()),
            fallback,
            delay: Duration::ZERO,
            requests: Mutex::new(Vec::new()),
            in_flight: AtomicUsize::new(0),
            peak: AtomicUsize::new(0),
        }
    }

    pub fn uniform(letter: char) -> Self {
        Self::new(Fallback::Uniform(letter))
    }

    pub fn failing(err: LLMError) -> Self {
        Self::new(Fallback::Fail(err))
    }

    /// Responses consumed in order before the fallback applies.
    pub fn with_script(self, items: impl IntoIterator<Item = Result<String, LLMError>>) -> Self {
        self.script.lock().extend(items);
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn with_model(mut self, model: &str) -> Self {
        self.model = model.to_string();
        self
    }

    pub fn calls(&self) -> usize {
        self.requests.lock().len()
    }

    pub fn requests(&self) -> Vec<CompletionRequest> {
        self.requests.lock().clone()
    }

    pub fn peak_in_flight(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }
}

/// Texts of the `N. text` lines of a prompt.
pub fn numbered_items(user: &str) -> Vec<&str> {
    user.lines()
        .filter_map(|line| {
            let line = line.trim_start();
            let (num, rest) = line.split_once(". ")?;
            if !num.is_empty() && num.chars().all(|c| c.is_ascii_digit()) {
                Some(rest)
            } else {
                None
            }
        })
        .collect()
}

#[async_trait]
impl BaseLLM for ScriptedLLM {
    fn model(&self) -> &str {
        &self.model
    }

    async fn complete(&self, request: &CompletionRequest) -> Result<Completion, LLMError> {
        self.requests.lock().push(request.clone());
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        let scripted = self.script.lock().pop_front();
        let text = match scripted {
            Some(result) => result?,
            None => {
                let items = numbered_items(&request.user);
                let letters: Vec<String> = match &self.fallback {
                    Fallback::Uniform(letter) => items.iter().map(|_| letter.to_string()).collect(),
                    Fallback::ByItem(pick) => items.iter().map(|text| pick(text).to_string()).collect(),
                    Fallback::Fail(err) => return Err(err.clone()),
                };
                letters.join(" ")
            }
        };
        let completion_tokens = text.split_whitespace().count() as i64;
        Ok(Completion {
            text,
            usage: Some(TokenUsage {
                prompt_tokens: 10,
                completion_tokens,
            }),
        })
    }
}
