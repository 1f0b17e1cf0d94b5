//! Retrying, backoff-aware adapter around a [`BaseLLM`].

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use super::backoff::RetryPolicy;
use super::parsing::{parse_answers, StructuredAnswer};
use crate::context::ProbeContext;
use crate::llms::base_llm::{BaseLLM, Completion, CompletionRequest};
use crate::types::UsageMetrics;
use crate::utilities::config::ReasoningConfig;
use crate::utilities::errors::{AssessmentError, LLMError};
use crate::utilities::string_utils::truncate_chars;

/// Completion allowance for reasoning-class models.
const REASONING_MODEL_TOKENS: u32 = 1000;

/// One inventory statement inside a prompt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PromptItem {
    pub id: String,
    pub text: String,
}

impl PromptItem {
    pub fn new(id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            text: text.into(),
        }
    }
}

/// One request: a system directive and a numbered batch of items.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prompt {
    pub system: String,
    pub items: Vec<PromptItem>,
    /// 1-based position of this batch within its assessment.
    pub batch_number: usize,
}

impl Prompt {
    /// The user message listing every item.
    pub fn render_user(&self) -> String {
        let mut text = format!(
            "Rate how accurately each statement describes you (Batch {}):\n\n",
            self.batch_number
        );
        for (i, item) in self.items.iter().enumerate() {
            text.push_str(&format!("{}. {}\n", i + 1, item.text));
        }
        text.push_str(&format!(
            "\nRespond with exactly {} letters separated by spaces.\nFormat: A B C D E A B C D E...",
            self.items.len()
        ));
        text
    }
}

/// Parsed answers for one prompt, in item order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchAnswers {
    pub answers: Vec<StructuredAnswer>,
    /// The response text exactly as returned.
    pub raw_text: String,
    /// Some items fell back to the neutral default.
    pub partial_failure: bool,
    /// Attempts spent, including the successful one.
    pub attempts: u32,
}

impl BatchAnswers {
    pub fn defaulted(&self) -> usize {
        self.answers.iter().filter(|a| a.low_confidence()).count()
    }
}

/// Result of evaluating a sequence of prompts.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Evaluation {
    /// Completed batches, in prompt order.
    pub batches: Vec<BatchAnswers>,
    /// Cancellation stopped evaluation at a batch boundary.
    pub cancelled: bool,
}

impl Evaluation {
    /// All answers flattened in prompt order.
    pub fn answers(&self) -> impl Iterator<Item = &StructuredAnswer> {
        self.batches.iter().flat_map(|b| b.answers.iter())
    }
}

#[derive(Debug)]
pub struct ReasoningClient {
    llm: Arc<dyn BaseLLM>,
    retry: RetryPolicy,
    batch_size: usize,
    pacing: Duration,
    request_timeout: Duration,
    temperature: f64,
    max_tokens: u32,
    usage: Mutex<UsageMetrics>,
}

impl ReasoningClient {
    pub fn new(llm: Arc<dyn BaseLLM>, config: &ReasoningConfig) -> Self {
        Self {
            llm,
            retry: config.retry_policy(),
            batch_size: config.batch_size.max(1),
            pacing: config.pacing(),
            request_timeout: config.request_timeout(),
            temperature: config.temperature,
            max_tokens: config.max_tokens,
            usage: Mutex::new(UsageMetrics::new()),
        }
    }

    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    pub fn with_pacing(mut self, pacing: Duration) -> Self {
        self.pacing = pacing;
        self
    }

    pub fn llm(&self) -> &Arc<dyn BaseLLM> {
        &self.llm
    }

    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    pub fn pacing(&self) -> Duration {
        self.pacing
    }

    /// Snapshot of the counters accumulated so far.
    pub fn usage_metrics(&self) -> UsageMetrics {
        self.usage.lock().clone()
    }

    /// Completion token allowance for the configured model.
    pub fn token_allowance(&self) -> u32 {
        if self.llm.is_reasoning_model() {
            self.max_tokens.max(REASONING_MODEL_TOKENS)
        } else {
            self.max_tokens
        }
    }

    /// Chunk `items` into prompts of at most `batch_size` items.
    pub fn build_prompts(&self, system: &str, items: &[PromptItem]) -> Vec<Prompt> {
        items
            .chunks(self.batch_size)
            .enumerate()
            .map(|(i, chunk)| Prompt {
                system: system.to_string(),
                items: chunk.to_vec(),
                batch_number: i + 1,
            })
            .collect()
    }

    /// Evaluate `prompts` sequentially with pacing between requests.
    ///
    /// Cancellation is checked before each batch; a cancelled evaluation
    /// returns the batches completed so far with `cancelled` set.
    pub async fn evaluate(
        &self,
        prompts: &[Prompt],
        ctx: &ProbeContext,
    ) -> Result<Evaluation, AssessmentError> {
        let mut evaluation = Evaluation::default();
        for (i, prompt) in prompts.iter().enumerate() {
            if i > 0 && !self.pacing.is_zero() {
                tokio::time::sleep(self.pacing).await;
            }
            if ctx.cancel.is_cancelled() {
                log::info!(
                    "evaluation cancelled after {} of {} batches",
                    i,
                    prompts.len()
                );
                evaluation.cancelled = true;
                return Ok(evaluation);
            }
            evaluation.batches.push(self.evaluate_batch(prompt, ctx).await?);
        }
        Ok(evaluation)
    }

    /// Send one prompt and parse its answers. Unparsable items default to
    /// neutral; only availability failures are errors.
    pub async fn evaluate_batch(
        &self,
        prompt: &Prompt,
        ctx: &ProbeContext,
    ) -> Result<BatchAnswers, AssessmentError> {
        let mut request = CompletionRequest::new(prompt.system.clone(), prompt.render_user())
            .with_max_tokens(self.token_allowance());
        if !self.llm.is_reasoning_model() {
            request = request.with_temperature(self.temperature);
        }

        let (completion, attempts) = self.complete_with_retry(&request, ctx).await?;
        let answers = parse_answers(&completion.text, prompt.items.len());

        let mut defaulted = 0;
        for (item, answer) in prompt.items.iter().zip(&answers) {
            if answer.low_confidence() {
                defaulted += 1;
                match &answer.raw {
                    Some(raw) => log::warn!(
                        "item {} defaulted to neutral: unrecognised answer '{}'",
                        item.id,
                        truncate_chars(raw, 40)
                    ),
                    None => log::warn!("item {} defaulted to neutral: no answer in response", item.id),
                }
            }
        }
        if defaulted > 0 {
            self.usage.lock().defaulted_answers += defaulted as i64;
        }

        Ok(BatchAnswers {
            answers,
            raw_text: completion.text,
            partial_failure: defaulted > 0,
            attempts,
        })
    }

    /// Send `request` under the shared ceiling, retrying retryable failures.
    async fn complete_with_retry(
        &self,
        request: &CompletionRequest,
        ctx: &ProbeContext,
    ) -> Result<(Completion, u32), AssessmentError> {
        let max_attempts = self.retry.max_attempts();
        let mut last_error: Option<LLMError> = None;

        for attempt in 1..=max_attempts {
            let result = {
                let _slot = ctx.ceiling.acquire().await;
                match tokio::time::timeout(self.request_timeout, self.llm.complete(request)).await {
                    Ok(result) => result,
                    Err(_) => Err(LLMError::Timeout(self.request_timeout)),
                }
            };

            match result {
                Ok(completion) => {
                    self.record_success(&completion);
                    return Ok((completion, attempt));
                }
                Err(e) if !e.is_retryable() => {
                    log::warn!("reasoning request failed permanently: {}", e);
                    return Err(AssessmentError::Service(e.to_string()));
                }
                Err(e) => {
                    if attempt < max_attempts {
                        let delay = self.retry.delay_for(attempt, e.retry_after());
                        log::warn!(
                            "reasoning request failed (attempt {}/{}): {}; retrying in {:?}",
                            attempt,
                            max_attempts,
                            e,
                            delay
                        );
                        self.usage.lock().retried_requests += 1;
                        tokio::time::sleep(delay).await;
                    }
                    last_error = Some(e);
                }
            }
        }

        Err(AssessmentError::RateLimited {
            attempts: max_attempts,
            last_error: last_error.map(|e| e.to_string()).unwrap_or_default(),
        })
    }

    fn record_success(&self, completion: &Completion) {
        let mut usage = self.usage.lock();
        usage.successful_requests += 1;
        if let Some(tokens) = completion.usage {
            usage.prompt_tokens += tokens.prompt_tokens;
            usage.completion_tokens += tokens.completion_tokens;
            usage.total_tokens += tokens.total();
        }
    }
}
