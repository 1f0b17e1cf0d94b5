//! Administers the inventory through the reasoning client in baseline and
//! induced mode.

use std::sync::Arc;

use super::inventory::Inventory;
use super::result::{AssessmentMode, AssessmentResult, ItemResponse, ModeAssessment};
use crate::context::ProbeContext;
use crate::evidence::EvidenceSet;
use crate::persona::CalibrationDirective;
use crate::reasoning::ReasoningClient;
use crate::utilities::errors::AssessmentError;

/// Instructions shared by both modes.
pub const INVENTORY_SYSTEM_PROMPT: &str = "You are completing a standardized personality inventory. \
Answer honestly in first person.\n\nOutput format: For each question, respond with only the letter \
(A/B/C/D/E) where:\nA=Very Accurate, B=Accurate, C=Neither, D=Inaccurate, E=Very Inaccurate";

/// Characters kept from each evidence unit in induced prompts.
const EVIDENCE_CHARS_PER_UNIT: usize = 280;

/// The prompt context of one assessment. Built from the mode tag alone, so
/// a baseline context cannot carry evidence.
#[derive(Debug, Clone, PartialEq)]
pub enum PromptContext {
    Baseline,
    Induced { persona: String },
}

impl PromptContext {
    pub fn baseline() -> Self {
        Self::Baseline
    }

    pub fn induced(directive: &CalibrationDirective, evidence: &EvidenceSet) -> Self {
        let persona = format!(
            "You are the author of the messages below. Answer every statement as that person \
             would, judging from how they actually write rather than from any single message.\n\n\
             {}\n\nREPRESENTATIVE MESSAGES ({} of the author's {} messages):\n{}",
            directive.render(),
            evidence.len(),
            directive.channel(),
            evidence.render_condensed(EVIDENCE_CHARS_PER_UNIT)
        );
        Self::Induced { persona }
    }

    pub fn mode(&self) -> AssessmentMode {
        match self {
            Self::Baseline => AssessmentMode::Baseline,
            Self::Induced { .. } => AssessmentMode::Induced,
        }
    }

    pub fn system_prompt(&self) -> String {
        match self {
            Self::Baseline => INVENTORY_SYSTEM_PROMPT.to_string(),
            Self::Induced { persona } => format!("{}\n\n{}", persona, INVENTORY_SYSTEM_PROMPT),
        }
    }
}

#[derive(Debug, Clone)]
pub struct TraitAssessmentEngine {
    client: Arc<ReasoningClient>,
    inventory: Arc<Inventory>,
    best_effort_partial: bool,
}

impl TraitAssessmentEngine {
    pub fn new(client: Arc<ReasoningClient>, inventory: Arc<Inventory>) -> Self {
        Self {
            client,
            inventory,
            best_effort_partial: false,
        }
    }

    /// Score completed batches when cancelled instead of failing.
    pub fn with_best_effort_partial(mut self, enabled: bool) -> Self {
        self.best_effort_partial = enabled;
        self
    }

    pub fn inventory(&self) -> &Inventory {
        &self.inventory
    }

    /// Administer the inventory once in `mode`. Baseline mode ignores
    /// `evidence` and `directive`.
    pub async fn assess(
        &self,
        evidence: &EvidenceSet,
        directive: &CalibrationDirective,
        mode: AssessmentMode,
        ctx: &ProbeContext,
    ) -> Result<ModeAssessment, AssessmentError> {
        let context = match mode {
            AssessmentMode::Baseline => PromptContext::baseline(),
            AssessmentMode::Induced => PromptContext::induced(directive, evidence),
        };
        self.administer(&context, ctx).await
    }

    /// One run: a baseline assessment followed by an induced one, each with
    /// its own prompt context.
    pub async fn run(
        &self,
        evidence: &EvidenceSet,
        directive: &CalibrationDirective,
        ctx: &ProbeContext,
    ) -> Result<AssessmentResult, AssessmentError> {
        let baseline = self
            .assess(evidence, directive, AssessmentMode::Baseline, ctx)
            .await?;
        let induced = self
            .assess(evidence, directive, AssessmentMode::Induced, ctx)
            .await?;
        Ok(AssessmentResult::new(directive.channel(), baseline, induced))
    }

    async fn administer(
        &self,
        context: &PromptContext,
        ctx: &ProbeContext,
    ) -> Result<ModeAssessment, AssessmentError> {
        let mode = context.mode();
        let prompts = self
            .client
            .build_prompts(&context.system_prompt(), &self.inventory.prompt_items());
        let evaluation = self.client.evaluate(&prompts, ctx).await?;

        let completed = evaluation.batches.len();
        if evaluation.cancelled && (!self.best_effort_partial || completed == 0) {
            log::info!("{} assessment cancelled after {} batches", mode, completed);
            return Err(AssessmentError::Cancelled {
                completed_batches: completed,
            });
        }

        let responses: Vec<ItemResponse> = self
            .inventory
            .items()
            .iter()
            .zip(evaluation.answers())
            .map(|(item, answer)| ItemResponse {
                item_id: item.id.clone(),
                dimension: item.dimension,
                reverse: item.reverse,
                raw: answer.raw.clone(),
                value: answer.value,
                scored: item.score(answer.value),
                source: answer.source,
            })
            .collect();
        let raw_batches = evaluation.batches.into_iter().map(|b| b.raw_text).collect();

        let assessment =
            ModeAssessment::from_responses(mode, responses, raw_batches, evaluation.cancelled);
        log::debug!(
            "{} assessment scored {} items ({} defaulted){}",
            mode,
            assessment.responses.len(),
            assessment.defaulted_count(),
            if assessment.partial { ", partial" } else { "" }
        );
        Ok(assessment)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;

    use crate::assessment::inventory::InventoryItem;
    use crate::context::CancelFlag;
    use crate::evidence::ScoredUnit;
    use crate::llms::base_llm::{BaseLLM, Completion, CompletionRequest};
    use crate::llms::testing::{numbered_items, Fallback, ScriptedLLM};
    use crate::persona::PersonaCalibrator;
    use crate::types::{ChannelKind, TextUnit, TraitDimension, TraitVector};
    use crate::utilities::config::ReasoningConfig;
    use crate::utilities::errors::LLMError;

    const MARKER: &str = "zyxquorum";

    fn evidence() -> EvidenceSet {
        let unit = ScoredUnit::new(
            TextUnit::new(
                format!("{} trip with friends was amazing, so curious about the caves", MARKER),
                ChannelKind::BroadcastPublic,
            ),
            TraitVector::new([0.5, 0.0, 0.6, 0.0, 0.0]),
            0.0,
        );
        EvidenceSet::new(ChannelKind::BroadcastPublic, vec![unit], 1, 0)
    }

    fn directive(evidence: &EvidenceSet) -> CalibrationDirective {
        PersonaCalibrator::default()
            .calibrate(evidence, ChannelKind::BroadcastPublic)
            .unwrap()
    }

    fn engine(llm: Arc<dyn BaseLLM>, inventory: Inventory) -> TraitAssessmentEngine {
        let config = ReasoningConfig {
            pacing_ms: 0,
            ..ReasoningConfig::default()
        };
        let client = Arc::new(ReasoningClient::new(llm, &config));
        TraitAssessmentEngine::new(client, Arc::new(inventory))
    }

    fn small_inventory() -> Inventory {
        let items = TraitDimension::ALL
            .iter()
            .flat_map(|d| {
                [
                    InventoryItem::new(&format!("{}1", d.letter()), &format!("High {}.", d), *d, false),
                    InventoryItem::new(&format!("{}2", d.letter()), &format!("Low {}.", d), *d, true),
                ]
            })
            .collect();
        Inventory::new(items)
    }

    fn agree_high_disagree_low(text: &str) -> char {
        if text.starts_with("Low") {
            'E'
        } else {
            'A'
        }
    }

    #[tokio::test]
    async fn test_baseline_prompt_never_carries_evidence() {
        let llm = Arc::new(ScriptedLLM::uniform('C'));
        let engine = engine(llm.clone(), Inventory::default());
        let ev = evidence();
        let dir = directive(&ev);
        let ctx = ProbeContext::with_max_concurrency(1);

        engine.assess(&ev, &dir, AssessmentMode::Baseline, &ctx).await.unwrap();
        let baseline_requests = llm.requests();
        assert_eq!(baseline_requests.len(), 2);
        for req in &baseline_requests {
            assert_eq!(req.system, INVENTORY_SYSTEM_PROMPT);
            assert!(!req.system.contains(MARKER) && !req.user.contains(MARKER));
            assert!(!req.system.contains("CHANNEL CALIBRATION"));
        }

        engine.assess(&ev, &dir, AssessmentMode::Induced, &ctx).await.unwrap();
        let induced = &llm.requests()[2];
        assert!(induced.system.contains(MARKER));
        assert!(induced.system.contains("CHANNEL CALIBRATION"));
        assert!(induced.system.ends_with(INVENTORY_SYSTEM_PROMPT));
    }

    #[tokio::test]
    async fn test_reverse_items_are_inverted_before_averaging() {
        let llm = Arc::new(ScriptedLLM::new(Fallback::ByItem(agree_high_disagree_low)));
        let engine = engine(llm, small_inventory());
        let ev = evidence();
        let ctx = ProbeContext::with_max_concurrency(1);
        let m = engine
            .assess(&ev, &directive(&ev), AssessmentMode::Induced, &ctx)
            .await
            .unwrap();
        assert_eq!(m.scores, TraitVector::splat(5.0));
        assert_eq!(m.item_dispersion, TraitVector::zero());
        assert_eq!(m.responses.len(), 10);
        let low = m.responses.iter().find(|r| r.item_id == "O2").unwrap();
        assert_eq!((low.value, low.scored), (1, 5.0));
    }

    #[tokio::test]
    async fn test_run_produces_both_modes() {
        let llm = Arc::new(ScriptedLLM::uniform('C'));
        let engine = engine(llm.clone(), Inventory::default());
        let ev = evidence();
        let ctx = ProbeContext::with_max_concurrency(1);
        let result = engine.run(&ev, &directive(&ev), &ctx).await.unwrap();
        assert_eq!(result.channel, ChannelKind::BroadcastPublic);
        assert_eq!(result.baseline.mode, AssessmentMode::Baseline);
        assert_eq!(result.induced.mode, AssessmentMode::Induced);
        assert_eq!(result.baseline_scores(), TraitVector::neutral());
        assert_eq!(result.induced.responses.len(), 60);
        assert_eq!(result.induced.raw_batches.len(), 2);
        assert_eq!(llm.calls(), 4);
    }

    #[tokio::test]
    async fn test_malformed_answers_are_neutral_and_counted() {
        let mut letters = vec!["A"; 30];
        for i in [2, 8, 14, 20, 26] {
            letters[i] = "?";
        }
        let llm = Arc::new(ScriptedLLM::uniform('A').with_script([Ok(letters
            .iter()
            .enumerate()
            .map(|(i, l)| format!("{}. {}", i + 1, l))
            .collect::<Vec<_>>()
            .join("\n"))]));
        let engine = engine(llm, Inventory::default());
        let ev = evidence();
        let ctx = ProbeContext::with_max_concurrency(1);
        let m = engine
            .assess(&ev, &directive(&ev), AssessmentMode::Baseline, &ctx)
            .await
            .unwrap();
        assert_eq!(m.responses.len(), 60);
        assert_eq!(m.defaulted_count(), 5);
    }

    #[tokio::test]
    async fn test_cancelled_before_start() {
        let engine = engine(Arc::new(ScriptedLLM::uniform('C')), Inventory::default());
        let ev = evidence();
        let ctx = ProbeContext::with_max_concurrency(1);
        ctx.cancel.cancel();
        let err = engine
            .assess(&ev, &directive(&ev), AssessmentMode::Baseline, &ctx)
            .await
            .unwrap_err();
        assert!(matches!(err, AssessmentError::Cancelled { completed_batches: 0 }));
    }

    /// Answers neutrally and requests cancellation on its first call.
    #[derive(Debug)]
    struct CancellingLLM {
        cancel: CancelFlag,
    }

    #[async_trait]
    impl BaseLLM for CancellingLLM {
        fn model(&self) -> &str {
            "cancelling"
        }

        async fn complete(&self, request: &CompletionRequest) -> Result<Completion, LLMError> {
            self.cancel.cancel();
            let n = numbered_items(&request.user).len();
            Ok(Completion::text(vec!["C"; n].join(" ")))
        }
    }

    #[tokio::test]
    async fn test_cancellation_discards_partial_results_by_default() {
        let ctx = ProbeContext::with_max_concurrency(1);
        let llm = Arc::new(CancellingLLM {
            cancel: ctx.cancel.clone(),
        });
        let engine = engine(llm, Inventory::default());
        let ev = evidence();
        let err = engine
            .assess(&ev, &directive(&ev), AssessmentMode::Baseline, &ctx)
            .await
            .unwrap_err();
        assert!(matches!(err, AssessmentError::Cancelled { completed_batches: 1 }));
    }

    #[tokio::test]
    async fn test_best_effort_partial_scores_completed_batches() {
        let ctx = ProbeContext::with_max_concurrency(1);
        let llm = Arc::new(CancellingLLM {
            cancel: ctx.cancel.clone(),
        });
        let engine = engine(llm, Inventory::default()).with_best_effort_partial(true);
        let ev = evidence();
        let m = engine
            .assess(&ev, &directive(&ev), AssessmentMode::Baseline, &ctx)
            .await
            .unwrap();
        assert!(m.partial);
        assert_eq!(m.responses.len(), 30);
        assert_eq!(m.scores, TraitVector::neutral());
    }
}
