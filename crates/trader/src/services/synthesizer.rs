use std::sync::Arc;

use chrono::Utc;
use serde::Deserialize;
use tracing::info;

use common::error::PipelineError;
use common::models::{ActionKind, Decision, PositionSide, Rationale, SignalBundle};

use crate::remote::{ReasoningClient, ReasoningRequest};

/// The reasoning service's response, minus the timestamp the core stamps on.
#[derive(Deserialize)]
struct RawDecision {
    action: String,
    rationale: Rationale,
    confidence_score: f64,
}

#[derive(Debug)]
pub struct SynthesisOutcome {
    pub decision: Decision,
    pub total_tokens: u64,
}

/// Turns one [`SignalBundle`] into one [`Decision`] via a single reasoning
/// call. The instruction template is a pure function of the current position
/// side.
pub struct DecisionSynthesizer {
    reasoning: Arc<dyn ReasoningClient>,
}

impl DecisionSynthesizer {
    pub fn new(reasoning: Arc<dyn ReasoningClient>) -> Self {
        Self { reasoning }
    }

    pub async fn synthesize(&self, bundle: &SignalBundle) -> Result<SynthesisOutcome, PipelineError> {
        let request = build_request(bundle);
        info!(
            images = request.images.len(),
            blocks = request.blocks.len(),
            "requesting trading decision"
        );

        let reply = self
            .reasoning
            .complete(&request)
            .await
            .map_err(|e| PipelineError::Reasoning(e.to_string()))?;

        let decision = parse_decision(&reply.content, Utc::now().timestamp())?;
        info!(
            action = decision.action.as_str(),
            confidence = decision.confidence_score,
            total_tokens = reply.total_tokens,
            "decision synthesized"
        );
        Ok(SynthesisOutcome {
            decision,
            total_tokens: reply.total_tokens,
        })
    }
}

/// Exactly three templates: Long, Short, and Flat (which also covers an
/// unknown side).
pub fn instructions_for(side: PositionSide) -> &'static str {
    match side {
        PositionSide::Long => include_str!("../../instructions/long.md"),
        PositionSide::Short => include_str!("../../instructions/short.md"),
        PositionSide::Flat => include_str!("../../instructions/flat.md"),
    }
}

fn build_request(bundle: &SignalBundle) -> ReasoningRequest {
    ReasoningRequest {
        instructions: instructions_for(bundle.account.side).to_string(),
        images: bundle.chart_images.clone(),
        blocks: bundle
            .prompt_blocks()
            .iter()
            .map(|(_, value)| (*value).clone())
            .collect(),
    }
}

/// The reasoning response is untrusted input: structure, action string and
/// confidence range are all validated before a `Decision` exists.
fn parse_decision(content: &str, timestamp: i64) -> Result<Decision, PipelineError> {
    let raw: RawDecision =
        serde_json::from_str(content).map_err(|e| PipelineError::DecisionParse(e.to_string()))?;

    let action: ActionKind = raw.action.parse()?;

    if !(0.0..=1.0).contains(&raw.confidence_score) {
        return Err(PipelineError::DecisionParse(format!(
            "confidence_score {} outside [0, 1]",
            raw.confidence_score
        )));
    }

    Ok(Decision {
        action,
        rationale: raw.rationale,
        confidence_score: raw.confidence_score,
        timestamp,
    })
}
