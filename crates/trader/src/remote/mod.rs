pub mod openai_client;

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

use common::models::ChartImage;

pub use openai_client::OpenAiClient;

#[derive(Debug, Error)]
pub enum ReasoningError {
    #[error("reasoning transport error: {0}")]
    Transport(String),
    #[error("reasoning service error: {0}")]
    Api(String),
    #[error("reasoning response carried no content")]
    EmptyResponse,
}

/// One structured multi-part request: system instructions, then the chart
/// images inline, then one textual block per signal field.
#[derive(Debug, Clone, PartialEq)]
pub struct ReasoningRequest {
    pub instructions: String,
    pub images: Vec<ChartImage>,
    pub blocks: Vec<Value>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ReasoningReply {
    pub content: String,
    pub total_tokens: u64,
}

/// The generative reasoning collaborator. Called exactly once per cycle.
#[async_trait]
pub trait ReasoningClient: Send + Sync {
    async fn complete(&self, request: &ReasoningRequest) -> Result<ReasoningReply, ReasoningError>;
}
