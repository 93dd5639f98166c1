use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::{info, warn};

use common::config::ReasoningSettings;

use crate::remote::{ReasoningClient, ReasoningError, ReasoningReply, ReasoningRequest};

const COMPLETIONS_URL: &str = "https://api.openai.com/v1/chat/completions";

#[derive(Deserialize)]
struct CompletionResponse {
    choices: Vec<Choice>,
    usage: Option<Usage>,
}

#[derive(Deserialize)]
struct Choice {
    message: Message,
}

#[derive(Deserialize)]
struct Message {
    content: Option<String>,
}

#[derive(Deserialize)]
struct Usage {
    total_tokens: u64,
}

/// Chat-completions client, constrained to JSON-object responses.
pub struct OpenAiClient {
    client: Client,
    settings: ReasoningSettings,
}

impl OpenAiClient {
    pub fn new(client: Client, settings: ReasoningSettings) -> Self {
        Self { client, settings }
    }

    fn build_messages(request: &ReasoningRequest) -> Vec<Value> {
        let mut messages = vec![json!({
            "role": "system",
            "content": request.instructions,
        })];

        for chart in &request.images {
            match &chart.image_data {
                Some(image_data) => messages.push(json!({
                    "role": "user",
                    "content": [{
                        "type": "image_url",
                        "image_url": {
                            "url": format!("data:image/png;base64,{image_data}"),
                        },
                    }],
                })),
                None => warn!(chart = %chart.file_name, "image data not available, skipping"),
            }
        }

        for block in &request.blocks {
            messages.push(json!({
                "role": "user",
                "content": block.to_string(),
            }));
        }

        messages
    }
}

#[async_trait]
impl ReasoningClient for OpenAiClient {
    async fn complete(&self, request: &ReasoningRequest) -> Result<ReasoningReply, ReasoningError> {
        let body = json!({
            "model": self.settings.model,
            "messages": Self::build_messages(request),
            "response_format": {"type": "json_object"},
        });

        let resp = self
            .client
            .post(COMPLETIONS_URL)
            .bearer_auth(&self.settings.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| ReasoningError::Transport(e.to_string()))?;

        let status = resp.status();
        let text = resp
            .text()
            .await
            .map_err(|e| ReasoningError::Transport(e.to_string()))?;
        if !status.is_success() {
            return Err(ReasoningError::Api(format!("HTTP {status}: {text}")));
        }

        let parsed: CompletionResponse =
            serde_json::from_str(&text).map_err(|e| ReasoningError::Api(e.to_string()))?;
        let content = parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or(ReasoningError::EmptyResponse)?;
        let total_tokens = parsed.usage.map_or(0, |u| u.total_tokens);

        info!(total_tokens, "reasoning call completed");
        Ok(ReasoningReply {
            content,
            total_tokens,
        })
    }
}
