use reqwest::multipart::{Form, Part};
use serde_json::json;
use tracing::info;

use super::{split_message, Attachment};

/// Discord rejects message content above this many characters.
const MAX_MESSAGE_LENGTH: usize = 2000;

pub struct DiscordNotifier {
    client: reqwest::Client,
    webhook_url: String,
}

impl DiscordNotifier {
    pub fn new(client: reqwest::Client, webhook_url: String) -> Self {
        Self {
            client,
            webhook_url,
        }
    }

    /// Text goes out first, chunked to the Discord limit, then the chart
    /// images as one multipart upload.
    pub async fn send(&self, text: &str, attachments: &[Attachment]) -> anyhow::Result<()> {
        for chunk in split_message(text, MAX_MESSAGE_LENGTH) {
            self.post_text(&chunk).await?;
        }
        if !attachments.is_empty() {
            self.post_attachments(attachments).await?;
        }
        info!(attachments = attachments.len(), "Discord notification delivered");
        Ok(())
    }

    async fn post_text(&self, content: &str) -> anyhow::Result<()> {
        self.client
            .post(&self.webhook_url)
            .json(&json!({ "content": content }))
            .send()
            .await?
            .error_for_status()?;
        Ok(())
    }

    async fn post_attachments(&self, attachments: &[Attachment]) -> anyhow::Result<()> {
        let mut form = Form::new().text(
            "payload_json",
            serde_json::to_string(&json!({ "content": "" }))?,
        );
        for (i, attachment) in attachments.iter().enumerate() {
            let part = Part::bytes(attachment.bytes.clone())
                .file_name(attachment.file_name.clone())
                .mime_str("image/png")?;
            form = form.part(format!("file{i}"), part);
        }
        self.client
            .post(&self.webhook_url)
            .multipart(form)
            .send()
            .await?
            .error_for_status()?;
        Ok(())
    }
}
