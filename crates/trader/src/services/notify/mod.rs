mod discord;
mod telegram;

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use chrono::{DateTime, Utc};
use serde_json::json;
use tracing::{error, warn};

use common::models::{ChartImage, DecisionRecord};
use common::traits::Notifier;

pub use discord::DiscordNotifier;
pub use telegram::TelegramNotifier;

/// A decoded PNG ready to attach to an outbound message.
pub struct Attachment {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

/// Fans one cycle outcome out to Discord and, when configured, Telegram.
/// Delivery failures are logged and swallowed: the cycle already happened
/// and a lost message must not undo or repeat it.
pub struct NotificationService {
    discord: DiscordNotifier,
    telegram: Option<TelegramNotifier>,
}

impl NotificationService {
    pub fn new(discord: DiscordNotifier, telegram: Option<TelegramNotifier>) -> Self {
        Self { discord, telegram }
    }

    async fn fan_out(&self, text: &str, attachments: &[Attachment]) {
        if let Err(e) = self.discord.send(text, attachments).await {
            error!(error = %e, "failed to deliver Discord notification");
        }
        if let Some(telegram) = &self.telegram {
            telegram.send(text, attachments).await;
        }
    }
}

#[async_trait]
impl Notifier for NotificationService {
    async fn notify_success(&self, record: &DecisionRecord, images: &[ChartImage]) {
        let text = format_record(record);
        let attachments = decode_attachments(images);
        self.fan_out(&text, &attachments).await;
    }

    async fn notify_failure(&self, stage: &str, detail: &str) {
        let payload = json!({
            "action": "ERROR",
            "stage": stage,
            "error_details": detail,
            "timestamp": Utc::now().timestamp(),
        });
        let text = format!(
            "**TRADING BOT ERROR**\n```json\n{}\n```",
            serde_json::to_string_pretty(&payload).unwrap_or_else(|_| detail.to_string())
        );
        self.fan_out(&text, &[]).await;
    }
}

fn decode_attachments(images: &[ChartImage]) -> Vec<Attachment> {
    images
        .iter()
        .filter_map(|image| {
            let data = image.image_data.as_ref()?;
            match STANDARD.decode(data) {
                Ok(bytes) => Some(Attachment {
                    file_name: format!("{}.png", image.file_name),
                    bytes,
                }),
                Err(e) => {
                    warn!(chart = %image.file_name, error = %e, "dropping undecodable chart image");
                    None
                }
            }
        })
        .collect()
}

fn format_record(record: &DecisionRecord) -> String {
    let when = DateTime::<Utc>::from_timestamp(record.decision.timestamp, 0)
        .map(|t| t.format("%Y-%m-%d %H:%M UTC").to_string())
        .unwrap_or_else(|| record.decision.timestamp.to_string());
    let rationale = &record.decision.rationale;

    let mut text = format!(
        "**Trading Decision — {when}**\n\
         Action: **{}**\n\
         Confidence: {:.0}%\n\n\
         **Technical Analysis**\n{}\n\n\
         **News Impact**\n{}\n\n\
         **Market Sentiment**\n{}\n\n\
         **Conclusion**\n{}\n\n\
         Execution: {} — {}",
        record.decision.action.as_str().to_uppercase(),
        record.decision.confidence_score * 100.0,
        rationale.technical_analysis,
        rationale.news_impact,
        rationale.market_sentiment,
        rationale.conclusion,
        record.execution.status,
        record.execution.detail,
    );
    if !record.execution.order_ids.is_empty() {
        text.push_str(&format!(
            " (orders: {})",
            record.execution.order_ids.join(", ")
        ));
    }
    text
}

/// Splits `text` into chunks of at most `limit` characters, cutting at the
/// last newline inside each window when one exists.
pub(crate) fn split_message(text: &str, limit: usize) -> Vec<String> {
    let mut chunks = Vec::new();
    let mut rest = text;
    loop {
        let Some((cut, _)) = rest.char_indices().nth(limit) else {
            if !rest.is_empty() {
                chunks.push(rest.to_string());
            }
            break;
        };
        let split_at = match rest[..cut].rfind('\n') {
            Some(i) if i > 0 => i + 1,
            _ => cut,
        };
        chunks.push(rest[..split_at].trim_end().to_string());
        rest = &rest[split_at..];
    }
    chunks
}

#[cfg(test)]
mod tests {
    use common::models::{ActionKind, Decision, ExecutionResult, Rationale};

    use super::*;

    fn record() -> DecisionRecord {
        DecisionRecord::new(
            Decision {
                action: ActionKind::OpenLong,
                rationale: Rationale {
                    technical_analysis: "daily uptrend intact".into(),
                    news_impact: "ETF inflows".into(),
                    market_sentiment: "greed at 72".into(),
                    conclusion: "go long".into(),
                },
                confidence_score: 0.85,
                timestamp: 1_725_807_732,
            },
            ExecutionResult::executed("opened Buy 0.45", vec!["abc123".into()]),
        )
    }

    #[test]
    fn record_message_carries_action_and_execution() {
        let text = format_record(&record());
        assert!(text.contains("OPEN LONG"));
        assert!(text.contains("Confidence: 85%"));
        assert!(text.contains("daily uptrend intact"));
        assert!(text.contains("Executed — opened Buy 0.45"));
        assert!(text.contains("orders: abc123"));
    }

    #[test]
    fn short_message_is_a_single_chunk() {
        let chunks = split_message("hello\nworld", 2000);
        assert_eq!(chunks, vec!["hello\nworld"]);
    }

    #[test]
    fn long_message_splits_at_newlines() {
        let text = format!("{}\n{}", "a".repeat(1500), "b".repeat(1000));
        let chunks = split_message(&text, 2000);
        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0], "a".repeat(1500));
        assert_eq!(chunks[1], "b".repeat(1000));
        assert!(chunks.iter().all(|c| c.chars().count() <= 2000));
    }

    #[test]
    fn unbroken_text_splits_hard_at_the_limit() {
        let chunks = split_message(&"x".repeat(4500), 2000);
        assert_eq!(chunks.len(), 3);
        assert_eq!(chunks[0].len(), 2000);
        assert_eq!(chunks[2].len(), 500);
    }

    #[test]
    fn multibyte_text_never_splits_inside_a_char() {
        let text = "é".repeat(2500);
        let chunks = split_message(&text, 2000);
        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0].chars().count(), 2000);
    }

    #[test]
    fn undecodable_image_is_dropped() {
        let images = vec![
            ChartImage {
                file_name: "daily".into(),
                image_data: Some("cGluZw==".into()),
            },
            ChartImage {
                file_name: "broken".into(),
                image_data: Some("not base64!!".into()),
            },
            ChartImage {
                file_name: "missing".into(),
                image_data: None,
            },
        ];
        let attachments = decode_attachments(&images);
        assert_eq!(attachments.len(), 1);
        assert_eq!(attachments[0].file_name, "daily.png");
        assert_eq!(attachments[0].bytes, b"ping");
    }
}
