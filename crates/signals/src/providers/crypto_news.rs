use anyhow::Context;
use async_trait::async_trait;
use chrono::DateTime;
use reqwest::Client;
use serde_json::{Value, json};
use tracing::info;

use common::config::RapidApiSettings;

use crate::normalize::clean_article_text;
use crate::providers::SignalProvider;

/// Coindesk articles from the last 24 hours, via the RapidAPI news gateway.
pub struct CryptoNewsProvider {
    client: Client,
    settings: RapidApiSettings,
}

impl CryptoNewsProvider {
    pub fn new(client: Client, settings: RapidApiSettings) -> Self {
        Self { client, settings }
    }
}

#[async_trait]
impl SignalProvider for CryptoNewsProvider {
    fn name(&self) -> &'static str {
        "crypto-news"
    }

    async fn fetch(&self) -> anyhow::Result<Value> {
        let url = format!(
            "https://{}/api/v1/crypto/articles?page=1&limit=50&time_frame=24h&format=json&source=coindesk",
            self.settings.host
        );
        let raw: Value = self
            .client
            .get(&url)
            .header("x-rapidapi-key", &self.settings.key)
            .header("x-rapidapi-host", &self.settings.host)
            .send()
            .await
            .context("crypto news request failed")?
            .json()
            .await
            .context("crypto news response was not JSON")?;

        let normalized = normalize_articles(&raw);
        info!(
            articles = normalized.as_array().map_or(0, Vec::len),
            "processed crypto news articles"
        );
        if normalized.as_array().is_some_and(Vec::is_empty) {
            return Ok(json!("No coindesk newspaper articles in the last 24 hours."));
        }
        Ok(normalized)
    }
}

/// Keeps `[timestamp, title, summary]` triples; articles without a parseable
/// publication time are skipped.
fn normalize_articles(raw: &Value) -> Value {
    let mut out = Vec::new();
    for article in raw.as_array().into_iter().flatten() {
        let title = article["title"].as_str().map(clean_article_text);
        let summary = article["summary"]
            .as_str()
            .map(clean_article_text)
            .unwrap_or_default();
        let timestamp = article["published"]
            .as_str()
            .and_then(|p| DateTime::parse_from_rfc3339(p).ok())
            .map(|dt| dt.timestamp());

        if let (Some(title), Some(timestamp)) = (title, timestamp)
            && !title.is_empty()
        {
            out.push(json!([timestamp, title, summary]));
        }
    }
    Value::Array(out)
}
