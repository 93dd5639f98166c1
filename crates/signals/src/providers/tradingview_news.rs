use anyhow::Context;
use async_trait::async_trait;
use reqwest::Client;
use serde_json::{Value, json};
use tracing::info;

use common::config::RapidApiSettings;

use crate::normalize::strip_markup;
use crate::providers::SignalProvider;

/// Broad-market headline feed, used as the "overall news" signal.
pub struct TradingViewNewsProvider {
    client: Client,
    settings: RapidApiSettings,
}

impl TradingViewNewsProvider {
    pub fn new(client: Client, settings: RapidApiSettings) -> Self {
        Self { client, settings }
    }
}

#[async_trait]
impl SignalProvider for TradingViewNewsProvider {
    fn name(&self) -> &'static str {
        "tradingview-news"
    }

    async fn fetch(&self) -> anyhow::Result<Value> {
        let url = format!(
            "https://{}/news/list?page=1&per_page=20&category=base&country=us&locale=en",
            self.settings.host
        );
        let raw: Value = self
            .client
            .get(&url)
            .header("x-rapidapi-key", &self.settings.key)
            .header("x-rapidapi-host", &self.settings.host)
            .send()
            .await
            .context("tradingview news request failed")?
            .json()
            .await
            .context("tradingview news response was not JSON")?;

        let normalized = normalize_headlines(&raw);
        info!(
            headlines = normalized.as_array().map_or(0, Vec::len),
            "processed tradingview news items"
        );
        Ok(normalized)
    }
}

fn normalize_headlines(raw: &Value) -> Value {
    let rows = raw
        .as_array()
        .into_iter()
        .flatten()
        .map(|item| {
            json!([
                item["published"].clone(),
                strip_markup(item["source"].as_str().unwrap_or("")),
                strip_markup(item["title"].as_str().unwrap_or("")),
            ])
        })
        .collect();
    Value::Array(rows)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_markup_from_headlines() {
        let raw = json!([
            {"published": 1725807732, "source": "Reuters", "title": "<b>Stocks</b> slip"},
        ]);
        let rows = normalize_headlines(&raw);
        assert_eq!(rows[0][0], 1725807732);
        assert_eq!(rows[0][2], "Stocks slip");
    }
}
