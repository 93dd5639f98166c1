use std::collections::HashMap;

use anyhow::Context;
use async_trait::async_trait;
use reqwest::Client;
use serde_json::{Value, json};
use tracing::info;

use common::config::RapidApiSettings;

use crate::normalize::normalize_idea_text;
use crate::providers::SignalProvider;

const MAX_IDEA_TEXT: usize = 1500;

/// Recent community trade ideas for BTCUSDT, deduplicated by title.
pub struct TradingViewIdeasProvider {
    client: Client,
    settings: RapidApiSettings,
}

impl TradingViewIdeasProvider {
    pub fn new(client: Client, settings: RapidApiSettings) -> Self {
        Self { client, settings }
    }
}

#[async_trait]
impl SignalProvider for TradingViewIdeasProvider {
    fn name(&self) -> &'static str {
        "tradingview-ideas"
    }

    async fn fetch(&self) -> anyhow::Result<Value> {
        let url = format!(
            "https://{}/ideas/list?page=1&per_page=20&sort=recent&market=bitcoin&stock_country=us&symbol=BTCUSDT&locale=en",
            self.settings.host
        );
        let raw: Value = self
            .client
            .get(&url)
            .header("x-rapidapi-key", &self.settings.key)
            .header("x-rapidapi-host", &self.settings.host)
            .send()
            .await
            .context("tradingview ideas request failed")?
            .json()
            .await
            .context("tradingview ideas response was not JSON")?;

        let normalized = normalize_ideas(&raw);
        info!(
            ideas = normalized.as_array().map_or(0, Vec::len),
            "processed unique tradingview ideas"
        );
        Ok(normalized)
    }
}

/// Produces `[timestamp, likes, title, description]` rows. Duplicate titles
/// keep only the newest entry.
fn normalize_ideas(raw: &Value) -> Value {
    let mut unique: HashMap<String, (i64, Value)> = HashMap::new();

    for result in raw["results"].as_array().into_iter().flatten() {
        let Some(title) = result["name"].as_str().map(str::trim) else {
            continue;
        };
        let timestamp = result["date_timestamp"].as_i64().unwrap_or(0);
        let likes = result["likes_count"].as_i64().unwrap_or(0);
        let description = result["description"].as_str().unwrap_or("").trim();

        let row = json!([
            timestamp,
            likes,
            normalize_idea_text(title, MAX_IDEA_TEXT),
            normalize_idea_text(description, MAX_IDEA_TEXT),
        ]);

        match unique.get(title) {
            Some((existing, _)) if *existing >= timestamp => {}
            _ => {
                unique.insert(title.to_string(), (timestamp, row));
            }
        }
    }

    let mut rows: Vec<(i64, Value)> = unique.into_values().collect();
    rows.sort_by_key(|(timestamp, _)| std::cmp::Reverse(*timestamp));
    Value::Array(rows.into_iter().map(|(_, row)| row).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dedups_by_title_keeping_newest() {
        let raw = json!({"results": [
            {"name": "BTC wedge", "date_timestamp": 100, "likes_count": 5, "description": "old"},
            {"name": "BTC wedge", "date_timestamp": 200, "likes_count": 9, "description": "new"},
            {"name": "Short setup", "date_timestamp": 150, "likes_count": 1, "description": "desc"},
        ]});
        let rows = normalize_ideas(&raw);
        let rows = rows.as_array().unwrap();
        assert_eq!(rows.len(), 2);
        // Newest first.
        assert_eq!(rows[0][0], 200);
        assert_eq!(rows[0][3], "new");
        assert_eq!(rows[1][0], 150);
    }

    #[test]
    fn missing_results_yield_empty_array() {
        assert_eq!(normalize_ideas(&json!({})), json!([]));
    }
}
