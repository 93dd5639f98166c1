use anyhow::{Context, bail};
use async_trait::async_trait;
use reqwest::Client;
use serde_json::{Value, json};
use tracing::info;

use crate::providers::SignalProvider;

const FNG_URL: &str = "https://api.alternative.me/fng/";

/// Crypto Fear & Greed index, latest reading only.
pub struct FearGreedProvider {
    client: Client,
}

impl FearGreedProvider {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl SignalProvider for FearGreedProvider {
    fn name(&self) -> &'static str {
        "fear-and-greed"
    }

    async fn fetch(&self) -> anyhow::Result<Value> {
        let raw: Value = self
            .client
            .get(FNG_URL)
            .query(&[("limit", "1"), ("format", "json")])
            .send()
            .await
            .context("fear and greed request failed")?
            .json()
            .await
            .context("fear and greed response was not JSON")?;

        let reading = latest_reading(&raw)?;
        info!("fear and greed index fetched");
        Ok(reading)
    }
}

fn latest_reading(raw: &Value) -> anyhow::Result<Value> {
    let Some(entry) = raw["data"].as_array().and_then(|data| data.first()) else {
        bail!("fear and greed payload has no data entries");
    };
    Ok(json!({
        "timestamp": entry["timestamp"].clone(),
        "value": entry["value"].clone(),
        "value_classification": entry["value_classification"].clone(),
        "time_until_update": entry["time_until_update"].clone(),
    }))
}
