use serde_json::Value;

use crate::models::AccountState;

/// A chart to capture, identified by URL and a human-readable name that ends
/// up as the attachment file name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChartSpec {
    pub url: String,
    pub name: String,
}

/// A captured chart. `image_data` is base64-encoded PNG, or `None` when the
/// capture collaborator exhausted its retries for this chart.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChartImage {
    pub file_name: String,
    pub image_data: Option<String>,
}

/// A non-fatal signal source that failed this cycle. Its payload slot in the
/// bundle holds a "no data" sentinel instead.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderFailure {
    pub provider: &'static str,
    pub detail: String,
}

/// Immutable snapshot of every signal gathered for one cycle. Assembled once
/// by the aggregator, then handed to the synthesizer by value.
#[derive(Debug, Clone)]
pub struct SignalBundle {
    pub prior_decisions: Value,
    pub news: Value,
    pub ideas: Value,
    pub sentiment: Value,
    pub overall_news: Value,
    pub chart_images: Vec<ChartImage>,
    pub account: AccountState,
    pub account_snapshot: Value,
    pub degraded: Vec<ProviderFailure>,
}

impl SignalBundle {
    /// Textual prompt blocks, in the order the reasoning service expects
    /// them: history first, account status last.
    pub fn prompt_blocks(&self) -> [(&'static str, &Value); 6] {
        [
            ("prior_decisions", &self.prior_decisions),
            ("crypto_news", &self.news),
            ("tradingview_ideas", &self.ideas),
            ("fear_and_greed", &self.sentiment),
            ("tradingview_news", &self.overall_news),
            ("account_status", &self.account_snapshot),
        ]
    }
}
