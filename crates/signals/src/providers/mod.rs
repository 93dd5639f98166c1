pub mod crypto_news;
pub mod fear_greed;
pub mod tradingview_ideas;
pub mod tradingview_news;

use async_trait::async_trait;
use serde_json::Value;

pub use crypto_news::CryptoNewsProvider;
pub use fear_greed::FearGreedProvider;
pub use tradingview_ideas::TradingViewIdeasProvider;
pub use tradingview_news::TradingViewNewsProvider;

/// One independent signal source. Providers return their normalized,
/// prompt-ready payload; failures are reported to the aggregator, which
/// decides whether they degrade or abort the cycle.
#[async_trait]
pub trait SignalProvider: Send + Sync {
    fn name(&self) -> &'static str;

    async fn fetch(&self) -> anyhow::Result<Value>;
}
