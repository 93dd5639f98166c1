mod remote;
mod scheduler;
mod services;

use std::sync::Arc;

use anyhow::Context;
use tracing::info;

use common::config::Settings;
use common::logger::setup_logger;
use common::traits::{DecisionStore, ExchangeApi, Notifier};
use exchange::BybitClient;
use signals::providers::{
    CryptoNewsProvider, FearGreedProvider, SignalProvider, TradingViewIdeasProvider,
    TradingViewNewsProvider,
};
use signals::{ChartCaptureService, ScreenshotServiceCapture, SignalAggregator, default_charts};
use storage::DecisionsRepository;

use crate::remote::OpenAiClient;
use crate::scheduler::Scheduler;
use crate::services::execution_service::ExecutionService;
use crate::services::notify::{DiscordNotifier, NotificationService, TelegramNotifier};
use crate::services::pipeline::TradingPipeline;
use crate::services::synthesizer::DecisionSynthesizer;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    setup_logger();

    let settings = Settings::from_env().context("invalid configuration")?;
    info!(symbol = %settings.bybit.symbol, testnet = settings.bybit.testnet, "starting trading bot");

    let pool = storage::db::connect(&settings.db_path)
        .await
        .context("failed to open decision database")?;
    let store: Arc<dyn DecisionStore> = Arc::new(DecisionsRepository::new(pool));

    let http = reqwest::Client::new();
    let exchange: Arc<dyn ExchangeApi> = Arc::new(BybitClient::new(&settings.bybit));

    let news: Arc<dyn SignalProvider> = Arc::new(CryptoNewsProvider::new(
        http.clone(),
        settings.news_api.clone(),
    ));
    let ideas: Arc<dyn SignalProvider> = Arc::new(TradingViewIdeasProvider::new(
        http.clone(),
        settings.tradingview_api.clone(),
    ));
    let overall_news: Arc<dyn SignalProvider> = Arc::new(TradingViewNewsProvider::new(
        http.clone(),
        settings.tradingview_api.clone(),
    ));
    let sentiment: Arc<dyn SignalProvider> = Arc::new(FearGreedProvider::new(http.clone()));
    let charts = ChartCaptureService::new(
        Arc::new(ScreenshotServiceCapture::new(
            http.clone(),
            settings.chart_capture_url.clone(),
        )),
        default_charts(),
    );
    let aggregator = SignalAggregator::new(
        news,
        ideas,
        overall_news,
        sentiment,
        store.clone(),
        exchange.clone(),
        charts,
    );

    let synthesizer = DecisionSynthesizer::new(Arc::new(OpenAiClient::new(
        http.clone(),
        settings.reasoning.clone(),
    )));
    let execution = ExecutionService::new(exchange);

    let notifier: Arc<dyn Notifier> = Arc::new(NotificationService::new(
        DiscordNotifier::new(http, settings.discord_webhook_url.clone()),
        settings.telegram.as_ref().map(TelegramNotifier::new),
    ));

    let pipeline = TradingPipeline::new(aggregator, synthesizer, execution, store, notifier);
    Scheduler::new(pipeline, settings.trade_times).run().await;
    Ok(())
}
