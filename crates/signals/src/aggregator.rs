use std::sync::Arc;

use chrono::Utc;
use serde_json::{Value, json};
use tracing::{info, warn};

use common::error::PipelineError;
use common::models::{ProviderFailure, SignalBundle};
use common::traits::{DecisionStore, ExchangeApi};

use crate::charts::ChartCaptureService;
use crate::providers::SignalProvider;

const PRIOR_DECISION_LIMIT: i64 = 5;

/// Fan-out/fan-in assembly of the per-cycle [`SignalBundle`]. Every source
/// runs concurrently and every task settles before the bundle is built; only
/// chart capture and account status abort the cycle on failure, everything
/// else degrades to a "no data" sentinel.
pub struct SignalAggregator {
    news: Arc<dyn SignalProvider>,
    ideas: Arc<dyn SignalProvider>,
    overall_news: Arc<dyn SignalProvider>,
    sentiment: Arc<dyn SignalProvider>,
    store: Arc<dyn DecisionStore>,
    exchange: Arc<dyn ExchangeApi>,
    charts: ChartCaptureService,
}

impl SignalAggregator {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        news: Arc<dyn SignalProvider>,
        ideas: Arc<dyn SignalProvider>,
        overall_news: Arc<dyn SignalProvider>,
        sentiment: Arc<dyn SignalProvider>,
        store: Arc<dyn DecisionStore>,
        exchange: Arc<dyn ExchangeApi>,
        charts: ChartCaptureService,
    ) -> Self {
        Self {
            news,
            ideas,
            overall_news,
            sentiment,
            store,
            exchange,
            charts,
        }
    }

    pub async fn aggregate(&self) -> Result<SignalBundle, PipelineError> {
        let (news, ideas, overall_news, sentiment, prior, charts, account) = tokio::join!(
            self.news.fetch(),
            self.ideas.fetch(),
            self.overall_news.fetch(),
            self.sentiment.fetch(),
            self.prior_decisions(),
            self.charts.capture_all(),
            self.exchange.account_state(),
        );

        let chart_images = charts.map_err(|e| PipelineError::FatalAggregation {
            stage: "chart-capture",
            detail: e.to_string(),
        })?;
        let account = account.map_err(|e| PipelineError::FatalAggregation {
            stage: "account-status",
            detail: e.to_string(),
        })?;

        let mut degraded = Vec::new();
        let news = degrade(self.news.name(), news, &mut degraded);
        let ideas = degrade(self.ideas.name(), ideas, &mut degraded);
        let overall_news = degrade(self.overall_news.name(), overall_news, &mut degraded);
        let sentiment = degrade(self.sentiment.name(), sentiment, &mut degraded);
        let prior_decisions = degrade("prior-decisions", prior, &mut degraded);

        let account_snapshot = account.prompt_snapshot(Utc::now().timestamp());

        info!(
            degraded = degraded.len(),
            charts = chart_images.len(),
            "signal bundle assembled"
        );
        Ok(SignalBundle {
            prior_decisions,
            news,
            ideas,
            sentiment,
            overall_news,
            chart_images,
            account,
            account_snapshot,
            degraded,
        })
    }

    async fn prior_decisions(&self) -> anyhow::Result<Value> {
        let records = self.store.recent(PRIOR_DECISION_LIMIT).await?;
        if records.is_empty() {
            return Ok(json!("No Recent Trading Decisions found."));
        }
        Ok(Value::Array(
            records.iter().map(|r| r.prompt_view()).collect(),
        ))
    }
}

fn degrade(
    provider: &'static str,
    result: anyhow::Result<Value>,
    degraded: &mut Vec<ProviderFailure>,
) -> Value {
    match result {
        Ok(payload) => payload,
        Err(e) => {
            warn!(provider, error = %e, "signal source degraded, substituting placeholder");
            degraded.push(ProviderFailure {
                provider,
                detail: e.to_string(),
            });
            json!(format!("No {provider} data available this cycle."))
        }
    }
}
