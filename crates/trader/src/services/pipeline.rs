use std::sync::Arc;

use tracing::{error, info, Instrument};
use uuid::Uuid;

use common::error::PipelineError;
use common::models::{ChartImage, DecisionRecord};
use common::traits::{DecisionStore, Notifier};
use signals::SignalAggregator;

use crate::services::execution_service::ExecutionService;
use crate::services::synthesizer::DecisionSynthesizer;

/// One full trading cycle: aggregate, synthesize, execute, persist, notify.
/// A cycle either completes all five stages or stops at the first fatal
/// stage; either way exactly one notification goes out.
pub struct TradingPipeline {
    aggregator: SignalAggregator,
    synthesizer: DecisionSynthesizer,
    execution: ExecutionService,
    store: Arc<dyn DecisionStore>,
    notifier: Arc<dyn Notifier>,
}

impl TradingPipeline {
    pub fn new(
        aggregator: SignalAggregator,
        synthesizer: DecisionSynthesizer,
        execution: ExecutionService,
        store: Arc<dyn DecisionStore>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            aggregator,
            synthesizer,
            execution,
            store,
            notifier,
        }
    }

    pub async fn run_cycle(&self) {
        let cycle = Uuid::new_v4();
        let span = tracing::info_span!("cycle", id = %cycle);
        async {
            info!("starting trading cycle");
            match self.run_inner().await {
                Ok((record, images)) => {
                    info!(
                        action = record.decision.action.as_str(),
                        status = %record.execution.status,
                        "trading cycle complete"
                    );
                    self.notifier.notify_success(&record, &images).await;
                }
                Err(e) => {
                    error!(stage = e.stage(), error = %e, "trading cycle failed");
                    self.notifier.notify_failure(e.stage(), &e.to_string()).await;
                }
            }
        }
        .instrument(span)
        .await
    }

    async fn run_inner(&self) -> Result<(DecisionRecord, Vec<ChartImage>), PipelineError> {
        let bundle = self.aggregator.aggregate().await?;
        let outcome = self.synthesizer.synthesize(&bundle).await?;
        let execution = self
            .execution
            .execute(outcome.decision.action, &bundle.account)
            .await?;

        let record = DecisionRecord::new(outcome.decision, execution);
        self.store
            .append(&record)
            .await
            .map_err(|e| PipelineError::Persistence(e.to_string()))?;

        Ok((record, bundle.chart_images))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use async_trait::async_trait;
    use serde_json::{json, Value};

    use common::error::{ExchangeError, StoreError};
    use common::models::{
        AccountState, ActionKind, ChartSpec, ExecutionStatus, OrderAck, OrderIntent, PositionSide,
    };
    use common::traits::{ChartSource, ExchangeApi};
    use signals::providers::SignalProvider;
    use signals::ChartCaptureService;

    use crate::remote::{ReasoningClient, ReasoningError, ReasoningReply, ReasoningRequest};

    use super::*;

    struct ScriptedReasoning {
        content: String,
    }

    #[async_trait]
    impl ReasoningClient for ScriptedReasoning {
        async fn complete(
            &self,
            _request: &ReasoningRequest,
        ) -> Result<ReasoningReply, ReasoningError> {
            Ok(ReasoningReply {
                content: self.content.clone(),
                total_tokens: 42,
            })
        }
    }

    struct StaticProvider(&'static str);

    #[async_trait]
    impl SignalProvider for StaticProvider {
        fn name(&self) -> &'static str {
            self.0
        }

        async fn fetch(&self) -> anyhow::Result<Value> {
            Ok(json!([]))
        }
    }

    #[derive(Default)]
    struct RecordingExchange {
        orders: Mutex<Vec<OrderIntent>>,
    }

    #[async_trait]
    impl ExchangeApi for RecordingExchange {
        async fn account_state(&self) -> Result<AccountState, ExchangeError> {
            Ok(AccountState {
                side: PositionSide::Flat,
                size: 0.0,
                leverage: 3.0,
                equity: 10_000.0,
                mark_price: 60_000.0,
            })
        }

        async fn set_leverage(&self, _leverage: f64) -> Result<(), ExchangeError> {
            Ok(())
        }

        async fn place_order(&self, intent: &OrderIntent) -> Result<OrderAck, ExchangeError> {
            self.orders.lock().unwrap().push(intent.clone());
            Ok(OrderAck {
                order_id: "order-1".into(),
            })
        }
    }

    #[derive(Default)]
    struct RecordingStore {
        fail: bool,
        appended: Mutex<Vec<DecisionRecord>>,
    }

    #[async_trait]
    impl DecisionStore for RecordingStore {
        async fn append(&self, record: &DecisionRecord) -> Result<(), StoreError> {
            if self.fail {
                return Err(StoreError::Database("disk I/O error".into()));
            }
            self.appended.lock().unwrap().push(record.clone());
            Ok(())
        }

        async fn recent(&self, _limit: i64) -> Result<Vec<DecisionRecord>, StoreError> {
            Ok(Vec::new())
        }
    }

    #[derive(Default)]
    struct RecordingNotifier {
        successes: Mutex<Vec<DecisionRecord>>,
        failures: Mutex<Vec<(String, String)>>,
    }

    #[async_trait]
    impl Notifier for RecordingNotifier {
        async fn notify_success(&self, record: &DecisionRecord, _images: &[ChartImage]) {
            self.successes.lock().unwrap().push(record.clone());
        }

        async fn notify_failure(&self, stage: &str, detail: &str) {
            self.failures
                .lock()
                .unwrap()
                .push((stage.to_string(), detail.to_string()));
        }
    }

    struct OkChartSource;

    #[async_trait]
    impl ChartSource for OkChartSource {
        async fn capture(&self, _chart: &ChartSpec) -> anyhow::Result<Option<String>> {
            Ok(Some("cGluZw==".to_string()))
        }
    }

    fn stay_out_reply() -> String {
        json!({
            "action": "Stay Out of the Market",
            "rationale": {
                "technical_analysis": "chop",
                "news_impact": "none",
                "market_sentiment": "neutral",
                "conclusion": "wait"
            },
            "confidence_score": 0.6
        })
        .to_string()
    }

    fn pipeline(
        reply: String,
        store: Arc<RecordingStore>,
        notifier: Arc<RecordingNotifier>,
        exchange: Arc<RecordingExchange>,
    ) -> TradingPipeline {
        let provider = |name| -> Arc<dyn SignalProvider> { Arc::new(StaticProvider(name)) };
        let aggregator = SignalAggregator::new(
            provider("crypto-news"),
            provider("tradingview-ideas"),
            provider("tradingview-news"),
            provider("fear-and-greed"),
            store.clone(),
            exchange.clone(),
            ChartCaptureService::new(
                Arc::new(OkChartSource),
                vec![ChartSpec {
                    url: "https://example.com/chart".into(),
                    name: "daily".into(),
                }],
            ),
        );
        TradingPipeline::new(
            aggregator,
            DecisionSynthesizer::new(Arc::new(ScriptedReasoning { content: reply })),
            ExecutionService::new(exchange),
            store,
            notifier,
        )
    }

    #[tokio::test(start_paused = true)]
    async fn stay_out_cycle_persists_and_notifies_once() {
        let store = Arc::new(RecordingStore::default());
        let notifier = Arc::new(RecordingNotifier::default());
        let exchange = Arc::new(RecordingExchange::default());
        pipeline(stay_out_reply(), store.clone(), notifier.clone(), exchange.clone())
            .run_cycle()
            .await;

        let appended = store.appended.lock().unwrap();
        assert_eq!(appended.len(), 1);
        assert_eq!(appended[0].decision.action, ActionKind::StayOut);
        assert_eq!(appended[0].execution.status, ExecutionStatus::Skipped);
        assert!(exchange.orders.lock().unwrap().is_empty());
        assert_eq!(notifier.successes.lock().unwrap().len(), 1);
        assert!(notifier.failures.lock().unwrap().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn open_cycle_records_order_ids() {
        let store = Arc::new(RecordingStore::default());
        let notifier = Arc::new(RecordingNotifier::default());
        let exchange = Arc::new(RecordingExchange::default());
        let mut reply: Value = serde_json::from_str(&stay_out_reply()).unwrap();
        reply["action"] = json!("Open Long");
        pipeline(reply.to_string(), store.clone(), notifier.clone(), exchange.clone())
            .run_cycle()
            .await;

        let appended = store.appended.lock().unwrap();
        assert_eq!(appended[0].execution.status, ExecutionStatus::Executed);
        assert_eq!(appended[0].execution.order_ids, vec!["order-1"]);
        assert_eq!(exchange.orders.lock().unwrap().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn malformed_reply_notifies_failure_and_persists_nothing() {
        let store = Arc::new(RecordingStore::default());
        let notifier = Arc::new(RecordingNotifier::default());
        let exchange = Arc::new(RecordingExchange::default());
        pipeline(
            "buy the dip".into(),
            store.clone(),
            notifier.clone(),
            exchange.clone(),
        )
        .run_cycle()
        .await;

        assert!(store.appended.lock().unwrap().is_empty());
        assert!(exchange.orders.lock().unwrap().is_empty());
        assert!(notifier.successes.lock().unwrap().is_empty());
        let failures = notifier.failures.lock().unwrap();
        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].0, "synthesis");
    }

    #[tokio::test(start_paused = true)]
    async fn persistence_failure_notifies_failure_not_success() {
        let store = Arc::new(RecordingStore {
            fail: true,
            ..Default::default()
        });
        let notifier = Arc::new(RecordingNotifier::default());
        let exchange = Arc::new(RecordingExchange::default());
        pipeline(stay_out_reply(), store, notifier.clone(), exchange)
            .run_cycle()
            .await;

        assert!(notifier.successes.lock().unwrap().is_empty());
        let failures = notifier.failures.lock().unwrap();
        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].0, "persistence");
    }
}
