use async_trait::async_trait;

use crate::error::{ExchangeError, StoreError};
use crate::models::{AccountState, ChartImage, ChartSpec, DecisionRecord, OrderAck, OrderIntent};

/// Read and write operations against the margin venue. Reads are always
/// performed fresh at cycle start; writes happen only inside the execution
/// engine, sequentially.
#[async_trait]
pub trait ExchangeApi: Send + Sync {
    /// Position, equity and mark price combined into one snapshot.
    async fn account_state(&self) -> Result<AccountState, ExchangeError>;

    /// Reconcile account leverage toward the policy target. Failures here
    /// are surfaced to the caller, which may decide to continue anyway.
    async fn set_leverage(&self, leverage: f64) -> Result<(), ExchangeError>;

    /// Submit one market order (good-till-cancel, one-way mode).
    async fn place_order(&self, intent: &OrderIntent) -> Result<OrderAck, ExchangeError>;
}

/// Append-only decision history.
#[async_trait]
pub trait DecisionStore: Send + Sync {
    async fn append(&self, record: &DecisionRecord) -> Result<(), StoreError>;

    /// Most-recent-first.
    async fn recent(&self, limit: i64) -> Result<Vec<DecisionRecord>, StoreError>;
}

/// Chart-image capture collaborator: produces a base64 PNG for one chart, or
/// `None` when the chart could not be rendered. An `Err` means the capture
/// mechanism itself is broken for this attempt and may be retried.
#[async_trait]
pub trait ChartSource: Send + Sync {
    async fn capture(&self, chart: &ChartSpec) -> anyhow::Result<Option<String>>;
}

/// Notification fan-out. Implementations log their own delivery failures;
/// a lost notification never aborts or reverses a cycle.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify_success(&self, record: &DecisionRecord, attachments: &[ChartImage]);

    async fn notify_failure(&self, stage: &str, detail: &str);
}
