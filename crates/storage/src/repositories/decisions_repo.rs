use async_trait::async_trait;
use sqlx::Row;
use sqlx::sqlite::{SqlitePool, SqliteRow};
use tracing::debug;

use common::error::StoreError;
use common::models::{
    ActionKind, Decision, DecisionRecord, ExecutionResult, ExecutionStatus, Rationale,
};
use common::traits::DecisionStore;

/// Append-only store of decisions plus their execution outcomes. Rows are
/// never updated or deleted.
pub struct DecisionsRepository {
    pool: SqlitePool,
}

impl DecisionsRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl DecisionStore for DecisionsRepository {
    async fn append(&self, record: &DecisionRecord) -> Result<(), StoreError> {
        let order_ids = serde_json::to_string(&record.execution.order_ids)
            .map_err(|e| StoreError::Corrupt(e.to_string()))?;

        sqlx::query(
            r#"
                INSERT INTO decisions (
                    timestamp, action,
                    rationale_technical_analysis, rationale_news_impact,
                    rationale_market_sentiment, rationale_conclusion,
                    confidence_score, execution_status, execution_detail, order_ids
                ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(record.decision.timestamp)
        .bind(record.decision.action.as_str())
        .bind(&record.decision.rationale.technical_analysis)
        .bind(&record.decision.rationale.news_impact)
        .bind(&record.decision.rationale.market_sentiment)
        .bind(&record.decision.rationale.conclusion)
        .bind(record.decision.confidence_score)
        .bind(record.execution.status.to_string())
        .bind(&record.execution.detail)
        .bind(order_ids)
        .execute(&self.pool)
        .await
        .map_err(|e| StoreError::Database(e.to_string()))?;

        debug!(
            timestamp = record.decision.timestamp,
            action = record.decision.action.as_str(),
            "decision appended"
        );
        Ok(())
    }

    async fn recent(&self, limit: i64) -> Result<Vec<DecisionRecord>, StoreError> {
        let rows = sqlx::query(
            r#"
                SELECT timestamp, action,
                       rationale_technical_analysis, rationale_news_impact,
                       rationale_market_sentiment, rationale_conclusion,
                       confidence_score, execution_status, execution_detail, order_ids
                FROM decisions
                ORDER BY timestamp DESC
                LIMIT ?
            "#,
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| StoreError::Database(e.to_string()))?;

        rows.iter().map(row_to_record).collect()
    }
}

fn row_to_record(row: &SqliteRow) -> Result<DecisionRecord, StoreError> {
    let get_text = |col: &str| -> Result<String, StoreError> {
        row.try_get::<String, _>(col)
            .map_err(|e| StoreError::Database(e.to_string()))
    };

    let action: ActionKind = get_text("action")?
        .parse()
        .map_err(|_| StoreError::Corrupt("unknown action in decisions table".into()))?;
    let status = match get_text("execution_status")?.as_str() {
        "Executed" => ExecutionStatus::Executed,
        "Skipped" => ExecutionStatus::Skipped,
        "Rejected" => ExecutionStatus::Rejected,
        other => {
            return Err(StoreError::Corrupt(format!(
                "unknown execution status {other:?}"
            )));
        }
    };
    let order_ids: Vec<String> = serde_json::from_str(&get_text("order_ids")?)
        .map_err(|e| StoreError::Corrupt(e.to_string()))?;

    Ok(DecisionRecord {
        decision: Decision {
            action,
            rationale: Rationale {
                technical_analysis: get_text("rationale_technical_analysis")?,
                news_impact: get_text("rationale_news_impact")?,
                market_sentiment: get_text("rationale_market_sentiment")?,
                conclusion: get_text("rationale_conclusion")?,
            },
            confidence_score: row
                .try_get("confidence_score")
                .map_err(|e| StoreError::Database(e.to_string()))?,
            timestamp: row
                .try_get("timestamp")
                .map_err(|e| StoreError::Database(e.to_string()))?,
        },
        execution: ExecutionResult {
            status,
            detail: get_text("execution_detail")?,
            order_ids,
        },
    })
}
