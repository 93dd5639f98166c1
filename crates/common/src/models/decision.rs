use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::PipelineError;

/// The closed set of trading actions the reasoning service may return.
/// Exactly one action per cycle; anything outside this set is fatal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ActionKind {
    OpenLong,
    OpenShort,
    CloseLong,
    CloseShort,
    SwitchToLong,
    SwitchToShort,
    MaintainLong,
    MaintainShort,
    StayOut,
}

impl ActionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ActionKind::OpenLong => "Open Long",
            ActionKind::OpenShort => "Open Short",
            ActionKind::CloseLong => "Close Long",
            ActionKind::CloseShort => "Close Short",
            ActionKind::SwitchToLong => "Switch to Long",
            ActionKind::SwitchToShort => "Switch to Short",
            ActionKind::MaintainLong => "Maintain Long",
            ActionKind::MaintainShort => "Maintain Short",
            ActionKind::StayOut => "Stay Out of the Market",
        }
    }
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ActionKind {
    type Err = PipelineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "Open Long" => Ok(ActionKind::OpenLong),
            "Open Short" => Ok(ActionKind::OpenShort),
            "Close Long" => Ok(ActionKind::CloseLong),
            "Close Short" => Ok(ActionKind::CloseShort),
            "Switch to Long" => Ok(ActionKind::SwitchToLong),
            "Switch to Short" => Ok(ActionKind::SwitchToShort),
            "Maintain Long" => Ok(ActionKind::MaintainLong),
            "Maintain Short" => Ok(ActionKind::MaintainShort),
            "Stay Out of the Market" => Ok(ActionKind::StayOut),
            other => Err(PipelineError::InvalidAction(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rationale {
    pub technical_analysis: String,
    pub news_impact: String,
    pub market_sentiment: String,
    pub conclusion: String,
}

/// Canonical output of the synthesis stage. Immutable once stamped with a
/// timestamp; the execution result is attached afterwards as a
/// [`DecisionRecord`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Decision {
    pub action: ActionKind,
    pub rationale: Rationale,
    pub confidence_score: f64,
    pub timestamp: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExecutionStatus {
    Executed,
    Skipped,
    Rejected,
}

impl fmt::Display for ExecutionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ExecutionStatus::Executed => "Executed",
            ExecutionStatus::Skipped => "Skipped",
            ExecutionStatus::Rejected => "Rejected",
        };
        f.write_str(s)
    }
}

/// Always produced, even for no-op actions: Maintain and StayOut yield
/// `Skipped` with an explanatory detail rather than nothing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionResult {
    pub status: ExecutionStatus,
    pub detail: String,
    pub order_ids: Vec<String>,
}

impl ExecutionResult {
    pub fn executed(detail: impl Into<String>, order_ids: Vec<String>) -> Self {
        Self {
            status: ExecutionStatus::Executed,
            detail: detail.into(),
            order_ids,
        }
    }

    pub fn skipped(detail: impl Into<String>) -> Self {
        Self {
            status: ExecutionStatus::Skipped,
            detail: detail.into(),
            order_ids: Vec::new(),
        }
    }

    pub fn rejected(detail: impl Into<String>, order_ids: Vec<String>) -> Self {
        Self {
            status: ExecutionStatus::Rejected,
            detail: detail.into(),
            order_ids,
        }
    }
}

/// Persisted projection of a decision plus its execution outcome, keyed by
/// timestamp. Append-only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecisionRecord {
    pub decision: Decision,
    pub execution: ExecutionResult,
}

impl DecisionRecord {
    pub fn new(decision: Decision, execution: ExecutionResult) -> Self {
        Self {
            decision,
            execution,
        }
    }

    /// The shape fed back into the next cycle's prompt as historical context.
    pub fn prompt_view(&self) -> serde_json::Value {
        serde_json::json!({
            "timestamp": self.decision.timestamp,
            "action": self.decision.action.as_str(),
            "rationale": self.decision.rationale,
            "confidence_score": self.decision.confidence_score,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn action_round_trips_through_display() {
        let all = [
            ActionKind::OpenLong,
            ActionKind::OpenShort,
            ActionKind::CloseLong,
            ActionKind::CloseShort,
            ActionKind::SwitchToLong,
            ActionKind::SwitchToShort,
            ActionKind::MaintainLong,
            ActionKind::MaintainShort,
            ActionKind::StayOut,
        ];
        for action in all {
            assert_eq!(action.as_str().parse::<ActionKind>().unwrap(), action);
        }
    }

    #[test]
    fn unknown_action_is_rejected() {
        let err = "Go All In".parse::<ActionKind>().unwrap_err();
        assert!(matches!(err, PipelineError::InvalidAction(s) if s == "Go All In"));
    }

    #[test]
    fn action_parse_trims_whitespace() {
        assert_eq!(
            "  Stay Out of the Market ".parse::<ActionKind>().unwrap(),
            ActionKind::StayOut
        );
    }
}
