use thiserror::Error;

/// Errors surfaced by exchange calls. A non-zero result code from the venue
/// carries the provider's message verbatim.
#[derive(Debug, Clone, Error)]
pub enum ExchangeError {
    #[error("exchange returned code {code}: {message}")]
    Api { code: i64, message: String },
    #[error("exchange transport error: {0}")]
    Transport(String),
    #[error("malformed exchange payload: {0}")]
    Payload(String),
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(String),
    #[error("corrupt decision record: {0}")]
    Corrupt(String),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable {0}")]
    MissingVar(&'static str),
    #[error("invalid value for {var}: {detail}")]
    Invalid { var: &'static str, detail: String },
}

/// The cycle-level taxonomy. Every stage converts its internal failures into
/// one of these before the error crosses a stage boundary, and the top-level
/// handler emits exactly one failure notification per error.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("fatal aggregation failure in {stage}: {detail}")]
    FatalAggregation {
        stage: &'static str,
        detail: String,
    },
    #[error("reasoning request failed: {0}")]
    Reasoning(String),
    #[error("failed to parse reasoning response: {0}")]
    DecisionParse(String),
    #[error("unrecognized action: {0}")]
    InvalidAction(String),
    #[error(transparent)]
    Exchange(#[from] ExchangeError),
    #[error("failed to persist decision: {0}")]
    Persistence(String),
}

impl PipelineError {
    /// Stage name used in failure notifications.
    pub fn stage(&self) -> &'static str {
        match self {
            PipelineError::FatalAggregation { stage, .. } => stage,
            PipelineError::Reasoning(_)
            | PipelineError::DecisionParse(_)
            | PipelineError::InvalidAction(_) => "synthesis",
            PipelineError::Exchange(_) => "execution",
            PipelineError::Persistence(_) => "persistence",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stage_attribution() {
        let err = PipelineError::FatalAggregation {
            stage: "account-status",
            detail: "timeout".into(),
        };
        assert_eq!(err.stage(), "account-status");
        assert_eq!(
            PipelineError::DecisionParse("bad json".into()).stage(),
            "synthesis"
        );
        assert_eq!(
            PipelineError::Exchange(ExchangeError::Transport("reset".into())).stage(),
            "execution"
        );
    }

    #[test]
    fn api_error_carries_venue_message() {
        let err = ExchangeError::Api {
            code: 110007,
            message: "ab not enough for new order".into(),
        };
        assert!(err.to_string().contains("110007"));
        assert!(err.to_string().contains("not enough"));
    }
}
