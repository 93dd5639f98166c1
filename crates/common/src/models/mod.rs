pub mod account;
pub mod decision;
pub mod order;
pub mod signal;

pub use account::{AccountState, PositionSide};
pub use decision::{
    ActionKind, Decision, DecisionRecord, ExecutionResult, ExecutionStatus, Rationale,
};
pub use order::{OrderAck, OrderIntent, OrderSide};
pub use signal::{ChartImage, ChartSpec, ProviderFailure, SignalBundle};
