use std::sync::Arc;

use tracing::{info, warn};

use common::error::PipelineError;
use common::models::{
    AccountState, ActionKind, ExecutionResult, OrderIntent, OrderSide, PositionSide,
};
use common::traits::ExchangeApi;

/// Fixed policy: target leverage for every position.
pub const DESIRED_LEVERAGE: f64 = 3.0;
/// Fixed policy: new positions commit 90% of equity.
pub const EQUITY_FRACTION: f64 = 0.9;
/// BTCUSDT quantity step, in decimal places.
const QTY_DECIMALS: f64 = 1_000.0;

/// Turns one [`ActionKind`] into zero, one or two market orders against the
/// venue. Sizing always derives from the account state read at cycle start,
/// never from accumulated local state, so replaying the same decision with
/// the same account produces the same orders.
pub struct ExecutionService {
    exchange: Arc<dyn ExchangeApi>,
}

impl ExecutionService {
    pub fn new(exchange: Arc<dyn ExchangeApi>) -> Self {
        Self { exchange }
    }

    pub async fn execute(
        &self,
        action: ActionKind,
        account: &AccountState,
    ) -> Result<ExecutionResult, PipelineError> {
        info!(
            action = action.as_str(),
            side = ?account.side,
            size = account.size,
            leverage = account.leverage,
            "executing decision"
        );

        match action {
            ActionKind::OpenLong => self.open(OrderSide::Buy, account).await,
            ActionKind::OpenShort => self.open(OrderSide::Sell, account).await,
            ActionKind::CloseLong | ActionKind::CloseShort => self.close(account).await,
            ActionKind::SwitchToLong => self.switch(OrderSide::Buy, account).await,
            ActionKind::SwitchToShort => self.switch(OrderSide::Sell, account).await,
            ActionKind::MaintainLong => Ok(maintain(PositionSide::Long, account)),
            ActionKind::MaintainShort => Ok(maintain(PositionSide::Short, account)),
            ActionKind::StayOut => Ok(ExecutionResult::skipped(
                "staying out of the market, no action taken",
            )),
        }
    }

    async fn open(
        &self,
        side: OrderSide,
        account: &AccountState,
    ) -> Result<ExecutionResult, PipelineError> {
        let leverage = self.effective_leverage(account).await;
        let quantity = size_position(account.equity, leverage, account.mark_price);

        if let Err(detail) = check_margin(quantity, account.mark_price, leverage, account.equity) {
            warn!(detail, "open order rejected");
            return Ok(ExecutionResult::rejected(detail, Vec::new()));
        }

        let ack = self
            .exchange
            .place_order(&OrderIntent::open(side, quantity))
            .await?;
        Ok(ExecutionResult::executed(
            format!("opened {side} {quantity} at ~{}", account.mark_price),
            vec![ack.order_id],
        ))
    }

    async fn close(&self, account: &AccountState) -> Result<ExecutionResult, PipelineError> {
        let Some(close_side) = account.side.opposite_order_side() else {
            info!("no position to close");
            return Ok(ExecutionResult::skipped("no position to close"));
        };
        if account.size <= 0.0 {
            info!("no position to close");
            return Ok(ExecutionResult::skipped("no position to close"));
        }

        let ack = self
            .exchange
            .place_order(&OrderIntent::close(close_side, account.size))
            .await?;
        Ok(ExecutionResult::executed(
            format!("closed {:?} position of size {}", account.side, account.size),
            vec![ack.order_id],
        ))
    }

    /// Close-then-open, strictly sequential: the opening order is computed
    /// and submitted only after the closing order was acknowledged. Sizing
    /// uses the equity read at cycle start, before the close settles.
    async fn switch(
        &self,
        open_side: OrderSide,
        account: &AccountState,
    ) -> Result<ExecutionResult, PipelineError> {
        let leverage = self.effective_leverage(account).await;
        let mut order_ids = Vec::new();

        if let Some(close_side) = account.side.opposite_order_side()
            && account.size > 0.0
        {
            let ack = self
                .exchange
                .place_order(&OrderIntent::close(close_side, account.size))
                .await?;
            info!(
                size = account.size,
                side = ?account.side,
                "closed existing position before switch"
            );
            order_ids.push(ack.order_id);
        }

        let quantity = size_position(account.equity, leverage, account.mark_price);
        if let Err(detail) = check_margin(quantity, account.mark_price, leverage, account.equity) {
            warn!(detail, "switch open order rejected");
            return Ok(ExecutionResult::rejected(detail, order_ids));
        }

        let ack = self
            .exchange
            .place_order(&OrderIntent::open(open_side, quantity))
            .await?;
        order_ids.push(ack.order_id);
        Ok(ExecutionResult::executed(
            format!("switched to {open_side} {quantity}"),
            order_ids,
        ))
    }

    /// Reconcile account leverage toward [`DESIRED_LEVERAGE`]. A failed
    /// leverage change is non-fatal: the trade proceeds sized with the
    /// currently effective leverage.
    async fn effective_leverage(&self, account: &AccountState) -> f64 {
        if account.leverage == DESIRED_LEVERAGE {
            info!(leverage = account.leverage, "leverage already at target");
            return account.leverage;
        }
        match self.exchange.set_leverage(DESIRED_LEVERAGE).await {
            Ok(()) => DESIRED_LEVERAGE,
            Err(e) => {
                warn!(
                    error = %e,
                    current = account.leverage,
                    "failed to set leverage, continuing with current leverage"
                );
                account.leverage
            }
        }
    }
}

fn maintain(expected: PositionSide, account: &AccountState) -> ExecutionResult {
    if !account.is_open() {
        info!("no position to maintain");
        return ExecutionResult::skipped("no position to maintain");
    }
    if account.side != expected {
        warn!(
            current = ?account.side,
            expected = ?expected,
            "current position does not match the maintain action"
        );
        return ExecutionResult::skipped(format!(
            "current position ({:?}) does not match the action (Maintain {:?})",
            account.side, expected
        ));
    }
    ExecutionResult::skipped("maintaining current position, no changes made")
}

/// `0.9 × equity × leverage / price`, rounded to the instrument's quantity
/// step.
fn size_position(equity: f64, leverage: f64, mark_price: f64) -> f64 {
    let raw = EQUITY_FRACTION * equity * leverage / mark_price;
    (raw * QTY_DECIMALS).round() / QTY_DECIMALS
}

fn check_margin(quantity: f64, mark_price: f64, leverage: f64, equity: f64) -> Result<(), String> {
    if quantity <= 0.0 {
        return Err(format!("computed quantity {quantity} rounds to zero"));
    }
    let required_margin = quantity * mark_price / leverage;
    if required_margin > equity {
        return Err(format!(
            "not enough available balance, required margin {required_margin:.2} exceeds equity {equity:.2}"
        ));
    }
    Ok(())
}
