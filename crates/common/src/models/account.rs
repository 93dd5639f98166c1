use serde::{Deserialize, Serialize};
use serde_json::json;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PositionSide {
    Long,
    Short,
    Flat,
}

impl PositionSide {
    pub fn opposite_order_side(&self) -> Option<crate::models::OrderSide> {
        match self {
            PositionSide::Long => Some(crate::models::OrderSide::Sell),
            PositionSide::Short => Some(crate::models::OrderSide::Buy),
            PositionSide::Flat => None,
        }
    }
}

/// Live account snapshot, read from the exchange at the start of every cycle.
/// Never cached across cycles: sizing and closing quantities must always come
/// from fresh state.
#[derive(Debug, Clone, PartialEq)]
pub struct AccountState {
    pub side: PositionSide,
    pub size: f64,
    pub leverage: f64,
    pub equity: f64,
    pub mark_price: f64,
}

impl AccountState {
    pub fn is_open(&self) -> bool {
        self.size > 0.0 && self.side != PositionSide::Flat
    }

    /// The JSON block handed to the reasoning service, mirroring what the
    /// exchange status endpoint reports.
    pub fn prompt_snapshot(&self, timestamp: i64) -> serde_json::Value {
        let position_type = match self.side {
            PositionSide::Long => json!("Long"),
            PositionSide::Short => json!("Short"),
            PositionSide::Flat => serde_json::Value::Null,
        };
        json!({
            "timestamp": timestamp,
            "current_market_price": (self.mark_price * 100.0).round() / 100.0,
            "position": {
                "status": if self.is_open() { "Open" } else { "Closed" },
                "type": position_type,
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn account(side: PositionSide, size: f64) -> AccountState {
        AccountState {
            side,
            size,
            leverage: 3.0,
            equity: 10_000.0,
            mark_price: 60_000.555,
        }
    }

    #[test]
    fn flat_account_reports_closed() {
        let snapshot = account(PositionSide::Flat, 0.0).prompt_snapshot(1_725_807_732);
        assert_eq!(snapshot["position"]["status"], "Closed");
        assert!(snapshot["position"]["type"].is_null());
    }

    #[test]
    fn open_short_reports_type() {
        let snapshot = account(PositionSide::Short, 0.5).prompt_snapshot(1_725_807_732);
        assert_eq!(snapshot["position"]["status"], "Open");
        assert_eq!(snapshot["position"]["type"], "Short");
        assert_eq!(snapshot["current_market_price"], 60_000.56);
    }
}
