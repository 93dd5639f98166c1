use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderSide {
    Buy,
    Sell,
}

impl fmt::Display for OrderSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            OrderSide::Buy => "Buy",
            OrderSide::Sell => "Sell",
        })
    }
}

/// A single market order to submit. At most two are produced per cycle, and
/// only Switch actions produce two (close-then-open).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderIntent {
    pub side: OrderSide,
    pub quantity: f64,
    pub reduce_only: bool,
}

impl OrderIntent {
    pub fn open(side: OrderSide, quantity: f64) -> Self {
        Self {
            side,
            quantity,
            reduce_only: false,
        }
    }

    pub fn close(side: OrderSide, quantity: f64) -> Self {
        Self {
            side,
            quantity,
            reduce_only: true,
        }
    }
}

/// Exchange acknowledgment for a submitted order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderAck {
    pub order_id: String,
}
