use serde::Deserialize;

use common::error::ExchangeError;

use crate::remote::position_response::parse_field;

#[derive(Deserialize, Debug)]
pub struct TickerList {
    pub list: Vec<TickerEntry>,
}

#[derive(Deserialize, Debug)]
pub struct TickerEntry {
    #[serde(rename = "lastPrice")]
    pub last_price: String,
}

impl TickerEntry {
    pub fn last_price_f64(&self) -> Result<f64, ExchangeError> {
        let price = parse_field("lastPrice", &self.last_price)?;
        if price <= 0.0 {
            return Err(ExchangeError::Payload(format!(
                "non-positive mark price {price}"
            )));
        }
        Ok(price)
    }
}
