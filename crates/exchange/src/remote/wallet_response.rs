use serde::Deserialize;

use common::error::ExchangeError;

use crate::remote::position_response::parse_field;

#[derive(Deserialize, Debug)]
pub struct WalletList {
    pub list: Vec<WalletEntry>,
}

/// One entry of `/v5/account/wallet-balance` for the UNIFIED account.
#[derive(Deserialize, Debug)]
pub struct WalletEntry {
    #[serde(rename = "totalEquity")]
    pub total_equity: String,
}

impl WalletEntry {
    pub fn total_equity_f64(&self) -> Result<f64, ExchangeError> {
        parse_field("totalEquity", &self.total_equity)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_equity() {
        let raw = r#"{"list":[{"totalEquity":"10000.25"}]}"#;
        let parsed: WalletList = serde_json::from_str(raw).unwrap();
        assert_eq!(parsed.list[0].total_equity_f64().unwrap(), 10000.25);
    }
}
