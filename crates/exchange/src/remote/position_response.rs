use serde::Deserialize;

use common::error::ExchangeError;
use common::models::PositionSide;

#[derive(Deserialize, Debug)]
pub struct PositionList {
    pub list: Vec<PositionEntry>,
}

/// One entry of `/v5/position/list`. Bybit reports numeric fields as strings.
#[derive(Deserialize, Debug)]
pub struct PositionEntry {
    pub side: String,
    pub size: String,
    pub leverage: String,
}

impl PositionEntry {
    pub fn size_f64(&self) -> Result<f64, ExchangeError> {
        parse_field("size", &self.size)
    }

    pub fn leverage_f64(&self) -> Result<f64, ExchangeError> {
        parse_field("leverage", &self.leverage)
    }

    /// `side` is `"Buy"`, `"Sell"` or empty; an empty side or a zero size
    /// both mean no open position.
    pub fn position_side(&self) -> Result<PositionSide, ExchangeError> {
        if self.size_f64()? == 0.0 {
            return Ok(PositionSide::Flat);
        }
        match self.side.as_str() {
            "Buy" => Ok(PositionSide::Long),
            "Sell" => Ok(PositionSide::Short),
            "" | "None" => Ok(PositionSide::Flat),
            other => Err(ExchangeError::Payload(format!(
                "unknown position side {other:?}"
            ))),
        }
    }
}

pub(crate) fn parse_field(name: &str, raw: &str) -> Result<f64, ExchangeError> {
    if raw.is_empty() {
        return Ok(0.0);
    }
    raw.parse::<f64>()
        .map_err(|e| ExchangeError::Payload(format!("bad {name} value {raw:?}: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_open_short() {
        let raw = r#"{"list":[{"side":"Sell","size":"0.5","leverage":"3"}]}"#;
        let parsed: PositionList = serde_json::from_str(raw).unwrap();
        let entry = &parsed.list[0];
        assert_eq!(entry.position_side().unwrap(), PositionSide::Short);
        assert_eq!(entry.size_f64().unwrap(), 0.5);
        assert_eq!(entry.leverage_f64().unwrap(), 3.0);
    }

    #[test]
    fn zero_size_is_flat_even_with_side() {
        let entry = PositionEntry {
            side: "Buy".into(),
            size: "0".into(),
            leverage: "10".into(),
        };
        assert_eq!(entry.position_side().unwrap(), PositionSide::Flat);
    }

    #[test]
    fn empty_fields_default_to_zero() {
        let entry = PositionEntry {
            side: "".into(),
            size: "".into(),
            leverage: "".into(),
        };
        assert_eq!(entry.position_side().unwrap(), PositionSide::Flat);
        assert_eq!(entry.leverage_f64().unwrap(), 0.0);
    }
}
