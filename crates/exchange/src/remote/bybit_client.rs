use std::time::{SystemTime, UNIX_EPOCH};

use async_trait::async_trait;
use hmac::{Hmac, Mac};
use reqwest::Client;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::json;
use sha2::Sha256;
use tracing::{debug, info};

use common::config::BybitSettings;
use common::error::ExchangeError;
use common::models::{AccountState, OrderAck, OrderIntent, PositionSide};
use common::traits::ExchangeApi;

use crate::remote::{PositionList, TickerList, WalletList};

type HmacSha256 = Hmac<Sha256>;

const MAINNET_URL: &str = "https://api.bybit.com";
const TESTNET_URL: &str = "https://api-testnet.bybit.com";
const RECV_WINDOW: &str = "10000";

/// Bybit v5 envelope. `retCode != 0` is a request failure and the venue's
/// message is surfaced verbatim.
#[derive(Deserialize, Debug)]
struct Envelope<T> {
    #[serde(rename = "retCode")]
    ret_code: i64,
    #[serde(rename = "retMsg")]
    ret_msg: String,
    result: Option<T>,
}

impl<T> Envelope<T> {
    fn into_result(self) -> Result<T, ExchangeError> {
        if self.ret_code != 0 {
            return Err(ExchangeError::Api {
                code: self.ret_code,
                message: self.ret_msg,
            });
        }
        self.result
            .ok_or_else(|| ExchangeError::Payload("missing result field".into()))
    }
}

#[derive(Deserialize, Debug)]
struct OrderCreateResult {
    #[serde(rename = "orderId")]
    order_id: String,
}

#[derive(Clone)]
pub struct BybitClient {
    client: Client,
    base_url: String,
    api_key: String,
    api_secret: String,
    symbol: String,
}

impl BybitClient {
    pub fn new(settings: &BybitSettings) -> Self {
        let base_url = if settings.testnet {
            TESTNET_URL.to_string()
        } else {
            MAINNET_URL.to_string()
        };
        Self {
            client: Client::new(),
            base_url,
            api_key: settings.api_key.clone(),
            api_secret: settings.api_secret.clone(),
            symbol: settings.symbol.clone(),
        }
    }

    fn timestamp_ms() -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or(0)
    }

    /// v5 header signature: HMAC-SHA256 over timestamp + key + recv_window +
    /// (query string or request body).
    fn sign(&self, timestamp: u64, payload: &str) -> Result<String, ExchangeError> {
        let mut mac = HmacSha256::new_from_slice(self.api_secret.as_bytes())
            .map_err(|e| ExchangeError::Transport(e.to_string()))?;
        mac.update(format!("{timestamp}{}{RECV_WINDOW}{payload}", self.api_key).as_bytes());
        Ok(hex::encode(mac.finalize().into_bytes()))
    }

    async fn signed_get<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &str,
    ) -> Result<T, ExchangeError> {
        let timestamp = Self::timestamp_ms();
        let signature = self.sign(timestamp, query)?;
        let url = format!("{}{}?{}", self.base_url, path, query);

        let resp = self
            .client
            .get(&url)
            .header("X-BAPI-API-KEY", &self.api_key)
            .header("X-BAPI-TIMESTAMP", timestamp.to_string())
            .header("X-BAPI-RECV-WINDOW", RECV_WINDOW)
            .header("X-BAPI-SIGN", signature)
            .send()
            .await
            .map_err(|e| ExchangeError::Transport(e.to_string()))?;

        Self::decode(resp).await
    }

    async fn signed_post<T: DeserializeOwned>(
        &self,
        path: &str,
        body: &serde_json::Value,
    ) -> Result<T, ExchangeError> {
        let timestamp = Self::timestamp_ms();
        let raw_body = body.to_string();
        let signature = self.sign(timestamp, &raw_body)?;
        let url = format!("{}{}", self.base_url, path);

        let resp = self
            .client
            .post(&url)
            .header("X-BAPI-API-KEY", &self.api_key)
            .header("X-BAPI-TIMESTAMP", timestamp.to_string())
            .header("X-BAPI-RECV-WINDOW", RECV_WINDOW)
            .header("X-BAPI-SIGN", signature)
            .header("Content-Type", "application/json")
            .body(raw_body)
            .send()
            .await
            .map_err(|e| ExchangeError::Transport(e.to_string()))?;

        Self::decode(resp).await
    }

    async fn public_get<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &str,
    ) -> Result<T, ExchangeError> {
        let url = format!("{}{}?{}", self.base_url, path, query);
        let resp = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| ExchangeError::Transport(e.to_string()))?;
        Self::decode(resp).await
    }

    async fn decode<T: DeserializeOwned>(resp: reqwest::Response) -> Result<T, ExchangeError> {
        let status = resp.status();
        let text = resp
            .text()
            .await
            .map_err(|e| ExchangeError::Transport(e.to_string()))?;
        if !status.is_success() {
            return Err(ExchangeError::Transport(format!("HTTP {status}: {text}")));
        }
        let envelope: Envelope<T> = serde_json::from_str(&text)
            .map_err(|e| ExchangeError::Payload(format!("{e}: {text}")))?;
        envelope.into_result()
    }

    async fn position(&self) -> Result<(PositionSide, f64, f64), ExchangeError> {
        let query = format!("category=linear&symbol={}", self.symbol);
        let positions: PositionList = self.signed_get("/v5/position/list", &query).await?;
        match positions.list.first() {
            Some(entry) => Ok((
                entry.position_side()?,
                entry.size_f64()?,
                entry.leverage_f64()?.max(1.0),
            )),
            None => Ok((PositionSide::Flat, 0.0, 1.0)),
        }
    }

    async fn total_equity(&self) -> Result<f64, ExchangeError> {
        let wallets: WalletList = self
            .signed_get("/v5/account/wallet-balance", "accountType=UNIFIED")
            .await?;
        wallets
            .list
            .first()
            .ok_or_else(|| ExchangeError::Payload("empty wallet list".into()))?
            .total_equity_f64()
    }

    async fn mark_price(&self) -> Result<f64, ExchangeError> {
        let query = format!("category=linear&symbol={}", self.symbol);
        let tickers: TickerList = self.public_get("/v5/market/tickers", &query).await?;
        tickers
            .list
            .first()
            .ok_or_else(|| ExchangeError::Payload("empty ticker list".into()))?
            .last_price_f64()
    }
}

#[async_trait]
impl ExchangeApi for BybitClient {
    async fn account_state(&self) -> Result<AccountState, ExchangeError> {
        let (side, size, leverage) = self.position().await?;
        let equity = self.total_equity().await?;
        let mark_price = self.mark_price().await?;

        debug!(
            ?side,
            size, leverage, equity, mark_price, "fetched account state"
        );
        Ok(AccountState {
            side,
            size,
            leverage,
            equity,
            mark_price,
        })
    }

    async fn set_leverage(&self, leverage: f64) -> Result<(), ExchangeError> {
        let body = json!({
            "category": "linear",
            "symbol": self.symbol,
            "buyLeverage": leverage.to_string(),
            "sellLeverage": leverage.to_string(),
        });
        let _: serde_json::Value = self.signed_post("/v5/position/set-leverage", &body).await?;
        info!(leverage, "leverage set");
        Ok(())
    }

    async fn place_order(&self, intent: &OrderIntent) -> Result<OrderAck, ExchangeError> {
        let body = json!({
            "category": "linear",
            "symbol": self.symbol,
            "side": intent.side.to_string(),
            "orderType": "Market",
            "qty": intent.quantity.to_string(),
            "timeInForce": "GoodTillCancel",
            "positionIdx": 0,
            "reduceOnly": intent.reduce_only,
        });

        info!(
            side = %intent.side,
            qty = intent.quantity,
            reduce_only = intent.reduce_only,
            "placing market order"
        );
        let result: OrderCreateResult = self.signed_post("/v5/order/create", &body).await?;
        Ok(OrderAck {
            order_id: result.order_id,
        })
    }
}
