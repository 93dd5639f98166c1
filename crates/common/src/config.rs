use std::env;

use chrono::NaiveTime;

use crate::error::ConfigError;

#[derive(Debug, Clone)]
pub struct BybitSettings {
    pub api_key: String,
    pub api_secret: String,
    pub symbol: String,
    pub testnet: bool,
}

#[derive(Debug, Clone)]
pub struct ReasoningSettings {
    pub api_key: String,
    pub model: String,
}

#[derive(Debug, Clone)]
pub struct RapidApiSettings {
    pub key: String,
    pub host: String,
}

#[derive(Debug, Clone)]
pub struct TelegramSettings {
    pub bot_token: String,
    pub chat_id: i64,
}

/// Full configuration surface, validated once before the scheduler starts.
/// A missing required credential is a startup error, never a per-cycle one.
#[derive(Debug, Clone)]
pub struct Settings {
    pub bybit: BybitSettings,
    pub reasoning: ReasoningSettings,
    pub news_api: RapidApiSettings,
    pub tradingview_api: RapidApiSettings,
    pub discord_webhook_url: String,
    pub telegram: Option<TelegramSettings>,
    pub chart_capture_url: String,
    pub db_path: String,
    pub trade_times: Vec<NaiveTime>,
}

const DEFAULT_TRADE_TIMES: &str = "03:58,07:58,11:58,15:58,19:58,23:58";

impl Settings {
    pub fn from_env() -> Result<Self, ConfigError> {
        let telegram = match (optional("TELEGRAM_BOT_TOKEN"), optional("TELEGRAM_CHAT_ID")) {
            (Some(bot_token), Some(chat_id)) => {
                let chat_id = chat_id.parse::<i64>().map_err(|e| ConfigError::Invalid {
                    var: "TELEGRAM_CHAT_ID",
                    detail: e.to_string(),
                })?;
                Some(TelegramSettings { bot_token, chat_id })
            }
            _ => None,
        };

        let trade_times = parse_trade_times(
            &optional("TRADE_TIMES").unwrap_or_else(|| DEFAULT_TRADE_TIMES.to_string()),
        )?;

        Ok(Settings {
            bybit: BybitSettings {
                api_key: required("BYBIT_API_KEY")?,
                api_secret: required("BYBIT_API_SECRET")?,
                symbol: optional("BYBIT_SYMBOL").unwrap_or_else(|| "BTCUSDT".to_string()),
                testnet: optional("BYBIT_TESTNET").is_some_and(|v| v == "1" || v == "true"),
            },
            reasoning: ReasoningSettings {
                api_key: required("OPENAI_API_KEY")?,
                model: optional("OPENAI_MODEL").unwrap_or_else(|| "chatgpt-4o-latest".to_string()),
            },
            news_api: RapidApiSettings {
                key: required("RAPIDAPI_NEWS_KEY")?,
                host: required("RAPIDAPI_NEWS_HOST")?,
            },
            tradingview_api: RapidApiSettings {
                key: required("RAPIDAPI_TRADINGVIEW_KEY")?,
                host: required("RAPIDAPI_TRADINGVIEW_HOST")?,
            },
            discord_webhook_url: required("DISCORD_WEBHOOK_URL")?,
            telegram,
            chart_capture_url: required("CHART_CAPTURE_URL")?,
            db_path: optional("DB_PATH").unwrap_or_else(|| "trading_decisions.sqlite".to_string()),
            trade_times,
        })
    }
}

fn required(var: &'static str) -> Result<String, ConfigError> {
    optional(var).ok_or(ConfigError::MissingVar(var))
}

fn optional(var: &str) -> Option<String> {
    env::var(var).ok().filter(|v| !v.trim().is_empty())
}

/// Parses a comma-separated list of daily `HH:MM` trigger times (UTC).
pub fn parse_trade_times(raw: &str) -> Result<Vec<NaiveTime>, ConfigError> {
    let mut times = Vec::new();
    for part in raw.split(',') {
        let part = part.trim();
        if part.is_empty() {
            continue;
        }
        let time = NaiveTime::parse_from_str(part, "%H:%M").map_err(|e| ConfigError::Invalid {
            var: "TRADE_TIMES",
            detail: format!("{part:?}: {e}"),
        })?;
        times.push(time);
    }
    if times.is_empty() {
        return Err(ConfigError::Invalid {
            var: "TRADE_TIMES",
            detail: "no trigger times configured".into(),
        });
    }
    times.sort();
    times.dedup();
    Ok(times)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_default_schedule() {
        let times = parse_trade_times(DEFAULT_TRADE_TIMES).unwrap();
        assert_eq!(times.len(), 6);
        assert_eq!(times[0], NaiveTime::from_hms_opt(3, 58, 0).unwrap());
        assert_eq!(times[5], NaiveTime::from_hms_opt(23, 58, 0).unwrap());
    }

    #[test]
    fn sorts_and_dedups() {
        let times = parse_trade_times("12:00, 06:00,12:00").unwrap();
        assert_eq!(
            times,
            vec![
                NaiveTime::from_hms_opt(6, 0, 0).unwrap(),
                NaiveTime::from_hms_opt(12, 0, 0).unwrap(),
            ]
        );
    }

    #[test]
    fn rejects_garbage() {
        assert!(parse_trade_times("25:99").is_err());
        assert!(parse_trade_times("").is_err());
    }
}
