//! Market Data Aggregator tuning (spec §4.2 defaults) plus the per-source
//! base URLs the spec's §6 env-var table lists as "illustrative, per-source
//! aggregator URLs".

use crate::infrastructure::market_data::aggregator::AggregatorConfig;
use anyhow::{Context, Result};
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct AggregatorEnvConfig {
    pub freshness_window: Duration,
    pub per_source_timeout: Duration,
    pub crypto_source_url: String,
    pub equity_source_url: String,
    pub equity_source_api_key: Option<String>,
    pub equity_source_api_secret: Option<String>,
    pub forex_source_url: String,
}

fn parse_secs_env(key: &str, default: u64) -> Result<Duration> {
    let secs = std::env::var(key)
        .unwrap_or_else(|_| default.to_string())
        .parse::<u64>()
        .with_context(|| format!("{key} must be a whole number of seconds"))?;
    Ok(Duration::from_secs(secs))
}

impl AggregatorEnvConfig {
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            freshness_window: parse_secs_env("AGGREGATOR_FRESHNESS_WINDOW_SECS", 30)?,
            per_source_timeout: parse_secs_env("AGGREGATOR_SOURCE_TIMEOUT_SECS", 5)?,
            crypto_source_url: std::env::var("CRYPTO_SOURCE_URL")
                .unwrap_or_else(|_| "https://api.binance.com".to_string()),
            equity_source_url: std::env::var("EQUITY_SOURCE_URL")
                .unwrap_or_else(|_| "https://data.alpaca.markets".to_string()),
            equity_source_api_key: std::env::var("EQUITY_SOURCE_API_KEY").ok().filter(|k| !k.is_empty()),
            equity_source_api_secret: std::env::var("EQUITY_SOURCE_API_SECRET").ok().filter(|k| !k.is_empty()),
            forex_source_url: std::env::var("FOREX_SOURCE_URL")
                .unwrap_or_else(|_| "https://api-fxpractice.oanda.com".to_string()),
        })
    }

    pub fn as_aggregator_config(&self) -> AggregatorConfig {
        AggregatorConfig {
            freshness_window: self.freshness_window,
            per_source_timeout: self.per_source_timeout,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_spec() {
        let _guard = crate::config::test_support::env_lock().lock().unwrap();
        unsafe {
            std::env::remove_var("AGGREGATOR_FRESHNESS_WINDOW_SECS");
        }
        let config = AggregatorEnvConfig::from_env().unwrap();
        assert_eq!(config.freshness_window, Duration::from_secs(30));
    }
}
