//! Crypto quote source hitting a public ticker feed, grounded on the
//! teacher's `infrastructure/binance/market_data.rs::get_prices` (same
//! endpoint shape, same "parse the string fields into `Decimal`, skip
//! anything that doesn't parse" posture).

use crate::domain::errors::AppError;
use crate::domain::ports::QuoteSource;
use crate::domain::quote::{AssetClass, Quote};
use async_trait::async_trait;
use chrono::Utc;
use reqwest_middleware::ClientWithMiddleware;
use rust_decimal::Decimal;
use serde::Deserialize;
use std::time::Instant;

#[derive(Debug, Deserialize)]
struct Ticker24hr {
    #[serde(rename = "lastPrice")]
    last_price: String,
    #[serde(rename = "priceChangePercent")]
    price_change_percent: String,
    #[serde(rename = "quoteVolume")]
    quote_volume: String,
    #[serde(rename = "highPrice")]
    high_price: String,
    #[serde(rename = "lowPrice")]
    low_price: String,
}

pub struct CryptoSource {
    client: ClientWithMiddleware,
    base_url: String,
}

impl CryptoSource {
    pub fn new(client: ClientWithMiddleware, base_url: impl Into<String>) -> Self {
        Self { client, base_url: base_url.into() }
    }
}

#[async_trait]
impl QuoteSource for CryptoSource {
    fn name(&self) -> &str {
        "crypto_public"
    }

    async fn fetch(&self, symbol: &str) -> Result<Quote, AppError> {
        let url = format!("{}/api/v3/ticker/24hr?symbol={}", self.base_url, symbol);
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| AppError::upstream(format!("crypto source request failed: {e}"), true))?;

        if !response.status().is_success() {
            return Err(AppError::upstream(
                format!("crypto source returned status {}", response.status()),
                true,
            ));
        }

        let ticker: Ticker24hr = response
            .json()
            .await
            .map_err(|e| AppError::upstream(format!("crypto source parse failure: {e}"), false))?;

        let price = Decimal::from_str_exact(&ticker.last_price)
            .map_err(|_| AppError::upstream("crypto source returned a non-numeric price", false))?;
        if price <= Decimal::ZERO {
            return Err(AppError::upstream("crypto source returned a non-positive price", true));
        }

        Ok(Quote {
            symbol: symbol.to_string(),
            price,
            change_24h_pct: ticker.price_change_percent.parse().unwrap_or(Decimal::ZERO),
            volume_24h: ticker.quote_volume.parse().unwrap_or(Decimal::ZERO),
            high_24h: ticker.high_price.parse().unwrap_or(price),
            low_24h: ticker.low_price.parse().unwrap_or(price),
            asset_class: AssetClass::Crypto,
            source_tag: "source:crypto_public".to_string(),
            fetched_at: Utc::now(),
            fetched_monotonic: Some(Instant::now()),
        })
    }
}
