//! FX-rate quote source. The teacher carries only a forex *sector provider*
//! stub (`infrastructure/oanda/client.rs`); this follows the same
//! `HttpClientFactory`-backed request shape as the crypto/equity sources,
//! against a generic FX-rate endpoint keyed by base/quote currency pair.

use crate::domain::errors::AppError;
use crate::domain::ports::QuoteSource;
use crate::domain::quote::{AssetClass, Quote};
use async_trait::async_trait;
use chrono::Utc;
use reqwest_middleware::ClientWithMiddleware;
use rust_decimal::Decimal;
use serde::Deserialize;
use std::collections::HashMap;
use std::time::Instant;

#[derive(Debug, Deserialize)]
struct FxRatesResponse {
    rates: HashMap<String, f64>,
}

pub struct ForexSource {
    client: ClientWithMiddleware,
    base_url: String,
}

impl ForexSource {
    pub fn new(client: ClientWithMiddleware, base_url: impl Into<String>) -> Self {
        Self { client, base_url: base_url.into() }
    }
}

#[async_trait]
impl QuoteSource for ForexSource {
    fn name(&self) -> &str {
        "forex_public"
    }

    async fn fetch(&self, symbol: &str) -> Result<Quote, AppError> {
        if symbol.len() != 6 {
            return Err(AppError::upstream(format!("'{symbol}' is not a six-letter FX pair"), false));
        }
        let (base, quote) = symbol.split_at(3);

        let url = format!("{}/latest?base={}&symbols={}", self.base_url, base, quote);
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| AppError::upstream(format!("forex source request failed: {e}"), true))?;

        if !response.status().is_success() {
            return Err(AppError::upstream(
                format!("forex source returned status {}", response.status()),
                true,
            ));
        }

        let body: FxRatesResponse = response
            .json()
            .await
            .map_err(|e| AppError::upstream(format!("forex source parse failure: {e}"), false))?;

        let rate = body
            .rates
            .get(quote)
            .copied()
            .ok_or_else(|| AppError::upstream(format!("forex source did not quote {quote}"), true))?;
        let price = Decimal::from_f64_retain(rate).unwrap_or(Decimal::ZERO);
        if price <= Decimal::ZERO {
            return Err(AppError::upstream("forex source returned a non-positive rate", true));
        }

        Ok(Quote {
            symbol: symbol.to_string(),
            price,
            change_24h_pct: Decimal::ZERO,
            volume_24h: Decimal::ZERO,
            high_24h: price,
            low_24h: price,
            asset_class: AssetClass::Forex,
            source_tag: "source:forex_public".to_string(),
            fetched_at: Utc::now(),
            fetched_monotonic: Some(Instant::now()),
        })
    }
}
