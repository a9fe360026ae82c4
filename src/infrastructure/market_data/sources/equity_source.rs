//! Equity quote source, grounded on the teacher's
//! `infrastructure/alpaca/market_data.rs` (header-based API key auth, a
//! `data_base_url` distinct from the trading API's base URL).

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
struct LatestQuoteEnvelope {
    quote: LatestQuote,
}

#[derive(Debug, Deserialize)]
struct LatestQuote {
    #[serde(rename = "ap")]
    ask_price: f64,
    #[serde(rename = "bp")]
    bid_price: f64,
}

pub struct EquitySource {
    client: ClientWithMiddleware,
    data_base_url: String,
    api_key: String,
    api_secret: String,
}

impl EquitySource {
    pub fn new(
        client: ClientWithMiddleware,
        data_base_url: impl Into<String>,
        api_key: impl Into<String>,
        api_secret: impl Into<String>,
    ) -> Self {
        Self {
            client,
            data_base_url: data_base_url.into(),
            api_key: api_key.into(),
            api_secret: api_secret.into(),
        }
    }
}

#[async_trait]
impl QuoteSource for EquitySource {
    fn name(&self) -> &str {
        "equity_public"
    }

    async fn fetch(&self, symbol: &str) -> Result<Quote, AppError> {
        let url = format!("{}/v2/stocks/{}/quotes/latest", self.data_base_url, symbol);
        let response = self
            .client
            .get(&url)
            .header("APCA-API-KEY-ID", &self.api_key)
            .header("APCA-API-SECRET-KEY", &self.api_secret)
            .send()
            .await
            .map_err(|e| AppError::upstream(format!("equity source request failed: {e}"), true))?;

        if !response.status().is_success() {
            return Err(AppError::upstream(
                format!("equity source returned status {}", response.status()),
                true,
            ));
        }

        let envelope: LatestQuoteEnvelope = response
            .json()
            .await
            .map_err(|e| AppError::upstream(format!("equity source parse failure: {e}"), false))?;

        let mid_f64 = (envelope.quote.ask_price + envelope.quote.bid_price) / 2.0;
        let mid = Decimal::from_f64_retain(mid_f64).unwrap_or(Decimal::ZERO);
        if mid <= Decimal::ZERO {
            return Err(AppError::upstream("equity source returned a non-positive price", true));
        }

        Ok(Quote {
            symbol: symbol.to_string(),
            price: mid,
            change_24h_pct: Decimal::ZERO,
            volume_24h: Decimal::ZERO,
            high_24h: mid,
            low_24h: mid,
            asset_class: AssetClass::Stock,
            source_tag: "source:equity_public".to_string(),
            fetched_at: Utc::now(),
            fetched_monotonic: Some(Instant::now()),
        })
    }
}
