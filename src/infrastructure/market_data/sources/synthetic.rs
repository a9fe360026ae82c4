//! Deterministic synthetic fallback (spec §4.2: "falls through to a
//! deterministic synthetic price table only if all live sources fail").
//! Never errors — it is the source of last resort — and always tags its
//! quotes `source_tag = "synthetic"` so callers can downgrade confidence
//! (`Quote::is_synthetic`).

use crate::domain::errors::AppError;
use crate::domain::ports::QuoteSource;
use crate::domain::quote::{AssetClass, Quote, classify_symbol};
use async_trait::async_trait;
use chrono::Utc;
use rust_decimal::Decimal;
use sha2::{Digest, Sha256};
use std::time::Instant;

fn base_price_for(class: AssetClass) -> Decimal {
    match class {
        AssetClass::Crypto => Decimal::new(45_000_00, 2),
        AssetClass::Stock => Decimal::new(150_00, 2),
        AssetClass::Forex => Decimal::new(1_1000, 4),
        AssetClass::Commodity => Decimal::new(2_000_00, 2),
        AssetClass::Index => Decimal::new(4_500_00, 2),
    }
}

/// Deterministic pseudo-variance in [-10%, +10%] derived from a symbol's
/// SHA-256 digest, so the same symbol always synthesizes the same price
/// within a process lifetime (and across processes, since it's a pure
/// function of the symbol rather than process-local state).
fn variance_pct(symbol: &str) -> Decimal {
    let digest = Sha256::digest(symbol.as_bytes());
    let sample = u32::from_be_bytes([digest[0], digest[1], digest[2], digest[3]]);
    let bucket = (sample % 2001) as i64 - 1000; // [-1000, 1000]
    Decimal::new(bucket, 4) // [-0.1000, 0.1000]
}

pub struct SyntheticSource;

impl SyntheticSource {
    pub fn new() -> Self {
        Self
    }
}

impl Default for SyntheticSource {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl QuoteSource for SyntheticSource {
    fn name(&self) -> &str {
        "synthetic"
    }

    async fn fetch(&self, symbol: &str) -> Result<Quote, AppError> {
        let class = classify_symbol(symbol);
        let base = base_price_for(class);
        let variance = variance_pct(symbol);
        let price = (base * (Decimal::ONE + variance)).round_dp(8);

        Ok(Quote {
            symbol: symbol.to_string(),
            price,
            change_24h_pct: variance * Decimal::new(100, 0),
            volume_24h: Decimal::ZERO,
            high_24h: price,
            low_24h: price,
            asset_class: class,
            source_tag: "synthetic".to_string(),
            fetched_at: Utc::now(),
            fetched_monotonic: Some(Instant::now()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn always_succeeds_and_tags_as_synthetic() {
        let source = SyntheticSource::new();
        let quote = source.fetch("BTCUSDT").await.unwrap();
        assert!(quote.is_synthetic());
        assert!(quote.price > Decimal::ZERO);
    }

    #[tokio::test]
    async fn is_deterministic_for_the_same_symbol() {
        let source = SyntheticSource::new();
        let a = source.fetch("AAPL").await.unwrap();
        let b = source.fetch("AAPL").await.unwrap();
        assert_eq!(a.price, b.price);
    }

    #[tokio::test]
    async fn varies_by_asset_class() {
        let source = SyntheticSource::new();
        let crypto = source.fetch("BTCUSDT").await.unwrap();
        let forex = source.fetch("EURUSD").await.unwrap();
        assert_ne!(crypto.asset_class, forex.asset_class);
    }
}
