use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::time::Instant;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssetClass {
    Crypto,
    Stock,
    Forex,
    Commodity,
    Index,
}

/// Classify a symbol into an asset class using suffix rules and an explicit
/// allowlist (spec §4.2). Crypto pairs are `<BASE><QUOTE>` with no
/// separator and a recognized quote asset suffix; forex pairs are six
/// letters drawn from ISO currency codes; anything else falls back to
/// `Stock` unless it is in the commodity/index allowlist.
pub fn classify_symbol(symbol: &str) -> AssetClass {
    const CRYPTO_QUOTES: &[&str] = &["USDT", "USDC", "BUSD", "BTC", "ETH"];
    const FX_CODES: &[&str] = &[
        "USD", "EUR", "GBP", "JPY", "CHF", "AUD", "CAD", "NZD", "CNH", "SEK", "NOK",
    ];
    const COMMODITIES: &[&str] = &["XAUUSD", "XAGUSD", "WTI", "BRENT"];
    const INDICES: &[&str] = &["SPX", "NDX", "DJI", "US30", "US500"];

    let upper = symbol.to_uppercase();

    if COMMODITIES.contains(&upper.as_str()) {
        return AssetClass::Commodity;
    }
    if INDICES.contains(&upper.as_str()) {
        return AssetClass::Index;
    }
    if upper.len() == 6 && FX_CODES.contains(&&upper[0..3]) && FX_CODES.contains(&&upper[3..6]) {
        return AssetClass::Forex;
    }
    for quote in CRYPTO_QUOTES {
        if upper.len() > quote.len() && upper.ends_with(quote) {
            return AssetClass::Crypto;
        }
    }
    AssetClass::Stock
}

/// Latest priced view of a symbol, with freshness metadata (spec Glossary).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Quote {
    pub symbol: String,
    pub price: Decimal,
    pub change_24h_pct: Decimal,
    pub volume_24h: Decimal,
    pub high_24h: Decimal,
    pub low_24h: Decimal,
    pub asset_class: AssetClass,
    /// Identifies which source produced this quote. Synthetic fallbacks are
    /// tagged unambiguously (e.g. `"synthetic"`) so callers can downgrade
    /// user-visible confidence (spec §4.2).
    pub source_tag: String,
    pub fetched_at: DateTime<Utc>,
    #[serde(skip)]
    pub fetched_monotonic: Option<Instant>,
}

impl Quote {
    pub fn is_synthetic(&self) -> bool {
        self.source_tag == "synthetic"
    }

    pub fn age(&self) -> chrono::Duration {
        Utc::now() - self.fetched_at
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_crypto_pairs() {
        assert_eq!(classify_symbol("BTCUSDT"), AssetClass::Crypto);
        assert_eq!(classify_symbol("ETHUSDC"), AssetClass::Crypto);
    }

    #[test]
    fn classifies_forex_pairs() {
        assert_eq!(classify_symbol("EURUSD"), AssetClass::Forex);
        assert_eq!(classify_symbol("GBPJPY"), AssetClass::Forex);
    }

    #[test]
    fn classifies_commodities_and_indices() {
        assert_eq!(classify_symbol("xauusd"), AssetClass::Commodity);
        assert_eq!(classify_symbol("SPX"), AssetClass::Index);
    }

    #[test]
    fn falls_back_to_stock() {
        assert_eq!(classify_symbol("AAPL"), AssetClass::Stock);
    }
}
