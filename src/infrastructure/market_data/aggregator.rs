//! Market Data Aggregator (spec §4.2): classifies a symbol, consults a
//! ranked list of sources for that asset class until one returns a usable
//! quote, and falls through to the synthetic source if every live source
//! fails. Generalizes the teacher's per-exchange `get_prices` methods
//! (`infrastructure/binance/market_data.rs`,
//! `infrastructure/alpaca/market_data.rs`) — which each talked to exactly
//! one source — into a source-agnostic fallback chain guarded by the
//! Circuit Breaker Registry, one breaker keyed `source:<name>` per source.

use crate::domain::errors::AppError;
use crate::domain::ports::QuoteSource;
use crate::domain::quote::{AssetClass, Quote, classify_symbol};
use crate::infrastructure::circuit_breaker::{BreakerDecision, CircuitBreakerRegistry};
use crate::infrastructure::market_data::cache::QuoteCache;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::warn;

pub struct AggregatorConfig {
    pub freshness_window: Duration,
    pub per_source_timeout: Duration,
}

impl Default for AggregatorConfig {
    fn default() -> Self {
        Self { freshness_window: Duration::from_secs(30), per_source_timeout: Duration::from_secs(5) }
    }
}

pub struct MarketDataAggregator {
    cache: QuoteCache,
    ranked_sources: HashMap<AssetClass, Vec<Arc<dyn QuoteSource>>>,
    synthetic: Arc<dyn QuoteSource>,
    breakers: Arc<CircuitBreakerRegistry>,
    per_source_timeout: Duration,
}

impl MarketDataAggregator {
    pub fn new(
        ranked_sources: HashMap<AssetClass, Vec<Arc<dyn QuoteSource>>>,
        synthetic: Arc<dyn QuoteSource>,
        breakers: Arc<CircuitBreakerRegistry>,
        config: AggregatorConfig,
    ) -> Self {
        Self {
            cache: QuoteCache::new(config.freshness_window),
            ranked_sources,
            synthetic,
            breakers,
            per_source_timeout: config.per_source_timeout,
        }
    }

    /// Serve `symbol` from cache when fresh; otherwise refresh through the
    /// ranked source chain, coalescing concurrent refreshers onto one
    /// upstream call (spec testable property f).
    pub async fn get_quote(&self, symbol: &str) -> Result<Quote, AppError> {
        let refresh_symbol = symbol.to_string();
        self.cache
            .get_or_refresh(symbol, || async move { self.refresh(&refresh_symbol).await })
            .await
    }

    /// Bypasses the cache. Used by the Trade Router's pre-submission
    /// freshness check (spec §4.6 step d: "freshness ≤ 5s; stale-data-
    /// while-ordering triggers an automatic breaker trip").
    pub fn cached_quote(&self, symbol: &str) -> Option<Quote> {
        self.cache.get_fresh(symbol)
    }

    /// Batch form of the contract in spec §4.2: `quotes(symbols) →
    /// map[symbol → Quote | MissingQuote]`. A symbol whose refresh fails is
    /// simply absent from the returned map rather than failing the whole
    /// request.
    pub async fn get_quotes(&self, symbols: &[String]) -> HashMap<String, Quote> {
        let mut out = HashMap::with_capacity(symbols.len());
        for symbol in symbols {
            if let Ok(quote) = self.get_quote(symbol).await {
                out.insert(symbol.clone(), quote);
            }
        }
        out
    }

    async fn refresh(&self, symbol: &str) -> Result<Quote, AppError> {
        let class = classify_symbol(symbol);
        let empty: Vec<Arc<dyn QuoteSource>> = Vec::new();
        let sources = self.ranked_sources.get(&class).unwrap_or(&empty);

        for source in sources {
            let breaker = self.breakers.get_or_create(&format!("source:{}", source.name()));
            match breaker.check() {
                BreakerDecision::Reject { .. } => continue,
                BreakerDecision::Allow => {}
            }

            match tokio::time::timeout(self.per_source_timeout, source.fetch(symbol)).await {
                Ok(Ok(quote)) if quote.price > rust_decimal::Decimal::ZERO => {
                    breaker.on_success();
                    return Ok(quote);
                }
                Ok(Ok(_)) => {
                    warn!(source = source.name(), symbol, "source returned a non-positive price");
                    breaker.on_failure();
                }
                Ok(Err(err)) => {
                    warn!(source = source.name(), symbol, error = %err, "source fetch failed");
                    if err.counts_toward_breaker() {
                        breaker.on_failure();
                    }
                }
                Err(_) => {
                    warn!(source = source.name(), symbol, "source fetch timed out");
                    breaker.on_failure();
                }
            }
        }

        warn!(symbol, "all live sources exhausted, falling back to synthetic");
        self.synthetic.fetch(symbol).await
    }
}
