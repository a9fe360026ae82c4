//! Per-symbol freshness cache with in-flight refresh coalescing (spec
//! §4.2). Grounded on the *shape* of the teacher's
//! `application/market_data/spread_cache.rs` (one cache entry per symbol),
//! generalized with a per-symbol `tokio::sync::Mutex` so that concurrent
//! refreshes for the same symbol serialize on the fetch and all observers
//! see the same resulting `Quote` — this is the "singleflight" coalescing
//! pattern, implemented with a double-checked lock rather than a dedicated
//! broadcast channel because the lock itself is the simplest thing that
//! gives every caller the same post-refresh cache read.

use crate::domain::quote::Quote;
use dashmap::DashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex as AsyncMutex;

struct CacheEntry {
    quote: Quote,
    fetched_at: Instant,
}

pub struct QuoteCache {
    entries: DashMap<String, CacheEntry>,
    inflight_locks: DashMap<String, Arc<AsyncMutex<()>>>,
    freshness_window: Duration,
}

impl QuoteCache {
    pub fn new(freshness_window: Duration) -> Self {
        Self { entries: DashMap::new(), inflight_locks: DashMap::new(), freshness_window }
    }

    pub fn get_fresh(&self, symbol: &str) -> Option<Quote> {
        let entry = self.entries.get(symbol)?;
        if entry.fetched_at.elapsed() < self.freshness_window {
            Some(entry.quote.clone())
        } else {
            None
        }
    }

    pub fn insert(&self, quote: Quote) {
        self.entries
            .insert(quote.symbol.clone(), CacheEntry { fetched_at: Instant::now(), quote });
    }

    fn lock_for(&self, symbol: &str) -> Arc<AsyncMutex<()>> {
        self.inflight_locks.entry(symbol.to_string()).or_insert_with(|| Arc::new(AsyncMutex::new(()))).clone()
    }

    /// Serve from cache if fresh; otherwise acquire the per-symbol refresh
    /// lock, double-check the cache (another caller may have just refreshed
    /// it while we waited), and call `refresh` exactly once per stale
    /// window. All callers observe the same resulting quote.
    pub async fn get_or_refresh<F, Fut, E>(
        &self,
        symbol: &str,
        refresh: F,
    ) -> Result<Quote, E>
    where
        F: FnOnce() -> Fut,
        Fut: std::future::Future<Output = Result<Quote, E>>,
    {
        if let Some(quote) = self.get_fresh(symbol) {
            return Ok(quote);
        }

        let lock = self.lock_for(symbol);
        let _guard = lock.lock().await;

        if let Some(quote) = self.get_fresh(symbol) {
            return Ok(quote);
        }

        let quote = refresh().await?;
        self.insert(quote.clone());
        Ok(quote)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::quote::AssetClass;
    use chrono::Utc;
    use rust_decimal_macros::dec;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn test_quote(symbol: &str, price: rust_decimal::Decimal) -> Quote {
        Quote {
            symbol: symbol.to_string(),
            price,
            change_24h_pct: dec!(0),
            volume_24h: dec!(0),
            high_24h: price,
            low_24h: price,
            asset_class: AssetClass::Crypto,
            source_tag: "test".to_string(),
            fetched_at: Utc::now(),
            fetched_monotonic: None,
        }
    }

    #[tokio::test]
    async fn serves_from_cache_when_fresh() {
        let cache = QuoteCache::new(Duration::from_secs(30));
        cache.insert(test_quote("BTCUSDT", dec!(60000)));
        let calls = AtomicUsize::new(0);
        let quote = cache
            .get_or_refresh::<_, _, String>("BTCUSDT", || async {
                calls.fetch_add(1, Ordering::SeqCst);
                Ok(test_quote("BTCUSDT", dec!(61000)))
            })
            .await
            .unwrap();
        assert_eq!(quote.price, dec!(60000));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn refreshes_when_stale() {
        let cache = QuoteCache::new(Duration::from_millis(1));
        cache.insert(test_quote("BTCUSDT", dec!(60000)));
        tokio::time::sleep(Duration::from_millis(5)).await;
        let quote = cache
            .get_or_refresh::<_, _, String>("BTCUSDT", || async { Ok(test_quote("BTCUSDT", dec!(61000))) })
            .await
            .unwrap();
        assert_eq!(quote.price, dec!(61000));
    }

    #[tokio::test]
    async fn coalesces_concurrent_refreshes() {
        let cache = Arc::new(QuoteCache::new(Duration::from_secs(30)));
        let fetch_count = Arc::new(AtomicUsize::new(0));

        let mut handles = Vec::new();
        for _ in 0..20 {
            let cache = cache.clone();
            let fetch_count = fetch_count.clone();
            handles.push(tokio::spawn(async move {
                cache
                    .get_or_refresh::<_, _, String>("ETHUSDT", || {
                        let fetch_count = fetch_count.clone();
                        async move {
                            fetch_count.fetch_add(1, Ordering::SeqCst);
                            tokio::time::sleep(Duration::from_millis(20)).await;
                            Ok(test_quote("ETHUSDT", dec!(3000)))
                        }
                    })
                    .await
                    .unwrap()
            }));
        }

        for handle in handles {
            let quote = handle.await.unwrap();
            assert_eq!(quote.price, dec!(3000));
        }
        assert_eq!(fetch_count.load(Ordering::SeqCst), 1);
    }
}
