use crate::application::streaming::{Fanout, SystemEvent};
use crate::infrastructure::market_data::aggregator::MarketDataAggregator;
use dashmap::DashMap;
use rust_decimal::Decimal;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::debug;

const SCAN_INTERVAL: Duration = Duration::from_secs(60);
/// An opportunity for the same symbol at roughly the same move is only
/// broadcast once per this window, so a sustained move doesn't re-announce
/// itself every scan tick.
const DEDUP_TTL: Duration = Duration::from_secs(600);

/// Periodic heuristic scan over watched symbols for notable 24h moves
/// (spec §4.8's "opportunity scans"). Broadcasts a `system` fan-out event
/// rather than a per-owner notification — a reasonable simplification for a
/// scan with no per-user watchlist input, left as a single process-wide
/// stream subscribers can filter client-side.
pub struct OpportunityScanner {
    aggregator: Arc<MarketDataAggregator>,
    fanout: Arc<Fanout>,
    watchlist: Vec<String>,
    move_threshold_pct: Decimal,
    recently_emitted: DashMap<String, Instant>,
}

impl OpportunityScanner {
    pub fn new(aggregator: Arc<MarketDataAggregator>, fanout: Arc<Fanout>, watchlist: Vec<String>, move_threshold_pct: Decimal) -> Self {
        Self { aggregator, fanout, watchlist, move_threshold_pct, recently_emitted: DashMap::new() }
    }

    /// Spawn the background scan loop. The returned handle is owned by the
    /// caller (typically `application::bootstrap`) so it can be aborted on
    /// shutdown.
    pub fn spawn(self: Arc<Self>) -> tokio::task::JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(SCAN_INTERVAL);
            loop {
                ticker.tick().await;
                self.scan_once().await;
            }
        })
    }

    async fn scan_once(&self) {
        let quotes = self.aggregator.get_quotes(&self.watchlist).await;
        for (symbol, quote) in quotes {
            if quote.change_24h_pct.abs() < self.move_threshold_pct {
                continue;
            }
            let dedup_key = format!("{symbol}:{}", quote.change_24h_pct.round_dp(1));
            let now = Instant::now();
            if let Some(last) = self.recently_emitted.get(&dedup_key) {
                if now.duration_since(*last) < DEDUP_TTL {
                    continue;
                }
            }
            self.recently_emitted.insert(dedup_key, now);

            debug!(symbol, pct = %quote.change_24h_pct, "opportunity scan: notable move");
            self.fanout.publish_system(SystemEvent {
                kind: "opportunity".to_string(),
                detail: serde_json::json!({
                    "symbol": symbol,
                    "change_24h_pct": quote.change_24h_pct.to_string(),
                    "price": quote.price.to_string(),
                }),
            });
        }
        self.recently_emitted.retain(|_, last| now_elapsed_within_ttl(*last));
    }
}

fn now_elapsed_within_ttl(last: Instant) -> bool {
    Instant::now().duration_since(last) < DEDUP_TTL
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::circuit_breaker::CircuitBreakerRegistry;
    use crate::infrastructure::market_data::aggregator::AggregatorConfig;
    use crate::infrastructure::market_data::sources::SyntheticSource;
    use crate::domain::ports::QuoteSource;
    use std::collections::HashMap;

    #[tokio::test]
    async fn scan_does_not_panic_with_empty_watchlist() {
        let aggregator = Arc::new(MarketDataAggregator::new(
            HashMap::new(),
            Arc::new(SyntheticSource::new()) as Arc<dyn QuoteSource>,
            Arc::new(CircuitBreakerRegistry::default()),
            AggregatorConfig::default(),
        ));
        let scanner = OpportunityScanner::new(aggregator, Arc::new(Fanout::new()), Vec::new(), Decimal::from(5));
        scanner.scan_once().await;
    }
}
