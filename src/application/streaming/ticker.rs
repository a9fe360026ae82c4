use crate::application::alerts::AlertEngine;
use crate::application::streaming::Fanout;
use crate::infrastructure::market_data::aggregator::MarketDataAggregator;
use std::sync::Arc;
use std::time::Duration;
use tracing::warn;

const TICK_INTERVAL: Duration = Duration::from_secs(5);

/// Polls the aggregator for a fixed watchlist and feeds both the
/// `prices:<symbol>` fan-out channel and the alert engine's quote
/// evaluation (spec §4.8/§4.9). Grounded on
/// `application::alerts::OpportunityScanner`'s spawn-a-ticker-loop shape,
/// run at a tighter interval since price streaming and alert evaluation are
/// latency-sensitive in a way the 60s opportunity scan is not.
pub struct PriceTicker {
    aggregator: Arc<MarketDataAggregator>,
    fanout: Arc<Fanout>,
    alerts: Arc<AlertEngine>,
    watchlist: Vec<String>,
}

impl PriceTicker {
    pub fn new(aggregator: Arc<MarketDataAggregator>, fanout: Arc<Fanout>, alerts: Arc<AlertEngine>, watchlist: Vec<String>) -> Self {
        Self { aggregator, fanout, alerts, watchlist }
    }

    pub fn spawn(self: Arc<Self>) -> tokio::task::JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(TICK_INTERVAL);
            loop {
                ticker.tick().await;
                self.tick_once().await;
            }
        })
    }

    async fn tick_once(&self) {
        let quotes = self.aggregator.get_quotes(&self.watchlist).await;
        for (_, quote) in quotes {
            self.fanout.publish_price(quote.clone());
            if let Err(e) = self.alerts.on_quote(&quote).await {
                warn!(symbol = %quote.symbol, error = %e, "alert evaluation failed for quote");
            }
        }
    }
}
