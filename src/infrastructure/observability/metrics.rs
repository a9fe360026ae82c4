//! Prometheus metrics for the trade orchestration service.
//!
//! All metrics use the `vaultrade_` prefix and are read-only once built.
//! Generalized from the teacher's single-portfolio `Metrics` struct to the
//! multi-user metrics spec §2 names: per-user trade counts, breaker trips,
//! aggregator cache hit rate, risk-denial counts.

use prometheus::{
    CounterVec, HistogramOpts, HistogramVec, Opts, Registry, TextEncoder,
    core::{AtomicF64, GenericGauge, GenericGaugeVec},
};
use std::sync::Arc;

#[derive(Clone)]
pub struct Metrics {
    registry: Arc<Registry>,
    pub trades_total: CounterVec,
    pub risk_denials_total: CounterVec,
    pub breaker_trips_total: CounterVec,
    pub breaker_state: GenericGaugeVec<AtomicF64>,
    pub aggregator_cache_hits_total: CounterVec,
    pub aggregator_cache_misses_total: CounterVec,
    pub portfolio_equity_usd: GenericGaugeVec<AtomicF64>,
    pub active_users: GenericGauge<AtomicF64>,
    pub api_latency_seconds: HistogramVec,
    pub uptime_seconds: GenericGauge<AtomicF64>,
}

impl Metrics {
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new();

        let trades_total = CounterVec::new(
            Opts::new("vaultrade_trades_total", "Total trades placed, by owner and outcome"),
            &["owner_id", "outcome"],
        )?;
        registry.register(Box::new(trades_total.clone()))?;

        let risk_denials_total = CounterVec::new(
            Opts::new("vaultrade_risk_denials_total", "Total orders denied by the risk engine, by reason"),
            &["reason"],
        )?;
        registry.register(Box::new(risk_denials_total.clone()))?;

        let breaker_trips_total = CounterVec::new(
            Opts::new("vaultrade_breaker_trips_total", "Total circuit breaker trips, by resource"),
            &["resource"],
        )?;
        registry.register(Box::new(breaker_trips_total.clone()))?;

        let breaker_state = GenericGaugeVec::new(
            Opts::new("vaultrade_breaker_state", "Circuit breaker state (0=closed, 1=open, 2=half_open)"),
            &["resource"],
        )?;
        registry.register(Box::new(breaker_state.clone()))?;

        let aggregator_cache_hits_total = CounterVec::new(
            Opts::new("vaultrade_aggregator_cache_hits_total", "Market data cache hits"),
            &["symbol_class"],
        )?;
        registry.register(Box::new(aggregator_cache_hits_total.clone()))?;

        let aggregator_cache_misses_total = CounterVec::new(
            Opts::new("vaultrade_aggregator_cache_misses_total", "Market data cache misses requiring a refresh"),
            &["symbol_class"],
        )?;
        registry.register(Box::new(aggregator_cache_misses_total.clone()))?;

        let portfolio_equity_usd = GenericGaugeVec::new(
            Opts::new("vaultrade_portfolio_equity_usd", "Per-user portfolio equity in USD"),
            &["owner_id"],
        )?;
        registry.register(Box::new(portfolio_equity_usd.clone()))?;

        let active_users = prometheus::Gauge::with_opts(Opts::new(
            "vaultrade_active_users",
            "Number of users with at least one open position",
        ))?;
        registry.register(Box::new(active_users.clone()))?;

        let api_latency_seconds = HistogramVec::new(
            HistogramOpts::new("vaultrade_api_latency_seconds", "HTTP handler latency in seconds")
                .buckets(vec![0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0]),
            &["route"],
        )?;
        registry.register(Box::new(api_latency_seconds.clone()))?;

        let uptime_seconds = prometheus::Gauge::with_opts(Opts::new(
            "vaultrade_uptime_seconds",
            "Server uptime in seconds",
        ))?;
        registry.register(Box::new(uptime_seconds.clone()))?;

        Ok(Self {
            registry: Arc::new(registry),
            trades_total,
            risk_denials_total,
            breaker_trips_total,
            breaker_state,
            aggregator_cache_hits_total,
            aggregator_cache_misses_total,
            portfolio_equity_usd,
            active_users,
            api_latency_seconds,
            uptime_seconds,
        })
    }

    pub fn render(&self) -> String {
        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();
        encoder.encode_to_string(&metric_families).unwrap_or_default()
    }

    pub fn record_trade(&self, owner_id: &str, outcome: &str) {
        self.trades_total.with_label_values(&[owner_id, outcome]).inc();
    }

    pub fn record_risk_denial(&self, reason: &str) {
        self.risk_denials_total.with_label_values(&[reason]).inc();
    }

    pub fn record_breaker_trip(&self, resource: &str) {
        self.breaker_trips_total.with_label_values(&[resource]).inc();
    }

    pub fn record_cache_hit(&self, symbol_class: &str) {
        self.aggregator_cache_hits_total.with_label_values(&[symbol_class]).inc();
    }

    pub fn record_cache_miss(&self, symbol_class: &str) {
        self.aggregator_cache_misses_total.with_label_values(&[symbol_class]).inc();
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new().expect("metric registration with static, non-duplicated names cannot fail")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exposes_the_vaultrade_prefix() {
        let metrics = Metrics::new().unwrap();
        assert!(metrics.render().contains("vaultrade_"));
    }

    #[test]
    fn trade_counter_increments_per_owner() {
        let metrics = Metrics::new().unwrap();
        metrics.record_trade("u1", "filled");
        metrics.record_trade("u1", "filled");
        metrics.record_trade("u2", "rejected");
        let output = metrics.render();
        assert!(output.contains("vaultrade_trades_total"));
    }

    #[test]
    fn cache_hit_rate_metrics_are_labeled_by_asset_class() {
        let metrics = Metrics::new().unwrap();
        metrics.record_cache_hit("crypto");
        metrics.record_cache_miss("crypto");
        let output = metrics.render();
        assert!(output.contains("vaultrade_aggregator_cache_hits_total"));
        assert!(output.contains("vaultrade_aggregator_cache_misses_total"));
    }
}
