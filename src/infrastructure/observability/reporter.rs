//! Periodic structured-log metrics heartbeat, grounded on the teacher's
//! `MetricsReporter` (push-based JSON-to-stdout on an interval, no inbound
//! HTTP). Generalized: this service owns no portfolio state itself —
//! counters are updated in place by the components that produce them
//! (Trade Router, Risk Engine, Circuit Breaker Registry, Market Data
//! Aggregator); the reporter only renders a periodic snapshot of what has
//! accumulated and refreshes the uptime gauge.

use crate::infrastructure::observability::metrics::Metrics;
use serde::Serialize;
use std::time::{Duration, Instant};
use tracing::info;

#[derive(Serialize)]
struct HeartbeatSnapshot {
    timestamp: String,
    uptime_seconds: u64,
    version: &'static str,
}

pub struct MetricsReporter {
    metrics: Metrics,
    start_time: Instant,
    interval: Duration,
}

impl MetricsReporter {
    pub fn new(metrics: Metrics, interval: Duration) -> Self {
        Self { metrics, start_time: Instant::now(), interval }
    }

    /// Runs forever; intended to be spawned as its own task.
    pub async fn run(self) {
        info!(interval_secs = self.interval.as_secs(), "metrics reporter starting");
        loop {
            tokio::time::sleep(self.interval).await;
            self.tick();
        }
    }

    fn tick(&self) {
        let uptime = self.start_time.elapsed().as_secs();
        self.metrics.uptime_seconds.set(uptime as f64);

        let snapshot = HeartbeatSnapshot {
            timestamp: chrono::Utc::now().to_rfc3339(),
            uptime_seconds: uptime,
            version: env!("CARGO_PKG_VERSION"),
        };
        match serde_json::to_string(&snapshot) {
            Ok(json) => info!(target: "metrics", "METRICS_JSON:{json}"),
            Err(e) => tracing::warn!("failed to serialize metrics heartbeat: {e}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tick_updates_the_uptime_gauge() {
        let metrics = Metrics::new().unwrap();
        let reporter = MetricsReporter::new(metrics.clone(), Duration::from_secs(60));
        reporter.tick();
        assert!(metrics.render().contains("vaultrade_uptime_seconds"));
    }
}
