use std::time::Duration;

/// Three-state circuit breaker lifecycle (spec §4.4).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CircuitState {
    Closed,
    Open,
    HalfOpen,
}

#[derive(Debug, Clone)]
pub struct BreakerConfig {
    pub failure_threshold: u32,
    pub failure_window: Duration,
    pub cooldown: Duration,
    pub probe_limit: u32,
}

impl Default for BreakerConfig {
    fn default() -> Self {
        Self {
            failure_threshold: 5,
            failure_window: Duration::from_secs(60),
            cooldown: Duration::from_secs(30),
            probe_limit: 1,
        }
    }
}

/// Names of breakers guaranteed to exist at startup (spec §4.4); others are
/// created lazily on first reference.
pub const WELL_KNOWN_BREAKERS: &[&str] = &["exchange_api", "trade_execution", "risk_threshold"];
