//! Circuit Breaker Registry (spec §4.4), generalizing the teacher's
//! single-resource `CircuitBreaker`
//! (`infrastructure/core/circuit_breaker.rs`, async `tokio::sync::RwLock`)
//! into a `DashMap`-keyed registry guarded by `parking_lot::Mutex` so the
//! state check never suspends (spec §5: "No suspension is permitted inside
//! a Risk Engine evaluation" and the breaker check is a lock-protected
//! suspension point only at the *caller's* await, not inside the check
//! itself).

use crate::domain::breaker::{BreakerConfig, CircuitState, WELL_KNOWN_BREAKERS};
use dashmap::DashMap;
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{info, warn};

struct BreakerState {
    state: CircuitState,
    failure_count: u32,
    window_started_at: Instant,
    opened_at: Option<Instant>,
    half_open_in_flight: u32,
    half_open_successes: u32,
}

impl BreakerState {
    fn new() -> Self {
        Self {
            state: CircuitState::Closed,
            failure_count: 0,
            window_started_at: Instant::now(),
            opened_at: None,
            half_open_in_flight: 0,
            half_open_successes: 0,
        }
    }
}

/// A single named breaker. Cheap to clone (wraps an `Arc`).
#[derive(Clone)]
pub struct CircuitBreaker {
    name: String,
    config: BreakerConfig,
    state: Arc<Mutex<BreakerState>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BreakerDecision {
    Allow,
    Reject { retry_after_secs: u64 },
}

impl CircuitBreaker {
    fn new(name: impl Into<String>, config: BreakerConfig) -> Self {
        Self { name: name.into(), config, state: Arc::new(Mutex::new(BreakerState::new())) }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn current_state(&self) -> CircuitState {
        self.state.lock().state
    }

    /// Non-suspending check-and-maybe-transition. Called before invoking a
    /// guarded operation; the caller must report the outcome via
    /// `on_success`/`on_failure` afterward.
    pub fn check(&self) -> BreakerDecision {
        let mut st = self.state.lock();
        match st.state {
            CircuitState::Closed => BreakerDecision::Allow,
            CircuitState::Open => {
                let opened_at = st.opened_at.unwrap_or_else(Instant::now);
                if opened_at.elapsed() >= self.config.cooldown {
                    info!(breaker = %self.name, "transitioning open -> half_open");
                    st.state = CircuitState::HalfOpen;
                    st.half_open_in_flight = 0;
                    st.half_open_successes = 0;
                    BreakerDecision::Allow
                } else {
                    let remaining = self.config.cooldown.saturating_sub(opened_at.elapsed());
                    BreakerDecision::Reject { retry_after_secs: remaining.as_secs().max(1) }
                }
            }
            CircuitState::HalfOpen => {
                if st.half_open_in_flight < self.config.probe_limit {
                    st.half_open_in_flight += 1;
                    BreakerDecision::Allow
                } else {
                    BreakerDecision::Reject { retry_after_secs: 1 }
                }
            }
        }
    }

    pub fn on_success(&self) {
        let mut st = self.state.lock();
        match st.state {
            CircuitState::Closed => {
                st.failure_count = 0;
            }
            CircuitState::HalfOpen => {
                st.half_open_successes += 1;
                if st.half_open_successes >= self.config.probe_limit {
                    info!(breaker = %self.name, "transitioning half_open -> closed");
                    st.state = CircuitState::Closed;
                    st.failure_count = 0;
                    st.opened_at = None;
                }
            }
            CircuitState::Open => {}
        }
    }

    pub fn on_failure(&self) {
        let mut st = self.state.lock();
        match st.state {
            CircuitState::Closed => {
                if st.window_started_at.elapsed() > self.config.failure_window {
                    st.failure_count = 0;
                    st.window_started_at = Instant::now();
                }
                st.failure_count += 1;
                if st.failure_count >= self.config.failure_threshold {
                    warn!(breaker = %self.name, "transitioning closed -> open");
                    st.state = CircuitState::Open;
                    st.opened_at = Some(Instant::now());
                }
            }
            CircuitState::HalfOpen => {
                warn!(breaker = %self.name, "probe failed, transitioning half_open -> open");
                st.state = CircuitState::Open;
                st.opened_at = Some(Instant::now());
                st.failure_count = self.config.failure_threshold;
            }
            CircuitState::Open => {}
        }
    }

    /// Privileged manual reset (admin scope per spec §4.4).
    pub fn reset(&self) {
        let mut st = self.state.lock();
        *st = BreakerState::new();
    }
}

/// Process-wide registry mapping resource key -> breaker (spec §3's
/// `CircuitBreaker` entity, "A single process-wide registry maps key ->
/// breaker"). Lazily creates breakers on first reference.
pub struct CircuitBreakerRegistry {
    breakers: DashMap<String, CircuitBreaker>,
    default_config: BreakerConfig,
}

impl CircuitBreakerRegistry {
    pub fn new(default_config: BreakerConfig) -> Self {
        let registry = Self { breakers: DashMap::new(), default_config };
        for name in WELL_KNOWN_BREAKERS {
            registry.get_or_create(name);
        }
        registry
    }

    pub fn get_or_create(&self, resource_key: &str) -> CircuitBreaker {
        if let Some(existing) = self.breakers.get(resource_key) {
            return existing.clone();
        }
        let breaker = CircuitBreaker::new(resource_key, self.default_config.clone());
        self.breakers.insert(resource_key.to_string(), breaker.clone());
        breaker
    }

    pub fn snapshot(&self) -> Vec<(String, CircuitState)> {
        self.breakers.iter().map(|e| (e.key().clone(), e.value().current_state())).collect()
    }
}

impl Default for CircuitBreakerRegistry {
    fn default() -> Self {
        Self::new(BreakerConfig::default())
    }
}
