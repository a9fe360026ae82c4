use crate::domain::ports::AiProvider;
use crate::infrastructure::circuit_breaker::{BreakerDecision, CircuitBreakerRegistry};
use std::sync::Arc;
use tracing::warn;

/// Breaker key shared with the domain's "ai:provider" naming in spec §3's
/// CircuitBreaker example.
const BREAKER_KEY: &str = "ai:provider";

#[derive(Debug, Clone, serde::Serialize)]
pub struct AiAnalysis {
    pub text: String,
    pub degraded: bool,
}

/// Wraps a raw `AiProvider` with the breaker check and the recoverable
/// degrade policy from spec §7: "on UpstreamError, endpoints return a
/// deterministic textual fallback and mark the response as degraded: true
/// rather than failing". `analyze` is deliberately infallible — there is no
/// error path left to propagate once this layer is in front of the caller.
pub struct AiService {
    provider: Option<Arc<dyn AiProvider>>,
    breakers: Arc<CircuitBreakerRegistry>,
}

impl AiService {
    /// `provider: None` models "absence disables the AI endpoints
    /// gracefully" (spec §6) — every call falls straight to the fallback.
    pub fn new(provider: Option<Arc<dyn AiProvider>>, breakers: Arc<CircuitBreakerRegistry>) -> Self {
        Self { provider, breakers }
    }

    pub async fn analyze(&self, prompt: &str) -> AiAnalysis {
        let Some(provider) = &self.provider else {
            return fallback("AI analysis is not configured for this deployment");
        };

        let breaker = self.breakers.get_or_create(BREAKER_KEY);
        if let BreakerDecision::Reject { .. } = breaker.check() {
            return fallback("AI provider is temporarily unavailable, showing a generic summary");
        }

        match provider.analyze(prompt).await {
            Ok(text) => {
                breaker.on_success();
                AiAnalysis { text, degraded: false }
            }
            Err(err) => {
                warn!(error = %err, "AI provider call failed, degrading to fallback");
                if err.counts_toward_breaker() {
                    breaker.on_failure();
                }
                fallback("AI analysis is temporarily unavailable, showing a generic summary")
            }
        }
    }
}

fn fallback(message: &str) -> AiAnalysis {
    AiAnalysis { text: message.to_string(), degraded: true }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::errors::AppError;
    use async_trait::async_trait;

    struct AlwaysFails;

    #[async_trait]
    impl AiProvider for AlwaysFails {
        async fn analyze(&self, _prompt: &str) -> Result<String, AppError> {
            Err(AppError::upstream("simulated outage", true))
        }
    }

    struct AlwaysSucceeds;

    #[async_trait]
    impl AiProvider for AlwaysSucceeds {
        async fn analyze(&self, prompt: &str) -> Result<String, AppError> {
            Ok(format!("analysis of: {prompt}"))
        }
    }

    #[tokio::test]
    async fn no_provider_configured_degrades_immediately() {
        let service = AiService::new(None, Arc::new(CircuitBreakerRegistry::default()));
        let result = service.analyze("hello").await;
        assert!(result.degraded);
    }

    #[tokio::test]
    async fn provider_failure_degrades_instead_of_propagating() {
        let service = AiService::new(Some(Arc::new(AlwaysFails)), Arc::new(CircuitBreakerRegistry::default()));
        let result = service.analyze("hello").await;
        assert!(result.degraded);
    }

    #[tokio::test]
    async fn successful_call_is_not_degraded() {
        let service = AiService::new(Some(Arc::new(AlwaysSucceeds)), Arc::new(CircuitBreakerRegistry::default()));
        let result = service.analyze("hello").await;
        assert!(!result.degraded);
        assert_eq!(result.text, "analysis of: hello");
    }

    #[tokio::test]
    async fn repeated_failures_open_the_breaker_and_short_circuit() {
        let service = AiService::new(Some(Arc::new(AlwaysFails)), Arc::new(CircuitBreakerRegistry::default()));
        for _ in 0..10 {
            service.analyze("hello").await;
        }
        // Breaker should now be open; this call must not even reach the provider.
        let result = service.analyze("hello").await;
        assert!(result.degraded);
    }
}
