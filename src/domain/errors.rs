//! Cross-cutting error taxonomy (spec §7).
//!
//! Every subsystem surface returns `AppError`. The HTTP boundary
//! (`interfaces::http::error_response`) is the *only* place that maps a
//! variant to a status code; nothing upstream of it should know about HTTP.

use serde_json::{Value, json};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("validation error: {message}")]
    Validation { message: String, details: Value },

    #[error("authentication required or invalid")]
    Auth { message: String },

    #[error("forbidden: {message}")]
    Forbidden { message: String },

    #[error("not found: {message}")]
    NotFound { message: String },

    #[error("conflict: {message}")]
    Conflict { message: String },

    #[error("risk denied: {reason}")]
    RiskDenied { reason: String, details: Value },

    #[error("circuit breaker open for {resource}")]
    BreakerOpen { resource: String, retry_after_secs: u64 },

    /// An exchange rejected an order for lack of funds. Client-caused, like
    /// `Validation`/`RiskDenied`: does not indicate the exchange is unwell.
    #[error("insufficient funds: {message}")]
    InsufficientFunds { message: String },

    /// An exchange rejected an order because the market is closed. Also
    /// client/market-state-caused, not an upstream health signal.
    #[error("market closed: {message}")]
    MarketClosed { message: String },

    #[error("upstream error: {message}")]
    Upstream { message: String, retryable: bool },

    #[error("vault error: {0}")]
    Vault(String),

    #[error("internal error: {correlation_id}")]
    Internal { correlation_id: String, message: String },
}

impl AppError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation { message: message.into(), details: Value::Null }
    }

    pub fn validation_with(message: impl Into<String>, details: Value) -> Self {
        Self::Validation { message: message.into(), details }
    }

    pub fn auth(message: impl Into<String>) -> Self {
        Self::Auth { message: message.into() }
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::Forbidden { message: message.into() }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound { message: message.into() }
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::Conflict { message: message.into() }
    }

    pub fn risk_denied(reason: impl Into<String>) -> Self {
        let reason = reason.into();
        Self::RiskDenied { details: json!({ "reason": reason }), reason }
    }

    pub fn breaker_open(resource: impl Into<String>, retry_after_secs: u64) -> Self {
        Self::BreakerOpen { resource: resource.into(), retry_after_secs }
    }

    pub fn insufficient_funds(message: impl Into<String>) -> Self {
        Self::InsufficientFunds { message: message.into() }
    }

    pub fn market_closed(message: impl Into<String>) -> Self {
        Self::MarketClosed { message: message.into() }
    }

    pub fn upstream(message: impl Into<String>, retryable: bool) -> Self {
        Self::Upstream { message: message.into(), retryable }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            correlation_id: uuid::Uuid::new_v4().to_string(),
            message: message.into(),
        }
    }

    /// Whether a failure of this kind should count against a circuit breaker.
    /// Client-caused failures (bad input, denied by risk policy) should not.
    pub fn counts_toward_breaker(&self) -> bool {
        !matches!(
            self,
            AppError::Validation { .. }
                | AppError::RiskDenied { .. }
                | AppError::InsufficientFunds { .. }
                | AppError::MarketClosed { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_caused_errors_do_not_trip_breakers() {
        assert!(!AppError::validation("bad qty").counts_toward_breaker());
        assert!(!AppError::risk_denied("per_trade_exposure_exceeded").counts_toward_breaker());
        assert!(!AppError::insufficient_funds("account has insufficient balance").counts_toward_breaker());
        assert!(!AppError::market_closed("market is closed").counts_toward_breaker());
    }

    #[test]
    fn upstream_errors_trip_breakers() {
        assert!(AppError::upstream("timeout", true).counts_toward_breaker());
        assert!(AppError::internal("bug").counts_toward_breaker());
    }
}
