//! Maps `AppError` to the wire status codes of spec §7's taxonomy table.
//! The only place in the crate that is allowed to know HTTP exists.

use crate::domain::errors::AppError;
use axum::Json;
use axum::http::{HeaderValue, StatusCode, header};
use axum::response::{IntoResponse, Response};
use serde_json::json;

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let retry_after_secs = match &self {
            AppError::BreakerOpen { retry_after_secs, .. } => Some(*retry_after_secs),
            _ => None,
        };

        let (status, kind, message, details) = match self {
            AppError::Validation { message, details } => {
                (StatusCode::BAD_REQUEST, "validation_error", message, details)
            }
            AppError::Auth { message } => (StatusCode::UNAUTHORIZED, "auth_error", message, json!(null)),
            AppError::Forbidden { message } => (StatusCode::FORBIDDEN, "forbidden_error", message, json!(null)),
            AppError::NotFound { message } => (StatusCode::NOT_FOUND, "not_found_error", message, json!(null)),
            AppError::Conflict { message } => (StatusCode::CONFLICT, "conflict_error", message, json!(null)),
            AppError::RiskDenied { reason, details } => {
                (StatusCode::UNPROCESSABLE_ENTITY, "risk_denied", reason, details)
            }
            AppError::InsufficientFunds { message } => {
                (StatusCode::UNPROCESSABLE_ENTITY, "insufficient_funds_error", message, json!(null))
            }
            AppError::MarketClosed { message } => {
                (StatusCode::UNPROCESSABLE_ENTITY, "market_closed_error", message, json!(null))
            }
            AppError::BreakerOpen { resource, retry_after_secs } => (
                StatusCode::SERVICE_UNAVAILABLE,
                "breaker_open",
                format!("{resource} is temporarily unavailable"),
                json!({ "resource": resource, "retry_after_secs": retry_after_secs }),
            ),
            AppError::Upstream { message, retryable } => (
                if retryable { StatusCode::GATEWAY_TIMEOUT } else { StatusCode::BAD_GATEWAY },
                "upstream_error",
                message,
                json!(null),
            ),
            AppError::Vault(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "vault_error",
                "a secret operation failed".to_string(),
                json!(null),
            ),
            AppError::Internal { correlation_id, message } => {
                tracing::error!(correlation_id, message, "internal error reached the HTTP boundary");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal_error",
                    "an unexpected error occurred".to_string(),
                    json!({ "correlation_id": correlation_id }),
                )
            }
        };

        let mut body = json!({ "error": kind, "message": message });
        if !details.is_null()
            && let Some(obj) = body.as_object_mut()
        {
            obj.insert("details".to_string(), details);
        }

        let mut response = (status, Json(body)).into_response();
        if let Some(secs) = retry_after_secs
            && let Ok(value) = HeaderValue::from_str(&secs.to_string())
        {
            response.headers_mut().insert(header::RETRY_AFTER, value);
        }
        response
    }
}
