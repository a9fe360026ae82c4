use crate::application::bootstrap::AppContext;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use std::sync::Arc;

pub async fn health() -> impl IntoResponse {
    axum::Json(json!({ "status": "ok", "server_time": chrono::Utc::now().to_rfc3339() }))
}

/// Dependency check (spec §6: `GET /ready` — dependencies). Verifies the
/// database pool answers a trivial query; any failure reports 503 rather
/// than panicking the request.
pub async fn ready(State(ctx): State<Arc<AppContext>>) -> Response {
    match sqlx::query("SELECT 1").execute(&ctx.db.pool).await {
        Ok(_) => axum::Json(json!({ "status": "ready" })).into_response(),
        Err(e) => {
            tracing::warn!(error = %e, "readiness check failed: database unreachable");
            (StatusCode::SERVICE_UNAVAILABLE, axum::Json(json!({ "status": "not_ready" }))).into_response()
        }
    }
}

pub async fn metrics(State(ctx): State<Arc<AppContext>>) -> impl IntoResponse {
    (
        [(axum::http::header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        ctx.metrics.render(),
    )
}
