//! The HTTP/WebSocket transport. Generalizes `orc2626-tech-sBot9999`'s
//! `api::rest::router()` (CORS layer, flat `.route()` table,
//! `Arc`-wrapped state) from its single-tenant dashboard surface to the
//! multi-user, JWT-authenticated routes spec §6 names.

pub mod auth;
pub mod dto;
pub mod error;
pub mod handlers;

use crate::application::bootstrap::AppContext;
use axum::Router;
use axum::routing::{delete, get, post, put};
use std::sync::Arc;
use std::time::Duration;
use tower_http::cors::CorsLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

/// Request bodies time out after this long regardless of what's downstream
/// (a wedged exchange adapter must not hang a client connection forever).
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

pub fn router(ctx: Arc<AppContext>) -> Router {
    Router::new()
        .route("/health", get(handlers::health::health))
        .route("/ready", get(handlers::health::ready))
        .route("/metrics", get(handlers::health::metrics))
        .route("/auth/register", post(handlers::auth::register))
        .route("/auth/login", post(handlers::auth::login))
        .route("/portfolio", get(handlers::portfolio::get_portfolio))
        .route("/trades", get(handlers::trades::list_trades).post(handlers::trades::create_trade))
        .route("/trades/pending", get(handlers::trades::list_pending))
        .route("/trades/pending/:approval_id/approve", post(handlers::trades::approve_pending))
        .route("/trades/pending/:approval_id/reject", post(handlers::trades::reject_pending))
        .route("/trades/:trade_id/close", post(handlers::trades::close_trade))
        .route("/platforms", get(handlers::platforms::list_platforms).post(handlers::platforms::create_platform))
        .route("/platforms/:platform_id/test", put(handlers::platforms::test_platform))
        .route("/market/quotes", get(handlers::market::get_quotes))
        .route("/market/:symbol", get(handlers::market::get_quote))
        .route("/alerts", get(handlers::alerts::list_alerts).post(handlers::alerts::create_alert))
        .route("/alerts/:alert_id", delete(handlers::alerts::delete_alert))
        .route("/kill-switch", post(handlers::admin::engage_kill_switch).delete(handlers::admin::release_kill_switch))
        .route("/ai/analyze", post(handlers::ai::analyze))
        .route("/ws", get(handlers::ws::ws_handler))
        .layer(TraceLayer::new_for_http())
        .layer(TimeoutLayer::new(REQUEST_TIMEOUT))
        .layer(CorsLayer::permissive())
        .with_state(ctx)
}
