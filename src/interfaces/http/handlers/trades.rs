use crate::application::bootstrap::AppContext;
use crate::application::router::SubmissionOutcome;
use crate::domain::errors::AppError;
use crate::domain::order::{OrderType, TradeOrder};
use crate::interfaces::http::auth::AuthUser;
use crate::interfaces::http::dto::{SubmissionResponse, TradeRequest, TradeResponse};
use axum::Json;
use axum::extract::{Path, State};
use serde::Serialize;
use std::sync::Arc;

pub async fn list_trades(
    State(ctx): State<Arc<AppContext>>,
    AuthUser(user): AuthUser,
) -> Result<Json<Vec<TradeResponse>>, AppError> {
    let trades = ctx.trades.list_for_owner(&user.id).await?;
    Ok(Json(trades.into_iter().map(TradeResponse::from).collect()))
}

pub async fn create_trade(
    State(ctx): State<Arc<AppContext>>,
    AuthUser(user): AuthUser,
    Json(req): Json<TradeRequest>,
) -> Result<Json<SubmissionResponse>, AppError> {
    let stop_price = match req.order_type {
        OrderType::StopLoss => req.stop_loss,
        OrderType::TakeProfit => req.take_profit,
        OrderType::Market | OrderType::Limit => None,
    };
    let order = TradeOrder {
        owner_id: user.id.clone(),
        symbol: req.symbol,
        side: req.side,
        order_type: req.order_type,
        quantity: req.quantity,
        limit_price: req.limit_price,
        stop_price,
        platform_id: req.platform_id,
        idempotency_key: req.idempotency_key,
    };

    let outcome = ctx.router.submit_order(&user, order).await?;
    let response = match outcome {
        SubmissionOutcome::Recorded { message } => SubmissionResponse::Recorded { message },
        SubmissionOutcome::PendingApproval { approval_id, expires_at } => {
            SubmissionResponse::PendingApproval { approval_id, expires_at }
        }
        SubmissionOutcome::Executed(trade) => SubmissionResponse::Executed(trade.into()),
    };
    Ok(Json(response))
}

pub async fn close_trade(
    State(ctx): State<Arc<AppContext>>,
    AuthUser(user): AuthUser,
    Path(trade_id): Path<String>,
) -> Result<Json<TradeResponse>, AppError> {
    let trade = ctx.router.close_trade(&user, &trade_id).await?;
    Ok(Json(trade.into()))
}

#[derive(Debug, Serialize)]
pub struct PendingApprovalDto {
    pub approval_id: String,
    pub symbol: String,
    pub expires_at: chrono::DateTime<chrono::Utc>,
}

pub async fn list_pending(
    State(ctx): State<Arc<AppContext>>,
    AuthUser(user): AuthUser,
) -> Json<Vec<PendingApprovalDto>> {
    let pending = ctx
        .router
        .pending_approvals_for(&user.id)
        .into_iter()
        .map(|p| PendingApprovalDto { approval_id: p.id, symbol: p.order.symbol, expires_at: p.expires_at })
        .collect();
    Json(pending)
}

pub async fn approve_pending(
    State(ctx): State<Arc<AppContext>>,
    AuthUser(user): AuthUser,
    Path(approval_id): Path<String>,
) -> Result<Json<TradeResponse>, AppError> {
    let trade = ctx.router.approve_pending(&user, &approval_id).await?;
    Ok(Json(trade.into()))
}

pub async fn reject_pending(
    State(ctx): State<Arc<AppContext>>,
    AuthUser(user): AuthUser,
    Path(approval_id): Path<String>,
) -> Result<axum::http::StatusCode, AppError> {
    ctx.router.reject_pending(&user, &approval_id).await?;
    Ok(axum::http::StatusCode::NO_CONTENT)
}
