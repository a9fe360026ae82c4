use crate::application::bootstrap::AppContext;
use crate::domain::errors::AppError;
use crate::interfaces::http::auth::AuthUser;
use crate::interfaces::http::dto::{AlertRequest, AlertResponse};
use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use std::sync::Arc;

pub async fn list_alerts(
    State(ctx): State<Arc<AppContext>>,
    AuthUser(user): AuthUser,
) -> Result<Json<Vec<AlertResponse>>, AppError> {
    let alerts = ctx.alerts.list_for_owner(&user.id).await?;
    Ok(Json(alerts.into_iter().map(AlertResponse::from).collect()))
}

pub async fn create_alert(
    State(ctx): State<Arc<AppContext>>,
    AuthUser(user): AuthUser,
    Json(req): Json<AlertRequest>,
) -> Result<(StatusCode, Json<AlertResponse>), AppError> {
    let alert = ctx.alerts.arm(&user.id, &req.symbol, req.condition, req.threshold).await?;
    Ok((StatusCode::CREATED, Json(alert.into())))
}

pub async fn delete_alert(
    State(ctx): State<Arc<AppContext>>,
    AuthUser(user): AuthUser,
    Path(alert_id): Path<String>,
) -> Result<StatusCode, AppError> {
    ctx.alerts.dismiss(&user.id, &alert_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
