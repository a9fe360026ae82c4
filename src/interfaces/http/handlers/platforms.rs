use crate::application::bootstrap::AppContext;
use crate::domain::errors::AppError;
use crate::domain::platform::{Platform, PlatformCredentials, PlatformStatus};
use crate::domain::ports::CredentialResolver;
use crate::infrastructure::adapters::ExchangeAdapterHandle;
use crate::interfaces::http::auth::AuthUser;
use crate::interfaces::http::dto::{PlatformRequest, PlatformResponse, PlatformTestResponse};
use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use chrono::Utc;
use std::sync::Arc;

pub async fn list_platforms(
    State(ctx): State<Arc<AppContext>>,
    AuthUser(user): AuthUser,
) -> Result<Json<Vec<PlatformResponse>>, AppError> {
    let platforms = ctx.platforms.list_for_owner(&user.id).await?;
    Ok(Json(platforms.into_iter().map(PlatformResponse::from).collect()))
}

pub async fn create_platform(
    State(ctx): State<Arc<AppContext>>,
    AuthUser(user): AuthUser,
    Json(req): Json<PlatformRequest>,
) -> Result<(StatusCode, Json<PlatformResponse>), AppError> {
    let existing = ctx.platforms.list_for_owner(&user.id).await?;
    let credentials =
        PlatformCredentials { api_key: req.api_key, secret_key: req.secret_key, passphrase: req.passphrase };
    let ciphertext = ctx.vault.encrypt(&credentials)?;

    let platform = Platform {
        id: uuid::Uuid::new_v4().to_string(),
        owner_id: user.id.clone(),
        name: req.name,
        kind: req.kind,
        is_sandbox: req.is_sandbox,
        is_default: existing.is_empty(),
        ciphertext,
        status: PlatformStatus::Disconnected,
        last_tested_at: None,
        created_at: Utc::now(),
    };
    ctx.platforms.insert(&platform).await?;
    Ok((StatusCode::CREATED, Json(platform.into())))
}

pub async fn test_platform(
    State(ctx): State<Arc<AppContext>>,
    AuthUser(user): AuthUser,
    Path(platform_id): Path<String>,
) -> Result<Json<PlatformTestResponse>, AppError> {
    let mut platform = ctx.platforms.find(&platform_id).await?.ok_or_else(|| AppError::not_found("no such platform"))?;
    if platform.owner_id != user.id {
        return Err(AppError::forbidden("platform does not belong to this account"));
    }

    let credentials =
        if platform.kind.is_live() { Some(ctx.vault.decrypt(&platform.ciphertext)?) } else { None };
    let base_url = ctx.config.exchanges.base_url_for(platform.kind, platform.is_sandbox);
    let adapter = ExchangeAdapterHandle::build(&platform, credentials.as_ref(), base_url, ctx.aggregator.clone())?;

    let result = adapter.test().await;
    let (status, error) = match &result {
        Ok(r) if r.ok => (PlatformStatus::Connected, None),
        Ok(r) => (PlatformStatus::Error, r.error.clone()),
        Err(e) => (PlatformStatus::Error, Some(e.to_string())),
    };

    platform.status = status;
    platform.last_tested_at = Some(Utc::now());
    ctx.platforms.update(&platform).await?;

    match result {
        Ok(r) => Ok(Json(r.into())),
        Err(_) => Ok(Json(PlatformTestResponse { ok: false, latency_ms: 0, balance_snapshot: None, error })),
    }
}
