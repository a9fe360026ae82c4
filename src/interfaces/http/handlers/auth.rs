use crate::application::bootstrap::AppContext;
use crate::domain::errors::AppError;
use crate::domain::mode::OperatingMode;
use crate::domain::user::{Role, TwoFactorState, User};
use crate::interfaces::http::auth::{hash_password, issue_token, verify_password, verify_totp};
use crate::interfaces::http::dto::{LoginRequest, LoginResponse, RegisterRequest, RegisterResponse};
use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use chrono::Utc;
use std::sync::Arc;

pub async fn register(
    State(ctx): State<Arc<AppContext>>,
    Json(req): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<RegisterResponse>), AppError> {
    if req.password.len() < 8 {
        return Err(AppError::validation("password must be at least 8 characters"));
    }
    if ctx.users.find_by_email(&req.email).await?.is_some() {
        return Err(AppError::conflict("an account with this email already exists"));
    }
    if ctx.users.find_by_username(&req.username).await?.is_some() {
        return Err(AppError::conflict("this username is already taken"));
    }

    let user = User {
        id: uuid::Uuid::new_v4().to_string(),
        email: req.email,
        username: req.username,
        password_hash: hash_password(&req.password)?,
        role: Role::User,
        two_factor: TwoFactorState::default(),
        mode: OperatingMode::default(),
        created_at: Utc::now(),
    };
    ctx.users.insert(&user).await?;
    ctx.portfolios.seed(&user.id, ctx.config.seed_balance_usd).await?;

    let access_token = issue_token(&ctx.config.server.jwt_secret, &user)?;
    Ok((StatusCode::CREATED, Json(RegisterResponse { access_token, user_id: user.id })))
}

pub async fn login(
    State(ctx): State<Arc<AppContext>>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, AppError> {
    let user = ctx.users.find_by_email(&req.email).await?.ok_or_else(|| AppError::auth("invalid credentials"))?;

    if !verify_password(&req.password, &user.password_hash) {
        return Err(AppError::auth("invalid credentials"));
    }

    if user.two_factor.enabled {
        let Some(secret) = &user.two_factor.totp_secret_base32 else {
            return Err(AppError::internal("2FA enabled without an enrolled secret"));
        };
        match &req.totp {
            Some(code) if verify_totp(secret, code) => {}
            Some(_) => return Err(AppError::forbidden("invalid 2FA code")),
            None => return Err(AppError::forbidden("2FA code required")),
        }
    }

    let access_token = issue_token(&ctx.config.server.jwt_secret, &user)?;
    Ok(Json(LoginResponse { access_token }))
}
