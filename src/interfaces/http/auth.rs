//! Bearer-token authentication for the HTTP boundary: JWT issuance/
//! verification (`jsonwebtoken`, HS256), password hashing (`argon2`), and
//! TOTP verification (`totp-rs`) for 2FA at login.
//!
//! Grounded on the pack's `services/gateway::middleware::auth_middleware`
//! (`jsonwebtoken::decode` against a `Claims` struct, user context attached
//! to the request) generalized from an extractor-free middleware into an
//! Axum `FromRequestParts` extractor in the style of `orc2626`'s
//! `AuthBearer`, since per-handler extraction composes more simply than a
//! path-allowlist middleware once every route but a handful is protected.

use crate::application::bootstrap::AppContext;
use crate::domain::errors::AppError;
use crate::domain::user::User;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use chrono::{Duration, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Access tokens are valid for 24 hours; there is no refresh-token flow in
/// this surface (spec §6 lists only issuance at register/login).
const TOKEN_TTL_HOURS: i64 = 24;

#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    sub: String,
    role: String,
    iat: usize,
    exp: usize,
}

pub fn issue_token(secret: &str, user: &User) -> Result<String, AppError> {
    let now = Utc::now();
    let claims = Claims {
        sub: user.id.clone(),
        role: format!("{:?}", user.role).to_lowercase(),
        iat: now.timestamp() as usize,
        exp: (now + Duration::hours(TOKEN_TTL_HOURS)).timestamp() as usize,
    };
    encode(&jsonwebtoken::Header::default(), &claims, &EncodingKey::from_secret(secret.as_bytes()))
        .map_err(|e| AppError::internal(format!("token issuance failed: {e}")))
}

pub(crate) fn decode_subject(secret: &str, token: &str) -> Result<String, AppError> {
    let data = decode::<Claims>(token, &DecodingKey::from_secret(secret.as_bytes()), &Validation::default())
        .map_err(|_| AppError::auth("invalid or expired token"))?;
    Ok(data.claims.sub)
}

/// The authenticated user for a request, resolved from the bearer token and
/// a repository lookup. Any handler parameter of this type makes the route
/// protected; routes that omit it are public (spec §6: "all protected
/// routes require a bearer token header; unauthenticated calls return
/// 401").
pub struct AuthUser(pub User);

impl FromRequestParts<Arc<AppContext>> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, ctx: &Arc<AppContext>) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get(axum::http::header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| AppError::auth("missing authorization header"))?;

        let token = header
            .strip_prefix("Bearer ")
            .ok_or_else(|| AppError::auth("authorization header must be a bearer token"))?;

        let user_id = decode_subject(&ctx.config.server.jwt_secret, token)?;
        let user = ctx
            .users
            .find_by_id(&user_id)
            .await?
            .ok_or_else(|| AppError::auth("token subject no longer exists"))?;

        Ok(AuthUser(user))
    }
}

/// Admin-only variant of [`AuthUser`], used by the kill-switch routes (spec
/// §6: `POST /kill-switch` (admin)).
pub struct AdminUser(pub User);

impl FromRequestParts<Arc<AppContext>> for AdminUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, ctx: &Arc<AppContext>) -> Result<Self, Self::Rejection> {
        let AuthUser(user) = AuthUser::from_request_parts(parts, ctx).await?;
        if !user.is_admin() {
            return Err(AppError::forbidden("this action requires an administrator account"));
        }
        Ok(AdminUser(user))
    }
}

pub fn hash_password(password: &str) -> Result<String, AppError> {
    use argon2::Argon2;
    use argon2::password_hash::{PasswordHasher, SaltString, rand_core::OsRng};

    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| AppError::internal(format!("password hashing failed: {e}")))
}

pub fn verify_password(password: &str, hash: &str) -> bool {
    use argon2::Argon2;
    use argon2::password_hash::{PasswordHash, PasswordVerifier};

    let Ok(parsed) = PasswordHash::new(hash) else { return false };
    Argon2::default().verify_password(password.as_bytes(), &parsed).is_ok()
}

/// Verify a client-supplied TOTP code against the user's enrolled secret.
/// Returns `false` for any malformed secret or code rather than erroring —
/// an invalid code is indistinguishable from a wrong one at the boundary.
pub fn verify_totp(secret_base32: &str, code: &str) -> bool {
    use totp_rs::{Algorithm, TOTP};

    let Some(secret_bytes) = base32::decode(base32::Alphabet::Rfc4648 { padding: false }, secret_base32) else {
        return false;
    };
    let Ok(totp) = TOTP::new(Algorithm::SHA1, 6, 1, 30, secret_bytes) else { return false };
    totp.check_current(code).unwrap_or(false)
}
