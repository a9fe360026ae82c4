//! `POST /ai/analyze` — supplemental to spec §6's representative list but
//! implied by §1's "AI-assisted analyses"; authenticated like every other
//! protected route, and absent a configured provider it is hidden entirely
//! (404) rather than returning a degraded response (spec §6: "AI_PROVIDER_KEY
//! absence disables the /ai/analyze endpoint").

use crate::application::bootstrap::AppContext;
use crate::domain::errors::AppError;
use crate::interfaces::http::auth::AuthUser;
use axum::Json;
use axum::extract::State;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

#[derive(Debug, Deserialize)]
pub struct AnalyzeRequest {
    pub prompt: String,
}

#[derive(Debug, Serialize)]
pub struct AnalyzeResponse {
    pub text: String,
    pub degraded: bool,
}

pub async fn analyze(
    State(ctx): State<Arc<AppContext>>,
    AuthUser(_user): AuthUser,
    Json(req): Json<AnalyzeRequest>,
) -> Result<Json<AnalyzeResponse>, AppError> {
    if ctx.config.ai_provider_key.is_none() {
        return Err(AppError::not_found("AI analysis is not enabled for this deployment"));
    }
    let analysis = ctx.ai.analyze(&req.prompt).await;
    Ok(Json(AnalyzeResponse { text: analysis.text, degraded: analysis.degraded }))
}
