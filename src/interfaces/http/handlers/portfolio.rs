use crate::application::bootstrap::AppContext;
use crate::domain::errors::AppError;
use crate::interfaces::http::auth::AuthUser;
use crate::interfaces::http::dto::PortfolioResponse;
use axum::Json;
use axum::extract::State;
use std::sync::Arc;

pub async fn get_portfolio(
    State(ctx): State<Arc<AppContext>>,
    AuthUser(user): AuthUser,
) -> Result<Json<PortfolioResponse>, AppError> {
    let portfolio = ctx.portfolios.snapshot(&user.id).await?;
    Ok(Json(portfolio.into()))
}
