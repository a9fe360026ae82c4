use crate::application::bootstrap::AppContext;
use crate::domain::errors::AppError;
use crate::interfaces::http::dto::{QuoteResponse, QuotesQuery};
use axum::Json;
use axum::extract::{Path, Query, State};
use std::collections::HashMap;
use std::sync::Arc;

pub async fn get_quote(
    State(ctx): State<Arc<AppContext>>,
    Path(symbol): Path<String>,
) -> Result<Json<QuoteResponse>, AppError> {
    let quote = ctx.aggregator.get_quote(&symbol).await?;
    Ok(Json(quote.into()))
}

pub async fn get_quotes(
    State(ctx): State<Arc<AppContext>>,
    Query(query): Query<QuotesQuery>,
) -> Json<HashMap<String, QuoteResponse>> {
    let symbols: Vec<String> = query.symbols.split(',').map(|s| s.trim().to_string()).filter(|s| !s.is_empty()).collect();
    let quotes = ctx.aggregator.get_quotes(&symbols).await;
    Json(quotes.into_iter().map(|(symbol, quote)| (symbol, quote.into())).collect())
}
