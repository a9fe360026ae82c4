use crate::application::bootstrap::AppContext;
use crate::interfaces::http::auth::AdminUser;
use axum::Json;
use axum::extract::State;
use serde_json::{Value, json};
use std::sync::Arc;

pub async fn engage_kill_switch(State(ctx): State<Arc<AppContext>>, AdminUser(user): AdminUser) -> Json<Value> {
    ctx.router.trip_global_kill_switch(&user.id).await;
    Json(json!({ "kill_switch": "engaged" }))
}

pub async fn release_kill_switch(State(ctx): State<Arc<AppContext>>, AdminUser(user): AdminUser) -> Json<Value> {
    ctx.router.release_global_kill_switch(&user.id).await;
    Json(json!({ "kill_switch": "released" }))
}
