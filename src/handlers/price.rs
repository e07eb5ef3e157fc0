// src/handlers/price.rs
use log::info;
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use warp::reply::Json;
use warp::Rejection;

use crate::services::context::AppContext;

#[derive(Debug, Deserialize)]
pub struct VisibilityRequest {
    pub visible: bool,
}

/// User-initiated refresh. A failed fetch is reported through the status,
/// not as an HTTP error.
pub async fn refresh_price(ctx: Arc<AppContext>) -> Result<Json, Rejection> {
    info!("Handling manual live price refresh");
    let quote = ctx.refresh_live_price(true).await;
    let status = ctx.state.read().await.status.clone();
    Ok(warp::reply::json(&json!({
        "live_quote": quote,
        "status": status,
    })))
}

pub async fn set_visibility(body: VisibilityRequest, ctx: Arc<AppContext>) -> Result<Json, Rejection> {
    let quote = ctx.set_visibility(body.visible).await;
    Ok(warp::reply::json(&json!({
        "visible": body.visible,
        "live_quote": quote,
    })))
}
