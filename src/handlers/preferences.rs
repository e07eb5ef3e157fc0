// src/handlers/preferences.rs
use log::info;
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use warp::reply::Json;
use warp::Rejection;

use crate::models::ChartScale;
use crate::services::context::AppContext;
use super::error::ApiError;

#[derive(Debug, Deserialize)]
pub struct ScaleRequest {
    pub scale: String,
}

pub async fn set_chart_scale(body: ScaleRequest, ctx: Arc<AppContext>) -> Result<Json, Rejection> {
    let scale: ChartScale = body
        .scale
        .parse()
        .map_err(|e: String| warp::reject::custom(ApiError::bad_request(e)))?;

    info!("Chart scale set to {}", scale);
    ctx.set_chart_scale(scale, true).await;
    Ok(warp::reply::json(&json!({ "scale": scale })))
}
