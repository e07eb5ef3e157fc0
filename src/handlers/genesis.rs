// src/handlers/genesis.rs
use log::{info, warn};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use warp::reply::Json;
use warp::Rejection;

use crate::services::context::AppContext;
use super::error::ApiError;

#[derive(Debug, Deserialize)]
pub struct GenesisRequest {
    pub date: String,
}

pub async fn set_genesis(body: GenesisRequest, ctx: Arc<AppContext>) -> Result<Json, Rejection> {
    info!("Setting genesis to {:?}", body.date);

    match ctx.set_genesis(&body.date, true).await {
        Ok(genesis) => Ok(warp::reply::json(&json!({ "my_genesis": genesis }))),
        Err(e) => {
            warn!("Genesis rejected: {}", e);
            Err(warp::reject::custom(ApiError::from(e)))
        }
    }
}

pub async fn clear_genesis(ctx: Arc<AppContext>) -> Result<Json, Rejection> {
    ctx.clear_genesis(true).await;
    Ok(warp::reply::json(&json!({ "my_genesis": null })))
}
