// src/handlers/series.rs
use chrono::Utc;
use log::debug;
use std::sync::Arc;
use warp::reply::Json;
use warp::Rejection;

use crate::services::context::AppContext;
use crate::services::views::{build_chart, build_status, build_table, build_timeline};

pub async fn get_series(ctx: Arc<AppContext>) -> Result<Json, Rejection> {
    let series = ctx.with_current_state(|state| state.display_series()).await;
    debug!("Serving {} series entries", series.len());
    Ok(warp::reply::json(&series))
}

pub async fn get_table(ctx: Arc<AppContext>) -> Result<Json, Rejection> {
    let table = ctx.with_current_state(build_table).await;
    Ok(warp::reply::json(&table))
}

pub async fn get_timeline(ctx: Arc<AppContext>) -> Result<Json, Rejection> {
    let timeline = ctx.with_current_state(build_timeline).await;
    Ok(warp::reply::json(&timeline))
}

pub async fn get_chart(ctx: Arc<AppContext>) -> Result<Json, Rejection> {
    let chart = ctx.with_current_state(build_chart).await;
    Ok(warp::reply::json(&chart))
}

pub async fn get_status(ctx: Arc<AppContext>) -> Result<Json, Rejection> {
    let fetching = ctx.live.is_fetching();
    let status = ctx
        .with_current_state(|state| build_status(state, Utc::now(), fetching))
        .await;
    Ok(warp::reply::json(&status))
}
