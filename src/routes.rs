// src/routes.rs
use std::sync::Arc;
use warp::reject::Rejection;
use crate::handlers::{
    genesis::{clear_genesis, set_genesis},
    preferences::set_chart_scale,
    price::{refresh_price, set_visibility},
    series::{get_chart, get_series, get_status, get_table, get_timeline},
};
use crate::services::context::AppContext;
use log::info;

use std::convert::Infallible;
use warp::{Filter, Reply};
use crate::handlers::error::ApiError;

// Turn rejections into `{"error": ...}` bodies
async fn handle_rejection(err: Rejection) -> Result<impl Reply, Infallible> {
    let code;
    let message;

    if err.is_not_found() {
        code = warp::http::StatusCode::NOT_FOUND;
        message = "Not Found".to_string();
    } else if let Some(api_error) = err.find::<ApiError>() {
        code = api_error.status;
        message = api_error.message.clone();
    } else if let Some(e) = err.find::<warp::filters::body::BodyDeserializeError>() {
        code = warp::http::StatusCode::BAD_REQUEST;
        message = e.to_string();
    } else if err.find::<warp::reject::PayloadTooLarge>().is_some() {
        code = warp::http::StatusCode::PAYLOAD_TOO_LARGE;
        message = "Payload Too Large".to_string();
    } else if err.find::<warp::reject::LengthRequired>().is_some() {
        code = warp::http::StatusCode::LENGTH_REQUIRED;
        message = "Length Required".to_string();
    } else if err.find::<warp::reject::UnsupportedMediaType>().is_some() {
        code = warp::http::StatusCode::UNSUPPORTED_MEDIA_TYPE;
        message = "Unsupported Media Type".to_string();
    } else if err.find::<warp::reject::MethodNotAllowed>().is_some() {
        code = warp::http::StatusCode::METHOD_NOT_ALLOWED;
        message = "Method Not Allowed".to_string();
    } else {
        code = warp::http::StatusCode::INTERNAL_SERVER_ERROR;
        message = "Internal Server Error".to_string();
    }

    Ok(warp::reply::with_status(
        warp::reply::json(&serde_json::json!({
            "error": message,
        })),
        code,
    ))
}

fn json_body<T: serde::de::DeserializeOwned + Send>() -> impl Filter<Extract = (T,), Error = Rejection> + Clone {
    warp::body::content_length_limit(4 * 1024).and(warp::body::json())
}

pub fn routes(ctx: Arc<AppContext>) -> impl Filter<Extract = impl Reply, Error = Infallible> + Clone {
    info!("Configuring routes...");

    let ctx_filter = warp::any().map(move || ctx.clone());

    let series_route = warp::path!("api" / "v1" / "series")
        .and(warp::get())
        .and(ctx_filter.clone())
        .and_then(get_series);

    let table_route = warp::path!("api" / "v1" / "table")
        .and(warp::get())
        .and(ctx_filter.clone())
        .and_then(get_table);

    let timeline_route = warp::path!("api" / "v1" / "timeline")
        .and(warp::get())
        .and(ctx_filter.clone())
        .and_then(get_timeline);

    let chart_route = warp::path!("api" / "v1" / "chart")
        .and(warp::get())
        .and(ctx_filter.clone())
        .and_then(get_chart);

    let status_route = warp::path!("api" / "v1" / "status")
        .and(warp::get())
        .and(ctx_filter.clone())
        .and_then(get_status);

    let set_genesis_route = warp::path!("api" / "v1" / "genesis")
        .and(warp::post())
        .and(json_body())
        .and(ctx_filter.clone())
        .and_then(set_genesis);

    let clear_genesis_route = warp::path!("api" / "v1" / "genesis")
        .and(warp::delete())
        .and(ctx_filter.clone())
        .and_then(clear_genesis);

    let scale_route = warp::path!("api" / "v1" / "chart" / "scale")
        .and(warp::put())
        .and(json_body())
        .and(ctx_filter.clone())
        .and_then(set_chart_scale);

    let refresh_route = warp::path!("api" / "v1" / "price" / "refresh")
        .and(warp::post())
        .and(ctx_filter.clone())
        .and_then(refresh_price);

    let visibility_route = warp::path!("api" / "v1" / "visibility")
        .and(warp::put())
        .and(json_body())
        .and(ctx_filter.clone())
        .and_then(set_visibility);

    info!("All routes configured successfully.");

    series_route
        .or(table_route)
        .or(timeline_route)
        .or(chart_route)
        .or(status_route)
        .or(set_genesis_route)
        .or(clear_genesis_route)
        .or(scale_route)
        .or(refresh_route)
        .or(visibility_route)
        .recover(handle_rejection)
}

/// Used when startup wiring failed: every API path answers with the
/// fatal message in place of data.
pub fn fatal_routes(message: String) -> impl Filter<Extract = impl Reply, Error = Infallible> + Clone {
    warp::path("api")
        .map(move || {
            warp::reply::with_status(
                warp::reply::json(&serde_json::json!({
                    "error": message.clone(),
                    "fatal": true,
                })),
                warp::http::StatusCode::INTERNAL_SERVER_ERROR,
            )
        })
        .recover(handle_rejection)
}
