use env_logger;
use log::{error, info};
use dotenv::dotenv;
use warp::Filter;
use std::net::SocketAddr;

use btc_this_day::config::Config;
use btc_this_day::routes;
use btc_this_day::services::context::AppContext;
use btc_this_day::services::refresh::spawn_auto_refresh;

#[tokio::main]
async fn main() {
    dotenv().ok();
    // Initialize the logger
    env_logger::init();
    info!("Logger initialized. Starting the application...");

    let config = Config::from_env();
    info!("Using PORT: {}", config.port);
    info!("CSV candidates resolved against {}", config.data_base);

    let addr: SocketAddr = ([0, 0, 0, 0], config.port).into();
    info!("Will bind to: {}", addr);

    // Set up CORS
    let cors = warp::cors()
        .allow_any_origin()
        .allow_header("content-type")
        .allow_methods(vec!["GET", "POST", "PUT", "DELETE"]);

    match AppContext::initialize(config).await {
        Ok(ctx) => {
            let _refresh = spawn_auto_refresh(ctx.clone());

            let api = routes::routes(ctx).with(cors);
            info!("Routes configured successfully with CORS.");

            info!("Starting server on {}", addr);
            warp::serve(api).run(addr).await;
        }
        Err(e) => {
            error!("Initialization failed: {}", e);
            let api = routes::fatal_routes(format!("Failed to initialize: {}", e)).with(cors);
            warp::serve(api).run(addr).await;
        }
    }
}
