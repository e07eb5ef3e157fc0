// src/bin/probe_live_price.rs
use btc_this_day::config::Config;
use btc_this_day::services::live_price::LivePriceService;
use btc_this_day::services::views::format_currency;
use log::{info, error};
use env_logger;
use dotenv::dotenv;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenv().ok();
    env_logger::init();

    let config = Config::from_env();
    info!("Testing live price fetching from {}...", config.live_price_url);

    let service = LivePriceService::new(config.live_price_url, config.api_timeout)?;
    match service.fetch_quote().await {
        Ok(quote) => {
            info!("SUCCESS: BTC/USD {} at {}", format_currency(Some(quote.price)), quote.timestamp);
        }
        Err(e) => {
            error!("ERROR: Failed to fetch live price: {}", e);
            return Err(e.into());
        }
    }

    Ok(())
}
