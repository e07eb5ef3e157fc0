// src/bin/probe_csv_sources.rs
use anyhow::Result;
use btc_this_day::config::Config;
use btc_this_day::services::csv_parser::parse_price_csv;
use btc_this_day::services::loader::candidate_sources;
use log::{info, warn};
use env_logger;
use dotenv::dotenv;
use reqwest::Client;

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();
    env_logger::init();

    let config = Config::from_env();
    let client = Client::new();

    info!("Probing CSV candidates under {}", config.data_base);
    for source in candidate_sources(&config.data_base) {
        let label = source.label();
        match tokio::time::timeout(config.csv_timeout, source.fetch_csv(&client)).await {
            Ok(Ok(text)) => match parse_price_csv(&text) {
                Ok(prices) => {
                    let first = prices.keys().next();
                    let last = prices.keys().next_back();
                    info!("{}: {} rows ({:?} .. {:?})", label, prices.len(), first, last);
                }
                Err(e) => warn!("{}: {}", label, e),
            },
            Ok(Err(e)) => warn!("{}", e),
            Err(_) => warn!("{}: timed out after {:?}", label, config.csv_timeout),
        }
    }

    Ok(())
}
