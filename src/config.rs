// src/config.rs
use log::warn;
use std::env;
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_LIVE_PRICE_URL: &str =
    "https://api.coingecko.com/api/v3/simple/price?ids=bitcoin&vs_currencies=usd";

#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    /// Directory or http(s) base URL the CSV candidates are resolved against.
    pub data_base: String,
    pub live_price_url: String,
    pub prefs_path: PathBuf,
    pub refresh_interval: Duration,
    pub api_timeout: Duration,
    pub csv_timeout: Duration,
    pub error_display: Duration,
    pub fill_year_gaps: bool,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            port: 3030,
            data_base: ".".to_string(),
            live_price_url: DEFAULT_LIVE_PRICE_URL.to_string(),
            prefs_path: PathBuf::from("btc_this_day_prefs.json"),
            refresh_interval: Duration::from_secs(120),
            api_timeout: Duration::from_secs(10),
            csv_timeout: Duration::from_secs(5),
            error_display: Duration::from_secs(5),
            fill_year_gaps: false,
        }
    }
}

impl Config {
    /// Read configuration from the environment. Call `dotenv().ok()` first
    /// if a `.env` file should be honoured.
    pub fn from_env() -> Self {
        let defaults = Config::default();

        Config {
            port: parse_var("PORT", defaults.port),
            data_base: env::var("BTC_DATA_BASE").unwrap_or(defaults.data_base),
            live_price_url: env::var("BTC_LIVE_PRICE_URL").unwrap_or(defaults.live_price_url),
            prefs_path: env::var("BTC_PREFS_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.prefs_path),
            refresh_interval: secs_var("BTC_REFRESH_SECS", defaults.refresh_interval),
            api_timeout: secs_var("BTC_API_TIMEOUT_SECS", defaults.api_timeout),
            csv_timeout: secs_var("BTC_CSV_TIMEOUT_SECS", defaults.csv_timeout),
            error_display: secs_var("BTC_ERROR_DISPLAY_SECS", defaults.error_display),
            fill_year_gaps: parse_var("BTC_FILL_YEAR_GAPS", defaults.fill_year_gaps),
        }
    }
}

fn parse_var<T: std::str::FromStr + std::fmt::Display>(name: &str, default: T) -> T {
    match env::var(name) {
        Ok(raw) => raw.trim().parse().unwrap_or_else(|_| {
            warn!("${} has invalid value {:?}, defaulting to {}", name, raw, default);
            default
        }),
        Err(_) => default,
    }
}

/// Whole seconds, at least one; zero is treated like any other invalid value.
fn secs_var(name: &str, default: Duration) -> Duration {
    match parse_var(name, default.as_secs()) {
        0 => {
            warn!("${} must be at least 1 second, defaulting to {:?}", name, default);
            default
        }
        secs => Duration::from_secs(secs),
    }
}
