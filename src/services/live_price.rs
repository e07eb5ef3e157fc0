// src/services/live_price.rs
use chrono::Utc;
use log::{debug, info};
use reqwest::Client;
use serde::Deserialize;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use crate::models::LiveQuote;
use super::error::PipelineError;

#[derive(Debug, Deserialize)]
struct SimplePriceResponse {
    bitcoin: CoinPrice,
}

#[derive(Debug, Deserialize)]
struct CoinPrice {
    usd: f64,
}

/// Client for the public spot price endpoint. Only one fetch runs at a
/// time; see [`LivePriceService::try_begin`].
pub struct LivePriceService {
    client: Client,
    url: String,
    in_flight: AtomicBool,
}

/// Marks a fetch as in flight until dropped.
pub struct FetchGuard<'a> {
    flag: &'a AtomicBool,
}

impl Drop for FetchGuard<'_> {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::SeqCst);
    }
}

impl LivePriceService {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self, PipelineError> {
        let url = url.into();
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("btc_this_day/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| PipelineError::fetch(url.as_str(), e))?;

        Ok(LivePriceService {
            client,
            url,
            in_flight: AtomicBool::new(false),
        })
    }

    /// Claim the fetch slot. `None` while another fetch is outstanding.
    pub fn try_begin(&self) -> Option<FetchGuard<'_>> {
        if self.in_flight.swap(true, Ordering::SeqCst) {
            debug!("Live price fetch already in flight");
            return None;
        }
        Some(FetchGuard { flag: &self.in_flight })
    }

    pub fn is_fetching(&self) -> bool {
        self.in_flight.load(Ordering::SeqCst)
    }

    /// One GET against the endpoint. Non-2xx, timeouts and any deviation
    /// from `{"bitcoin":{"usd":<number>}}` are fetch failures.
    pub async fn fetch_quote(&self) -> Result<LiveQuote, PipelineError> {
        debug!("Fetching live price from {}", self.url);
        let response = self
            .client
            .get(&self.url)
            .send()
            .await
            .map_err(|e| PipelineError::fetch(self.url.as_str(), e))?;

        if !response.status().is_success() {
            return Err(PipelineError::fetch(
                self.url.as_str(),
                format!("API returned {}", response.status()),
            ));
        }

        let body: SimplePriceResponse = response
            .json()
            .await
            .map_err(|e| PipelineError::fetch(self.url.as_str(), format!("Invalid API response shape: {}", e)))?;

        if !body.bitcoin.usd.is_finite() {
            return Err(PipelineError::fetch(self.url.as_str(), "Invalid API response shape"));
        }

        info!("Live BTC price: {}", body.bitcoin.usd);
        Ok(LiveQuote {
            price: body.bitcoin.usd,
            timestamp: Utc::now(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;
    use std::sync::Arc;
    use warp::Filter;

    macro_rules! serve {
        ($filter:expr) => {{
            let (addr, server) = warp::serve($filter).bind_ephemeral(([127, 0, 0, 1], 0));
            tokio::spawn(server);
            addr
        }};
    }

    #[tokio::test]
    async fn parses_simple_price_response() {
        let addr = serve!(warp::any().map(|| warp::reply::json(&serde_json::json!({"bitcoin": {"usd": 97_123.5}}))));
        let service = LivePriceService::new(format!("http://{}/price", addr), Duration::from_secs(2)).unwrap();
        let quote = service.fetch_quote().await.unwrap();
        assert_eq!(quote.price, 97_123.5);
    }

    #[tokio::test]
    async fn wrong_shape_is_a_failure() {
        let addr = serve!(warp::any().map(|| warp::reply::json(&serde_json::json!({"bitcoin": {"usd": "97123"}}))));
        let service = LivePriceService::new(format!("http://{}/", addr), Duration::from_secs(2)).unwrap();
        assert!(matches!(service.fetch_quote().await, Err(PipelineError::FetchFailure { .. })));
    }

    #[tokio::test]
    async fn non_success_status_is_a_failure() {
        let addr = serve!(warp::any().map(|| {
            warp::reply::with_status(
                warp::reply::json(&serde_json::json!({"bitcoin": {"usd": 1.0}})),
                warp::http::StatusCode::TOO_MANY_REQUESTS,
            )
        }));
        let service = LivePriceService::new(format!("http://{}/", addr), Duration::from_secs(2)).unwrap();
        let err = service.fetch_quote().await.unwrap_err();
        assert!(err.to_string().contains("429"), "{}", err);
    }

    #[tokio::test]
    async fn slow_endpoint_times_out() {
        let addr = serve!(warp::any().and_then(|| async {
            tokio::time::sleep(Duration::from_secs(2)).await;
            Ok::<_, warp::Rejection>(warp::reply::json(&serde_json::json!({"bitcoin": {"usd": 1.0}})))
        }));
        let service = LivePriceService::new(format!("http://{}/", addr), Duration::from_millis(100)).unwrap();
        assert!(service.fetch_quote().await.is_err());
    }

    #[tokio::test]
    async fn only_one_fetch_in_flight() {
        let hits = Arc::new(AtomicUsize::new(0));
        let counter = hits.clone();
        let addr = serve!(warp::any().and_then(move || {
            let counter = counter.clone();
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                tokio::time::sleep(Duration::from_millis(200)).await;
                Ok::<_, warp::Rejection>(warp::reply::json(&serde_json::json!({"bitcoin": {"usd": 2.0}})))
            }
        }));
        let service = LivePriceService::new(format!("http://{}/", addr), Duration::from_secs(2)).unwrap();

        let first = async {
            let _guard = service.try_begin().expect("slot free");
            service.fetch_quote().await
        };
        let second = async {
            tokio::time::sleep(Duration::from_millis(20)).await;
            service.try_begin().is_none()
        };
        let (quote, suppressed) = tokio::join!(first, second);

        assert_eq!(quote.unwrap().price, 2.0);
        assert!(suppressed);
        assert_eq!(hits.load(Ordering::SeqCst), 1);
        assert!(!service.is_fetching());
    }
}
