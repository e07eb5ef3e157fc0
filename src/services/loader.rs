// src/services/loader.rs
use log::{debug, info, warn};
use reqwest::Client;
use std::future::Future;
use std::path::PathBuf;
use std::time::Duration;

use crate::models::{DataSource, PriceMap};
use super::csv_parser::{has_header_sentinel, parse_price_csv};
use super::error::PipelineError;
use super::sample_data::SAMPLE_HISTORICAL_CSV;

/// Candidate names, tried in order.
pub const CSV_CANDIDATES: [&str; 4] = [
    "Bitcoin%20Historical%20Data_missing%20data.csv",
    "Bitcoin Historical Data_missing data.csv",
    "btc-historical-price.csv",
    "btc-historical-price",
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CsvSource {
    File(PathBuf),
    Url(String),
}

impl CsvSource {
    /// Resolve a candidate name against a directory or an http(s) base URL.
    pub fn resolve(base: &str, name: &str) -> Self {
        if base.starts_with("http://") || base.starts_with("https://") {
            CsvSource::Url(format!("{}/{}", base.trim_end_matches('/'), name))
        } else {
            CsvSource::File(PathBuf::from(base).join(name))
        }
    }

    pub fn label(&self) -> String {
        match self {
            CsvSource::File(path) => path.display().to_string(),
            CsvSource::Url(url) => url.clone(),
        }
    }

    async fn read(&self, client: &Client) -> Result<String, PipelineError> {
        match self {
            CsvSource::File(path) => tokio::fs::read_to_string(path)
                .await
                .map_err(|e| PipelineError::fetch(self.label(), e)),
            CsvSource::Url(url) => {
                let response = client
                    .get(url)
                    .send()
                    .await
                    .map_err(|e| PipelineError::fetch(url.as_str(), e))?;
                if !response.status().is_success() {
                    return Err(PipelineError::fetch(url.as_str(), response.status()));
                }
                response
                    .text()
                    .await
                    .map_err(|e| PipelineError::fetch(url.as_str(), e))
            }
        }
    }

    /// Read the candidate and accept it only if it carries a CSV header.
    pub async fn fetch_csv(&self, client: &Client) -> Result<String, PipelineError> {
        let text = self.read(client).await?;
        if !has_header_sentinel(&text) {
            return Err(PipelineError::fetch(self.label(), "unrecognized header"));
        }
        Ok(text)
    }
}

/// Run suppliers in order, each bounded by `per_attempt`, and return the
/// first success with its label. A timed-out attempt is dropped whole.
pub async fn first_success<T, F, Fut>(
    suppliers: impl IntoIterator<Item = (String, F)>,
    per_attempt: Duration,
) -> Option<(String, T)>
where
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<T, PipelineError>>,
{
    for (label, supplier) in suppliers {
        match tokio::time::timeout(per_attempt, supplier()).await {
            Ok(Ok(value)) => return Some((label, value)),
            Ok(Err(e)) => debug!("Skipping {}: {}", label, e),
            Err(_) => debug!("Skipping {}: timed out after {:?}", label, per_attempt),
        }
    }
    None
}

pub fn candidate_sources(base: &str) -> Vec<CsvSource> {
    CSV_CANDIDATES
        .iter()
        .map(|name| CsvSource::resolve(base, name))
        .collect()
}

/// Text of the first candidate that loads, if any.
pub async fn fetch_first_candidate(
    client: &Client,
    sources: Vec<CsvSource>,
    per_attempt: Duration,
) -> Option<(String, String)> {
    let suppliers = sources.into_iter().map(|source| {
        let client = client.clone();
        let label = source.label();
        (label, move || async move { source.fetch_csv(&client).await })
    });
    first_success(suppliers, per_attempt).await
}

#[derive(Debug, Clone)]
pub struct LoadedPrices {
    pub prices: PriceMap,
    pub source: DataSource,
}

/// Load historical prices from the first working candidate, falling back to
/// the built-in sample when all candidates fail or parse to nothing.
pub async fn load_price_data(client: &Client, base: &str, per_attempt: Duration) -> LoadedPrices {
    if let Some((label, text)) = fetch_first_candidate(client, candidate_sources(base), per_attempt).await {
        match parse_price_csv(&text) {
            Ok(prices) => {
                info!("Loaded historical prices from {}", label);
                return LoadedPrices { prices, source: DataSource::Candidate(label) };
            }
            Err(e) => warn!("{} from {}", e, label),
        }
    } else {
        warn!("No CSV candidate under {} could be loaded", base);
    }

    sample_prices()
}

pub fn sample_prices() -> LoadedPrices {
    info!("Using built-in sample dataset");
    LoadedPrices {
        prices: parse_price_csv(SAMPLE_HISTORICAL_CSV).unwrap_or_default(),
        source: DataSource::Sample,
    }
}
