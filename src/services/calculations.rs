// src/services/calculations.rs
use crate::models::{AnnotatedEntry, SeriesEntry};

/// Number of positions back used for the compound growth column.
pub const CAGR_WINDOW: usize = 5;

pub fn percent_change(from: f64, to: f64) -> Option<f64> {
    if from <= 0.0 {
        return None;
    }
    Some((to - from) / from * 100.0)
}

fn calculate_cagr(start_value: f64, end_value: f64, years: f64) -> Option<f64> {
    if start_value <= 0.0 || years <= 0.0 {
        None
    } else {
        Some(((end_value / start_value).powf(1.0 / years) - 1.0) * 100.0)
    }
}

/// Annotate a year-ascending series with return since its first entry and
/// the 5-position CAGR. Pure; recomputed in full whenever the series changes.
pub fn calculate_metrics(series: &[SeriesEntry]) -> Vec<AnnotatedEntry> {
    let genesis_price = series.first().and_then(|e| e.price);

    series
        .iter()
        .enumerate()
        .map(|(i, entry)| {
            let return_since_genesis = match (genesis_price, entry.price) {
                (Some(base), Some(price)) => percent_change(base, price),
                _ => None,
            };

            let cagr_5y = if i >= CAGR_WINDOW {
                match (series[i - CAGR_WINDOW].price, entry.price) {
                    (Some(start), Some(end)) => calculate_cagr(start, end, CAGR_WINDOW as f64),
                    _ => None,
                }
            } else {
                None
            };

            AnnotatedEntry {
                year: entry.year,
                date: entry.date,
                price: entry.price,
                year_key: entry.year_key(),
                return_since_genesis,
                cagr_5y,
                return_since_my_genesis: None,
                is_my_genesis: false,
            }
        })
        .collect()
}
