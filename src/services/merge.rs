// src/services/merge.rs
use chrono::{Datelike, NaiveDate};
use log::{debug, warn};

use crate::models::{AnnotatedEntry, LiveQuote, PriceMap, SeriesEntry, UserBaseline, YearKey};
use super::calculations::{calculate_metrics, percent_change};
use super::calendar::{fill_year_gaps, filter_calendar_day, first_record_per_year, year_range};

/// Calendar-day series for `today`, or one record per year when no year
/// has a match for today's month and day.
pub fn base_series(prices: &PriceMap, today: NaiveDate, fill_gaps: bool) -> Vec<SeriesEntry> {
    let series = filter_calendar_day(prices, today.month(), today.day());

    if series.is_empty() {
        warn!(
            "No records for {}; falling back to first record per year",
            today.format("%m/%d")
        );
        return first_record_per_year(prices);
    }

    if fill_gaps {
        if let Some((first, last)) = year_range(prices, today.year()) {
            return fill_year_gaps(&series, first, last);
        }
    }

    series
}

/// Overlay the live price on the current year: update that year's entry in
/// place or append one dated today. Applying the same quote twice is the
/// same as applying it once.
pub fn apply_live_quote(series: &[SeriesEntry], quote: &LiveQuote, today: NaiveDate) -> Vec<SeriesEntry> {
    let mut updated = series.to_vec();

    match updated.iter_mut().find(|e| e.year == today.year()) {
        Some(entry) => {
            entry.price = Some(quote.price);
            if entry.date.is_none() {
                entry.date = Some(today);
            }
        }
        None => updated.push(SeriesEntry {
            year: today.year(),
            date: Some(today),
            price: Some(quote.price),
        }),
    }

    updated.sort_by_key(|e| e.year);
    updated
}

/// Merge the user's genesis into an annotated series.
///
/// An entry on the same date is tagged in place; otherwise a synthetic
/// entry is inserted by continuous year key. Entries strictly after the
/// genesis get `return_since_my_genesis`.
pub fn merge_genesis(series: &[AnnotatedEntry], genesis: Option<&UserBaseline>) -> Vec<AnnotatedEntry> {
    let mut merged: Vec<AnnotatedEntry> = series
        .iter()
        .cloned()
        .map(|mut e| {
            e.is_my_genesis = false;
            e.return_since_my_genesis = None;
            e
        })
        .collect();

    let genesis = match genesis {
        Some(genesis) => genesis,
        None => return merged,
    };

    let genesis_key = YearKey::from_date(genesis.date);

    match merged.iter_mut().find(|e| e.date == Some(genesis.date)) {
        Some(existing) => {
            debug!("Tagging existing {} entry as genesis", genesis.date);
            existing.is_my_genesis = true;
        }
        None => merged.push(AnnotatedEntry {
            year: genesis.date.year(),
            date: Some(genesis.date),
            price: Some(genesis.price),
            year_key: genesis_key,
            return_since_genesis: None,
            cagr_5y: None,
            return_since_my_genesis: None,
            is_my_genesis: true,
        }),
    }

    merged.sort_by_key(|e| e.year_key);

    for entry in merged.iter_mut().filter(|e| !e.is_my_genesis && e.year_key > genesis_key) {
        entry.return_since_my_genesis = entry.price.and_then(|p| percent_change(genesis.price, p));
    }

    merged
}

/// Full pipeline from parsed series to the display series.
pub fn display_series(
    base: &[SeriesEntry],
    quote: Option<&LiveQuote>,
    genesis: Option<&UserBaseline>,
    today: NaiveDate,
) -> Vec<AnnotatedEntry> {
    let annotated = match quote {
        Some(quote) => calculate_metrics(&apply_live_quote(base, quote, today)),
        None => calculate_metrics(base),
    };
    merge_genesis(&annotated, genesis)
}
