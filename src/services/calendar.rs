// src/services/calendar.rs
use chrono::Datelike;
use std::collections::BTreeMap;

use crate::models::{PriceMap, PriceRecord, SeriesEntry};

/// Years before the first block are never shown.
pub const EARLIEST_YEAR: i32 = 2009;

/// Entries whose month and day equal the given calendar day, one per
/// year, ascending by year. A Feb 29 query simply matches leap years.
pub fn filter_calendar_day(prices: &PriceMap, month: u32, day: u32) -> Vec<SeriesEntry> {
    prices
        .iter()
        .filter(|(date, _)| date.month() == month && date.day() == day)
        .map(|(&date, &price)| SeriesEntry::from_record(PriceRecord { date, price }))
        .collect()
}

/// Degraded series: the earliest record of every year in the mapping,
/// whatever its calendar day.
pub fn first_record_per_year(prices: &PriceMap) -> Vec<SeriesEntry> {
    let mut by_year: BTreeMap<i32, SeriesEntry> = BTreeMap::new();
    for (&date, &price) in prices {
        by_year
            .entry(date.year())
            .or_insert_with(|| SeriesEntry::from_record(PriceRecord { date, price }));
    }
    by_year.into_values().collect()
}

/// Pad the series so every year in `first_year..=last_year` has an entry;
/// years without a match carry no date or price.
pub fn fill_year_gaps(series: &[SeriesEntry], first_year: i32, last_year: i32) -> Vec<SeriesEntry> {
    let by_year: BTreeMap<i32, &SeriesEntry> = series.iter().map(|e| (e.year, e)).collect();
    let mut filled: Vec<SeriesEntry> = (first_year..=last_year)
        .map(|year| {
            by_year
                .get(&year)
                .map(|e| (*e).clone())
                .unwrap_or_else(|| SeriesEntry::missing(year))
        })
        .collect();

    // Keep matched years that fall outside the requested range.
    for entry in series {
        if entry.year < first_year || entry.year > last_year {
            filled.push(entry.clone());
        }
    }
    filled.sort_by_key(|e| e.year);
    filled
}

/// Year range covered by the mapping, floored at the first block.
pub fn year_range(prices: &PriceMap, today_year: i32) -> Option<(i32, i32)> {
    let first = prices.keys().next()?.year().max(EARLIEST_YEAR);
    let last = prices.keys().next_back()?.year().min(today_year);
    if first > last {
        return None;
    }
    Some((first, last))
}
