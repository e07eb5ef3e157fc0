// src/services/csv_parser.rs
use chrono::NaiveDate;
use log::{debug, info};
use regex::Regex;

use crate::models::PriceMap;
use super::error::PipelineError;

const BOM: char = '\u{feff}';

/// Parse `Date,Price` text into a date -> price map.
///
/// The first line is the header and is discarded. Rows with a date that is
/// not `M/D/YYYY`, or a price that is negative, non-finite or unparsable,
/// are dropped without error. A later row for the same date replaces an
/// earlier one.
pub fn parse_price_csv(text: &str) -> Result<PriceMap, PipelineError> {
    let date_re = Regex::new(r"^\d{1,2}/\d{1,2}/\d{4}$").map_err(|_| PipelineError::ParseFailure)?;
    let normalized = text.trim_start_matches(BOM).trim();

    let mut prices = PriceMap::new();
    let mut rejected = 0usize;

    for line in normalized.lines().skip(1) {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        match parse_row(line, &date_re) {
            Some((date, price)) => {
                prices.insert(date, price);
            }
            None => rejected += 1,
        }
    }

    if rejected > 0 {
        debug!("Dropped {} malformed CSV rows", rejected);
    }

    if prices.is_empty() {
        return Err(PipelineError::ParseFailure);
    }

    info!("Parsed {} daily prices", prices.len());
    Ok(prices)
}

fn parse_row(line: &str, date_re: &Regex) -> Option<(NaiveDate, f64)> {
    let fields = split_fields(line);
    if fields.len() < 2 {
        return None;
    }

    let date = parse_date(&fields[0], date_re)?;
    let price = parse_price(&fields[1])?;
    Some((date, price))
}

/// Split one line on commas outside double quotes. Every `"` toggles the
/// quoted state and is dropped, wherever it sits in the field.
fn split_fields(line: &str) -> Vec<String> {
    let mut fields = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;

    for ch in line.chars() {
        match ch {
            '"' => in_quotes = !in_quotes,
            ',' if !in_quotes => fields.push(std::mem::take(&mut current).trim().to_string()),
            _ => current.push(ch),
        }
    }
    fields.push(current.trim().to_string());
    fields
}

fn parse_date(raw: &str, date_re: &Regex) -> Option<NaiveDate> {
    if !date_re.is_match(raw) {
        return None;
    }

    let mut parts = raw.split('/');
    let month = parts.next()?.parse::<u32>().ok()?;
    let day = parts.next()?.parse::<u32>().ok()?;
    let year = parts.next()?.parse::<i32>().ok()?;
    NaiveDate::from_ymd_opt(year, month, day)
}

fn parse_price(raw: &str) -> Option<f64> {
    let price = raw.replace(',', "").parse::<f64>().ok()?;
    if !price.is_finite() || price < 0.0 {
        return None;
    }
    Some(price)
}

/// True when the text starts with a recognised header line.
pub fn has_header_sentinel(text: &str) -> bool {
    let trimmed = text.trim_start_matches(BOM).trim();
    trimmed.starts_with("Date,Price") || trimmed.starts_with("\"Date\"")
}
