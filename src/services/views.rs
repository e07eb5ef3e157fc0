// src/services/views.rs
//! Read-only view models handed to the table, timeline and chart renderers.

use chrono::{DateTime, Datelike, Local, NaiveDate, Utc};
use serde::Serialize;

use crate::models::{AnnotatedEntry, ChartScale, DataSource, StatusMessage, UserBaseline};
use super::calculations::percent_change;
use super::error::PipelineError;
use super::state::AppState;

/// Shown where a value does not apply.
pub const NOT_APPLICABLE: &str = "---";
const MISSING: &str = "-";

#[derive(Debug, Serialize)]
pub struct TableRow {
    pub year: i32,
    pub date_label: String,
    pub price: Option<f64>,
    pub price_text: String,
    pub return_since_genesis: Option<f64>,
    pub return_since_genesis_text: String,
    /// Only present while a personal genesis is set.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub return_since_my_genesis_text: Option<String>,
    pub return_since_my_genesis: Option<f64>,
    pub cagr_5y: Option<f64>,
    pub cagr_5y_text: String,
    pub is_current_year: bool,
    pub is_my_genesis: bool,
}

#[derive(Debug, Serialize)]
pub struct TableView {
    pub header: String,
    pub show_my_genesis: bool,
    pub rows: Vec<TableRow>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub empty_message: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct TimelineBlock {
    pub year: i32,
    pub date_label: String,
    pub price_text: String,
    pub change_percent: Option<f64>,
    pub change_text: String,
    pub is_current_year: bool,
    pub is_my_genesis: bool,
}

#[derive(Debug, Serialize)]
pub struct TimelineView {
    pub header: String,
    pub blocks: Vec<TimelineBlock>,
}

#[derive(Debug, Serialize)]
pub struct ChartView {
    pub labels: Vec<String>,
    pub prices: Vec<Option<f64>>,
    pub my_genesis: Vec<bool>,
    pub scale: ChartScale,
}

#[derive(Debug, Serialize)]
pub struct StatusView {
    pub live_price: Option<f64>,
    pub live_price_text: String,
    pub price_source: String,
    pub last_updated: Option<DateTime<Utc>>,
    pub last_updated_text: String,
    pub fetching: bool,
    pub status: Option<StatusMessage>,
    pub genesis_error: Option<StatusMessage>,
    pub notice: Option<String>,
    pub data_source: DataSource,
    pub my_genesis: Option<UserBaseline>,
    pub chart_scale: ChartScale,
    pub calendar_day: String,
}

fn group_thousands(mut n: u64) -> String {
    let mut groups = Vec::new();
    loop {
        if n < 1000 {
            groups.push(n.to_string());
            break;
        }
        groups.push(format!("{:03}", n % 1000));
        n /= 1000;
    }
    groups.reverse();
    groups.join(",")
}

/// Rounded, thousands-grouped whole number with its sign.
pub fn format_whole(value: f64) -> String {
    let rounded = value.round();
    let grouped = group_thousands(rounded.abs() as u64);
    if rounded < 0.0 {
        format!("-{}", grouped)
    } else {
        grouped
    }
}

/// `$12,345.67`, or four decimals below one dollar.
pub fn format_currency(value: Option<f64>) -> String {
    match value {
        None => MISSING.to_string(),
        Some(v) if v >= 1.0 => {
            let cents = (v * 100.0).round() as u64;
            format!("${}.{:02}", group_thousands(cents / 100), cents % 100)
        }
        Some(v) => format!("${:.4}", v),
    }
}

pub fn format_currency_whole(value: Option<f64>) -> String {
    match value {
        None => MISSING.to_string(),
        Some(v) => format!("${}", format_whole(v)),
    }
}

pub fn format_percent_whole(value: Option<f64>, include_sign: bool) -> String {
    match value {
        None => NOT_APPLICABLE.to_string(),
        Some(v) => {
            let sign = if include_sign && v >= 0.0 { "+" } else { "" };
            format!("{}{}%", sign, format_whole(v))
        }
    }
}

pub fn calendar_day_label(today: NaiveDate) -> String {
    today.format("%B %-d").to_string()
}

/// The entry's own date, or today's calendar day in the entry's year.
fn entry_date(entry: &AnnotatedEntry, today: NaiveDate) -> Option<NaiveDate> {
    entry
        .date
        .or_else(|| NaiveDate::from_ymd_opt(entry.year, today.month(), today.day()))
}

fn long_date_label(entry: &AnnotatedEntry, today: NaiveDate) -> String {
    let label = match entry_date(entry, today) {
        Some(date) => date.format("%B %-d, %Y").to_string(),
        None => format!("{} {}", calendar_day_label(today), entry.year),
    };
    if entry.is_my_genesis {
        format!("{} [MY GENESIS]", label)
    } else {
        label
    }
}

fn short_date_label(entry: &AnnotatedEntry, today: NaiveDate) -> String {
    match entry_date(entry, today) {
        Some(date) => format!(
            "{}. {} '{}",
            date.format("%b").to_string().to_uppercase(),
            date.format("%d"),
            date.format("%y")
        ),
        None => format!("'{:02}", entry.year.rem_euclid(100)),
    }
}

fn is_current_year(entry: &AnnotatedEntry, today: NaiveDate) -> bool {
    entry.year == today.year() && !entry.is_my_genesis
}

/// Table rows, newest first.
pub fn build_table(state: &AppState) -> TableView {
    let today = state.today;
    let show_my_genesis = state.genesis.is_some();
    let series = state.display_series();

    let rows: Vec<TableRow> = series
        .iter()
        .rev()
        .map(|entry| {
            let return_since_my_genesis_text = show_my_genesis.then(|| {
                if entry.is_my_genesis {
                    NOT_APPLICABLE.to_string()
                } else {
                    format_percent_whole(entry.return_since_my_genesis, true)
                }
            });

            TableRow {
                year: entry.year,
                date_label: long_date_label(entry, today),
                price: entry.price,
                price_text: format_currency_whole(entry.price),
                return_since_genesis: entry.return_since_genesis,
                return_since_genesis_text: format_percent_whole(entry.return_since_genesis, true),
                return_since_my_genesis_text,
                return_since_my_genesis: entry.return_since_my_genesis,
                cagr_5y: entry.cagr_5y,
                cagr_5y_text: format_percent_whole(entry.cagr_5y, true),
                is_current_year: is_current_year(entry, today),
                is_my_genesis: entry.is_my_genesis,
            }
        })
        .collect();

    let empty_message = rows.is_empty().then(|| "[ No data available ]".to_string());

    TableView {
        header: calendar_day_label(today),
        show_my_genesis,
        rows,
        empty_message,
    }
}

/// Write the table as CSV, one record per row. The "My Return" column is
/// present only while a personal genesis is set.
pub fn write_table_csv<W: std::io::Write>(table: &TableView, writer: W) -> Result<(), PipelineError> {
    let storage = |e: csv::Error| PipelineError::Storage(e.to_string());
    let mut wtr = csv::Writer::from_writer(writer);

    let mut header = vec!["Date", "Price", "Return"];
    if table.show_my_genesis {
        header.push("My Return");
    }
    header.push("5y CAGR");
    wtr.write_record(&header).map_err(storage)?;

    for row in &table.rows {
        let mut record = vec![
            row.date_label.as_str(),
            row.price_text.as_str(),
            row.return_since_genesis_text.as_str(),
        ];
        if let Some(mine) = &row.return_since_my_genesis_text {
            record.push(mine.as_str());
        }
        record.push(row.cagr_5y_text.as_str());
        wtr.write_record(&record).map_err(storage)?;
    }

    wtr.flush().map_err(|e| PipelineError::Storage(e.to_string()))
}

/// Timeline blocks, newest first; each shows its change from the block
/// before it in time.
pub fn build_timeline(state: &AppState) -> TimelineView {
    let today = state.today;
    let series = state.display_series();

    let mut blocks: Vec<TimelineBlock> = series
        .iter()
        .enumerate()
        .map(|(i, entry)| {
            let previous = if i > 0 { series[i - 1].price } else { None };
            let change_percent = match (previous, entry.price) {
                (Some(prev), Some(price)) => percent_change(prev, price),
                _ => None,
            };
            let change_text = match change_percent {
                Some(change) => format!("{}{:.2}", if change >= 0.0 { "+" } else { "-" }, change.abs()),
                None => NOT_APPLICABLE.to_string(),
            };

            TimelineBlock {
                year: entry.year,
                date_label: short_date_label(entry, today),
                price_text: match entry.price {
                    Some(price) => format!("$ {}", format_whole(price)),
                    None => MISSING.to_string(),
                },
                change_percent,
                change_text,
                is_current_year: entry.year == today.year(),
                is_my_genesis: entry.is_my_genesis,
            }
        })
        .collect();
    blocks.reverse();

    TimelineView {
        header: calendar_day_label(today),
        blocks,
    }
}

pub fn build_chart(state: &AppState) -> ChartView {
    let series = state.display_series();
    ChartView {
        labels: series.iter().map(|e| e.year.to_string()).collect(),
        prices: series.iter().map(|e| e.price).collect(),
        my_genesis: series.iter().map(|e| e.is_my_genesis).collect(),
        scale: state.chart_scale,
    }
}

pub fn build_status(state: &AppState, now: DateTime<Utc>, fetching: bool) -> StatusView {
    let (live_price_text, price_source) = match (&state.live_quote, state.live_failed) {
        (_, true) => ("Unable to fetch".to_string(), "API unavailable".to_string()),
        (Some(quote), false) => (format_currency(Some(quote.price)), "Live price from CoinGecko".to_string()),
        (None, false) => (MISSING.to_string(), "Waiting for live price".to_string()),
    };

    let last_updated = state.live_quote.map(|q| q.timestamp);
    let last_updated_text = match last_updated {
        Some(ts) => format!(
            "Last updated: {}",
            ts.with_timezone(&Local).format("%b %d, %Y, %I:%M:%S %p")
        ),
        None => "Last updated: --".to_string(),
    };

    StatusView {
        live_price: state.live_quote.map(|q| q.price),
        live_price_text,
        price_source,
        last_updated,
        last_updated_text,
        fetching,
        status: state.status.clone(),
        genesis_error: state.active_genesis_error(now).cloned(),
        notice: state.notice().map(str::to_string),
        data_source: state.source.clone(),
        my_genesis: state.genesis.clone(),
        chart_scale: state.chart_scale,
        calendar_day: calendar_day_label(state.today),
    }
}
