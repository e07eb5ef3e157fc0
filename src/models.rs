// src/models.rs
use serde::{Serialize, Deserialize};
use chrono::{DateTime, Datelike, NaiveDate, Utc};
use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Parsed historical prices keyed by calendar date. Ordered by date, so
/// iteration is chronological.
pub type PriceMap = BTreeMap<NaiveDate, f64>;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PriceRecord {
    pub date: NaiveDate,
    pub price: f64,
}

/// Continuous year position: `year + (ordinal - 1) / days_in_year`.
///
/// Whole-year entries without a date sit at the bare year, so a baseline
/// dated mid-year orders between its neighbours.
#[derive(Debug, Clone, Copy, Serialize)]
#[serde(transparent)]
pub struct YearKey(f64);

impl YearKey {
    pub fn from_year(year: i32) -> Self {
        YearKey(year as f64)
    }

    pub fn from_date(date: NaiveDate) -> Self {
        let days_in_year = if is_leap_year(date.year()) { 366.0 } else { 365.0 };
        YearKey(date.year() as f64 + (date.ordinal0() as f64 / days_in_year))
    }

    pub fn value(self) -> f64 {
        self.0
    }
}

impl PartialEq for YearKey {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for YearKey {}

impl PartialOrd for YearKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for YearKey {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.total_cmp(&other.0)
    }
}

fn is_leap_year(year: i32) -> bool {
    NaiveDate::from_ymd_opt(year, 2, 29).is_some()
}

/// One row of the per-year series. `price` is absent for a year with no
/// calendar-day match.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SeriesEntry {
    pub year: i32,
    pub date: Option<NaiveDate>,
    pub price: Option<f64>,
}

impl SeriesEntry {
    pub fn from_record(record: PriceRecord) -> Self {
        SeriesEntry {
            year: record.date.year(),
            date: Some(record.date),
            price: Some(record.price),
        }
    }

    pub fn missing(year: i32) -> Self {
        SeriesEntry { year, date: None, price: None }
    }

    pub fn year_key(&self) -> YearKey {
        match self.date {
            Some(date) => YearKey::from_date(date),
            None => YearKey::from_year(self.year),
        }
    }
}

/// Series entry with derived fields. Derived values are never persisted;
/// they are rebuilt from the series every time it changes.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnnotatedEntry {
    pub year: i32,
    pub date: Option<NaiveDate>,
    pub price: Option<f64>,
    pub year_key: YearKey,
    pub return_since_genesis: Option<f64>,
    pub cagr_5y: Option<f64>,
    pub return_since_my_genesis: Option<f64>,
    pub is_my_genesis: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Provenance {
    ExactMatch,
    NearestWithinWindow,
}

/// The user's personal reference date ("my genesis").
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UserBaseline {
    /// Raw input as typed, persisted verbatim.
    pub input: String,
    pub date: NaiveDate,
    pub resolved_date: NaiveDate,
    pub price: f64,
    pub provenance: Provenance,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LiveQuote {
    pub price: f64,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChartScale {
    #[default]
    Logarithmic,
    Linear,
}

impl ChartScale {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChartScale::Logarithmic => "logarithmic",
            ChartScale::Linear => "linear",
        }
    }
}

impl FromStr for ChartScale {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "logarithmic" => Ok(ChartScale::Logarithmic),
            "linear" => Ok(ChartScale::Linear),
            other => Err(format!("Unknown chart scale: {}", other)),
        }
    }
}

impl fmt::Display for ChartScale {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Where the historical mapping came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "name", rename_all = "snake_case")]
pub enum DataSource {
    Candidate(String),
    Sample,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StatusKind {
    Ok,
    Error,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatusMessage {
    pub text: String,
    pub kind: StatusKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,
}

impl StatusMessage {
    pub fn ok(text: impl Into<String>) -> Self {
        StatusMessage { text: text.into(), kind: StatusKind::Ok, expires_at: None }
    }

    pub fn error(text: impl Into<String>) -> Self {
        StatusMessage { text: text.into(), kind: StatusKind::Error, expires_at: None }
    }

    pub fn expiring_at(mut self, at: DateTime<Utc>) -> Self {
        self.expires_at = Some(at);
        self
    }

    pub fn is_active(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.map_or(true, |at| now < at)
    }
}
