// src/services/state.rs
use chrono::{DateTime, Duration, NaiveDate, Utc};
use log::{info, warn};
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::models::{
    AnnotatedEntry, ChartScale, DataSource, LiveQuote, PriceMap, SeriesEntry, StatusMessage,
    UserBaseline,
};
use super::error::PipelineError;
use super::genesis::resolve_genesis;
use super::loader::LoadedPrices;
use super::merge::{base_series, display_series};

pub type SharedState = Arc<RwLock<AppState>>;

pub const SAMPLE_NOTICE: &str = "[NOTICE] Using sample data - historical CSV could not be loaded.";

/// Everything the views are built from. Mutated only through the methods
/// below; the derived series is rebuilt on demand.
#[derive(Debug, Clone)]
pub struct AppState {
    pub today: NaiveDate,
    pub prices: PriceMap,
    pub source: DataSource,
    pub fill_year_gaps: bool,
    pub base: Vec<SeriesEntry>,
    pub live_quote: Option<LiveQuote>,
    pub live_failed: bool,
    pub genesis: Option<UserBaseline>,
    pub chart_scale: ChartScale,
    pub status: Option<StatusMessage>,
    pub genesis_error: Option<StatusMessage>,
    pub visible: bool,
}

impl AppState {
    pub fn new(loaded: LoadedPrices, today: NaiveDate, fill_year_gaps: bool) -> Self {
        let base = base_series(&loaded.prices, today, fill_year_gaps);
        info!("Built {} calendar-day entries for {}", base.len(), today);

        let status = match loaded.source {
            DataSource::Sample => Some(StatusMessage::error(
                "Using sample dataset. Add a CSV file for full history.",
            )),
            DataSource::Candidate(_) => None,
        };

        AppState {
            today,
            prices: loaded.prices,
            source: loaded.source,
            fill_year_gaps,
            base,
            live_quote: None,
            live_failed: false,
            genesis: None,
            chart_scale: ChartScale::default(),
            status,
            genesis_error: None,
            visible: true,
        }
    }

    pub fn using_sample_data(&self) -> bool {
        self.source == DataSource::Sample
    }

    pub fn notice(&self) -> Option<&'static str> {
        self.using_sample_data().then_some(SAMPLE_NOTICE)
    }

    /// Annotated series with the live overlay and genesis merged in.
    pub fn display_series(&self) -> Vec<AnnotatedEntry> {
        display_series(&self.base, self.live_quote.as_ref(), self.genesis.as_ref(), self.today)
    }

    /// Rebuild the calendar-day series when the local date moves on.
    /// Returns true if anything changed.
    pub fn roll_to(&mut self, today: NaiveDate) -> bool {
        if today == self.today {
            return false;
        }
        info!("Date rolled over from {} to {}", self.today, today);
        self.today = today;
        self.base = base_series(&self.prices, today, self.fill_year_gaps);
        true
    }

    pub fn record_live_quote(&mut self, quote: LiveQuote, user_initiated: bool) {
        self.live_quote = Some(quote);
        self.live_failed = false;
        self.status = Some(StatusMessage::ok(if user_initiated {
            "Live price refreshed."
        } else {
            "Live price online."
        }));
    }

    /// Historical data and any earlier quote are left untouched.
    pub fn record_live_failure(&mut self, error: &PipelineError) {
        warn!("{}", error);
        self.live_failed = true;
        self.status = Some(StatusMessage::error(
            "Live price API unavailable. Showing historical data.",
        ));
    }

    /// Apply raw baseline input. Empty input clears.
    ///
    /// Input without exactly three fields leaves the current genesis alone;
    /// anything that fails to resolve clears it. Either way an expiring error is recorded.
    pub fn apply_genesis_input(
        &mut self,
        input: &str,
        now: DateTime<Utc>,
        display_for: Duration,
    ) -> Result<Option<UserBaseline>, PipelineError> {
        if input.trim().is_empty() {
            self.clear_genesis();
            return Ok(None);
        }

        match resolve_genesis(input.trim(), &self.prices) {
            Ok(genesis) => {
                self.genesis = Some(genesis.clone());
                self.genesis_error = None;
                Ok(Some(genesis))
            }
            Err(e) => {
                if let PipelineError::BaselineNotFound { .. } = e {
                    self.genesis = None;
                }
                self.genesis_error =
                    Some(StatusMessage::error(format!("[ERROR] {}", e.user_message())).expiring_at(now + display_for));
                Err(e)
            }
        }
    }

    pub fn clear_genesis(&mut self) {
        self.genesis = None;
    }

    pub fn active_genesis_error(&self, now: DateTime<Utc>) -> Option<&StatusMessage> {
        self.genesis_error.as_ref().filter(|msg| msg.is_active(now))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::loader::sample_prices;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn state(today: NaiveDate) -> AppState {
        AppState::new(sample_prices(), today, false)
    }

    #[test]
    fn sample_data_sets_error_status_and_notice() {
        let state = state(date(2025, 1, 3));
        assert!(state.using_sample_data());
        assert_eq!(state.notice(), Some(SAMPLE_NOTICE));
        assert_eq!(state.status.as_ref().unwrap().kind, crate::models::StatusKind::Error);
        assert_eq!(state.base.len(), 15);
    }

    #[test]
    fn rollover_rebuilds_series() {
        let mut state = state(date(2025, 1, 3));
        assert!(!state.roll_to(date(2025, 1, 3)));
        assert!(state.roll_to(date(2025, 11, 23)));
        assert_eq!(state.base.len(), 15);
        assert!(state.base.iter().all(|e| e.date.map(|d| d.format("%m-%d").to_string()) == Some("11-23".into())));
    }

    #[test]
    fn live_quote_overlays_current_year() {
        let mut state = state(date(2026, 1, 3));
        state.record_live_quote(LiveQuote { price: 90_000.0, timestamp: Utc::now() }, true);
        let series = state.display_series();
        assert_eq!(series.len(), 16);
        assert_eq!(series.last().unwrap().price, Some(90_000.0));
        assert_eq!(state.status.as_ref().unwrap().text, "Live price refreshed.");
    }

    #[test]
    fn live_failure_keeps_data() {
        let mut state = state(date(2026, 1, 3));
        state.record_live_failure(&PipelineError::fetch("api", "down"));
        assert!(state.live_failed);
        assert_eq!(state.display_series().len(), 15);
    }

    #[test]
    fn genesis_lifecycle() {
        let mut state = state(date(2025, 1, 3));
        let now = Utc::now();
        let display = Duration::seconds(5);

        let genesis = state.apply_genesis_input("2015-01-03", now, display).unwrap().unwrap();
        assert_eq!(genesis.price, 314.25);
        assert!(state.display_series().iter().any(|e| e.is_my_genesis));

        // Malformed input keeps the current genesis.
        assert!(state.apply_genesis_input("2015/01/03", now, display).is_err());
        assert!(state.genesis.is_some());
        assert_eq!(
            state.active_genesis_error(now).unwrap().text,
            "[ERROR] Invalid date format."
        );
        assert!(state.active_genesis_error(now + Duration::seconds(6)).is_none());

        // Unresolvable dates clear it.
        assert!(state.apply_genesis_input("2015-06-01", now, display).is_err());
        assert!(state.genesis.is_none());
        let series = state.display_series();
        assert!(series.iter().all(|e| !e.is_my_genesis && e.return_since_my_genesis.is_none()));
    }

    #[test]
    fn three_field_garbage_clears_genesis() {
        let mut state = state(date(2025, 1, 3));
        let now = Utc::now();
        state.apply_genesis_input("2015-01-03", now, Duration::seconds(5)).unwrap();

        let err = state.apply_genesis_input("2015-01-xx", now, Duration::seconds(5)).unwrap_err();
        assert!(matches!(err, PipelineError::BaselineNotFound { .. }));
        assert!(state.genesis.is_none());
        assert_eq!(
            state.active_genesis_error(now).unwrap().text,
            "[ERROR] No price data available for this date or nearby dates."
        );
    }

    #[test]
    fn empty_input_clears_genesis() {
        let mut state = state(date(2025, 1, 3));
        let now = Utc::now();
        state.apply_genesis_input("2015-01-03", now, Duration::seconds(5)).unwrap();
        assert_eq!(state.apply_genesis_input("  ", now, Duration::seconds(5)), Ok(None));
        assert!(state.genesis.is_none());
    }
}
