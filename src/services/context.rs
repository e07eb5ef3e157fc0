// src/services/context.rs
use chrono::{Local, NaiveDate, Utc};
use log::{info, warn};
use reqwest::Client;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::config::Config;
use crate::models::{ChartScale, LiveQuote, UserBaseline};
use super::error::PipelineError;
use super::live_price::LivePriceService;
use super::loader::{load_price_data, LoadedPrices};
use super::preferences::{PreferenceStore, CHART_SCALE_KEY, MY_GENESIS_KEY};
use super::state::{AppState, SharedState};

pub fn local_today() -> NaiveDate {
    Local::now().date_naive()
}

async fn saved_chart_scale(prefs: &PreferenceStore) -> Option<ChartScale> {
    let saved = prefs.get(CHART_SCALE_KEY).await?;
    match saved.parse::<ChartScale>() {
        Ok(scale) => Some(scale),
        Err(e) => {
            warn!("{}", e);
            None
        }
    }
}

/// Shared handles behind every route and the refresh task.
pub struct AppContext {
    pub config: Config,
    pub state: SharedState,
    pub prefs: PreferenceStore,
    pub live: LivePriceService,
    clock: fn() -> NaiveDate,
}

impl AppContext {
    /// Wire up collaborators around already loaded prices. Does no I/O.
    pub fn from_parts(config: Config, loaded: LoadedPrices, today: NaiveDate) -> Result<Self, PipelineError> {
        let live = LivePriceService::new(config.live_price_url.clone(), config.api_timeout)?;
        let prefs = PreferenceStore::new(config.prefs_path.clone());
        let state = AppState::new(loaded, today, config.fill_year_gaps);

        Ok(AppContext {
            config,
            state: Arc::new(RwLock::new(state)),
            prefs,
            live,
            clock: local_today,
        })
    }

    /// Replace the source of "today" used for calendar rollover.
    pub fn with_clock(mut self, clock: fn() -> NaiveDate) -> Self {
        self.clock = clock;
        self
    }

    /// Startup sequence: restore the chart scale, load prices, fetch the
    /// live price, then restore the saved genesis.
    pub async fn initialize(config: Config) -> Result<Arc<Self>, PipelineError> {
        let saved_scale = saved_chart_scale(&PreferenceStore::new(config.prefs_path.clone())).await;

        let csv_client = Client::builder()
            .build()
            .map_err(|e| PipelineError::fetch(config.data_base.as_str(), e))?;
        let loaded = load_price_data(&csv_client, &config.data_base, config.csv_timeout).await;

        let ctx = Arc::new(AppContext::from_parts(config, loaded, local_today())?);
        if let Some(scale) = saved_scale {
            ctx.set_chart_scale(scale, false).await;
        }
        ctx.refresh_live_price(false).await;

        if let Some(saved) = ctx.prefs.get(MY_GENESIS_KEY).await {
            info!("Restoring saved genesis {:?}", saved);
            if let Err(e) = ctx.set_genesis(&saved, true).await {
                warn!("Saved genesis could not be restored: {}", e);
            }
        }

        Ok(ctx)
    }

    /// Run `f` against the state for the current local date.
    pub async fn with_current_state<R>(&self, f: impl FnOnce(&AppState) -> R) -> R {
        let today = (self.clock)();
        if self.state.read().await.today != today {
            self.state.write().await.roll_to(today);
        }
        let state = self.state.read().await;
        f(&state)
    }

    /// Fetch the live price unless a fetch is already outstanding, in which
    /// case the last known quote is returned without a network call.
    pub async fn refresh_live_price(&self, user_initiated: bool) -> Option<LiveQuote> {
        let _guard = match self.live.try_begin() {
            Some(guard) => guard,
            None => return self.state.read().await.live_quote,
        };

        let result = self.live.fetch_quote().await;

        let mut state = self.state.write().await;
        match result {
            Ok(quote) => {
                state.record_live_quote(quote, user_initiated);
                Some(quote)
            }
            Err(e) => {
                state.record_live_failure(&e);
                None
            }
        }
    }

    /// Apply raw genesis input and mirror it into the preference store.
    /// Empty input clears.
    pub async fn set_genesis(&self, input: &str, persist: bool) -> Result<Option<UserBaseline>, PipelineError> {
        let display_for = chrono::Duration::from_std(self.config.error_display)
            .unwrap_or_else(|_| chrono::Duration::seconds(5));

        // Storage is updated under the state lock so the two never disagree.
        let mut state = self.state.write().await;
        let result = state.apply_genesis_input(input, Utc::now(), display_for);

        if persist {
            match &result {
                Ok(Some(genesis)) => self.prefs.set(MY_GENESIS_KEY, &genesis.input).await,
                Ok(None) | Err(PipelineError::BaselineNotFound { .. }) => {
                    self.prefs.remove(MY_GENESIS_KEY).await
                }
                Err(_) => {}
            }
        }

        result
    }

    pub async fn clear_genesis(&self, persist: bool) {
        let mut state = self.state.write().await;
        state.clear_genesis();
        if persist {
            self.prefs.remove(MY_GENESIS_KEY).await;
        }
        info!("Genesis cleared");
    }

    pub async fn set_chart_scale(&self, scale: ChartScale, persist: bool) {
        let mut state = self.state.write().await;
        state.chart_scale = scale;
        if persist {
            self.prefs.set(CHART_SCALE_KEY, scale.as_str()).await;
        }
    }

    /// Record client visibility; becoming visible triggers a live fetch.
    pub async fn set_visibility(&self, visible: bool) -> Option<LiveQuote> {
        let was_visible = {
            let mut state = self.state.write().await;
            std::mem::replace(&mut state.visible, visible)
        };

        if visible && !was_visible {
            return self.refresh_live_price(false).await;
        }
        self.state.read().await.live_quote
    }

    pub async fn is_visible(&self) -> bool {
        self.state.read().await.visible
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::loader::sample_prices;
    use std::path::PathBuf;

    fn context(name: &str) -> (PathBuf, AppContext) {
        let dir = std::env::temp_dir().join(name);
        let _ = std::fs::remove_dir_all(&dir);
        let config = Config {
            prefs_path: dir.join("prefs.json"),
            live_price_url: "http://127.0.0.1:9/unreachable".to_string(),
            api_timeout: std::time::Duration::from_millis(500),
            ..Config::default()
        };
        let today = NaiveDate::from_ymd_opt(2025, 1, 3).unwrap();
        (dir, AppContext::from_parts(config, sample_prices(), today).unwrap())
    }

    #[tokio::test]
    async fn genesis_is_persisted_and_removed() {
        let (dir, ctx) = context("btc_this_day_ctx_genesis");

        ctx.set_genesis("2015-01-03", true).await.unwrap();
        assert_eq!(ctx.prefs.get(MY_GENESIS_KEY).await.as_deref(), Some("2015-01-03"));

        // A date with nothing nearby clears both state and storage.
        assert!(ctx.set_genesis("2015-06-01", true).await.is_err());
        assert_eq!(ctx.prefs.get(MY_GENESIS_KEY).await, None);
        assert!(ctx.state.read().await.genesis.is_none());

        ctx.set_genesis("2016-01-03", true).await.unwrap();
        ctx.clear_genesis(true).await;
        assert_eq!(ctx.prefs.get(MY_GENESIS_KEY).await, None);

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[tokio::test]
    async fn malformed_genesis_leaves_storage_alone() {
        let (dir, ctx) = context("btc_this_day_ctx_malformed");
        ctx.set_genesis("2015-01-03", true).await.unwrap();
        assert!(ctx.set_genesis("2015/01/03", true).await.is_err());
        assert_eq!(ctx.prefs.get(MY_GENESIS_KEY).await.as_deref(), Some("2015-01-03"));

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[tokio::test]
    async fn unparsable_three_field_genesis_removes_stored_key() {
        let (dir, ctx) = context("btc_this_day_ctx_garbage");
        ctx.set_genesis("2015-01-03", true).await.unwrap();

        let err = ctx.set_genesis("2015-01-xx", true).await.unwrap_err();
        assert!(matches!(err, PipelineError::BaselineNotFound { .. }));
        assert_eq!(ctx.prefs.get(MY_GENESIS_KEY).await, None);
        assert!(ctx.state.read().await.genesis.is_none());

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_genesis_updates_agree_with_storage() {
        let (dir, ctx) = context("btc_this_day_ctx_concurrent");
        let ctx = Arc::new(ctx);

        for _ in 0..20 {
            let (a, b, c) = (ctx.clone(), ctx.clone(), ctx.clone());
            let first = tokio::spawn(async move { a.set_genesis("2015-01-03", true).await });
            let second = tokio::spawn(async move { b.set_genesis("2016-01-03", true).await });
            let scale = tokio::spawn(async move { c.set_chart_scale(ChartScale::Linear, true).await });
            first.await.unwrap().unwrap();
            second.await.unwrap().unwrap();
            scale.await.unwrap();

            let in_state = ctx.state.read().await.genesis.as_ref().map(|g| g.input.clone());
            assert_eq!(ctx.prefs.get(MY_GENESIS_KEY).await, in_state);
            assert_eq!(ctx.prefs.get(CHART_SCALE_KEY).await.as_deref(), Some("linear"));
        }

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[tokio::test]
    async fn chart_scale_is_persisted_and_restored() {
        let (dir, ctx) = context("btc_this_day_ctx_scale");
        ctx.set_chart_scale(ChartScale::Linear, true).await;
        assert_eq!(ctx.prefs.get(CHART_SCALE_KEY).await.as_deref(), Some("linear"));

        let today = NaiveDate::from_ymd_opt(2025, 1, 3).unwrap();
        let fresh = AppContext::from_parts(ctx.config.clone(), sample_prices(), today).unwrap();
        assert_eq!(fresh.state.read().await.chart_scale, ChartScale::Logarithmic);
        assert_eq!(saved_chart_scale(&fresh.prefs).await, Some(ChartScale::Linear));

        fresh.prefs.set(CHART_SCALE_KEY, "cubic").await;
        assert_eq!(saved_chart_scale(&fresh.prefs).await, None);

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[tokio::test]
    async fn failed_refresh_reports_error_and_keeps_series() {
        let (dir, ctx) = context("btc_this_day_ctx_refresh");
        assert_eq!(ctx.refresh_live_price(true).await, None);

        let state = ctx.state.read().await;
        assert!(state.live_failed);
        assert_eq!(state.display_series().len(), 15);
        assert!(!ctx.live.is_fetching());
        drop(state);

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[tokio::test]
    async fn refresh_while_in_flight_returns_last_quote() {
        let (dir, ctx) = context("btc_this_day_ctx_in_flight");
        let quote = LiveQuote { price: 42.0, timestamp: Utc::now() };
        ctx.state.write().await.live_quote = Some(quote);

        let _held = ctx.live.try_begin().unwrap();
        assert_eq!(ctx.refresh_live_price(true).await, Some(quote));
        assert!(!ctx.state.read().await.live_failed);

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[tokio::test]
    async fn rollover_follows_the_clock() {
        fn next_day() -> NaiveDate {
            NaiveDate::from_ymd_opt(2025, 1, 4).unwrap()
        }

        let (dir, ctx) = context("btc_this_day_ctx_clock");
        let ctx = ctx.with_clock(next_day);
        let today = ctx.with_current_state(|state| state.today).await;
        assert_eq!(today, next_day());

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[tokio::test]
    async fn visibility_toggles() {
        let (dir, ctx) = context("btc_this_day_ctx_visibility");
        ctx.set_visibility(false).await;
        assert!(!ctx.is_visible().await);
        // Becoming visible attempts a fetch, which fails against the closed port.
        assert_eq!(ctx.set_visibility(true).await, None);
        assert!(ctx.state.read().await.live_failed);

        let _ = std::fs::remove_dir_all(&dir);
    }
}
