// src/services/refresh.rs
use log::{debug, info, warn};
use std::sync::Arc;
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};

use crate::config::Config;
use super::context::AppContext;

/// Periodically refetch the live price while the client is visible.
pub fn spawn_auto_refresh(ctx: Arc<AppContext>) -> JoinHandle<()> {
    let mut period = ctx.config.refresh_interval;
    if period.is_zero() {
        period = Config::default().refresh_interval;
        warn!("Refresh interval must be non-zero, using {:?}", period);
    }
    info!("Auto refresh every {:?}", period);

    tokio::spawn(async move {
        let mut ticker = interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // The first tick fires immediately; startup already fetched.
        ticker.tick().await;

        loop {
            ticker.tick().await;
            if !ctx.is_visible().await {
                debug!("Client hidden, skipping refresh");
                continue;
            }
            ctx.refresh_live_price(false).await;
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::loader::sample_prices;
    use chrono::NaiveDate;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;
    use warp::Filter;

    #[tokio::test]
    async fn refreshes_only_while_visible() {
        let hits = Arc::new(AtomicUsize::new(0));
        let counter = hits.clone();
        let route = warp::any().map(move || {
            counter.fetch_add(1, Ordering::SeqCst);
            warp::reply::json(&serde_json::json!({"bitcoin": {"usd": 50_000.0}}))
        });
        let (addr, server) = warp::serve(route).bind_ephemeral(([127, 0, 0, 1], 0));
        tokio::spawn(server);

        let config = Config {
            live_price_url: format!("http://{}/", addr),
            refresh_interval: Duration::from_millis(40),
            prefs_path: std::env::temp_dir().join("btc_this_day_refresh_prefs.json"),
            ..Config::default()
        };
        let today = NaiveDate::from_ymd_opt(2026, 1, 3).unwrap();
        let ctx = Arc::new(AppContext::from_parts(config, sample_prices(), today).unwrap());

        ctx.set_visibility(false).await;
        let handle = spawn_auto_refresh(ctx.clone());
        tokio::time::sleep(Duration::from_millis(200)).await;
        assert_eq!(hits.load(Ordering::SeqCst), 0);

        ctx.state.write().await.visible = true;
        tokio::time::sleep(Duration::from_millis(200)).await;
        handle.abort();

        assert!(hits.load(Ordering::SeqCst) >= 1);
        let state = ctx.state.read().await;
        assert_eq!(state.live_quote.map(|q| q.price), Some(50_000.0));
        assert_eq!(state.display_series().last().unwrap().year, 2026);
    }

    #[tokio::test]
    async fn zero_interval_uses_default() {
        let config = Config {
            live_price_url: "http://127.0.0.1:9/unreachable".to_string(),
            refresh_interval: Duration::ZERO,
            prefs_path: std::env::temp_dir().join("btc_this_day_refresh_zero_prefs.json"),
            ..Config::default()
        };
        let today = NaiveDate::from_ymd_opt(2026, 1, 3).unwrap();
        let ctx = Arc::new(AppContext::from_parts(config, sample_prices(), today).unwrap());

        let handle = spawn_auto_refresh(ctx);
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(!handle.is_finished());
        handle.abort();
    }
}
