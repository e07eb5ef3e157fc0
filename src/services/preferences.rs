// src/services/preferences.rs
use log::{debug, warn};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::Mutex;

use super::error::PipelineError;

pub const CHART_SCALE_KEY: &str = "btcyoy.chartScale";
pub const MY_GENESIS_KEY: &str = "btcyoy.myGenesisDate";

/// Flat string key-value store persisted as a JSON object. A missing or
/// corrupt file reads as empty; write failures are logged and ignored.
///
/// Clones share one lock, held across each read-modify-write of the file.
#[derive(Debug, Clone)]
pub struct PreferenceStore {
    path: PathBuf,
    lock: Arc<Mutex<()>>,
}

impl PreferenceStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        PreferenceStore {
            path: path.into(),
            lock: Arc::new(Mutex::new(())),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn load(&self) -> BTreeMap<String, String> {
        match tokio::fs::read_to_string(&self.path).await {
            Ok(content) => serde_json::from_str(&content).unwrap_or_else(|e| {
                warn!("Ignoring corrupt preference file {}: {}", self.path.display(), e);
                BTreeMap::new()
            }),
            Err(_) => BTreeMap::new(),
        }
    }

    async fn save(&self, values: &BTreeMap<String, String>) -> Result<(), PipelineError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent)
                    .await
                    .map_err(|e| PipelineError::Storage(e.to_string()))?;
            }
        }
        let json = serde_json::to_string_pretty(values).map_err(|e| PipelineError::Storage(e.to_string()))?;
        tokio::fs::write(&self.path, json)
            .await
            .map_err(|e| PipelineError::Storage(e.to_string()))
    }

    pub async fn get(&self, key: &str) -> Option<String> {
        let _held = self.lock.lock().await;
        self.load().await.remove(key)
    }

    pub async fn set(&self, key: &str, value: &str) {
        let _held = self.lock.lock().await;
        let mut values = self.load().await;
        values.insert(key.to_string(), value.to_string());
        match self.save(&values).await {
            Ok(()) => debug!("Stored {} = {}", key, value),
            Err(e) => warn!("Could not store {}: {}", key, e),
        }
    }

    pub async fn remove(&self, key: &str) {
        let _held = self.lock.lock().await;
        let mut values = self.load().await;
        if values.remove(key).is_none() {
            return;
        }
        if let Err(e) = self.save(&values).await {
            warn!("Could not remove {}: {}", key, e);
        }
    }
}
