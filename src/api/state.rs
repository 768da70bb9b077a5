//! Application State
//!
//! Shared state accessible by all API handlers.
//! The dataset sits behind an `RwLock` and is replaced wholesale on reload.

use std::sync::Arc;
use std::time::Instant;
use tokio::sync::RwLock;

use crate::config::{ApiConfig, IndexConfig};
use crate::dataset::{Dataset, DatasetError};
use crate::index::BuildReport;

/// Shared application state for all handlers
#[derive(Clone)]
pub struct AppState {
    /// Index and coverage currently served
    pub dataset: Arc<RwLock<Dataset>>,
    /// Where reloads read from
    pub sources: Arc<IndexConfig>,
    /// API configuration
    pub config: Arc<ApiConfig>,
    /// Server start time for uptime tracking
    pub start_time: Instant,
}

impl AppState {
    pub fn new(dataset: Dataset, sources: IndexConfig, config: ApiConfig) -> Self {
        Self {
            dataset: Arc::new(RwLock::new(dataset)),
            sources: Arc::new(sources),
            config: Arc::new(config),
            start_time: Instant::now(),
        }
    }

    /// Get server uptime in seconds
    pub fn uptime_seconds(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }

    /// Rebuild the dataset from its sources and swap it in
    ///
    /// Loading happens on the blocking pool and without holding the lock;
    /// on failure the current dataset keeps serving.
    pub async fn reload(&self) -> Result<BuildReport, DatasetError> {
        let sources = Arc::clone(&self.sources);
        let loaded = tokio::task::spawn_blocking(move || Dataset::load(&sources))
            .await
            .map_err(|e| DatasetError::Task(e.to_string()))??;

        let report = loaded.report.clone();
        let targets = loaded.index.len();
        *self.dataset.write().await = loaded;
        tracing::info!(targets, "Dataset reloaded");

        Ok(report)
    }
}

impl ApiConfig {
    /// Get the socket address string
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
