//! Shared application state

use anyhow::Result;
use chorus_classifiers::Orchestrator;
use chorus_storage::SqliteStore;
use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

use crate::config::ServerConfig;

/// Application state shared across all requests
#[derive(Clone)]
pub struct AppState {
    /// Panel, consensus and result store
    pub orchestrator: Arc<Orchestrator>,

    /// Prometheus metrics handle for rendering
    pub metrics_handle: Option<PrometheusHandle>,
}

impl AppState {
    /// Build state around an existing orchestrator
    pub fn new(orchestrator: Orchestrator) -> Self {
        Self {
            orchestrator: Arc::new(orchestrator),
            metrics_handle: None,
        }
    }

    pub fn with_metrics(mut self, handle: PrometheusHandle) -> Self {
        self.metrics_handle = Some(handle);
        self
    }

    /// Initialize application state from configuration
    pub fn from_config(config: &ServerConfig) -> Result<Self> {
        info!("Initializing application state");

        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()?;

        let panel = config
            .panel
            .build(&http_client, config.instruction.as_deref())?;
        info!("Panel: {}", panel.model_names().join(", "));

        let store = SqliteStore::open(&config.store_config())?;

        Ok(Self::new(Orchestrator::new(panel, Arc::new(store))))
    }
}
