//! Application state for API handlers

use crate::notifications::NotificationCenter;
use inspection_engine::{BlobStore, CatalogService, EngineConfig, InspectionEngine, Storage};
use inspection_reports::ReportService;
use std::sync::Arc;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// Lifecycle engine
    pub engine: Arc<InspectionEngine>,

    /// Plants, shipping lines and users
    pub catalog: CatalogService,

    /// Dashboards, summaries and exports
    pub reports: ReportService,

    /// Per-user notification inbox
    pub notifications: NotificationCenter,

    /// Daemon version
    pub version: String,

    /// Daemon start time
    pub started_at: chrono::DateTime<chrono::Utc>,
}

impl AppState {
    /// Wire every service over one storage backend and blob store
    ///
    /// Also starts the task feeding notifications from engine events.
    pub fn new(store: Arc<dyn Storage>, blobs: Arc<dyn BlobStore>, config: EngineConfig) -> Self {
        let engine = Arc::new(InspectionEngine::new(store.clone(), blobs, config));
        let notifications = NotificationCenter::new();
        notifications.spawn(engine.subscribe());

        Self {
            catalog: CatalogService::new(store.clone()),
            reports: ReportService::new(store),
            engine,
            notifications,
            version: env!("CARGO_PKG_VERSION").to_string(),
            started_at: chrono::Utc::now(),
        }
    }

    /// Get uptime as a human-readable string
    pub fn uptime(&self) -> String {
        let duration = chrono::Utc::now() - self.started_at;
        let secs = duration.num_seconds();

        if secs < 60 {
            format!("{}s", secs)
        } else if secs < 3600 {
            format!("{}m {}s", secs / 60, secs % 60)
        } else if secs < 86400 {
            format!("{}h {}m", secs / 3600, (secs % 3600) / 60)
        } else {
            format!("{}d {}h", secs / 86400, (secs % 86400) / 3600)
        }
    }
}
