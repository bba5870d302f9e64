//! Application State
//!
//! Shared state accessible by all API handlers.
//! Wrapped in Arc for thread-safe sharing across async tasks.

use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::{Mutex, RwLock};

use crate::api::error::{ApiError, ApiResult};
use crate::dashboards::DashboardSpec;
use crate::snapshot::{SharedSnapshot, Snapshot};
use crate::store::ObjectStore;
use crate::table::LoadOptions;

/// Outcome of the most recent failed reload
#[derive(Debug, Clone)]
pub struct ReloadFailure {
    pub message: String,
    pub at: DateTime<Utc>,
}

/// Shared application state for all handlers
#[derive(Clone)]
pub struct AppState {
    /// Descriptor of the served dashboard
    pub spec: Arc<DashboardSpec>,
    /// Current snapshot
    pub snapshot: SharedSnapshot,
    /// Store the snapshot is reloaded from
    pub store: Arc<dyn ObjectStore>,
    /// Loader options used for reloads
    pub options: LoadOptions,
    /// Server start time for uptime tracking
    pub start_time: Instant,
    /// Held for the duration of a reload
    reload_lock: Arc<Mutex<()>>,
    last_failure: Arc<RwLock<Option<ReloadFailure>>>,
}

impl AppState {
    pub fn new(
        spec: DashboardSpec,
        snapshot: Snapshot,
        store: Arc<dyn ObjectStore>,
        options: LoadOptions,
    ) -> Self {
        Self {
            spec: Arc::new(spec),
            snapshot: SharedSnapshot::new(snapshot),
            store,
            options,
            start_time: Instant::now(),
            reload_lock: Arc::new(Mutex::new(())),
            last_failure: Arc::new(RwLock::new(None)),
        }
    }

    /// Get server uptime in seconds
    pub fn uptime_seconds(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }

    /// Most recent reload failure, cleared by a successful reload
    pub async fn last_failure(&self) -> Option<ReloadFailure> {
        self.last_failure.read().await.clone()
    }

    /// Fetch and aggregate a fresh snapshot, then swap it in.
    ///
    /// The fetch and parse run without holding the snapshot lock. On failure
    /// the current snapshot keeps being served.
    pub async fn reload(&self) -> ApiResult<Arc<Snapshot>> {
        let _guard = self
            .reload_lock
            .try_lock()
            .map_err(|_| ApiError::Conflict("a reload is already running".to_string()))?;

        match Snapshot::load(self.store.as_ref(), &self.spec, &self.options).await {
            Ok(snapshot) => {
                self.snapshot.replace(snapshot).await;
                *self.last_failure.write().await = None;
                Ok(self.snapshot.current().await)
            }
            Err(e) => {
                tracing::warn!(
                    bucket = %self.store.bucket(),
                    key = %self.spec.object_key,
                    error = %e,
                    "Reload failed, keeping current snapshot"
                );
                *self.last_failure.write().await = Some(ReloadFailure {
                    message: e.to_string(),
                    at: Utc::now(),
                });
                Err(ApiError::Reload(e))
            }
        }
    }
}
