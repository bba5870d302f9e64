//! Application Startup
//!
//! Runs the startup sequence to completion before any port is bound:
//!
//! ```text
//! Config ──► validate ──► ObjectStore ──► Snapshot::load ──► bind ──► serve
//! ```
//!
//! Any failure before `bind` aborts the process with a descriptive error.

use std::sync::Arc;
use thiserror::Error;

use crate::api::{self, ApiError, AppState};
use crate::config::{Config, ConfigError};
use crate::dashboards::DashboardSpec;
use crate::snapshot::{Snapshot, SnapshotError};
use crate::store::{build_store, ObjectStore, StoreError};
use crate::table::LoadOptions;

/// Errors that stop the process
#[derive(Error, Debug)]
pub enum StartupError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("Failed to load initial snapshot: {0}")]
    Snapshot(#[from] SnapshotError),

    #[error(transparent)]
    Server(#[from] ApiError),
}

/// Everything needed to serve, built from a validated config
pub struct Bootstrapped {
    pub spec: DashboardSpec,
    pub store: Arc<dyn ObjectStore>,
    pub options: LoadOptions,
    pub snapshot: Snapshot,
}

/// Descriptor for the configured dashboard, with any key override applied
pub fn dashboard_spec(config: &Config) -> DashboardSpec {
    let spec = config.dashboard.kind.spec();
    match &config.dashboard.object_key {
        Some(key) => spec.with_object_key(key.clone()),
        None => spec,
    }
}

/// Validate config, connect to the store and load the first snapshot
pub async fn bootstrap(config: &Config) -> Result<Bootstrapped, StartupError> {
    config.validate()?;

    let spec = dashboard_spec(config);
    let store = build_store(&config.store)?;
    let options = config.dashboard.load_options();

    tracing::info!(
        dashboard = %spec.kind,
        bucket = %store.bucket(),
        key = %spec.object_key,
        "Loading initial snapshot"
    );

    let snapshot = Snapshot::load(store.as_ref(), &spec, &options).await?;

    Ok(Bootstrapped {
        spec,
        store,
        options,
        snapshot,
    })
}

/// Bootstrap and serve until a shutdown signal arrives
pub async fn run(config: Config) -> Result<(), StartupError> {
    let addr = config.api.addr()?;
    let ready = bootstrap(&config).await?;

    let state = AppState::new(ready.spec, ready.snapshot, ready.store, ready.options);
    api::serve(state, &config.api, addr).await?;
    Ok(())
}
