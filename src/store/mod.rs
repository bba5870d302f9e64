//! Object Store
//!
//! Read-only access to the bucket holding dashboard snapshots.
//!
//! # Backends
//!
//! - [`GcsStore`]: Google Cloud Storage (or an emulator) over HTTP
//! - [`LocalStore`]: a directory on disk, for development and tests

mod auth;
mod error;
mod gcs;
mod local;
mod retry;

pub use auth::{MetadataTokenSource, DEFAULT_METADATA_HOST};
pub use error::{StoreError, StoreResult};
pub use gcs::{GcsConfig, GcsStore, DEFAULT_ENDPOINT};
pub use local::LocalStore;
pub use retry::RetryPolicy;

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;

use crate::config::StoreConfig;

/// Read access to objects in a single bucket
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Bucket this store reads from
    fn bucket(&self) -> &str;

    /// Human-readable description for logs
    fn describe(&self) -> String;

    /// Download an object's bytes
    async fn fetch(&self, key: &str) -> StoreResult<Vec<u8>>;
}

/// Build the configured object store.
///
/// Fails with [`StoreError::Configuration`] when no bucket is configured.
pub fn build_store(config: &StoreConfig) -> StoreResult<Arc<dyn ObjectStore>> {
    let bucket = config.bucket_name().ok_or_else(|| {
        StoreError::Configuration("data bucket is not set (DATA_BUCKET)".to_string())
    })?;

    if let Some(root) = &config.local_root {
        let store = LocalStore::new(root, bucket)?;
        tracing::info!("Using object store: {}", store.describe());
        return Ok(Arc::new(store));
    }

    let gcs_config = GcsConfig::new(bucket)
        .endpoint(config.endpoint.clone())
        .bearer_token(config.token.clone())
        .metadata_credentials(metadata_host(config))
        .request_timeout(Duration::from_secs(config.fetch_timeout_secs))
        .retry(RetryPolicy {
            max_attempts: config.max_attempts,
            base_backoff_ms: config.base_backoff_ms,
        });

    let store = GcsStore::new(gcs_config)?;
    tracing::info!("Using object store: {}", store.describe());
    Ok(Arc::new(store))
}

/// Metadata server to ask for tokens: only for the public endpoint without a configured token
fn metadata_host(config: &StoreConfig) -> Option<String> {
    let public = config.endpoint.trim_end_matches('/') == DEFAULT_ENDPOINT;
    let has_token = config.token.as_deref().map_or(false, |t| !t.trim().is_empty());
    (config.metadata_credentials && public && !has_token)
        .then(|| config.metadata_host.clone())
}
