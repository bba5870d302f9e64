//! Filesystem-backed object store
//!
//! Treats `{root}/{bucket}` as the bucket and object keys as relative paths
//! below it. Used for local development and tests.

use async_trait::async_trait;
use std::path::{Component, Path, PathBuf};

use super::error::{StoreError, StoreResult};
use super::ObjectStore;

pub struct LocalStore {
    root: PathBuf,
    bucket: String,
}

impl LocalStore {
    pub fn new(root: impl Into<PathBuf>, bucket: impl Into<String>) -> StoreResult<Self> {
        let bucket = bucket.into();
        if bucket.trim().is_empty() {
            return Err(StoreError::Configuration(
                "bucket name must not be empty".to_string(),
            ));
        }

        Ok(Self {
            root: root.into(),
            bucket,
        })
    }

    /// Directory holding this bucket's objects
    pub fn bucket_dir(&self) -> PathBuf {
        self.root.join(&self.bucket)
    }

    fn object_path(&self, key: &str) -> StoreResult<PathBuf> {
        let relative = Path::new(key.trim_start_matches('/'));
        // Keys must stay inside the bucket directory
        if relative
            .components()
            .any(|c| !matches!(c, Component::Normal(_)))
        {
            return Err(StoreError::NotFound {
                bucket: self.bucket.clone(),
                key: key.to_string(),
            });
        }
        Ok(self.bucket_dir().join(relative))
    }
}

#[async_trait]
impl ObjectStore for LocalStore {
    fn bucket(&self) -> &str {
        &self.bucket
    }

    fn describe(&self) -> String {
        format!("local {}", self.bucket_dir().display())
    }

    async fn fetch(&self, key: &str) -> StoreResult<Vec<u8>> {
        let path = self.object_path(key)?;
        match tokio::fs::read(&path).await {
            Ok(bytes) => Ok(bytes),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(StoreError::NotFound {
                bucket: self.bucket.clone(),
                key: key.to_string(),
            }),
            Err(e) => Err(StoreError::Io(e)),
        }
    }
}
