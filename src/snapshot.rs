//! Dashboard Snapshot
//!
//! The context object handed to the HTTP layer: the loaded table, the
//! summary derived from it and when it was loaded. Built once at startup;
//! a reload builds a complete new snapshot and swaps the pointer under a
//! write lock, so readers see either the old or the new one.

use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::Instant;
use thiserror::Error;
use tokio::sync::RwLock;

use crate::aggregate::AggregateError;
use crate::dashboards::{build_summary, DashboardSpec, DashboardSummary};
use crate::store::ObjectStore;
use crate::table::{load_table, LoadError, LoadOptions, RecordTable};

/// Errors that can occur while building a snapshot
#[derive(Error, Debug)]
pub enum SnapshotError {
    #[error(transparent)]
    Load(#[from] LoadError),

    #[error("Aggregation failed: {0}")]
    Aggregate(#[from] AggregateError),
}

/// Loaded table plus everything derived from it
#[derive(Debug)]
pub struct Snapshot {
    pub table: RecordTable,
    pub summary: DashboardSummary,
    pub object_key: String,
    pub loaded_at: DateTime<Utc>,
}

impl Snapshot {
    /// Fetch, parse and aggregate the snapshot described by `spec`
    pub async fn load(
        store: &dyn ObjectStore,
        spec: &DashboardSpec,
        options: &LoadOptions,
    ) -> Result<Self, SnapshotError> {
        let started = Instant::now();
        let table = load_table(store, &spec.object_key, &spec.schema, options).await?;
        let snapshot = Self::from_table(spec, table)?;

        tracing::info!(
            dashboard = %spec.kind,
            rows = snapshot.table.len(),
            cards = snapshot.summary.cards.len(),
            charts = snapshot.summary.charts.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Snapshot ready"
        );

        Ok(snapshot)
    }

    /// Aggregate an already loaded table
    pub fn from_table(spec: &DashboardSpec, table: RecordTable) -> Result<Self, SnapshotError> {
        let summary = build_summary(spec, &table)?;
        Ok(Self {
            table,
            summary,
            object_key: spec.object_key.clone(),
            loaded_at: Utc::now(),
        })
    }
}

/// Current snapshot, replaceable as a whole
#[derive(Debug, Clone)]
pub struct SharedSnapshot {
    inner: Arc<RwLock<Arc<Snapshot>>>,
}

impl SharedSnapshot {
    pub fn new(snapshot: Snapshot) -> Self {
        Self {
            inner: Arc::new(RwLock::new(Arc::new(snapshot))),
        }
    }

    /// The snapshot current at the time of the call
    pub async fn current(&self) -> Arc<Snapshot> {
        Arc::clone(&*self.inner.read().await)
    }

    /// Swap in a fully built snapshot, returning the previous one
    pub async fn replace(&self, snapshot: Snapshot) -> Arc<Snapshot> {
        let mut guard = self.inner.write().await;
        std::mem::replace(&mut *guard, Arc::new(snapshot))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dashboards::sales;
    use crate::store::LocalStore;
    use tempfile::tempdir;

    fn write_sales(root: &std::path::Path, body: &str) {
        let dir = root.join("analytics").join("dashboards");
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join("sales_data.csv"), body).unwrap();
    }

    #[tokio::test]
    async fn test_load_snapshot() {
        let dir = tempdir().unwrap();
        write_sales(
            dir.path(),
            "date,region,product,revenue,units_sold\n2024-01-01,North,Widget,100,4\n",
        );
        let store = LocalStore::new(dir.path(), "analytics").unwrap();

        let snapshot = Snapshot::load(&store, &sales::spec(), &LoadOptions::default())
            .await
            .unwrap();

        assert_eq!(snapshot.table.len(), 1);
        assert_eq!(snapshot.summary.cards[2].display, "$25.00");
        assert_eq!(snapshot.object_key, "dashboards/sales_data.csv");
    }

    #[tokio::test]
    async fn test_load_snapshot_propagates_parse_errors() {
        let dir = tempdir().unwrap();
        write_sales(dir.path(), "date,region,product,revenue,units_sold\nyesterday,North,Widget,100,4\n");
        let store = LocalStore::new(dir.path(), "analytics").unwrap();

        let result = Snapshot::load(&store, &sales::spec(), &LoadOptions::default()).await;
        assert!(matches!(
            result,
            Err(SnapshotError::Load(LoadError::Parse { row: 1, .. }))
        ));
    }

    #[tokio::test]
    async fn test_replace_swaps_whole_snapshot() {
        let spec = sales::spec();
        let first = crate::table::parse_str(
            "date,region,product,revenue,units_sold\n2024-01-01,North,Widget,100,4\n",
            &spec.schema,
            &LoadOptions::default(),
        )
        .unwrap();
        let second = crate::table::parse_str(
            "date,region,product,revenue,units_sold\n2024-01-01,North,Widget,100,4\n2024-01-02,South,Widget,50,1\n",
            &spec.schema,
            &LoadOptions::default(),
        )
        .unwrap();

        let shared = SharedSnapshot::new(Snapshot::from_table(&spec, first).unwrap());
        let held = shared.current().await;

        let previous = shared.replace(Snapshot::from_table(&spec, second).unwrap()).await;

        assert_eq!(previous.table.len(), 1);
        // Readers holding the old snapshot keep a consistent view
        assert_eq!(held.table.len(), 1);
        assert_eq!(held.summary.row_count, 1);
        assert_eq!(shared.current().await.table.len(), 2);
        assert_eq!(shared.current().await.summary.row_count, 2);
    }
}
