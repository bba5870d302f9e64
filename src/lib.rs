//! # Dashboards
//!
//! Read-only analytics dashboards over CSV snapshots kept in an object
//! store bucket. One binary serves one of three variants: customer
//! analytics, financial reports or sales performance.
//!
//! ## Pipeline
//!
//! ```text
//! Config ──► ObjectStore ──► Loader ──► RecordTable ──► Aggregator ──► DashboardSummary ──► HTML / JSON
//! ```
//!
//! ## Modules
//!
//! - [`store`]: Object store access (GCS JSON API or a local directory)
//! - [`table`]: Typed record tables and the snapshot loader
//! - [`aggregate`]: Grouped reductions and scalar metrics
//! - [`dashboards`]: Per-variant descriptors and summary evaluation
//! - [`snapshot`]: Loaded snapshot shared with request handlers
//! - [`render`]: HTML page rendering
//! - [`api`]: HTTP server with Axum
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use dashboards::{Config, DashboardKind};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut config = Config::from_env()?;
//!     config.dashboard.kind = DashboardKind::Sales;
//!     config.store.bucket = Some("analytics-snapshots".to_string());
//!
//!     let ready = dashboards::app::bootstrap(&config).await?;
//!     for card in &ready.snapshot.summary.cards {
//!         println!("{}: {}", card.label, card.display);
//!     }
//!
//!     Ok(())
//! }
//! ```

pub mod aggregate;
pub mod api;
pub mod app;
pub mod config;
pub mod dashboards;
pub mod render;
pub mod snapshot;
pub mod store;
pub mod table;

// Re-export top-level types for convenience
pub use aggregate::{AggregateError, GroupSpec, GroupedTable, Reduction};

pub use api::{build_router, serve, ApiError, AppState};

pub use app::{bootstrap, run, StartupError};

pub use config::{Config, ConfigError};

pub use dashboards::{build_summary, DashboardKind, DashboardSpec, DashboardSummary, MetricCard};

pub use snapshot::{SharedSnapshot, Snapshot, SnapshotError};

pub use store::{build_store, GcsStore, LocalStore, ObjectStore, StoreError};

pub use table::{load_table, LoadError, LoadOptions, RecordTable, TableSchema, Value};
