//! Data Transfer Objects
//!
//! Response types for the API endpoints, serialized to JSON.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::dashboards::{DashboardKind, DashboardSummary};
use crate::table::ColumnType;

// ============================================
// DASHBOARD DTOs
// ============================================

/// GET /api/v1/summary
#[derive(Debug, Serialize)]
pub struct SummaryResponse<'a> {
    #[serde(flatten)]
    pub summary: &'a DashboardSummary,
    pub loaded_at: DateTime<Utc>,
}

/// Column description in a table info response
#[derive(Debug, Serialize)]
pub struct ColumnInfo {
    pub name: String,
    #[serde(rename = "type")]
    pub column_type: ColumnType,
}

/// GET /api/v1/table
#[derive(Debug, Serialize)]
pub struct TableInfoResponse {
    pub dashboard: DashboardKind,
    pub bucket: String,
    pub object_key: String,
    pub row_count: usize,
    pub columns: Vec<ColumnInfo>,
    pub loaded_at: DateTime<Utc>,
}

/// POST /api/v1/reload
#[derive(Debug, Serialize)]
pub struct ReloadResponse {
    /// Status: "ok"
    pub status: String,
    pub row_count: usize,
    pub loaded_at: DateTime<Utc>,
    pub elapsed_ms: u64,
}

// ============================================
// HEALTH DTOs
// ============================================

/// GET /health
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// Overall status: healthy or degraded
    pub status: String,
    pub dashboard: DashboardKind,
    /// Store the snapshot came from
    pub store: String,
    pub row_count: usize,
    pub snapshot_loaded_at: DateTime<Utc>,
    /// Message of the last failed reload, if the last reload failed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_reload_error: Option<String>,
    /// Server uptime in seconds
    pub uptime_seconds: u64,
    /// Application version
    pub version: String,
}
