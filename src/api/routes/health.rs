//! Health Routes
//!
//! Health check endpoints for monitoring and Kubernetes probes.
//!
//! - GET /health/live - Liveness probe (process is alive)
//! - GET /health/ready - Readiness probe (a snapshot is being served)
//! - GET /health - Full health status

use axum::{extract::State, http::StatusCode, Json};
use std::sync::Arc;

use crate::api::dto::HealthResponse;
use crate::api::state::AppState;

/// GET /health/live
///
/// Returns 200 if the process is alive, no dependency checks.
pub async fn liveness() -> StatusCode {
    StatusCode::OK
}

/// GET /health/ready
///
/// The server only binds after the first snapshot loaded and a failed reload
/// keeps the previous one, so a running server is ready once it can read the
/// current snapshot.
pub async fn readiness(State(state): State<Arc<AppState>>) -> StatusCode {
    let snapshot = state.snapshot.current().await;
    tracing::trace!(rows = snapshot.table.len(), "Readiness probe");
    StatusCode::OK
}

/// GET /health
///
/// Full health status. `degraded` when the most recent reload failed.
pub async fn full_health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    let snapshot = state.snapshot.current().await;
    let failure = state.last_failure().await;

    let status = if failure.is_some() { "degraded" } else { "healthy" };

    Json(HealthResponse {
        status: status.to_string(),
        dashboard: state.spec.kind,
        store: state.store.describe(),
        row_count: snapshot.table.len(),
        snapshot_loaded_at: snapshot.loaded_at,
        last_reload_error: failure.map(|f| f.message),
        uptime_seconds: state.uptime_seconds(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_liveness() {
        let status = liveness().await;
        assert_eq!(status, StatusCode::OK);
    }
}
