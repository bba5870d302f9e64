//! Reload Route
//!
//! POST /api/v1/reload - Re-fetch the snapshot and swap it in

use axum::{extract::State, Json};
use std::sync::Arc;
use std::time::Instant;

use crate::api::dto::ReloadResponse;
use crate::api::error::ApiResult;
use crate::api::state::AppState;

/// POST /api/v1/reload
///
/// Returns 503 when the store is unreachable or the object is missing and
/// 422 when the new snapshot does not parse. The previous snapshot stays in
/// place in both cases.
pub async fn reload(State(state): State<Arc<AppState>>) -> ApiResult<Json<ReloadResponse>> {
    let started = Instant::now();
    let snapshot = state.reload().await?;
    let elapsed_ms = started.elapsed().as_millis() as u64;

    tracing::info!(
        rows = snapshot.table.len(),
        elapsed_ms = elapsed_ms,
        "Snapshot reloaded"
    );

    Ok(Json(ReloadResponse {
        status: "ok".to_string(),
        row_count: snapshot.table.len(),
        loaded_at: snapshot.loaded_at,
        elapsed_ms,
    }))
}
