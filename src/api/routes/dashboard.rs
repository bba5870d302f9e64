//! Dashboard Routes
//!
//! - GET / - Rendered dashboard page
//! - GET /api/v1/summary - Cards and chart figures as JSON
//! - GET /api/v1/table - Schema and size of the loaded table

use axum::{
    extract::State,
    http::header,
    response::{Html, IntoResponse, Response},
    Json,
};
use std::sync::Arc;

use crate::api::dto::{ColumnInfo, SummaryResponse, TableInfoResponse};
use crate::api::state::AppState;
use crate::render::render_page;

/// GET /
pub async fn page(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let snapshot = state.snapshot.current().await;
    let html = render_page(&state.spec, &snapshot.summary);
    ([(header::CACHE_CONTROL, "no-cache")], Html(html))
}

/// GET /api/v1/summary
pub async fn summary(State(state): State<Arc<AppState>>) -> Response {
    let snapshot = state.snapshot.current().await;
    Json(SummaryResponse {
        summary: &snapshot.summary,
        loaded_at: snapshot.loaded_at,
    })
    .into_response()
}

/// GET /api/v1/table
pub async fn table_info(State(state): State<Arc<AppState>>) -> Json<TableInfoResponse> {
    let snapshot = state.snapshot.current().await;

    let columns = snapshot
        .table
        .columns()
        .iter()
        .map(|c| ColumnInfo {
            name: c.name.clone(),
            column_type: c.column_type,
        })
        .collect();

    Json(TableInfoResponse {
        dashboard: state.spec.kind,
        bucket: state.store.bucket().to_string(),
        object_key: snapshot.object_key.clone(),
        row_count: snapshot.table.len(),
        columns,
        loaded_at: snapshot.loaded_at,
    })
}
