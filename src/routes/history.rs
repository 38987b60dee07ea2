use axum::{
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use chrono::Utc;
use serde::Deserialize;
use tracing::{error, info, warn};

use crate::{AppState, SortColumn};

// ---

pub fn router() -> Router<AppState> {
    // ---
    Router::new()
        .route("/history", get(show))
        .route("/history/sort/{column}", post(sort))
        .route("/history/export", get(export))
}

/// Query parameters for the history table
#[derive(Debug, Deserialize)]
pub struct HistoryQuery {
    /// Case-insensitive substring matched against every column
    search: Option<String>,
}

async fn show(Query(params): Query<HistoryQuery>, State(state): State<AppState>) -> impl IntoResponse {
    // ---
    let mut dashboard = state.dashboard.lock().await;
    let body = match params.search.as_deref() {
        Some(term) => dashboard.history.filter(term),
        None => dashboard.history.render(),
    };
    Json(body.clone())
}

async fn sort(Path(column): Path<String>, State(state): State<AppState>) -> impl IntoResponse {
    // ---
    let column: SortColumn = match column.parse() {
        Ok(column) => column,
        Err(e) => {
            warn!("Sort rejected: {}", e);
            return (StatusCode::BAD_REQUEST, Json(e.to_string())).into_response();
        }
    };

    let mut dashboard = state.dashboard.lock().await;
    let body = dashboard.history.sort(column).clone();
    (StatusCode::OK, Json(body)).into_response()
}

/// Download the full history (ignoring any filter) as CSV.
async fn export(State(state): State<AppState>) -> impl IntoResponse {
    // ---
    let dashboard = state.dashboard.lock().await;
    let export = match dashboard.history.export_csv(Utc::now().date_naive()) {
        Ok(export) => export,
        Err(e) => {
            error!("Failed to export history: {}", e);
            return (StatusCode::INTERNAL_SERVER_ERROR, Json("Failed to export history"))
                .into_response();
        }
    };

    info!(
        "Exporting {} history rows as {}",
        dashboard.history.entries().len(),
        export.filename
    );

    (
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", export.filename),
            ),
        ],
        export.content,
    )
        .into_response()
}
