use axum::{
    extract::{Path, State},
    routing::get,
    Json, Router,
};
use serde::Serialize;
use skyfare_shared::{HistoryEntry, SearchDraft};

use crate::error::AppError;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct HistoryItem {
    pub label: String,
    #[serde(flatten)]
    pub entry: HistoryEntry,
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/v1/history", get(list_history))
        .route("/v1/history/{key}", get(restore))
}

/// GET /v1/history
/// Most recent search first
pub async fn list_history(State(state): State<AppState>) -> Json<Vec<HistoryItem>> {
    let items = state
        .engine
        .history()
        .await
        .into_iter()
        .map(|entry| HistoryItem {
            label: entry.label(),
            entry,
        })
        .collect();
    Json(items)
}

/// GET /v1/history/{key}
/// Form values to re-run a remembered search
pub async fn restore(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<Json<SearchDraft>, AppError> {
    state
        .engine
        .restore(&key)
        .await
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("No saved search {}", key)))
}
