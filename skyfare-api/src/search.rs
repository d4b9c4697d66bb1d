use axum::{extract::State, routing::post, Json, Router};
use serde::{Deserialize, Serialize};
use skyfare_core::interpreter::{ConfidenceTier, InterpretedOutcome};
use skyfare_shared::{SearchDraft, SearchQuery, SearchResult};

use crate::error::AppError;
use crate::state::AppState;

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct AskRequest {
    pub query: String,
}

#[derive(Debug, Serialize)]
pub struct AskResponse {
    pub confidence: ConfidenceTier,
    pub confidence_label: &'static str,
    pub summary: Option<String>,
    pub query: SearchQuery,
    pub result: SearchResult,
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/v1/search", post(search))
        .route("/v1/ask", post(ask))
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /v1/search
/// Structured form search; records the search in history on success
pub async fn search(
    State(state): State<AppState>,
    Json(draft): Json<SearchDraft>,
) -> Result<Json<SearchResult>, AppError> {
    let result = state.engine.search(&draft).await?;
    Ok(Json(result))
}

/// POST /v1/ask
/// Free-text search: interpret, validate, then run the structured search
pub async fn ask(
    State(state): State<AppState>,
    Json(req): Json<AskRequest>,
) -> Result<Json<AskResponse>, AppError> {
    let outcome = state.engine.ask(&req.query).await?;
    let summary = outcome.interpretation.summary();

    let (query, tier) = match outcome.interpretation {
        InterpretedOutcome::Unparsed { message } => return Err(AppError::NotUnderstood(message)),
        InterpretedOutcome::Invalid { error, .. } => return Err(AppError::Core(error.into())),
        InterpretedOutcome::ParsedLowConfidence { query } => (query, ConfidenceTier::Low),
        InterpretedOutcome::ParsedActionable { query, tier } => (query, tier),
    };

    let result = match outcome.search {
        Some(search) => search?,
        None => return Err(AppError::Internal(anyhow::anyhow!("interpreted query was not dispatched"))),
    };

    Ok(Json(AskResponse {
        confidence: tier,
        confidence_label: tier.label(),
        summary,
        query,
        result,
    }))
}
