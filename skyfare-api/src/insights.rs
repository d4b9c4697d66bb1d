use axum::{
    extract::{Path, State},
    routing::{get, post},
    Json, Router,
};
use skyfare_offer::CapabilityStatus;
use skyfare_shared::models::insight::{DestinationInsights, PriceAnalysis, TravelRecommendations};

use crate::error::AppError;
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/v1/insights/destination/{code}", get(destination_insights))
        .route("/v1/insights/prices", post(analyze_prices))
        .route("/v1/insights/recommendations", post(recommendations))
        .route("/v1/insights/status", get(status))
}

/// GET /v1/insights/destination/{code}
pub async fn destination_insights(
    State(state): State<AppState>,
    Path(code): Path<String>,
) -> Result<Json<DestinationInsights>, AppError> {
    Ok(Json(state.engine.destination_insights(&code).await?))
}

/// POST /v1/insights/prices
/// Price analysis for the active search
pub async fn analyze_prices(State(state): State<AppState>) -> Result<Json<PriceAnalysis>, AppError> {
    Ok(Json(state.engine.analyze_prices().await?))
}

/// POST /v1/insights/recommendations
pub async fn recommendations(State(state): State<AppState>) -> Result<Json<TravelRecommendations>, AppError> {
    Ok(Json(state.engine.recommendations().await?))
}

/// GET /v1/insights/status
pub async fn status(State(state): State<AppState>) -> Json<Vec<CapabilityStatus>> {
    Json(state.engine.insight_status().await)
}
