use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use skyfare_core::{CoreError, NetworkError};
use skyfare_offer::InsightError;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error(transparent)]
    Core(#[from] CoreError),
    #[error(transparent)]
    Insight(#[from] InsightError),
    #[error("{0}")]
    NotUnderstood(String),
    #[error("{0}")]
    NotFound(String),
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    fn status_and_title(&self) -> (StatusCode, &'static str) {
        match self {
            AppError::Core(err) => {
                let status = match err {
                    CoreError::Validation(_) => StatusCode::BAD_REQUEST,
                    CoreError::Network(NetworkError::Timeout(_)) => StatusCode::GATEWAY_TIMEOUT,
                    CoreError::Network(_) | CoreError::Response(_) | CoreError::AiUnavailable(_) => {
                        StatusCode::BAD_GATEWAY
                    }
                    CoreError::NoOffersFound => StatusCode::NOT_FOUND,
                    CoreError::StorageCorruption(_) => StatusCode::INTERNAL_SERVER_ERROR,
                };
                (status, err.title())
            }
            AppError::Insight(err) => {
                let status = match err {
                    InsightError::Unavailable { cause, .. } if cause.is_timeout() => StatusCode::GATEWAY_TIMEOUT,
                    InsightError::Unavailable { .. } => StatusCode::BAD_GATEWAY,
                    InsightError::InvalidDestination(_) => StatusCode::BAD_REQUEST,
                    InsightError::NoActiveSearch | InsightError::Stale(_) => StatusCode::CONFLICT,
                };
                let title = match err.to_core() {
                    Some(core) => core.title(),
                    None if matches!(err, InsightError::NoActiveSearch) => "No Active Search",
                    None => "Search Changed",
                };
                (status, title)
            }
            AppError::NotUnderstood(_) => (StatusCode::UNPROCESSABLE_ENTITY, "Could Not Understand"),
            AppError::NotFound(_) => (StatusCode::NOT_FOUND, "Not Found"),
            AppError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error"),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, title) = self.status_and_title();

        let error_message = match &self {
            AppError::Internal(err) => {
                tracing::error!("Internal Server Error: {:#}", err);
                "Internal Server Error".to_string()
            }
            other => {
                if status.is_server_error() {
                    tracing::warn!("{}: {}", title, other);
                }
                other.to_string()
            }
        };

        let body = Json(json!({
            "error": error_message,
            "title": title,
        }));

        (status, body).into_response()
    }
}
