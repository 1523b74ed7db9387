use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// Handler error rendered as a JSON body.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("no data")]
    NoData,

    /// Manual fetch failure; the message is also recorded in the fetch status.
    #[error("{0}")]
    Fetch(String),

    #[error(transparent)]
    Store(#[from] coinsnap_core::StoreError),

    #[error("background task failed: {0}")]
    Task(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, body) = match &self {
            AppError::NoData => (StatusCode::NOT_FOUND, json!({ "error": self.to_string() })),
            AppError::Fetch(message) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                json!({ "status": "error", "error": message }),
            ),
            AppError::Store(_) | AppError::Task(_) => {
                tracing::error!(error = %self, "request failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    json!({ "error": self.to_string() }),
                )
            }
        };

        (status, Json(body)).into_response()
    }
}
