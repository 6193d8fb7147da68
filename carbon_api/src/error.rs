use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// Failures that can happen while answering a request.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("insufficient carbon history: need at least {required} samples, have {available}")]
    InsufficientHistory { required: usize, available: usize },

    #[error("regressor produced a non-finite prediction ({0})")]
    NonFinitePrediction(f64),
}

impl IntoResponse for ServiceError {
    fn into_response(self) -> Response {
        tracing::error!("request failed: {}", self);
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "error": self.to_string() })),
        )
            .into_response()
    }
}
