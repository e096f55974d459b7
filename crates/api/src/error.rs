//! API error types with HTTP response mapping.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use dag::DagError;

/// API-level error type that maps to HTTP responses.
#[derive(Debug)]
pub enum ApiError {
    /// Resource not found.
    NotFound(String),
    /// Bad request from the client.
    BadRequest(String),
    /// DAG workflow execution error.
    Dag(DagError),
    /// Internal server error.
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::Dag(err) => dag_error_to_response(err),
            ApiError::Internal(msg) => {
                tracing::error!(error = %msg, "internal server error");
                (StatusCode::INTERNAL_SERVER_ERROR, msg)
            }
        };

        let body = serde_json::json!({ "error": message });
        (status, axum::Json(body)).into_response()
    }
}

fn dag_error_to_response(err: DagError) -> (StatusCode, String) {
    match &err {
        DagError::Validation(_) | DagError::UnsupportedNodeType { .. } => {
            (StatusCode::BAD_REQUEST, err.to_string())
        }
        DagError::NodeFailed { .. } => (StatusCode::INTERNAL_SERVER_ERROR, err.to_string()),
    }
}

impl From<DagError> for ApiError {
    fn from(err: DagError) -> Self {
        ApiError::Dag(err)
    }
}
