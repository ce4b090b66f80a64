use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::auth::username::UsernameError;

/// Errors surfaced to the client. Internal causes are logged where they
/// happen; only the message below ever reaches the response body.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),
    #[error("{0}")]
    NotFound(String),
}

impl From<UsernameError> for ApiError {
    fn from(e: UsernameError) -> Self {
        ApiError::BadRequest(e.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::BadRequest(msg) => {
                tracing::debug!(message = %msg, "bad request");
                (StatusCode::BAD_REQUEST, msg)
            }
            ApiError::NotFound(msg) => {
                tracing::debug!(message = %msg, "not found");
                (StatusCode::NOT_FOUND, msg)
            }
        };
        (status, Json(json!({ "error": message }))).into_response()
    }
}
