//! Error types for btm-ui

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// API error type
#[derive(Debug, Error)]
pub enum ApiError {
    /// Invalid request (400)
    #[error("Invalid request: {0}")]
    BadRequest(String),

    /// btm-common error
    #[error(transparent)]
    Common(#[from] btm_common::Error),
}

impl ApiError {
    fn parts(&self) -> (StatusCode, &'static str) {
        use btm_common::Error as E;

        match self {
            ApiError::BadRequest(_) => (StatusCode::BAD_REQUEST, "BAD_REQUEST"),
            ApiError::Common(E::MissingColumn(_)) => (StatusCode::BAD_REQUEST, "MISSING_COLUMN"),
            ApiError::Common(E::Csv(_)) => (StatusCode::BAD_REQUEST, "INVALID_CSV"),
            ApiError::Common(E::InvalidInput(_)) => (StatusCode::BAD_REQUEST, "BAD_REQUEST"),
            ApiError::Common(E::Http(_) | E::Registry(_) | E::RegistryShape(_)) => {
                (StatusCode::BAD_GATEWAY, "UPSTREAM_ERROR")
            }
            ApiError::Common(_) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_code) = self.parts();
        let message = match &self {
            ApiError::BadRequest(msg) => msg.clone(),
            ApiError::Common(err) => err.to_string(),
        };

        let body = Json(json!({
            "error": {
                "code": error_code,
                "message": message,
            }
        }));

        (status, body).into_response()
    }
}

/// Result type for API handlers
pub type ApiResult<T> = Result<T, ApiError>;
