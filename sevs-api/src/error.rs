//! Error types for sevs-api
//!
//! Every failure leaves the service as `{"error": "<message>"}`. Store and
//! internal failures are logged in full and replaced with a generic message.

use axum::{
    extract::multipart::{MultipartError, MultipartRejection},
    extract::rejection::{JsonRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use sevs_common::Error;
use thiserror::Error;
use tracing::{debug, error};

/// API error type
#[derive(Debug, Error)]
pub enum ApiError {
    /// Request could not be decoded (400)
    #[error("Invalid request: {0}")]
    BadRequest(String),

    /// sevs-common error
    #[error(transparent)]
    Common(#[from] Error),
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl From<MultipartRejection> for ApiError {
    fn from(rejection: MultipartRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl From<MultipartError> for ApiError {
    fn from(err: MultipartError) -> Self {
        ApiError::BadRequest(err.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let err = match self {
            ApiError::BadRequest(msg) => {
                return (StatusCode::BAD_REQUEST, Json(json!({ "error": msg }))).into_response();
            }
            ApiError::Common(err) => err,
        };

        let (status, body) = match err {
            Error::Validation(msg) => (StatusCode::BAD_REQUEST, json!({ "error": msg })),
            Error::NotFound(msg) => (StatusCode::NOT_FOUND, json!({ "error": msg })),
            Error::BarcodeTaken { barcode } => {
                debug!(barcode = %barcode, "Barcode assignment rejected: already taken");
                (
                    StatusCode::BAD_REQUEST,
                    json!({ "error": "Barcode already assigned to another participant" }),
                )
            }
            Error::AlreadyEntered { venue, timestamp } => {
                debug!(venue = %venue, "Entry rejected: already entered");
                (
                    StatusCode::BAD_REQUEST,
                    json!({ "error": "Already entered", "timestamp": timestamp }),
                )
            }
            Error::Authentication => {
                (StatusCode::UNAUTHORIZED, json!({ "error": "Not authenticated" }))
            }
            Error::InvalidCredentials => {
                (StatusCode::UNAUTHORIZED, json!({ "error": "Invalid credentials" }))
            }
            Error::Authorization => (
                StatusCode::FORBIDDEN,
                json!({ "error": "Forbidden - insufficient role" }),
            ),
            other @ (Error::Database(_) | Error::Io(_) | Error::Config(_) | Error::Internal(_)) => {
                error!("Request failed: {}", other);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    json!({ "error": "Internal server error" }),
                )
            }
        };

        (status, Json(body)).into_response()
    }
}

/// Result type for API handlers
pub type ApiResult<T> = Result<T, ApiError>;
