use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use daxcur_core::CurationError;

/// Unified API error type for all route handlers.
#[derive(Debug)]
pub enum ApiError {
    BadRequest(String),
    NotFound(String),
    Unavailable(String),
    Internal(String),
}

#[derive(Serialize)]
struct ErrorBody {
    detail: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, detail) = match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            ApiError::Unavailable(msg) => (StatusCode::SERVICE_UNAVAILABLE, msg),
            ApiError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
        };

        (status, Json(ErrorBody { detail })).into_response()
    }
}

impl From<CurationError> for ApiError {
    fn from(e: CurationError) -> Self {
        if e.is_client_error() {
            return match e {
                CurationError::Validation(msg) => ApiError::BadRequest(msg),
                other => ApiError::NotFound(other.to_string()),
            };
        }

        let mut chain = e.to_string();
        let mut source = std::error::Error::source(&e);
        while let Some(cause) = source {
            chain.push_str(": ");
            chain.push_str(&cause.to_string());
            source = cause.source();
        }
        tracing::error!(error = %chain, "request failed");

        // Paths stay in the log, not in the response body.
        let detail = match e {
            CurationError::StorageUnavailable { .. } => "Storage unavailable",
            CurationError::CorruptData { .. } => "Stored examples could not be read",
            CurationError::Serialization(_) => "Failed to encode examples",
            _ => "Internal server error",
        };
        ApiError::Internal(detail.to_string())
    }
}

impl From<JsonRejection> for ApiError {
    fn from(e: JsonRejection) -> Self {
        ApiError::BadRequest(e.body_text())
    }
}
