//! API error handling.

use axum::{
    extract::rejection::{JsonRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use cotify_core::error::CotifyError;

/// API error type.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
    code: String,
}

impl ApiError {
    /// Creates a new API error.
    pub fn new(status: StatusCode, message: impl Into<String>, code: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
            code: code.into(),
        }
    }

    /// Bad request error.
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message, "BAD_REQUEST")
    }

    /// Not found error.
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, message, "NOT_FOUND")
    }

    /// Internal server error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, message, "INTERNAL_ERROR")
    }

    /// Returns the HTTP status.
    pub fn status(&self) -> StatusCode {
        self.status
    }
}

/// Error response body.
#[derive(Serialize)]
struct ErrorResponse {
    error: ErrorBody,
}

#[derive(Serialize)]
struct ErrorBody {
    code: String,
    message: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorResponse {
            error: ErrorBody {
                code: self.code,
                message: self.message,
            },
        };

        (self.status, Json(body)).into_response()
    }
}

impl From<CotifyError> for ApiError {
    fn from(err: CotifyError) -> Self {
        match &err {
            CotifyError::InvalidInput(_) => {
                ApiError::new(StatusCode::BAD_REQUEST, err.to_string(), "INVALID_INPUT")
            }
            CotifyError::NotFound(_) => ApiError::not_found(err.to_string()),
            CotifyError::UniqueConflict(_) => {
                ApiError::new(StatusCode::CONFLICT, err.to_string(), "CONFLICT")
            }
            CotifyError::BackendUnavailable(_) => {
                tracing::warn!(error = %err, "Backend unavailable");
                ApiError::new(
                    StatusCode::SERVICE_UNAVAILABLE,
                    "Storage backend unavailable",
                    "BACKEND_UNAVAILABLE",
                )
            }
            _ => {
                tracing::error!(error = %err, "Internal error");
                ApiError::internal("An internal error occurred")
            }
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::bad_request(rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::bad_request(rejection.body_text())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_domain_error_status_mapping() {
        let cases = [
            (CotifyError::InvalidInput("key is required".into()), StatusCode::BAD_REQUEST),
            (CotifyError::NotFound("k".into()), StatusCode::NOT_FOUND),
            (CotifyError::UniqueConflict("k".into()), StatusCode::CONFLICT),
            (CotifyError::BackendUnavailable("down".into()), StatusCode::SERVICE_UNAVAILABLE),
            (CotifyError::InternalError("bug".into()), StatusCode::INTERNAL_SERVER_ERROR),
        ];

        for (err, expected) in cases {
            assert_eq!(ApiError::from(err).status(), expected);
        }
    }

    #[test]
    fn test_internal_details_not_leaked() {
        let err = ApiError::from(CotifyError::InternalError("secret state".into()));
        assert!(!err.message.contains("secret"));
    }
}
