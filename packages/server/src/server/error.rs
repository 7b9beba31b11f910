//! Error-to-response mapping at the HTTP boundary.
//!
//! Every `ApiError` variant maps 1:1 to a status code, and every body is a
//! list of `{code, message}` entries so clients handle single failures and
//! collected validation failures the same way. `Internal` is logged with its
//! full cause and surfaces as a generic body only.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;

use crate::common::{ApiError, ProtocolError, RuleViolation};

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, violations) = match self {
            ApiError::Validation(violations) => (StatusCode::BAD_REQUEST, violations),
            ApiError::Unauthenticated => (
                StatusCode::UNAUTHORIZED,
                vec![RuleViolation::new(
                    "unauthenticated",
                    "authentication required",
                )],
            ),
            ApiError::Forbidden(message) => (
                StatusCode::FORBIDDEN,
                vec![RuleViolation::new("forbidden", message)],
            ),
            ApiError::NotFound(message) => (
                StatusCode::NOT_FOUND,
                vec![RuleViolation::new("not_found", message)],
            ),
            ApiError::Conflict(message) => (
                StatusCode::CONFLICT,
                vec![RuleViolation::new("conflict", message)],
            ),
            ApiError::Protocol(error) => {
                let code = match &error {
                    ProtocolError::UnknownKind(_) => "protocol.unknown_kind",
                    ProtocolError::InvalidFrame(_) => "protocol.invalid_frame",
                };
                (
                    StatusCode::BAD_REQUEST,
                    vec![RuleViolation::new(code, error.to_string())],
                )
            }
            ApiError::Internal(error) => {
                tracing::error!(error = ?error, "request failed with internal error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    vec![RuleViolation::new("internal", "an internal error occurred")],
                )
            }
        };

        (status, Json(violations)).into_response()
    }
}
