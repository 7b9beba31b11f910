//! Client-visible error taxonomy.
//!
//! Domain code constructs these locally and returns them as structured
//! results; the HTTP boundary maps each variant 1:1 to a status code and
//! response body (see `server::error`). Unexpected failures travel as
//! `Internal` and never expose their cause to the caller.

use serde::Serialize;
use thiserror::Error;

/// A single violated validation rule.
///
/// Validation collects every violated rule, not just the first, so clients
/// can surface all field problems in one round trip.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct RuleViolation {
    pub code: &'static str,
    pub message: String,
}

impl RuleViolation {
    pub fn new(code: &'static str, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

/// Chat wire-protocol errors.
///
/// `UnknownKind` carries the offending raw discriminator for diagnostics;
/// `InvalidFrame` covers frames whose payload fails its nominated schema
/// (including a missing discriminator).
#[derive(Error, Debug)]
pub enum ProtocolError {
    #[error("unknown message type: {0}")]
    UnknownKind(String),

    #[error("invalid message frame: {0}")]
    InvalidFrame(String),
}

/// Application error taxonomy.
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("validation failed")]
    Validation(Vec<RuleViolation>),

    #[error("authentication required")]
    Unauthenticated,

    #[error("forbidden: {0}")]
    Forbidden(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("conflict: {0}")]
    Conflict(String),

    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    #[error("internal error")]
    Internal(#[from] anyhow::Error),
}

impl ApiError {
    pub fn forbidden(message: impl Into<String>) -> Self {
        ApiError::Forbidden(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        ApiError::NotFound(message.into())
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        ApiError::Conflict(message.into())
    }

    /// Single-rule validation failure.
    pub fn invalid(code: &'static str, message: impl Into<String>) -> Self {
        ApiError::Validation(vec![RuleViolation::new(code, message)])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_violation_serializes_code_and_message() {
        let violation = RuleViolation::new("title.empty", "title must not be empty");
        let json = serde_json::to_value(&violation).unwrap();
        assert_eq!(json["code"], "title.empty");
        assert_eq!(json["message"], "title must not be empty");
    }

    #[test]
    fn test_unknown_kind_reports_raw_type() {
        let err = ProtocolError::UnknownKind("coolMessage".to_string());
        assert!(err.to_string().contains("coolMessage"));
    }
}
