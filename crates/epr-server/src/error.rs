//! Application error type
//!
//! Expected outcomes (not found, invalid input, business failures, ownership
//! mismatches) are ordinary variants returned by handlers. Everything else is
//! unexpected: it is logged by the pipeline and rendered as an opaque 500.

use axum::{
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

use crate::api::response::ErrorResponse;
use crate::codec::DecodeError;
use crate::repository::RepositoryError;

pub const ORGANISATION_MISMATCH: &str = "ORGANISATION_MISMATCH";

/// A failed validation rule on one request field
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl FieldError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl std::fmt::Display for FieldError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

fn join_fields(errors: &[FieldError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

pub type AppResult<T> = Result<T, AppError>;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation failed: {}", join_fields(.0))]
    Validation(Vec<FieldError>),

    #[error("{code}: {message}")]
    Failure { code: String, message: String },

    #[error("Unauthorized ({code}): {message}")]
    Unauthorized { code: &'static str, message: String },

    #[error("Not implemented: {0}")]
    Unimplemented(String),

    #[error("Repository error: {0}")]
    Repository(#[from] RepositoryError),

    /// A payload that cannot be decoded into any known shape
    #[error("Decode error: {0}")]
    Decode(DecodeError),
}

impl AppError {
    pub fn not_found(message: impl Into<String>) -> Self {
        AppError::NotFound(message.into())
    }

    /// A single-field validation failure
    pub fn invalid(field: impl Into<String>, message: impl Into<String>) -> Self {
        AppError::Validation(vec![FieldError::new(field, message)])
    }

    pub fn failure(code: impl Into<String>, message: impl Into<String>) -> Self {
        AppError::Failure {
            code: code.into(),
            message: message.into(),
        }
    }

    pub fn organisation_mismatch(message: impl Into<String>) -> Self {
        AppError::Unauthorized {
            code: ORGANISATION_MISMATCH,
            message: message.into(),
        }
    }

    /// Whether the error is a defect rather than an expected outcome
    pub fn is_unexpected(&self) -> bool {
        match self {
            AppError::Unimplemented(_) | AppError::Repository(_) => true,
            _ => false,
        }
    }
}

impl From<DecodeError> for AppError {
    fn from(error: DecodeError) -> Self {
        if error.is_malformed() {
            AppError::Decode(error)
        } else {
            AppError::Unimplemented(error.to_string())
        }
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::invalid("body", rejection.body_text())
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        AppError::invalid("query", rejection.body_text())
    }
}

impl From<PathRejection> for AppError {
    fn from(rejection: PathRejection) -> Self {
        AppError::invalid("path", rejection.body_text())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            AppError::NotFound(message) => {
                (StatusCode::NOT_FOUND, ErrorResponse::new("NOT_FOUND", message))
            },
            AppError::Validation(errors) => {
                let details = serde_json::to_value(&errors).unwrap_or_default();
                (
                    StatusCode::BAD_REQUEST,
                    ErrorResponse::with_details(
                        "VALIDATION_ERROR",
                        "One or more validation errors occurred",
                        details,
                    ),
                )
            },
            AppError::Failure { code, message } => {
                (StatusCode::INTERNAL_SERVER_ERROR, ErrorResponse::new(code, message))
            },
            AppError::Unauthorized { code, message } => {
                (StatusCode::FORBIDDEN, ErrorResponse::new(code, message))
            },
            AppError::Decode(e) => (
                StatusCode::BAD_REQUEST,
                ErrorResponse::new("MALFORMED_PAYLOAD", e.to_string()),
            ),
            AppError::Unimplemented(_) | AppError::Repository(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorResponse::new("INTERNAL_ERROR", "An unexpected error occurred"),
            ),
        };

        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        let cases = [
            (AppError::not_found("x"), StatusCode::NOT_FOUND),
            (AppError::invalid("id", "taken"), StatusCode::BAD_REQUEST),
            (AppError::failure("SAVE_FAILED", "x"), StatusCode::INTERNAL_SERVER_ERROR),
            (AppError::organisation_mismatch("x"), StatusCode::FORBIDDEN),
            (AppError::Unimplemented("x".into()), StatusCode::INTERNAL_SERVER_ERROR),
            (AppError::Decode(DecodeError::NotAnObject), StatusCode::BAD_REQUEST),
            (
                AppError::Repository(RepositoryError::Cancelled),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];
        for (error, status) in cases {
            assert_eq!(error.into_response().status(), status);
        }
    }

    #[test]
    fn test_only_defects_are_unexpected() {
        assert!(AppError::Unimplemented("x".into()).is_unexpected());
        assert!(!AppError::Decode(DecodeError::NotAnObject).is_unexpected());
        assert!(!AppError::not_found("x").is_unexpected());
        assert!(!AppError::invalid("id", "x").is_unexpected());
    }

    #[test]
    fn test_unknown_discriminator_becomes_unimplemented() {
        let error = AppError::from(DecodeError::Unimplemented {
            kind: "event type",
            value: "99".into(),
        });
        assert!(matches!(&error, AppError::Unimplemented(m) if m.contains("99")));
        assert!(error.is_unexpected());

        let error = AppError::from(DecodeError::MissingDiscriminator("type"));
        assert!(matches!(error, AppError::Decode(_)));
    }

    #[test]
    fn test_validation_message_lists_fields() {
        let error = AppError::Validation(vec![
            FieldError::new("id", "must be unique"),
            FieldError::new("submissionPeriod", "too short"),
        ]);
        assert_eq!(
            error.to_string(),
            "Validation failed: id: must be unique; submissionPeriod: too short"
        );
    }
}
