//! Error kinds for the surveillance pipeline.
//!
//! Grounded in the teacher's `auth::middleware::AuthError` shape: a plain
//! enum with a manual `IntoResponse` impl rather than a `thiserror`-derived
//! type (the teacher never depends on `thiserror`). CLI binaries convert
//! these into `anyhow::Error` with `.context(...)` at the glue layer.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use std::fmt;

#[derive(Debug)]
pub enum SurveillanceError {
    InputNotFound { path: String },
    InputMalformed { reason: String },
    ConfigInvalid { field: &'static str, reason: String },
    AuthMissingKey,
    AuthInvalidKey,
    RequestTooLarge { limit_bytes: u64 },
    ValidationFailed { reason: String },
    UnknownAlgorithm { name: String },
    DuplicateAlgorithm { name: String },
}

impl fmt::Display for SurveillanceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SurveillanceError::InputNotFound { path } => {
                write!(f, "input file not found: {path}")
            }
            SurveillanceError::InputMalformed { reason } => {
                write!(f, "malformed input: {reason}")
            }
            SurveillanceError::ConfigInvalid { field, reason } => {
                write!(f, "invalid config field '{field}': {reason}")
            }
            SurveillanceError::AuthMissingKey => write!(f, "Missing API key"),
            SurveillanceError::AuthInvalidKey => write!(f, "Invalid API key"),
            SurveillanceError::RequestTooLarge { limit_bytes } => {
                write!(f, "request body exceeds {limit_bytes} bytes")
            }
            SurveillanceError::ValidationFailed { reason } => {
                write!(f, "validation failed: {reason}")
            }
            SurveillanceError::UnknownAlgorithm { name } => {
                write!(f, "unknown algorithm: {name}")
            }
            SurveillanceError::DuplicateAlgorithm { name } => {
                write!(f, "algorithm '{name}' is already registered")
            }
        }
    }
}

impl std::error::Error for SurveillanceError {}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

impl IntoResponse for SurveillanceError {
    fn into_response(self) -> Response {
        let status = match &self {
            SurveillanceError::InputNotFound { .. } => StatusCode::NOT_FOUND,
            SurveillanceError::InputMalformed { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            SurveillanceError::ConfigInvalid { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            SurveillanceError::AuthMissingKey | SurveillanceError::AuthInvalidKey => {
                StatusCode::UNAUTHORIZED
            }
            SurveillanceError::RequestTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            SurveillanceError::ValidationFailed { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            SurveillanceError::UnknownAlgorithm { .. } => StatusCode::NOT_FOUND,
            SurveillanceError::DuplicateAlgorithm { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        };
        let body = ErrorBody {
            error: self.to_string(),
        };
        (status, axum::Json(body)).into_response()
    }
}
