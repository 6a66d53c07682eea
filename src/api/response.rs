//! Response types for the benefit engine API.
//!
//! This module defines the success body of `/calculate` and the error
//! response structures of the HTTP API.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::EngineError;
use crate::pipeline::Evaluation;

/// Success body of the `/calculate` endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CalculationResponse {
    /// Correlation id of the request, also present in the logs.
    pub correlation_id: Uuid,
    /// Report, exclusions, issues and audit.
    #[serde(flatten)]
    pub evaluation: Evaluation,
}

/// API error response structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiError {
    /// Error code for programmatic handling.
    pub code: String,
    /// Human-readable error message.
    pub message: String,
    /// Optional details about the error.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl ApiError {
    /// Creates a new API error.
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            details: None,
        }
    }

    /// Creates a new API error with details.
    pub fn with_details(
        code: impl Into<String>,
        message: impl Into<String>,
        details: impl Into<String>,
    ) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            details: Some(details.into()),
        }
    }

    /// Creates a validation error response.
    pub fn validation_error(message: impl Into<String>) -> Self {
        Self::new("VALIDATION_ERROR", message)
    }

    /// Creates a malformed JSON error response.
    pub fn malformed_json(message: impl Into<String>) -> Self {
        Self::new("MALFORMED_JSON", message)
    }
}

/// API error with HTTP status code.
pub struct ApiErrorResponse {
    /// The HTTP status code.
    pub status: StatusCode,
    /// The error body.
    pub error: ApiError,
}

impl IntoResponse for ApiErrorResponse {
    fn into_response(self) -> Response {
        (self.status, Json(self.error)).into_response()
    }
}

impl From<EngineError> for ApiErrorResponse {
    fn from(error: EngineError) -> Self {
        let message = error.to_string();
        let (status, error) = match error {
            EngineError::ConfigNotFound { .. } | EngineError::ConfigParseError { .. } => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ApiError::with_details("CONFIG_ERROR", "Configuration error", message),
            ),
            EngineError::InvalidRecord { key, .. } => (
                StatusCode::BAD_REQUEST,
                ApiError::with_details(
                    "INVALID_RECORD",
                    message,
                    format!("Record '{}' cannot be evaluated", key),
                ),
            ),
            EngineError::InvalidPeriod { .. } => (
                StatusCode::BAD_REQUEST,
                ApiError::validation_error(message),
            ),
            EngineError::RateNotFound { .. } => (
                StatusCode::UNPROCESSABLE_ENTITY,
                ApiError::new("RATE_NOT_FOUND", message),
            ),
            EngineError::MissingFile { .. }
            | EngineError::SourceReadError { .. }
            | EngineError::MissingColumn { .. } => (
                StatusCode::UNPROCESSABLE_ENTITY,
                ApiError::new("SOURCE_ERROR", message),
            ),
            EngineError::ExtractionError { .. }
            | EngineError::ReportWriteError { .. }
            | EngineError::CalculationError { .. } => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ApiError::with_details("CALCULATION_ERROR", "Calculation failed", message),
            ),
        };
        ApiErrorResponse { status, error }
    }
}
