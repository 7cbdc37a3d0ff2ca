//! Response types for the payroll engine API.
//!
//! This module defines the error response structures and the mapping from
//! engine errors to HTTP status codes.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::calculation::EffectiveAdjustment;
use crate::error::EngineError;

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

impl ApiErrorResponse {
    /// A 400 response.
    pub fn bad_request(error: ApiError) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            error,
        }
    }

    /// A 500 response.
    pub fn internal(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            error: ApiError::new("INTERNAL_ERROR", message),
        }
    }
}

impl IntoResponse for ApiErrorResponse {
    fn into_response(self) -> Response {
        (self.status, Json(self.error)).into_response()
    }
}

impl From<EngineError> for ApiErrorResponse {
    fn from(error: EngineError) -> Self {
        let code = error.code();
        let status = match &error {
            EngineError::Validation { .. } => StatusCode::BAD_REQUEST,
            EngineError::ConfigurationConflict { .. }
            | EngineError::InvalidTransition { .. }
            | EngineError::DuplicatePeriod { .. }
            | EngineError::StaleRecord { .. } => StatusCode::CONFLICT,
            EngineError::AdjustmentTypeNotFound { .. }
            | EngineError::AssignmentNotFound { .. }
            | EngineError::PayRecordNotFound { .. }
            | EngineError::EmployeeNotFound { .. } => StatusCode::NOT_FOUND,
            EngineError::ConfigNotFound { .. } | EngineError::ConfigParseError { .. } => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        let error = match error {
            EngineError::Validation { field, message } => ApiError::with_details(
                code,
                format!("Invalid field '{}': {}", field, message),
                field,
            ),
            EngineError::ConfigurationConflict {
                employee_id,
                adjustment_type_id,
                on_date,
                assignment_ids,
            } => ApiError::with_details(
                code,
                format!(
                    "Employee '{}' has conflicting assignments of adjustment type {} on {}",
                    employee_id, adjustment_type_id, on_date
                ),
                assignment_ids
                    .iter()
                    .map(ToString::to_string)
                    .collect::<Vec<_>>()
                    .join(","),
            ),
            other => ApiError::new(code, other.to_string()),
        };

        ApiErrorResponse { status, error }
    }
}

/// Response body for `POST /payroll/resolve`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResolveResponse {
    /// The employee the adjustments were resolved for.
    pub employee_id: String,
    /// First day of the period.
    pub period_start: NaiveDate,
    /// Last day of the period.
    pub period_end: NaiveDate,
    /// The resolved adjustments in application order.
    pub adjustments: Vec<EffectiveAdjustment>,
}
