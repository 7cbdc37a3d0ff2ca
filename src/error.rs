//! Error types for the payroll engine.
//!
//! This module provides strongly-typed errors using the `thiserror` crate
//! for all error conditions that can occur while maintaining the adjustment
//! catalog, computing payroll, and moving pay records through their lifecycle.

use chrono::NaiveDate;
use thiserror::Error;
use uuid::Uuid;

use crate::models::{PayRecordStatus, TransitionAction};

/// The main error type for the payroll engine.
///
/// All operations in the engine return this error type, making it easy
/// to handle errors consistently throughout the application.
///
/// # Example
///
/// ```
/// use payroll_engine::error::EngineError;
///
/// let error = EngineError::Validation {
///     field: "rate_or_amount".to_string(),
///     message: "must not be negative".to_string(),
/// };
/// assert_eq!(error.to_string(), "Invalid field 'rate_or_amount': must not be negative");
/// ```
#[derive(Debug, Error)]
pub enum EngineError {
    /// Configuration file was not found at the specified path.
    #[error("Configuration file not found: {path}")]
    ConfigNotFound {
        /// The path that was not found.
        path: String,
    },

    /// Configuration file could not be parsed.
    #[error("Failed to parse configuration file '{path}': {message}")]
    ConfigParseError {
        /// The path to the file that failed to parse.
        path: String,
        /// A description of the parse error.
        message: String,
    },

    /// Adjustment input was malformed and was rejected before persistence.
    #[error("Invalid field '{field}': {message}")]
    Validation {
        /// The field that failed validation.
        field: String,
        /// A description of what made the field invalid.
        message: String,
    },

    /// More than one active assignment of the same adjustment type is
    /// effective for an employee in the same period.
    #[error(
        "Conflicting assignments of adjustment type {adjustment_type_id} for employee '{employee_id}' on {on_date}: {assignment_ids:?}"
    )]
    ConfigurationConflict {
        /// The employee whose assignments conflict.
        employee_id: String,
        /// The adjustment type referenced by every conflicting assignment.
        adjustment_type_id: Uuid,
        /// The date on which the assignments overlap.
        on_date: NaiveDate,
        /// The conflicting assignment ids, ascending.
        assignment_ids: Vec<Uuid>,
    },

    /// A pay record state transition was not allowed.
    #[error("Cannot {action} pay record {record_id} while it is {status}")]
    InvalidTransition {
        /// The pay record that was targeted.
        record_id: Uuid,
        /// The record's status at the time of the attempt.
        status: PayRecordStatus,
        /// The attempted action.
        action: TransitionAction,
    },

    /// A pay record already exists for the employee and week.
    #[error("Pay record already exists for employee '{employee_id}' for week {week_start} to {week_end}")]
    DuplicatePeriod {
        /// The employee the record belongs to.
        employee_id: String,
        /// The first day of the week.
        week_start: NaiveDate,
        /// The last day of the week.
        week_end: NaiveDate,
    },

    /// A pay record changed between being read and being written.
    #[error("Pay record {record_id} was modified concurrently (expected version {expected}, found {found})")]
    StaleRecord {
        /// The pay record that was targeted.
        record_id: Uuid,
        /// The version the caller read.
        expected: u64,
        /// The version currently stored.
        found: u64,
    },

    /// Adjustment type was not found in the catalog.
    #[error("Adjustment type not found: {id}")]
    AdjustmentTypeNotFound {
        /// The adjustment type id that was not found.
        id: Uuid,
    },

    /// Employee adjustment was not found in the catalog.
    #[error("Employee adjustment not found: {id}")]
    AssignmentNotFound {
        /// The assignment id that was not found.
        id: Uuid,
    },

    /// Pay record was not found.
    #[error("Pay record not found: {id}")]
    PayRecordNotFound {
        /// The pay record id that was not found.
        id: Uuid,
    },

    /// Employee metadata was not found.
    #[error("Employee not found: {id}")]
    EmployeeNotFound {
        /// The employee id that was not found.
        id: String,
    },
}

/// A type alias for Results that return EngineError.
pub type EngineResult<T> = Result<T, EngineError>;

impl EngineError {
    /// Shorthand for a [`EngineError::Validation`] error.
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        EngineError::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Stable machine-readable code for the error.
    pub fn code(&self) -> &'static str {
        match self {
            EngineError::ConfigNotFound { .. } | EngineError::ConfigParseError { .. } => {
                "CONFIG_ERROR"
            }
            EngineError::Validation { .. } => "VALIDATION_ERROR",
            EngineError::ConfigurationConflict { .. } => "CONFIGURATION_CONFLICT",
            EngineError::InvalidTransition { .. } => "INVALID_TRANSITION",
            EngineError::DuplicatePeriod { .. } => "DUPLICATE_PERIOD",
            EngineError::StaleRecord { .. } => "STALE_RECORD",
            EngineError::AdjustmentTypeNotFound { .. }
            | EngineError::AssignmentNotFound { .. }
            | EngineError::PayRecordNotFound { .. }
            | EngineError::EmployeeNotFound { .. } => "NOT_FOUND",
        }
    }
}
