//! Input validation for catalog writes.
//!
//! Every create and update is validated in full before anything is stored, so
//! a rejected write never leaves a partial revision behind.

use chrono::NaiveDate;
use rust_decimal::Decimal;

use crate::error::{EngineError, EngineResult};
use crate::models::{AdjustmentType, EmployeeAdjustment, Mode};

/// Checks the fields of an adjustment type revision.
pub fn validate_type(candidate: &AdjustmentType, max_percent_rate: Decimal) -> EngineResult<()> {
    if candidate.name.trim().is_empty() {
        return Err(EngineError::validation("name", "must not be empty"));
    }
    validate_rate("rate_or_amount", candidate.mode, candidate.rate_or_amount, max_percent_rate)?;
    if let Some(cap) = candidate.cap_per_period {
        validate_cap("cap_per_period", cap)?;
    }
    validate_window(candidate.effective_start, candidate.effective_end)
}

/// Checks the fields of an employee assignment revision against the type it
/// references.
pub fn validate_assignment(
    candidate: &EmployeeAdjustment,
    adjustment_type: &AdjustmentType,
    max_percent_rate: Decimal,
) -> EngineResult<()> {
    if candidate.employee_id.trim().is_empty() {
        return Err(EngineError::validation("employee_id", "must not be empty"));
    }
    if let Some(rate) = candidate.override_rate_or_amount {
        validate_rate(
            "override_rate_or_amount",
            adjustment_type.mode,
            rate,
            max_percent_rate,
        )?;
    }
    if let Some(cap) = candidate.override_cap {
        validate_cap("override_cap", cap)?;
    }
    validate_window(candidate.effective_start, candidate.effective_end)
}

fn validate_rate(field: &str, mode: Mode, value: Decimal, max_percent_rate: Decimal) -> EngineResult<()> {
    if value < Decimal::ZERO {
        return Err(EngineError::validation(field, "must not be negative"));
    }
    if mode == Mode::Percent && value > max_percent_rate {
        return Err(EngineError::validation(
            field,
            format!(
                "percentage {} exceeds the maximum of {}",
                value.normalize(),
                max_percent_rate.normalize()
            ),
        ));
    }
    Ok(())
}

fn validate_cap(field: &str, cap: Decimal) -> EngineResult<()> {
    if cap < Decimal::ZERO {
        return Err(EngineError::validation(field, "must not be negative"));
    }
    if cap.normalize().scale() > 2 {
        return Err(EngineError::validation(field, "must be a whole number of cents"));
    }
    Ok(())
}

fn validate_window(start: Option<NaiveDate>, end: Option<NaiveDate>) -> EngineResult<()> {
    match (start, end) {
        (Some(start), Some(end)) if start > end => Err(EngineError::validation(
            "effective_start",
            format!("{} is after effective_end {}", start, end),
        )),
        _ => Ok(()),
    }
}
