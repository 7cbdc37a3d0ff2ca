//! Request types for the payroll engine API.

use std::collections::BTreeMap;

use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::calculation::OvertimeByRule;
use crate::error::{EngineError, EngineResult};
use crate::models::WorkedHours;

/// Request body for `POST /payroll/resolve`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResolveRequest {
    /// The employee to resolve adjustments for.
    pub employee_id: String,
    /// First day of the period.
    pub period_start: NaiveDate,
    /// Last day of the period.
    pub period_end: NaiveDate,
    /// Overtime hours per rule, used by the overtime-only gate.
    #[serde(default)]
    pub overtime_hours_by_rule: OvertimeByRule,
}

/// Request body for `POST /payroll/compute`.
///
/// Hours are given either as a total (`hours_worked`, attributed to
/// `period_start`) or per day (`daily_hours`), not both.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComputeRequest {
    /// The employee being paid.
    pub employee_id: String,
    /// First day of the period.
    pub period_start: NaiveDate,
    /// Last day of the period.
    pub period_end: NaiveDate,
    /// Total hours worked in the period.
    #[serde(default)]
    pub hours_worked: Option<Decimal>,
    /// Hours worked per day.
    #[serde(default)]
    pub daily_hours: BTreeMap<NaiveDate, Decimal>,
    /// Hourly pay rate.
    pub pay_rate: Decimal,
}

impl ComputeRequest {
    /// Builds the worked hours described by the request.
    pub fn worked_hours(&self) -> EngineResult<WorkedHours> {
        match (self.hours_worked, self.daily_hours.is_empty()) {
            (Some(_), false) => Err(EngineError::validation(
                "hours_worked",
                "give either hours_worked or daily_hours, not both",
            )),
            (Some(total), true) => Ok(WorkedHours::single_day(self.period_start, total)),
            (None, _) => Ok(WorkedHours {
                daily: self.daily_hours.clone(),
            }),
        }
    }
}

/// Request body for `POST /payroll/generate`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerateRequest {
    /// First day of the range.
    pub range_start: NaiveDate,
    /// Last day of the range.
    pub range_end: NaiveDate,
}

/// Query string for `GET /employees/{employee_id}/adjustments`.
///
/// Without `on_date` every assignment is listed in any status.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AssignmentQuery {
    /// Only list active assignments effective on this day.
    pub on_date: Option<NaiveDate>,
}

/// Request body for `POST /attendance`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttendanceRequest {
    /// The employee who clocked in.
    pub employee_id: String,
    /// Clock-in time.
    pub clock_in: NaiveDateTime,
    /// Clock-out time, if the interval is complete.
    #[serde(default)]
    pub clock_out: Option<NaiveDateTime>,
}
