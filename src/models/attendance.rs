//! Attendance and employee models.
//!
//! These types describe the data consumed from the clock/attendance ledger and
//! the employee directory. Both are owned by external collaborators; the engine
//! only reads them.

use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Employee metadata needed for payroll.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Employee {
    /// Unique identifier for the employee.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Hourly pay rate.
    pub pay_rate: Decimal,
}

/// A single clock-in/clock-out interval.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttendanceRecord {
    /// Unique identifier for the record.
    pub id: Uuid,
    /// The employee who clocked in.
    pub employee_id: String,
    /// When the employee clocked in.
    pub clock_in: NaiveDateTime,
    /// When the employee clocked out; `None` while still on the clock.
    #[serde(default)]
    pub clock_out: Option<NaiveDateTime>,
}

impl AttendanceRecord {
    /// Returns true once the employee has clocked out.
    pub fn is_completed(&self) -> bool {
        self.clock_out.is_some()
    }

    /// The day the interval is attributed to (the clock-in date).
    pub fn work_date(&self) -> NaiveDate {
        self.clock_in.date()
    }

    /// Calculates the worked hours for a completed record.
    ///
    /// Returns `None` for an open record. A clock-out before the clock-in
    /// yields zero hours.
    ///
    /// # Examples
    ///
    /// ```
    /// use payroll_engine::models::AttendanceRecord;
    /// use chrono::NaiveDateTime;
    /// use rust_decimal::Decimal;
    /// use uuid::Uuid;
    ///
    /// let record = AttendanceRecord {
    ///     id: Uuid::new_v4(),
    ///     employee_id: "emp_001".to_string(),
    ///     clock_in: NaiveDateTime::parse_from_str("2025-09-15 09:00:00", "%Y-%m-%d %H:%M:%S").unwrap(),
    ///     clock_out: Some(NaiveDateTime::parse_from_str("2025-09-15 17:30:00", "%Y-%m-%d %H:%M:%S").unwrap()),
    /// };
    /// assert_eq!(record.worked_hours(), Some(Decimal::new(85, 1)));
    /// ```
    pub fn worked_hours(&self) -> Option<Decimal> {
        let clock_out = self.clock_out?;
        let minutes = (clock_out - self.clock_in).num_minutes().max(0);
        Some(Decimal::new(minutes, 0) / Decimal::new(60, 0))
    }
}
