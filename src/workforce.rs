//! Attendance and employee collaborators.
//!
//! Payroll generation reads completed attendance and employee pay rates from
//! sources it does not own. [`AttendanceSource`] and [`EmployeeDirectory`] are
//! the seams; [`InMemoryWorkforce`] implements both for the HTTP service and
//! tests.

use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use tracing::info;
use uuid::Uuid;

use crate::error::{EngineError, EngineResult};
use crate::models::{AttendanceRecord, Employee};

/// Read access to the clock/attendance ledger.
pub trait AttendanceSource: Send + Sync {
    /// Completed intervals whose clock-in date falls in `[start, end]`.
    fn completed_between(&self, start: NaiveDate, end: NaiveDate) -> Vec<AttendanceRecord>;
}

/// Read access to employee metadata.
pub trait EmployeeDirectory: Send + Sync {
    /// Looks up an employee by id.
    fn employee(&self, id: &str) -> Option<Employee>;
}

/// An in-memory employee directory and attendance ledger.
#[derive(Debug, Default)]
pub struct InMemoryWorkforce {
    employees: RwLock<HashMap<String, Employee>>,
    attendance: RwLock<Vec<AttendanceRecord>>,
}

impl InMemoryWorkforce {
    /// Creates an empty workforce.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers or replaces an employee.
    pub fn add_employee(&self, employee: Employee) -> EngineResult<Employee> {
        if employee.id.trim().is_empty() {
            return Err(EngineError::validation("id", "must not be empty"));
        }
        if employee.pay_rate < Decimal::ZERO {
            return Err(EngineError::validation("pay_rate", "must not be negative"));
        }

        self.employees
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(employee.id.clone(), employee.clone());

        info!(employee_id = %employee.id, "Registered employee");
        Ok(employee)
    }

    /// Records a clock-in, optionally with its clock-out.
    ///
    /// The employee must already be registered.
    pub fn record_attendance(
        &self,
        employee_id: &str,
        clock_in: NaiveDateTime,
        clock_out: Option<NaiveDateTime>,
    ) -> EngineResult<AttendanceRecord> {
        if self.employee(employee_id).is_none() {
            return Err(EngineError::EmployeeNotFound {
                id: employee_id.to_string(),
            });
        }
        match clock_out {
            Some(out) if out < clock_in => {
                return Err(EngineError::validation(
                    "clock_out",
                    format!("{} is before clock_in {}", out, clock_in),
                ));
            }
            _ => {}
        }

        let record = AttendanceRecord {
            id: Uuid::new_v4(),
            employee_id: employee_id.to_string(),
            clock_in,
            clock_out,
        };
        self.attendance
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push(record.clone());
        Ok(record)
    }
}

impl AttendanceSource for InMemoryWorkforce {
    fn completed_between(&self, start: NaiveDate, end: NaiveDate) -> Vec<AttendanceRecord> {
        self.attendance
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .filter(|r| r.is_completed() && start <= r.work_date() && r.work_date() <= end)
            .cloned()
            .collect()
    }
}

impl EmployeeDirectory for InMemoryWorkforce {
    fn employee(&self, id: &str) -> Option<Employee> {
        self.employees
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(id)
            .cloned()
    }
}
