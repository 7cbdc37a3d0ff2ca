//! Core data models for the payroll engine.
//!
//! This module contains all the domain models used throughout the engine.

mod adjustment;
mod attendance;
mod audit;
mod pay_period;
mod pay_record;

pub use adjustment::{
    AdjustmentType, AdjustmentTypePatch, ApplyOn, AssignmentStatus, Direction,
    EmployeeAdjustment, EmployeeAdjustmentPatch, Mode, NewAdjustmentType, NewEmployeeAdjustment,
    OvertimeRule, window_contains, windows_overlap,
};
pub use attendance::{AttendanceRecord, Employee};
pub use audit::{AuditStep, AuditTrace, AuditWarning};
pub use pay_period::{PayPeriod, WorkedHours};
pub use pay_record::{
    AdjustmentLine, AdjustmentSource, ApprovalSummary, GenerationFailure, GenerationSummary,
    PayRecord, PayRecordDraft, PayRecordStatus, TransitionAction,
};
