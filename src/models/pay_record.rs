//! Pay record models.
//!
//! This module contains the [`PayRecord`] produced by payroll generation, the
//! [`PayRecordDraft`] returned by the computation engine before persistence,
//! the per-adjustment [`AdjustmentLine`], and the batch summaries returned by
//! generation and bulk approval.

use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{ApplyOn, AuditTrace, Direction, Mode, OvertimeRule};

/// Where the values of an applied adjustment came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdjustmentSource {
    /// A global type applied with its own values.
    Global,
    /// An employee copy stacked alongside the global type.
    Stacked,
    /// An employee copy that replaced the global type.
    Replacing,
    /// An assignment of a type that does not apply globally.
    EmployeeOnly,
}

/// A single applied adjustment on a pay record.
///
/// `amount_applied` is always non-negative; the sign is carried by `direction`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdjustmentLine {
    /// The adjustment type applied.
    pub adjustment_type_id: Uuid,
    /// The employee assignment the values came from, if any.
    pub assignment_id: Option<Uuid>,
    /// Display name of the adjustment.
    pub name: String,
    /// Add or deduct.
    pub direction: Direction,
    /// Percent or flat.
    pub mode: Mode,
    /// The rate or amount that was applied.
    pub rate_or_amount: Decimal,
    /// The earnings the adjustment was applied to.
    pub apply_on: ApplyOn,
    /// The overtime rule the adjustment evaluated.
    pub overtime_rule: OvertimeRule,
    /// The cap in force, if any.
    pub cap_per_period: Option<Decimal>,
    /// Whether the cap reduced the amount.
    pub cap_hit: bool,
    /// Where the values came from.
    pub source: AdjustmentSource,
    /// The rounded, non-negative amount applied.
    pub amount_applied: Decimal,
}

impl AdjustmentLine {
    /// The applied amount with the direction's sign.
    pub fn signed_amount(&self) -> Decimal {
        match self.direction {
            Direction::Add => self.amount_applied,
            Direction::Deduct => -self.amount_applied,
        }
    }
}

/// The computed, not yet persisted, payroll for one employee and period.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PayRecordDraft {
    /// The employee the draft is for.
    pub employee_id: String,
    /// First day of the period.
    pub week_start: NaiveDate,
    /// Last day of the period.
    pub week_end: NaiveDate,
    /// Total hours worked in the period.
    pub hours_worked: Decimal,
    /// Regular hours under the gross overtime rule.
    pub regular_hours: Decimal,
    /// Overtime hours under the gross overtime rule.
    pub overtime_hours: Decimal,
    /// The hourly rate used.
    pub pay_rate: Decimal,
    /// Gross pay before adjustments, rounded to cents.
    pub gross_amount: Decimal,
    /// Applied adjustments in resolution order.
    pub adjustments: Vec<AdjustmentLine>,
    /// Net pay, rounded to cents and never negative.
    pub amount: Decimal,
    /// True when net pay was raised to zero.
    pub negative_net_clamped: bool,
    /// How the amounts were derived.
    pub audit_trace: AuditTrace,
}

/// The approval state of a pay record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PayRecordStatus {
    /// Awaiting review.
    Pending,
    /// Paused and excluded from bulk approval.
    Held,
    /// Approved; terminal.
    Approved,
}

impl fmt::Display for PayRecordStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PayRecordStatus::Pending => "pending",
            PayRecordStatus::Held => "held",
            PayRecordStatus::Approved => "approved",
        };
        f.write_str(name)
    }
}

/// A lifecycle action on a pay record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransitionAction {
    /// `pending → approved`.
    Approve,
    /// `pending → held`.
    Hold,
    /// `held → pending`.
    Unhold,
}

impl fmt::Display for TransitionAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TransitionAction::Approve => "approve",
            TransitionAction::Hold => "hold",
            TransitionAction::Unhold => "unhold",
        };
        f.write_str(name)
    }
}

/// A persisted payroll record for one employee and week.
///
/// Amounts and adjustments are fixed at generation; only `status`,
/// `approved_by`, `approved_at` and `version` change afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PayRecord {
    /// Unique identifier for the record.
    pub id: Uuid,
    /// The employee the record belongs to.
    pub user_id: String,
    /// First day of the week.
    pub week_start: NaiveDate,
    /// Last day of the week.
    pub week_end: NaiveDate,
    /// Total hours worked.
    pub hours_worked: Decimal,
    /// Regular hours under the gross overtime rule.
    pub regular_hours: Decimal,
    /// Overtime hours under the gross overtime rule.
    pub overtime_hours: Decimal,
    /// Gross pay before adjustments.
    pub gross_amount: Decimal,
    /// Applied adjustments.
    pub adjustments: Vec<AdjustmentLine>,
    /// Net pay.
    pub amount: Decimal,
    /// True when net pay was raised to zero.
    pub negative_net_clamped: bool,
    /// Current approval state.
    pub status: PayRecordStatus,
    /// When the record was generated.
    pub created_at: DateTime<Utc>,
    /// Who approved the record.
    pub approved_by: Option<String>,
    /// When the record was approved.
    pub approved_at: Option<DateTime<Utc>>,
    /// Incremented on every state change.
    pub version: u64,
    /// How the amounts were derived.
    pub audit_trace: AuditTrace,
}

impl PayRecord {
    /// Creates a new pending record from a computed draft.
    pub fn from_draft(draft: PayRecordDraft) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id: draft.employee_id,
            week_start: draft.week_start,
            week_end: draft.week_end,
            hours_worked: draft.hours_worked,
            regular_hours: draft.regular_hours,
            overtime_hours: draft.overtime_hours,
            gross_amount: draft.gross_amount,
            adjustments: draft.adjustments,
            amount: draft.amount,
            negative_net_clamped: draft.negative_net_clamped,
            status: PayRecordStatus::Pending,
            created_at: Utc::now(),
            approved_by: None,
            approved_at: None,
            version: 1,
            audit_trace: draft.audit_trace,
        }
    }

    /// The uniqueness key for generation.
    pub fn period_key(&self) -> (String, NaiveDate, NaiveDate) {
        (self.user_id.clone(), self.week_start, self.week_end)
    }
}

/// A per-employee failure during batch generation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerationFailure {
    /// The employee whose computation failed.
    pub employee_id: String,
    /// First day of the affected week.
    pub week_start: NaiveDate,
    /// Machine-readable error code.
    pub code: String,
    /// Human-readable error message.
    pub message: String,
}

/// The outcome of a generation run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerationSummary {
    /// Number of new pending records inserted.
    pub generated: u32,
    /// Number of distinct weeks that had completed attendance.
    pub weeks_processed: u32,
    /// Employee-weeks skipped because a record already existed.
    pub skipped_existing: u32,
    /// Employee-weeks that failed to compute.
    pub failures: Vec<GenerationFailure>,
}

/// The outcome of a bulk approval.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApprovalSummary {
    /// Records approved.
    pub approved: u32,
    /// Records that failed to approve.
    pub failed: u32,
    /// Records that changed after the snapshot and were left alone.
    pub skipped: u32,
}
