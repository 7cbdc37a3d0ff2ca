//! Adjustment catalog models.
//!
//! This module defines the [`AdjustmentType`] rule definitions, the per-employee
//! [`EmployeeAdjustment`] assignments that override or extend them, and the
//! create/update payloads accepted by the catalog.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;

/// Whether an adjustment adds to or deducts from gross pay.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    /// The amount is added to pay.
    Add,
    /// The amount is deducted from pay.
    Deduct,
}

/// How the adjustment's `rate_or_amount` is interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Mode {
    /// A percentage of the applicable base.
    Percent,
    /// A fixed amount applied once per period.
    Flat,
}

/// Which earnings an adjustment is applied to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApplyOn {
    /// All earnings in the period.
    #[default]
    All,
    /// Overtime earnings only.
    OvertimeOnly,
}

/// The rule used to classify worked hours as overtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub enum OvertimeRule {
    /// No overtime split; every hour is regular.
    #[default]
    #[serde(rename = "none")]
    None,
    /// Hours beyond the daily threshold on any single day are overtime.
    #[serde(rename = "8h_day")]
    EightHourDay,
    /// Hours beyond the weekly threshold in the period are overtime.
    #[serde(rename = "40h_week")]
    FortyHourWeek,
}

impl OvertimeRule {
    /// All rules, in a stable order.
    pub const ALL: [OvertimeRule; 3] = [
        OvertimeRule::None,
        OvertimeRule::EightHourDay,
        OvertimeRule::FortyHourWeek,
    ];

    /// Returns the wire name of the rule.
    pub fn as_str(&self) -> &'static str {
        match self {
            OvertimeRule::None => "none",
            OvertimeRule::EightHourDay => "8h_day",
            OvertimeRule::FortyHourWeek => "40h_week",
        }
    }
}

/// Whether an employee assignment currently takes part in resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssignmentStatus {
    /// The assignment is applied.
    #[default]
    Active,
    /// The assignment is kept for history but not applied.
    Paused,
}

/// Returns true when `date` falls inside an optional, inclusive window.
///
/// A missing bound is open-ended.
///
/// ```
/// use payroll_engine::models::window_contains;
/// use chrono::NaiveDate;
///
/// let start = NaiveDate::from_ymd_opt(2025, 1, 1);
/// let date = NaiveDate::from_ymd_opt(2025, 6, 1).unwrap();
/// assert!(window_contains(start, None, date));
/// ```
pub fn window_contains(start: Option<NaiveDate>, end: Option<NaiveDate>, date: NaiveDate) -> bool {
    start.is_none_or(|s| s <= date) && end.is_none_or(|e| date <= e)
}

/// Returns true when two optional, inclusive windows share at least one day.
///
/// ```
/// use payroll_engine::models::windows_overlap;
/// use chrono::NaiveDate;
///
/// let d = |day| NaiveDate::from_ymd_opt(2025, 9, day);
/// assert!(windows_overlap((None, d(17)), (d(16), None)));
/// assert!(!windows_overlap((None, d(15)), (d(16), None)));
/// ```
pub fn windows_overlap(
    a: (Option<NaiveDate>, Option<NaiveDate>),
    b: (Option<NaiveDate>, Option<NaiveDate>),
) -> bool {
    let starts_before_b_ends = match (a.0, b.1) {
        (Some(start), Some(end)) => start <= end,
        _ => true,
    };
    let starts_before_a_ends = match (b.0, a.1) {
        (Some(start), Some(end)) => start <= end,
        _ => true,
    };
    starts_before_b_ends && starts_before_a_ends
}

/// A global adjustment rule defined by an administrator.
///
/// Types are append-only from the resolver's point of view: every edit is
/// stored as a new revision and only the latest revision is resolved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdjustmentType {
    /// Unique identifier for the type.
    pub id: Uuid,
    /// Display name (e.g., "Tax").
    pub name: String,
    /// Whether the adjustment adds or deducts.
    pub direction: Direction,
    /// Percent or flat.
    pub mode: Mode,
    /// Percentage (for `percent`) or amount (for `flat`).
    pub rate_or_amount: Decimal,
    /// Maximum amount applied per pay period.
    pub cap_per_period: Option<Decimal>,
    /// The earnings the adjustment applies to.
    pub apply_on: ApplyOn,
    /// The overtime rule used when `apply_on` is overtime only.
    pub overtime_rule: OvertimeRule,
    /// Whether the type applies to every employee.
    pub applies_globally: bool,
    /// Free-form administrator note.
    pub note: Option<String>,
    /// First date the type is effective (inclusive).
    pub effective_start: Option<NaiveDate>,
    /// Last date the type is effective (inclusive).
    pub effective_end: Option<NaiveDate>,
    /// Catalog creation order.
    pub sequence: u64,
    /// Revision number, starting at 1.
    pub revision: u32,
    /// When the type was created.
    pub created_at: DateTime<Utc>,
    /// When this revision was written.
    pub updated_at: DateTime<Utc>,
}

impl AdjustmentType {
    /// Returns true when the type is effective on `date`.
    pub fn is_effective_on(&self, date: NaiveDate) -> bool {
        window_contains(self.effective_start, self.effective_end, date)
    }
}

/// A per-employee assignment of an adjustment type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmployeeAdjustment {
    /// Unique identifier for the assignment.
    pub id: Uuid,
    /// The adjustment type this assignment references.
    pub adjustment_type_id: Uuid,
    /// The employee the assignment belongs to.
    pub employee_id: String,
    /// Replaces the type's `rate_or_amount` for this employee.
    pub override_rate_or_amount: Option<Decimal>,
    /// Replaces the type's `cap_per_period` for this employee.
    pub override_cap: Option<Decimal>,
    /// Suppresses the global rule for this employee when true.
    pub replace_global: bool,
    /// Active or paused.
    pub status: AssignmentStatus,
    /// Free-form administrator note.
    pub note: Option<String>,
    /// First date the assignment is effective (inclusive).
    pub effective_start: Option<NaiveDate>,
    /// Last date the assignment is effective (inclusive).
    pub effective_end: Option<NaiveDate>,
    /// Catalog creation order.
    pub sequence: u64,
    /// Revision number, starting at 1.
    pub revision: u32,
    /// When the assignment was created.
    pub created_at: DateTime<Utc>,
    /// When this revision was written.
    pub updated_at: DateTime<Utc>,
}

impl EmployeeAdjustment {
    /// Returns true when the assignment is active and effective on `date`.
    pub fn is_applicable_on(&self, date: NaiveDate) -> bool {
        self.status == AssignmentStatus::Active
            && window_contains(self.effective_start, self.effective_end, date)
    }

    /// Returns true when the assignment is active on at least one day of
    /// `start..=end`.
    pub fn is_active_within(&self, start: NaiveDate, end: NaiveDate) -> bool {
        self.status == AssignmentStatus::Active
            && windows_overlap(
                (self.effective_start, self.effective_end),
                (Some(start), Some(end)),
            )
    }

    /// Returns true when both assignments are effective on a shared day.
    pub fn overlaps(&self, other: &EmployeeAdjustment) -> bool {
        windows_overlap(
            (self.effective_start, self.effective_end),
            (other.effective_start, other.effective_end),
        )
    }
}

/// Payload for creating an adjustment type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewAdjustmentType {
    /// Display name.
    pub name: String,
    /// Whether the adjustment adds or deducts.
    pub direction: Direction,
    /// Percent or flat.
    pub mode: Mode,
    /// Percentage or amount.
    pub rate_or_amount: Decimal,
    /// Maximum amount applied per pay period.
    #[serde(default)]
    pub cap_per_period: Option<Decimal>,
    /// The earnings the adjustment applies to.
    #[serde(default)]
    pub apply_on: ApplyOn,
    /// The overtime rule for overtime-only adjustments.
    #[serde(default)]
    pub overtime_rule: OvertimeRule,
    /// Whether the type applies to every employee.
    #[serde(default)]
    pub applies_globally: bool,
    /// Free-form administrator note.
    #[serde(default)]
    pub note: Option<String>,
    /// First effective date.
    #[serde(default)]
    pub effective_start: Option<NaiveDate>,
    /// Last effective date.
    #[serde(default)]
    pub effective_end: Option<NaiveDate>,
}

/// Partial update for an adjustment type.
///
/// Nullable fields use `Option<Option<_>>`: absent leaves the value alone,
/// `null` clears it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AdjustmentTypePatch {
    /// New display name.
    #[serde(default)]
    pub name: Option<String>,
    /// New direction.
    #[serde(default)]
    pub direction: Option<Direction>,
    /// New mode.
    #[serde(default)]
    pub mode: Option<Mode>,
    /// New rate or amount.
    #[serde(default)]
    pub rate_or_amount: Option<Decimal>,
    /// New cap, or `null` to remove it.
    #[serde(default, deserialize_with = "deserialize_some")]
    pub cap_per_period: Option<Option<Decimal>>,
    /// New base selection.
    #[serde(default)]
    pub apply_on: Option<ApplyOn>,
    /// New overtime rule.
    #[serde(default)]
    pub overtime_rule: Option<OvertimeRule>,
    /// New global flag.
    #[serde(default)]
    pub applies_globally: Option<bool>,
    /// New note, or `null` to remove it.
    #[serde(default, deserialize_with = "deserialize_some")]
    pub note: Option<Option<String>>,
    /// New effective start, or `null` for open-ended.
    #[serde(default, deserialize_with = "deserialize_some")]
    pub effective_start: Option<Option<NaiveDate>>,
    /// New effective end, or `null` for open-ended.
    #[serde(default, deserialize_with = "deserialize_some")]
    pub effective_end: Option<Option<NaiveDate>>,
}

/// Payload for assigning an adjustment type to an employee.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewEmployeeAdjustment {
    /// The adjustment type to assign.
    pub adjustment_type_id: Uuid,
    /// Replacement rate or amount.
    #[serde(default)]
    pub override_rate_or_amount: Option<Decimal>,
    /// Replacement cap.
    #[serde(default)]
    pub override_cap: Option<Decimal>,
    /// Whether to suppress the global rule.
    #[serde(default)]
    pub replace_global: bool,
    /// Initial status.
    #[serde(default)]
    pub status: AssignmentStatus,
    /// Free-form administrator note.
    #[serde(default)]
    pub note: Option<String>,
    /// First effective date.
    #[serde(default)]
    pub effective_start: Option<NaiveDate>,
    /// Last effective date.
    #[serde(default)]
    pub effective_end: Option<NaiveDate>,
}

/// Partial update for an employee assignment.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EmployeeAdjustmentPatch {
    /// New override rate, or `null` to fall back to the type.
    #[serde(default, deserialize_with = "deserialize_some")]
    pub override_rate_or_amount: Option<Option<Decimal>>,
    /// New override cap, or `null` to fall back to the type.
    #[serde(default, deserialize_with = "deserialize_some")]
    pub override_cap: Option<Option<Decimal>>,
    /// New replace flag.
    #[serde(default)]
    pub replace_global: Option<bool>,
    /// New status.
    #[serde(default)]
    pub status: Option<AssignmentStatus>,
    /// New note, or `null` to remove it.
    #[serde(default, deserialize_with = "deserialize_some")]
    pub note: Option<Option<String>>,
    /// New effective start.
    #[serde(default, deserialize_with = "deserialize_some")]
    pub effective_start: Option<Option<NaiveDate>>,
    /// New effective end.
    #[serde(default, deserialize_with = "deserialize_some")]
    pub effective_end: Option<Option<NaiveDate>>,
}

/// Distinguishes an explicit `null` from an absent field.
fn deserialize_some<'de, T, D>(deserializer: D) -> Result<Option<T>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    T::deserialize(deserializer).map(Some)
}
