//! Calculation logic for the payroll engine.
//!
//! This module contains overtime classification, money rounding, adjustment
//! resolution and the payroll computation that combines them into a
//! [`PayRecordDraft`](crate::models::PayRecordDraft).

mod overtime;
mod payroll;
mod resolver;
mod rounding;

pub use overtime::{HoursSplit, OvertimeByRule, overtime_by_rule, split_hours};
pub use payroll::{PayrollInput, compute_payroll};
pub use resolver::{EffectiveAdjustment, OverrideKind, resolve_adjustments};
pub use rounding::{round_money, truncate_money};
