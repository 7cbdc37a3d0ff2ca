//! Overtime classification.
//!
//! This module splits worked hours into regular and overtime portions under
//! each [`OvertimeRule`]. Every adjustment type evaluates its own rule, so the
//! overtime hours are computed once per rule and handed to the resolver.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::config::PayrollPolicy;
use crate::models::{OvertimeRule, WorkedHours};

/// Worked hours split into regular and overtime portions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HoursSplit {
    /// Hours paid at the plain rate.
    pub regular_hours: Decimal,
    /// Hours classified as overtime.
    pub overtime_hours: Decimal,
}

/// Overtime hours under every rule, as consumed by the resolver's overtime gate.
///
/// Serialized with the rule names as keys, e.g.
/// `{"8h_day": "2", "40h_week": "5"}`. The `none` rule never produces overtime.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OvertimeByRule {
    /// Overtime under the `8h_day` rule.
    #[serde(rename = "8h_day", default)]
    pub eight_hour_day: Decimal,
    /// Overtime under the `40h_week` rule.
    #[serde(rename = "40h_week", default)]
    pub forty_hour_week: Decimal,
}

impl OvertimeByRule {
    /// Returns the overtime hours under `rule`.
    pub fn get(&self, rule: OvertimeRule) -> Decimal {
        match rule {
            OvertimeRule::None => Decimal::ZERO,
            OvertimeRule::EightHourDay => self.eight_hour_day,
            OvertimeRule::FortyHourWeek => self.forty_hour_week,
        }
    }
}

/// Splits worked hours under a single overtime rule.
///
/// - `8h_day`: on each day, hours beyond the daily threshold are overtime.
/// - `40h_week`: hours beyond the weekly threshold across the period are overtime.
/// - `none`: every hour is regular.
///
/// # Examples
///
/// ```
/// use payroll_engine::calculation::split_hours;
/// use payroll_engine::config::PayrollPolicy;
/// use payroll_engine::models::{OvertimeRule, WorkedHours};
/// use chrono::NaiveDate;
/// use rust_decimal::Decimal;
///
/// let day = NaiveDate::from_ymd_opt(2025, 9, 15).unwrap();
/// let worked = WorkedHours::single_day(day, Decimal::new(45, 0));
/// let split = split_hours(&worked, OvertimeRule::FortyHourWeek, &PayrollPolicy::default());
///
/// assert_eq!(split.regular_hours, Decimal::new(40, 0));
/// assert_eq!(split.overtime_hours, Decimal::new(5, 0));
/// ```
pub fn split_hours(worked: &WorkedHours, rule: OvertimeRule, policy: &PayrollPolicy) -> HoursSplit {
    let total = worked.total();
    let overtime_hours = match rule {
        OvertimeRule::None => Decimal::ZERO,
        OvertimeRule::EightHourDay => worked
            .daily
            .values()
            .map(|hours| (*hours - policy.daily_overtime_threshold_hours).max(Decimal::ZERO))
            .sum(),
        OvertimeRule::FortyHourWeek => {
            (total - policy.weekly_overtime_threshold_hours).max(Decimal::ZERO)
        }
    };

    HoursSplit {
        regular_hours: total - overtime_hours,
        overtime_hours,
    }
}

/// Computes the overtime hours under every rule.
pub fn overtime_by_rule(worked: &WorkedHours, policy: &PayrollPolicy) -> OvertimeByRule {
    OvertimeByRule {
        eight_hour_day: split_hours(worked, OvertimeRule::EightHourDay, policy).overtime_hours,
        forty_hour_week: split_hours(worked, OvertimeRule::FortyHourWeek, policy).overtime_hours,
    }
}
