//! Pay period and worked-hours models.
//!
//! A [`PayPeriod`] is the ISO week bucket (Monday to Sunday) that completed
//! attendance is grouped into. It is a computed key rather than a stored entity.
//! [`WorkedHours`] carries the per-day hours for one employee in one period.

use std::collections::BTreeMap;

use chrono::{Datelike, Days, NaiveDate};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A weekly pay period.
///
/// # Example
///
/// ```
/// use payroll_engine::models::PayPeriod;
/// use chrono::NaiveDate;
///
/// // Wednesday 2025-09-17 falls in the week of Monday 2025-09-15.
/// let period = PayPeriod::containing(NaiveDate::from_ymd_opt(2025, 9, 17).unwrap());
/// assert_eq!(period.week_start, NaiveDate::from_ymd_opt(2025, 9, 15).unwrap());
/// assert_eq!(period.week_end, NaiveDate::from_ymd_opt(2025, 9, 21).unwrap());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PayPeriod {
    /// The Monday the week starts on (inclusive).
    pub week_start: NaiveDate,
    /// The Sunday the week ends on (inclusive).
    pub week_end: NaiveDate,
}

impl PayPeriod {
    /// Returns the ISO week containing `date`.
    pub fn containing(date: NaiveDate) -> Self {
        let offset = u64::from(date.weekday().num_days_from_monday());
        let week_start = date - Days::new(offset);
        Self {
            week_start,
            week_end: week_start + Days::new(6),
        }
    }

    /// Returns every ISO week intersecting `[start, end]`, oldest first.
    ///
    /// Returns an empty list when `end` is before `start`.
    pub fn weeks_between(start: NaiveDate, end: NaiveDate) -> Vec<Self> {
        let mut weeks = Vec::new();
        if end < start {
            return weeks;
        }
        let mut current = Self::containing(start);
        while current.week_start <= end {
            weeks.push(current);
            current = Self::containing(current.week_end + Days::new(1));
        }
        weeks
    }

    /// Returns true when `date` falls inside the period.
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.week_start <= date && date <= self.week_end
    }
}

/// Worked hours for one employee in one period, bucketed by day.
///
/// Daily buckets are kept so the `8h_day` overtime rule can be evaluated; the
/// `40h_week` rule only looks at the total.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkedHours {
    /// Hours worked per calendar day.
    pub daily: BTreeMap<NaiveDate, Decimal>,
}

impl WorkedHours {
    /// Creates an empty set of worked hours.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records `hours` against a single day, attributing the whole amount to it.
    pub fn single_day(date: NaiveDate, hours: Decimal) -> Self {
        let mut worked = Self::new();
        worked.add(date, hours);
        worked
    }

    /// Adds hours to a day.
    pub fn add(&mut self, date: NaiveDate, hours: Decimal) {
        *self.daily.entry(date).or_insert(Decimal::ZERO) += hours;
    }

    /// Total hours across all days.
    pub fn total(&self) -> Decimal {
        self.daily.values().copied().sum()
    }

    /// Returns true when no positive hours were recorded.
    pub fn is_empty(&self) -> bool {
        self.total() <= Decimal::ZERO
    }
}
