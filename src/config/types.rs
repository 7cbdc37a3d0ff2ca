//! Configuration types for payroll computation.
//!
//! This module contains the strongly-typed configuration structures that
//! are deserialized from YAML configuration files.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::models::{NewAdjustmentType, OvertimeRule};

/// Payroll policy constants injected into computation.
///
/// These are deployment decisions rather than laws of the engine; the
/// defaults match a plain hourly payroll with no overtime premium.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PayrollPolicy {
    /// Multiplier applied to the pay rate for overtime hours.
    #[serde(default = "default_overtime_multiplier")]
    pub overtime_multiplier: Decimal,
    /// The overtime rule used to split hours when computing gross pay.
    #[serde(default = "default_gross_overtime_rule")]
    pub gross_overtime_rule: OvertimeRule,
    /// Hours per day before the `8h_day` rule counts overtime.
    #[serde(default = "default_daily_threshold")]
    pub daily_overtime_threshold_hours: Decimal,
    /// Hours per period before the `40h_week` rule counts overtime.
    #[serde(default = "default_weekly_threshold")]
    pub weekly_overtime_threshold_hours: Decimal,
    /// Largest percentage accepted for percent-mode adjustments.
    #[serde(default = "default_max_percent_rate")]
    pub max_percent_rate: Decimal,
    /// Number of employee-weeks computed concurrently during generation.
    #[serde(default = "default_generation_chunk_size")]
    pub generation_chunk_size: usize,
}

fn default_overtime_multiplier() -> Decimal {
    Decimal::ONE
}

fn default_gross_overtime_rule() -> OvertimeRule {
    OvertimeRule::FortyHourWeek
}

fn default_daily_threshold() -> Decimal {
    Decimal::new(8, 0)
}

fn default_weekly_threshold() -> Decimal {
    Decimal::new(40, 0)
}

fn default_max_percent_rate() -> Decimal {
    Decimal::new(1000, 0)
}

fn default_generation_chunk_size() -> usize {
    64
}

impl Default for PayrollPolicy {
    fn default() -> Self {
        Self {
            overtime_multiplier: default_overtime_multiplier(),
            gross_overtime_rule: default_gross_overtime_rule(),
            daily_overtime_threshold_hours: default_daily_threshold(),
            weekly_overtime_threshold_hours: default_weekly_threshold(),
            max_percent_rate: default_max_percent_rate(),
            generation_chunk_size: default_generation_chunk_size(),
        }
    }
}

impl PayrollPolicy {
    /// Returns the first problem with the policy, if any.
    pub fn problems(&self) -> Option<String> {
        if self.overtime_multiplier < Decimal::ZERO {
            return Some("overtime_multiplier must not be negative".to_string());
        }
        if self.daily_overtime_threshold_hours <= Decimal::ZERO {
            return Some("daily_overtime_threshold_hours must be positive".to_string());
        }
        if self.weekly_overtime_threshold_hours <= Decimal::ZERO {
            return Some("weekly_overtime_threshold_hours must be positive".to_string());
        }
        if self.max_percent_rate < Decimal::ZERO {
            return Some("max_percent_rate must not be negative".to_string());
        }
        if self.generation_chunk_size == 0 {
            return Some("generation_chunk_size must be at least 1".to_string());
        }
        None
    }
}

/// Seed catalog file structure (`adjustments.yaml`).
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SeedCatalog {
    /// Adjustment types installed at start-up.
    #[serde(default)]
    pub adjustment_types: Vec<NewAdjustmentType>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_policy() {
        let policy = PayrollPolicy::default();
        assert_eq!(policy.overtime_multiplier, Decimal::ONE);
        assert_eq!(policy.gross_overtime_rule, OvertimeRule::FortyHourWeek);
        assert_eq!(policy.weekly_overtime_threshold_hours, Decimal::new(40, 0));
        assert!(policy.problems().is_none());
    }

    #[test]
    fn test_partial_yaml_uses_defaults() {
        let policy: PayrollPolicy = serde_yaml::from_str("overtime_multiplier: \"1.5\"\n").unwrap();
        assert_eq!(policy.overtime_multiplier, Decimal::new(15, 1));
        assert_eq!(policy.daily_overtime_threshold_hours, Decimal::new(8, 0));
    }

    #[test]
    fn test_zero_chunk_size_is_a_problem() {
        let policy = PayrollPolicy {
            generation_chunk_size: 0,
            ..PayrollPolicy::default()
        };
        assert!(policy.problems().unwrap().contains("generation_chunk_size"));
    }
}
