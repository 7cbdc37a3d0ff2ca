//! Payroll computation.
//!
//! Turns worked hours, a pay rate and the resolved adjustments into a
//! [`PayRecordDraft`]. Computation is pure: nothing is persisted here.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::catalog::CatalogSnapshot;
use crate::config::PayrollPolicy;
use crate::error::{EngineError, EngineResult};
use crate::models::{
    AdjustmentLine, ApplyOn, AuditTrace, Mode, PayRecordDraft, WorkedHours,
};

use super::{
    EffectiveAdjustment, OvertimeByRule, overtime_by_rule, resolve_adjustments, round_money,
    split_hours, truncate_money,
};

/// Input for a single employee-period computation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PayrollInput {
    /// The employee being paid.
    pub employee_id: String,
    /// First day of the period.
    pub period_start: NaiveDate,
    /// Last day of the period.
    pub period_end: NaiveDate,
    /// Hours worked in the period, bucketed by day.
    pub worked_hours: WorkedHours,
    /// Hourly pay rate.
    pub pay_rate: Decimal,
}

fn validate_input(input: &PayrollInput) -> EngineResult<()> {
    if input.employee_id.trim().is_empty() {
        return Err(EngineError::validation("employee_id", "must not be empty"));
    }
    if input.period_start > input.period_end {
        return Err(EngineError::validation(
            "period_start",
            format!("{} is after period_end {}", input.period_start, input.period_end),
        ));
    }
    if input.pay_rate < Decimal::ZERO {
        return Err(EngineError::validation("pay_rate", "must not be negative"));
    }
    let period_days = (input.period_end - input.period_start).num_days() + 1;
    let capacity = Decimal::from(period_days * HOURS_PER_DAY);
    for (date, hours) in &input.worked_hours.daily {
        if *hours > capacity {
            return Err(EngineError::validation(
                "worked_hours",
                format!("hours on {} exceed the {} hours in the period", date, capacity),
            ));
        }
        if *hours < Decimal::ZERO {
            return Err(EngineError::validation(
                "worked_hours",
                format!("hours on {} must not be negative", date),
            ));
        }
        if *date < input.period_start || *date > input.period_end {
            return Err(EngineError::validation(
                "worked_hours",
                format!("{} is outside the period", date),
            ));
        }
    }
    if input.worked_hours.total() > capacity {
        return Err(EngineError::validation(
            "worked_hours",
            format!("total hours exceed the {} hours in the period", capacity),
        ));
    }
    Ok(())
}

const HOURS_PER_DAY: i64 = 24;

fn too_large(field: &str) -> EngineError {
    EngineError::validation(field, "amount is too large to compute")
}

struct AppliedAmount {
    base: Decimal,
    raw: Decimal,
    applied: Decimal,
    cap_hit: bool,
}

fn apply_adjustment(
    adjustment: &EffectiveAdjustment,
    gross: Decimal,
    overtime: &OvertimeByRule,
    pay_rate: Decimal,
    policy: &PayrollPolicy,
) -> EngineResult<AppliedAmount> {
    let base = match adjustment.apply_on {
        ApplyOn::All => gross,
        ApplyOn::OvertimeOnly => overtime
            .get(adjustment.overtime_rule)
            .checked_mul(pay_rate)
            .and_then(|pay| pay.checked_mul(policy.overtime_multiplier))
            .ok_or_else(|| too_large("pay_rate"))?,
    };
    let raw = match adjustment.mode {
        Mode::Percent => base
            .checked_mul(adjustment.rate_or_amount)
            .and_then(|value| value.checked_div(Decimal::ONE_HUNDRED))
            .ok_or_else(|| too_large("rate_or_amount"))?,
        Mode::Flat => adjustment.rate_or_amount,
    };
    let rounded = round_money(raw.max(Decimal::ZERO));
    let (applied, cap_hit) = match adjustment.cap_per_period {
        Some(cap) => {
            let ceiling = truncate_money(cap.max(Decimal::ZERO));
            (rounded.min(ceiling), raw > cap || rounded > ceiling)
        }
        None => (rounded, false),
    };

    Ok(AppliedAmount {
        base,
        raw,
        applied,
        cap_hit,
    })
}

/// Computes the payroll for one employee and period.
///
/// 1. Splits worked hours under every overtime rule.
/// 2. Computes gross pay with the policy's `gross_overtime_rule` and
///    `overtime_multiplier`.
/// 3. Resolves the adjustments for the period.
/// 4. Applies each adjustment to its base, enforcing caps.
/// 5. Sums gross and the signed adjustments, clamping net pay at zero.
///
/// Money values are rounded to cents as they are stored on the draft.
///
/// # Errors
///
/// - `Validation` for a negative pay rate, negative hours, hours outside the
///   period or an inverted period
/// - `ConfigurationConflict` from resolution
///
/// # Examples
///
/// ```
/// use payroll_engine::calculation::{compute_payroll, PayrollInput};
/// use payroll_engine::catalog::CatalogSnapshot;
/// use payroll_engine::config::PayrollPolicy;
/// use payroll_engine::models::WorkedHours;
/// use chrono::NaiveDate;
/// use rust_decimal::Decimal;
///
/// let start = NaiveDate::from_ymd_opt(2025, 9, 15).unwrap();
/// let input = PayrollInput {
///     employee_id: "emp_001".to_string(),
///     period_start: start,
///     period_end: NaiveDate::from_ymd_opt(2025, 9, 21).unwrap(),
///     worked_hours: WorkedHours::single_day(start, Decimal::new(45, 0)),
///     pay_rate: Decimal::new(20, 0),
/// };
///
/// let draft = compute_payroll(&CatalogSnapshot::default(), &PayrollPolicy::default(), &input).unwrap();
/// assert_eq!(draft.gross_amount, Decimal::new(900, 0));
/// assert_eq!(draft.amount, Decimal::new(900, 0));
/// ```
pub fn compute_payroll(
    snapshot: &CatalogSnapshot,
    policy: &PayrollPolicy,
    input: &PayrollInput,
) -> EngineResult<PayRecordDraft> {
    validate_input(input)?;

    let mut trace = AuditTrace::default();
    let rate = input.pay_rate;
    let worked = &input.worked_hours;
    let hours_worked = worked.total();

    let overtime = overtime_by_rule(worked, policy);
    let split = split_hours(worked, policy.gross_overtime_rule, policy);
    trace.push(
        "overtime_split",
        "Overtime Split",
        serde_json::json!({
            "hours_worked": hours_worked.normalize().to_string(),
            "days": worked.daily.len(),
            "gross_overtime_rule": policy.gross_overtime_rule.as_str(),
        }),
        serde_json::json!({
            "regular_hours": split.regular_hours.normalize().to_string(),
            "overtime_hours": split.overtime_hours.normalize().to_string(),
            "overtime_by_rule": overtime,
        }),
        format!(
            "{} hours split into {} regular and {} overtime under {}",
            hours_worked.normalize(),
            split.regular_hours.normalize(),
            split.overtime_hours.normalize(),
            policy.gross_overtime_rule.as_str()
        ),
    );

    let regular_pay = split.regular_hours.checked_mul(rate);
    let overtime_pay = split
        .overtime_hours
        .checked_mul(rate)
        .and_then(|pay| pay.checked_mul(policy.overtime_multiplier));
    let gross = regular_pay
        .zip(overtime_pay)
        .and_then(|(regular, overtime)| regular.checked_add(overtime))
        .ok_or_else(|| too_large("pay_rate"))?;
    let gross_amount = round_money(gross);
    trace.push(
        "gross_pay",
        "Gross Pay",
        serde_json::json!({
            "regular_hours": split.regular_hours.normalize().to_string(),
            "overtime_hours": split.overtime_hours.normalize().to_string(),
            "pay_rate": rate.normalize().to_string(),
            "overtime_multiplier": policy.overtime_multiplier.normalize().to_string(),
        }),
        serde_json::json!({ "gross_amount": gross_amount.to_string() }),
        format!(
            "{} regular hours x ${} + {} overtime hours x ${} x {} = ${}",
            split.regular_hours.normalize(),
            rate.normalize(),
            split.overtime_hours.normalize(),
            rate.normalize(),
            policy.overtime_multiplier.normalize(),
            gross_amount
        ),
    );

    let resolved = resolve_adjustments(
        snapshot,
        &input.employee_id,
        input.period_start,
        input.period_end,
        &overtime,
    )?;
    trace.push(
        "adjustment_resolution",
        "Adjustment Resolution",
        serde_json::json!({
            "period_start": input.period_start,
            "period_end": input.period_end,
        }),
        serde_json::json!({
            "adjustments": resolved.iter().map(|r| r.name.as_str()).collect::<Vec<_>>(),
        }),
        format!("{} adjustments apply to the period", resolved.len()),
    );

    let mut lines = Vec::with_capacity(resolved.len());
    for adjustment in &resolved {
        let amount = apply_adjustment(adjustment, gross, &overtime, rate, policy)?;
        let line = AdjustmentLine {
            adjustment_type_id: adjustment.adjustment_type_id,
            assignment_id: adjustment.assignment_id,
            name: adjustment.name.clone(),
            direction: adjustment.direction,
            mode: adjustment.mode,
            rate_or_amount: adjustment.rate_or_amount,
            apply_on: adjustment.apply_on,
            overtime_rule: adjustment.overtime_rule,
            cap_per_period: adjustment.cap_per_period,
            cap_hit: amount.cap_hit,
            source: adjustment.source,
            amount_applied: amount.applied,
        };

        let reasoning = if amount.cap_hit {
            format!(
                "{} of ${} capped at ${}",
                line.name,
                amount.raw.normalize(),
                line.amount_applied
            )
        } else {
            format!("{} applied ${} on a base of ${}", line.name, line.amount_applied, amount.base.normalize())
        };
        trace.push(
            "adjustment",
            &line.name,
            serde_json::json!({
                "base": amount.base.normalize().to_string(),
                "mode": line.mode,
                "rate_or_amount": line.rate_or_amount.normalize().to_string(),
                "cap_per_period": line.cap_per_period.map(|c| c.normalize().to_string()),
                "source": line.source,
            }),
            serde_json::json!({
                "direction": line.direction,
                "amount_applied": line.amount_applied.to_string(),
                "cap_hit": line.cap_hit,
            }),
            reasoning,
        );
        lines.push(line);
    }

    let unclamped = lines
        .iter()
        .map(AdjustmentLine::signed_amount)
        .try_fold(gross_amount, |total, signed| total.checked_add(signed))
        .ok_or_else(|| too_large("rate_or_amount"))?;
    let negative_net_clamped = unclamped < Decimal::ZERO;
    let amount = round_money(unclamped.max(Decimal::ZERO));
    if negative_net_clamped {
        warn!(
            employee_id = %input.employee_id,
            period_start = %input.period_start,
            unclamped = %unclamped,
            "Net pay below zero, clamped"
        );
        trace.warn(
            "NEGATIVE_NET_CLAMPED",
            format!("Net pay of ${} was raised to $0.00", unclamped),
        );
    }
    trace.push(
        "net_pay",
        "Net Pay",
        serde_json::json!({
            "gross_amount": gross_amount.to_string(),
            "adjustment_total": (unclamped - gross_amount).to_string(),
        }),
        serde_json::json!({
            "amount": amount.to_string(),
            "negative_net_clamped": negative_net_clamped,
        }),
        format!("${} gross with adjustments gives ${} net", gross_amount, amount),
    );

    Ok(PayRecordDraft {
        employee_id: input.employee_id.clone(),
        week_start: input.period_start,
        week_end: input.period_end,
        hours_worked,
        regular_hours: split.regular_hours,
        overtime_hours: split.overtime_hours,
        pay_rate: rate,
        gross_amount,
        adjustments: lines,
        amount,
        negative_net_clamped,
        audit_trace: trace,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{
        AdjustmentSource, AdjustmentType, AssignmentStatus, Direction, EmployeeAdjustment,
        OvertimeRule,
    };
    use chrono::Utc;
    use std::str::FromStr;
    use uuid::Uuid;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn make_date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn make_type(name: &str, direction: Direction, mode: Mode, rate: &str) -> AdjustmentType {
        AdjustmentType {
            id: Uuid::new_v4(),
            name: name.to_string(),
            direction,
            mode,
            rate_or_amount: dec(rate),
            cap_per_period: None,
            apply_on: ApplyOn::All,
            overtime_rule: OvertimeRule::None,
            applies_globally: true,
            note: None,
            effective_start: None,
            effective_end: None,
            sequence: 1,
            revision: 1,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn make_assignment(adjustment_type: &AdjustmentType) -> EmployeeAdjustment {
        EmployeeAdjustment {
            id: Uuid::new_v4(),
            adjustment_type_id: adjustment_type.id,
            employee_id: "emp_001".to_string(),
            override_rate_or_amount: None,
            override_cap: None,
            replace_global: false,
            status: AssignmentStatus::Active,
            note: None,
            effective_start: None,
            effective_end: None,
            sequence: 10,
            revision: 1,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn make_input(hours: &str, rate: &str) -> PayrollInput {
        PayrollInput {
            employee_id: "emp_001".to_string(),
            period_start: make_date("2025-09-15"),
            period_end: make_date("2025-09-21"),
            worked_hours: WorkedHours::single_day(make_date("2025-09-15"), dec(hours)),
            pay_rate: dec(rate),
        }
    }

    #[test]
    fn test_global_tax_on_45_hours() {
        let tax = make_type("Tax", Direction::Deduct, Mode::Percent, "10");
        let snapshot = CatalogSnapshot {
            types: vec![tax],
            assignments: vec![],
        };

        let draft = compute_payroll(&snapshot, &PayrollPolicy::default(), &make_input("45", "20"))
            .unwrap();

        assert_eq!(draft.gross_amount, dec("900.00"));
        assert_eq!(draft.regular_hours, dec("40"));
        assert_eq!(draft.overtime_hours, dec("5"));
        assert_eq!(draft.adjustments.len(), 1);
        assert_eq!(draft.adjustments[0].amount_applied, dec("90.00"));
        assert_eq!(draft.amount, dec("810.00"));
        assert!(!draft.negative_net_clamped);
    }

    #[test]
    fn test_replacing_override_on_45_hours() {
        let tax = make_type("Tax", Direction::Deduct, Mode::Percent, "10");
        let mut assignment = make_assignment(&tax);
        assignment.replace_global = true;
        assignment.override_rate_or_amount = Some(dec("8"));
        let snapshot = CatalogSnapshot {
            types: vec![tax],
            assignments: vec![assignment],
        };

        let draft = compute_payroll(&snapshot, &PayrollPolicy::default(), &make_input("45", "20"))
            .unwrap();

        assert_eq!(draft.adjustments.len(), 1);
        assert_eq!(draft.adjustments[0].source, AdjustmentSource::Replacing);
        assert_eq!(draft.adjustments[0].amount_applied, dec("72.00"));
        assert_eq!(draft.amount, dec("828.00"));
    }

    #[test]
    fn test_overtime_multiplier_raises_gross() {
        let policy = PayrollPolicy {
            overtime_multiplier: dec("1.5"),
            ..PayrollPolicy::default()
        };
        let draft = compute_payroll(&CatalogSnapshot::default(), &policy, &make_input("45", "20"))
            .unwrap();

        assert_eq!(draft.gross_amount, dec("950.00"));
    }

    #[test]
    fn test_overtime_only_uses_overtime_base() {
        let mut premium = make_type("Overtime Premium", Direction::Add, Mode::Percent, "50");
        premium.apply_on = ApplyOn::OvertimeOnly;
        premium.overtime_rule = OvertimeRule::FortyHourWeek;
        let snapshot = CatalogSnapshot {
            types: vec![premium],
            assignments: vec![],
        };

        let draft = compute_payroll(&snapshot, &PayrollPolicy::default(), &make_input("45", "20"))
            .unwrap();

        // 5 overtime hours x 20 = 100 base, 50% = 50
        assert_eq!(draft.adjustments[0].amount_applied, dec("50.00"));
        assert_eq!(draft.amount, dec("950.00"));
    }

    #[test]
    fn test_overtime_only_skipped_without_overtime() {
        let mut premium = make_type("Overtime Premium", Direction::Add, Mode::Percent, "50");
        premium.apply_on = ApplyOn::OvertimeOnly;
        premium.overtime_rule = OvertimeRule::FortyHourWeek;
        let snapshot = CatalogSnapshot {
            types: vec![premium],
            assignments: vec![],
        };

        let draft = compute_payroll(&snapshot, &PayrollPolicy::default(), &make_input("38", "20"))
            .unwrap();
        assert!(draft.adjustments.is_empty());
        assert_eq!(draft.amount, dec("760.00"));
    }

    #[test]
    fn test_cap_limits_amount() {
        let mut tax = make_type("Tax", Direction::Deduct, Mode::Percent, "10");
        tax.cap_per_period = Some(dec("50"));
        let snapshot = CatalogSnapshot {
            types: vec![tax],
            assignments: vec![],
        };

        let draft = compute_payroll(&snapshot, &PayrollPolicy::default(), &make_input("45", "20"))
            .unwrap();
        assert_eq!(draft.adjustments[0].amount_applied, dec("50.00"));
        assert!(draft.adjustments[0].cap_hit);
        assert_eq!(draft.amount, dec("850.00"));
    }

    #[test]
    fn test_sub_cent_cap_is_never_exceeded() {
        let mut tax = make_type("Tax", Direction::Deduct, Mode::Percent, "10");
        tax.cap_per_period = Some(dec("10.005"));
        let snapshot = CatalogSnapshot {
            types: vec![tax],
            assignments: vec![],
        };

        let draft = compute_payroll(&snapshot, &PayrollPolicy::default(), &make_input("40", "20"))
            .unwrap();
        assert_eq!(draft.adjustments[0].amount_applied, dec("10.00"));
        assert!(draft.adjustments[0].cap_hit);
    }

    #[test]
    fn test_override_cap_replaces_type_cap() {
        let mut tax = make_type("Tax", Direction::Deduct, Mode::Percent, "10");
        tax.cap_per_period = Some(dec("50"));
        let mut assignment = make_assignment(&tax);
        assignment.replace_global = true;
        assignment.override_cap = Some(dec("20"));
        let snapshot = CatalogSnapshot {
            types: vec![tax],
            assignments: vec![assignment],
        };

        let draft = compute_payroll(&snapshot, &PayrollPolicy::default(), &make_input("45", "20"))
            .unwrap();
        assert_eq!(draft.adjustments[0].amount_applied, dec("20.00"));
        assert_eq!(draft.adjustments[0].cap_per_period, Some(dec("20")));
    }

    #[test]
    fn test_flat_amount_applied_once() {
        let fee = make_type("Uniform Fee", Direction::Deduct, Mode::Flat, "15.50");
        let snapshot = CatalogSnapshot {
            types: vec![fee],
            assignments: vec![],
        };

        let mut input = make_input("10", "20");
        input.worked_hours.add(make_date("2025-09-16"), dec("10"));
        let draft = compute_payroll(&snapshot, &PayrollPolicy::default(), &input).unwrap();

        assert_eq!(draft.adjustments[0].amount_applied, dec("15.50"));
        assert_eq!(draft.amount, dec("384.50"));
    }

    #[test]
    fn test_negative_net_is_clamped() {
        let fee = make_type("Equipment Repayment", Direction::Deduct, Mode::Flat, "500");
        let snapshot = CatalogSnapshot {
            types: vec![fee],
            assignments: vec![],
        };

        let draft = compute_payroll(&snapshot, &PayrollPolicy::default(), &make_input("10", "20"))
            .unwrap();

        assert_eq!(draft.amount, Decimal::ZERO);
        assert!(draft.negative_net_clamped);
        assert_eq!(draft.audit_trace.warnings[0].code, "NEGATIVE_NET_CLAMPED");
    }

    #[test]
    fn test_percent_rounding_half_up() {
        let levy = make_type("Levy", Direction::Deduct, Mode::Percent, "1.25");
        let snapshot = CatalogSnapshot {
            types: vec![levy],
            assignments: vec![],
        };

        // 1 hour x 1.00 = 1.00 gross; 1.25% = 0.0125 -> 0.01
        let draft = compute_payroll(&snapshot, &PayrollPolicy::default(), &make_input("1", "1"))
            .unwrap();
        assert_eq!(draft.adjustments[0].amount_applied, dec("0.01"));
        assert_eq!(draft.amount, dec("0.99"));
    }

    #[test]
    fn test_negative_pay_rate_rejected() {
        let result = compute_payroll(
            &CatalogSnapshot::default(),
            &PayrollPolicy::default(),
            &make_input("10", "-1"),
        );
        match result {
            Err(EngineError::Validation { field, .. }) => assert_eq!(field, "pay_rate"),
            other => panic!("Expected validation error, got {:?}", other),
        }
    }

    #[test]
    fn test_hours_outside_period_rejected() {
        let mut input = make_input("8", "20");
        input.worked_hours.add(make_date("2025-09-22"), dec("8"));
        let result = compute_payroll(&CatalogSnapshot::default(), &PayrollPolicy::default(), &input);
        assert!(matches!(result, Err(EngineError::Validation { .. })));
    }

    #[test]
    fn test_hours_beyond_period_length_rejected() {
        let result = compute_payroll(
            &CatalogSnapshot::default(),
            &PayrollPolicy::default(),
            &make_input("100000", "20"),
        );
        assert!(matches!(
            result,
            Err(EngineError::Validation { ref field, .. }) if field == "worked_hours"
        ));
    }

    #[test]
    fn test_oversized_pay_rate_is_validation_error() {
        let input = make_input("100", "79228162514264337593543950");
        let result = compute_payroll(&CatalogSnapshot::default(), &PayrollPolicy::default(), &input);
        assert!(matches!(
            result,
            Err(EngineError::Validation { ref field, .. }) if field == "pay_rate"
        ));
    }

    #[test]
    fn test_oversized_flat_amounts_are_validation_error() {
        let first = make_type("Bonus", Direction::Add, Mode::Flat, "79228162514264337593543950");
        let mut second = make_type("Allowance", Direction::Add, Mode::Flat, "79228162514264337593543950");
        second.sequence = 2;
        let snapshot = CatalogSnapshot {
            types: vec![first, second],
            assignments: vec![],
        };

        let result = compute_payroll(&snapshot, &PayrollPolicy::default(), &make_input("40", "20"));
        assert!(matches!(result, Err(EngineError::Validation { .. })));
    }

    #[test]
    fn test_audit_trace_records_each_stage() {
        let tax = make_type("Tax", Direction::Deduct, Mode::Percent, "10");
        let snapshot = CatalogSnapshot {
            types: vec![tax],
            assignments: vec![],
        };

        let draft = compute_payroll(&snapshot, &PayrollPolicy::default(), &make_input("45", "20"))
            .unwrap();
        let rule_ids: Vec<&str> = draft
            .audit_trace
            .steps
            .iter()
            .map(|s| s.rule_id.as_str())
            .collect();

        assert_eq!(
            rule_ids,
            vec!["overtime_split", "gross_pay", "adjustment_resolution", "adjustment", "net_pay"]
        );
        assert_eq!(draft.audit_trace.steps[4].step_number, 5);
    }

    #[test]
    fn test_conflict_propagates() {
        let tax = make_type("Tax", Direction::Deduct, Mode::Percent, "10");
        let snapshot = CatalogSnapshot {
            types: vec![tax.clone()],
            assignments: vec![make_assignment(&tax), make_assignment(&tax)],
        };

        let result = compute_payroll(&snapshot, &PayrollPolicy::default(), &make_input("45", "20"));
        assert!(matches!(result, Err(EngineError::ConfigurationConflict { .. })));
    }
}
