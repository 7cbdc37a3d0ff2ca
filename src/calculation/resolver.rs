//! Adjustment resolution.
//!
//! Given a catalog snapshot, an employee and a pay period, this module produces
//! the ordered list of adjustments to apply. Global types are merged with the
//! employee's assignments according to a per-type [`OverrideKind`]:
//!
//! - no assignment: the global type applies with its own values
//! - an assignment with `replace_global = false`: both apply (stacked)
//! - an assignment with `replace_global = true`: only the employee copy applies
//!
//! Effectiveness is judged on the last day of the period.

use std::collections::{BTreeMap, HashMap};

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

use crate::catalog::CatalogSnapshot;
use crate::error::{EngineError, EngineResult};
use crate::models::{
    AdjustmentSource, AdjustmentType, ApplyOn, Direction, EmployeeAdjustment, Mode, OvertimeRule,
};

use super::OvertimeByRule;

/// How a global adjustment type combines with the employee's assignment of it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OverrideKind<'a> {
    /// No assignment; the global values apply.
    GlobalOnly,
    /// The global type and the employee copy both apply.
    StackedOverride(&'a EmployeeAdjustment),
    /// Only the employee copy applies.
    ReplacingOverride(&'a EmployeeAdjustment),
}

impl<'a> OverrideKind<'a> {
    fn for_assignment(assignment: Option<&'a EmployeeAdjustment>) -> Self {
        match assignment {
            None => OverrideKind::GlobalOnly,
            Some(a) if a.replace_global => OverrideKind::ReplacingOverride(a),
            Some(a) => OverrideKind::StackedOverride(a),
        }
    }
}

/// A resolved adjustment with its effective values.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EffectiveAdjustment {
    /// The adjustment type.
    pub adjustment_type_id: Uuid,
    /// The assignment supplying the values, for employee copies.
    pub assignment_id: Option<Uuid>,
    /// Display name.
    pub name: String,
    /// Add or deduct.
    pub direction: Direction,
    /// Percent or flat.
    pub mode: Mode,
    /// The rate or amount in force.
    pub rate_or_amount: Decimal,
    /// The cap in force.
    pub cap_per_period: Option<Decimal>,
    /// The earnings the adjustment applies to.
    pub apply_on: ApplyOn,
    /// The overtime rule evaluated for overtime-only adjustments.
    pub overtime_rule: OvertimeRule,
    /// Where the values came from.
    pub source: AdjustmentSource,
}

impl EffectiveAdjustment {
    fn global(adjustment_type: &AdjustmentType) -> Self {
        Self {
            adjustment_type_id: adjustment_type.id,
            assignment_id: None,
            name: adjustment_type.name.clone(),
            direction: adjustment_type.direction,
            mode: adjustment_type.mode,
            rate_or_amount: adjustment_type.rate_or_amount,
            cap_per_period: adjustment_type.cap_per_period,
            apply_on: adjustment_type.apply_on,
            overtime_rule: adjustment_type.overtime_rule,
            source: AdjustmentSource::Global,
        }
    }

    fn employee_copy(
        adjustment_type: &AdjustmentType,
        assignment: &EmployeeAdjustment,
        source: AdjustmentSource,
    ) -> Self {
        Self {
            adjustment_type_id: adjustment_type.id,
            assignment_id: Some(assignment.id),
            name: adjustment_type.name.clone(),
            direction: adjustment_type.direction,
            mode: adjustment_type.mode,
            rate_or_amount: assignment
                .override_rate_or_amount
                .unwrap_or(adjustment_type.rate_or_amount),
            cap_per_period: assignment.override_cap.or(adjustment_type.cap_per_period),
            apply_on: adjustment_type.apply_on,
            overtime_rule: adjustment_type.overtime_rule,
            source,
        }
    }
}

fn is_eligible(adjustment_type: &AdjustmentType, on_date: NaiveDate, overtime: &OvertimeByRule) -> bool {
    if !adjustment_type.is_effective_on(on_date) {
        return false;
    }
    match adjustment_type.apply_on {
        ApplyOn::All => true,
        ApplyOn::OvertimeOnly => overtime.get(adjustment_type.overtime_rule) > Decimal::ZERO,
    }
}

/// Resolves the ordered adjustments for one employee and period.
///
/// Global entries come first in type creation order, followed by employee
/// copies and employee-only entries in assignment creation order. Types that
/// are not effective on `period_end`, and overtime-only types with no overtime
/// under their rule, are left out together with their assignments.
///
/// # Errors
///
/// - `Validation` when `period_start` is after `period_end`
/// - `ConfigurationConflict` when two active assignments of the same type
///   have overlapping windows that reach into the period
pub fn resolve_adjustments(
    snapshot: &CatalogSnapshot,
    employee_id: &str,
    period_start: NaiveDate,
    period_end: NaiveDate,
    overtime: &OvertimeByRule,
) -> EngineResult<Vec<EffectiveAdjustment>> {
    if period_start > period_end {
        return Err(EngineError::validation(
            "period_start",
            format!("{} is after period_end {}", period_start, period_end),
        ));
    }
    let on_date = period_end;

    let mut within_period: BTreeMap<Uuid, Vec<&EmployeeAdjustment>> = BTreeMap::new();
    for assignment in snapshot
        .assignments
        .iter()
        .filter(|a| a.employee_id == employee_id && a.is_active_within(period_start, period_end))
    {
        within_period
            .entry(assignment.adjustment_type_id)
            .or_default()
            .push(assignment);
    }

    for (type_id, assignments) in &within_period {
        let mut assignment_ids: Vec<Uuid> = Vec::new();
        for (i, first) in assignments.iter().enumerate() {
            for second in &assignments[i + 1..] {
                if first.overlaps(second) {
                    assignment_ids.push(first.id);
                    assignment_ids.push(second.id);
                }
            }
        }
        if !assignment_ids.is_empty() {
            assignment_ids.sort();
            assignment_ids.dedup();
            return Err(EngineError::ConfigurationConflict {
                employee_id: employee_id.to_string(),
                adjustment_type_id: *type_id,
                on_date,
                assignment_ids,
            });
        }
    }

    // Without overlaps at most one assignment per type covers `on_date`.
    let mut by_type: BTreeMap<Uuid, Vec<&EmployeeAdjustment>> = BTreeMap::new();
    for (type_id, assignments) in within_period {
        let applicable: Vec<&EmployeeAdjustment> = assignments
            .into_iter()
            .filter(|a| a.is_applicable_on(on_date))
            .collect();
        if !applicable.is_empty() {
            by_type.insert(type_id, applicable);
        }
    }

    let types: HashMap<Uuid, &AdjustmentType> =
        snapshot.types.iter().map(|t| (t.id, t)).collect();

    let mut ordered_types: Vec<&AdjustmentType> = snapshot.types.iter().collect();
    ordered_types.sort_by_key(|t| (t.sequence, t.id));

    let mut global_entries = Vec::new();
    let mut employee_entries: Vec<(u64, Uuid, EffectiveAdjustment)> = Vec::new();

    for adjustment_type in ordered_types
        .into_iter()
        .filter(|t| t.applies_globally && is_eligible(t, on_date, overtime))
    {
        let assignment = by_type
            .get(&adjustment_type.id)
            .and_then(|assignments| assignments.first().copied());

        match OverrideKind::for_assignment(assignment) {
            OverrideKind::GlobalOnly => {
                global_entries.push(EffectiveAdjustment::global(adjustment_type));
            }
            OverrideKind::StackedOverride(a) => {
                global_entries.push(EffectiveAdjustment::global(adjustment_type));
                employee_entries.push((
                    a.sequence,
                    a.id,
                    EffectiveAdjustment::employee_copy(adjustment_type, a, AdjustmentSource::Stacked),
                ));
            }
            OverrideKind::ReplacingOverride(a) => {
                employee_entries.push((
                    a.sequence,
                    a.id,
                    EffectiveAdjustment::employee_copy(adjustment_type, a, AdjustmentSource::Replacing),
                ));
            }
        }
    }

    for assignment in by_type.values().filter_map(|assignments| assignments.first().copied()) {
        let Some(adjustment_type) = types.get(&assignment.adjustment_type_id) else {
            debug!(
                assignment_id = %assignment.id,
                adjustment_type_id = %assignment.adjustment_type_id,
                "Skipping assignment of unknown adjustment type"
            );
            continue;
        };
        if adjustment_type.applies_globally || !is_eligible(adjustment_type, on_date, overtime) {
            continue;
        }
        employee_entries.push((
            assignment.sequence,
            assignment.id,
            EffectiveAdjustment::employee_copy(
                adjustment_type,
                assignment,
                AdjustmentSource::EmployeeOnly,
            ),
        ));
    }

    employee_entries.sort_by_key(|(sequence, id, _)| (*sequence, *id));

    let mut resolved = global_entries;
    resolved.extend(employee_entries.into_iter().map(|(_, _, entry)| entry));

    debug!(
        employee_id = %employee_id,
        period_start = %period_start,
        period_end = %period_end,
        resolved = resolved.len(),
        "Resolved adjustments"
    );
    Ok(resolved)
}
