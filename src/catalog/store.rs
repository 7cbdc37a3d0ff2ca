//! The adjustment catalog.
//!
//! Types and assignments are stored as append-only revision lists: an edit
//! pushes a new revision and leaves earlier ones in place for audit. Resolution
//! always reads the latest revision. Assignments are indexed by
//! `(employee_id, adjustment_type_id)`.

use std::collections::{BTreeMap, HashMap};
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use tracing::info;
use uuid::Uuid;

use crate::error::{EngineError, EngineResult};
use crate::models::{
    AdjustmentType, AdjustmentTypePatch, EmployeeAdjustment, EmployeeAdjustmentPatch,
    NewAdjustmentType, NewEmployeeAdjustment,
};

use super::validation::{validate_assignment, validate_type};

/// A consistent view of the catalog for one employee.
///
/// Holds the latest revision of every adjustment type and of every assignment
/// belonging to the employee, in creation order.
#[derive(Debug, Clone, Default)]
pub struct CatalogSnapshot {
    /// All adjustment types, ordered by creation.
    pub types: Vec<AdjustmentType>,
    /// The employee's assignments in any status, ordered by creation.
    pub assignments: Vec<EmployeeAdjustment>,
}

#[derive(Debug, Default)]
struct CatalogState {
    types: HashMap<Uuid, Vec<AdjustmentType>>,
    assignments: HashMap<Uuid, Vec<EmployeeAdjustment>>,
    by_employee_type: BTreeMap<(String, Uuid), Vec<Uuid>>,
    next_sequence: u64,
}

impl CatalogState {
    fn next_sequence(&mut self) -> u64 {
        self.next_sequence += 1;
        self.next_sequence
    }

    fn current_type(&self, id: Uuid) -> EngineResult<&AdjustmentType> {
        self.types
            .get(&id)
            .and_then(|revisions| revisions.last())
            .ok_or(EngineError::AdjustmentTypeNotFound { id })
    }

    fn current_assignment(&self, id: Uuid) -> EngineResult<&EmployeeAdjustment> {
        self.assignments
            .get(&id)
            .and_then(|revisions| revisions.last())
            .ok_or(EngineError::AssignmentNotFound { id })
    }

    fn current_types(&self) -> Vec<AdjustmentType> {
        let mut types: Vec<AdjustmentType> = self
            .types
            .values()
            .filter_map(|revisions| revisions.last().cloned())
            .collect();
        types.sort_by_key(|t| (t.sequence, t.id));
        types
    }

    fn employee_assignments(&self, employee_id: &str) -> Vec<EmployeeAdjustment> {
        let mut assignments: Vec<EmployeeAdjustment> = self
            .by_employee_type
            .iter()
            .filter(|((employee, _), _)| employee == employee_id)
            .flat_map(|(_, ids)| ids.iter())
            .filter_map(|id| self.assignments.get(id).and_then(|r| r.last().cloned()))
            .collect();
        assignments.sort_by_key(|a| (a.sequence, a.id));
        assignments
    }
}

/// Stores adjustment types and per-employee assignments.
///
/// The catalog is safe to share between threads; every write validates the
/// full candidate revision before it is stored.
///
/// # Example
///
/// ```
/// use payroll_engine::catalog::AdjustmentCatalog;
/// use payroll_engine::models::{Direction, Mode, NewAdjustmentType, ApplyOn, OvertimeRule};
/// use rust_decimal::Decimal;
///
/// let catalog = AdjustmentCatalog::new(Decimal::new(1000, 0));
/// let tax = catalog
///     .create_type(NewAdjustmentType {
///         name: "Tax".to_string(),
///         direction: Direction::Deduct,
///         mode: Mode::Percent,
///         rate_or_amount: Decimal::new(10, 0),
///         cap_per_period: None,
///         apply_on: ApplyOn::All,
///         overtime_rule: OvertimeRule::None,
///         applies_globally: true,
///         note: None,
///         effective_start: None,
///         effective_end: None,
///     })
///     .unwrap();
/// assert_eq!(catalog.list_types().len(), 1);
/// assert_eq!(tax.revision, 1);
/// ```
#[derive(Debug)]
pub struct AdjustmentCatalog {
    max_percent_rate: Decimal,
    state: RwLock<CatalogState>,
}

impl AdjustmentCatalog {
    /// Creates an empty catalog that rejects percentages above `max_percent_rate`.
    pub fn new(max_percent_rate: Decimal) -> Self {
        Self {
            max_percent_rate,
            state: RwLock::new(CatalogState::default()),
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, CatalogState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, CatalogState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Creates a new adjustment type.
    pub fn create_type(&self, input: NewAdjustmentType) -> EngineResult<AdjustmentType> {
        let mut state = self.write();
        let now = Utc::now();
        let candidate = AdjustmentType {
            id: Uuid::new_v4(),
            name: input.name,
            direction: input.direction,
            mode: input.mode,
            rate_or_amount: input.rate_or_amount,
            cap_per_period: input.cap_per_period,
            apply_on: input.apply_on,
            overtime_rule: input.overtime_rule,
            applies_globally: input.applies_globally,
            note: input.note,
            effective_start: input.effective_start,
            effective_end: input.effective_end,
            sequence: 0,
            revision: 1,
            created_at: now,
            updated_at: now,
        };
        validate_type(&candidate, self.max_percent_rate)?;

        let stored = AdjustmentType {
            sequence: state.next_sequence(),
            ..candidate
        };
        state.types.insert(stored.id, vec![stored.clone()]);

        info!(
            adjustment_type_id = %stored.id,
            name = %stored.name,
            applies_globally = stored.applies_globally,
            "Created adjustment type"
        );
        Ok(stored)
    }

    /// Applies a partial update to an adjustment type as a new revision.
    ///
    /// Existing pay records are not touched; the new values apply to future
    /// computations only.
    pub fn update_type(&self, id: Uuid, patch: AdjustmentTypePatch) -> EngineResult<AdjustmentType> {
        let mut state = self.write();
        let mut candidate = state.current_type(id)?.clone();

        if let Some(name) = patch.name {
            candidate.name = name;
        }
        if let Some(direction) = patch.direction {
            candidate.direction = direction;
        }
        if let Some(mode) = patch.mode {
            candidate.mode = mode;
        }
        if let Some(rate) = patch.rate_or_amount {
            candidate.rate_or_amount = rate;
        }
        if let Some(cap) = patch.cap_per_period {
            candidate.cap_per_period = cap;
        }
        if let Some(apply_on) = patch.apply_on {
            candidate.apply_on = apply_on;
        }
        if let Some(rule) = patch.overtime_rule {
            candidate.overtime_rule = rule;
        }
        if let Some(applies_globally) = patch.applies_globally {
            candidate.applies_globally = applies_globally;
        }
        if let Some(note) = patch.note {
            candidate.note = note;
        }
        if let Some(start) = patch.effective_start {
            candidate.effective_start = start;
        }
        if let Some(end) = patch.effective_end {
            candidate.effective_end = end;
        }
        candidate.revision += 1;
        candidate.updated_at = Utc::now();

        validate_type(&candidate, self.max_percent_rate)?;
        // A mode change reinterprets every override of this type.
        for assignment in state
            .assignments
            .values()
            .filter_map(|revisions| revisions.last())
            .filter(|assignment| assignment.adjustment_type_id == id)
        {
            validate_assignment(assignment, &candidate, self.max_percent_rate)?;
        }

        state
            .types
            .entry(id)
            .or_default()
            .push(candidate.clone());

        info!(
            adjustment_type_id = %id,
            revision = candidate.revision,
            "Updated adjustment type"
        );
        Ok(candidate)
    }

    /// Returns the latest revision of an adjustment type.
    pub fn get_type(&self, id: Uuid) -> EngineResult<AdjustmentType> {
        self.read().current_type(id).cloned()
    }

    /// Returns every revision of an adjustment type, oldest first.
    pub fn type_history(&self, id: Uuid) -> EngineResult<Vec<AdjustmentType>> {
        self.read()
            .types
            .get(&id)
            .cloned()
            .ok_or(EngineError::AdjustmentTypeNotFound { id })
    }

    /// Lists the latest revision of every adjustment type in creation order.
    pub fn list_types(&self) -> Vec<AdjustmentType> {
        self.read().current_types()
    }

    /// Finds an adjustment type by exact name.
    pub fn find_type_by_name(&self, name: &str) -> Option<AdjustmentType> {
        self.read()
            .current_types()
            .into_iter()
            .find(|t| t.name == name)
    }

    /// Installs seed types, skipping names that already exist.
    ///
    /// Returns the number of types created.
    pub fn seed(&self, seeds: &[NewAdjustmentType]) -> EngineResult<usize> {
        let mut created = 0;
        for seed in seeds {
            if self.find_type_by_name(&seed.name).is_some() {
                continue;
            }
            self.create_type(seed.clone())?;
            created += 1;
        }
        Ok(created)
    }

    /// Assigns an adjustment type to an employee.
    pub fn assign(
        &self,
        employee_id: &str,
        input: NewEmployeeAdjustment,
    ) -> EngineResult<EmployeeAdjustment> {
        let mut state = self.write();
        let adjustment_type = state
            .current_type(input.adjustment_type_id)
            .map_err(|_| {
                EngineError::validation(
                    "adjustment_type_id",
                    format!("unknown adjustment type {}", input.adjustment_type_id),
                )
            })?
            .clone();

        let now = Utc::now();
        let candidate = EmployeeAdjustment {
            id: Uuid::new_v4(),
            adjustment_type_id: input.adjustment_type_id,
            employee_id: employee_id.to_string(),
            override_rate_or_amount: input.override_rate_or_amount,
            override_cap: input.override_cap,
            replace_global: input.replace_global,
            status: input.status,
            note: input.note,
            effective_start: input.effective_start,
            effective_end: input.effective_end,
            sequence: 0,
            revision: 1,
            created_at: now,
            updated_at: now,
        };
        validate_assignment(&candidate, &adjustment_type, self.max_percent_rate)?;

        let stored = EmployeeAdjustment {
            sequence: state.next_sequence(),
            ..candidate
        };
        state.assignments.insert(stored.id, vec![stored.clone()]);
        state
            .by_employee_type
            .entry((stored.employee_id.clone(), stored.adjustment_type_id))
            .or_default()
            .push(stored.id);

        info!(
            assignment_id = %stored.id,
            employee_id = %stored.employee_id,
            adjustment_type_id = %stored.adjustment_type_id,
            replace_global = stored.replace_global,
            "Assigned adjustment to employee"
        );
        Ok(stored)
    }

    /// Applies a partial update to an employee assignment as a new revision.
    ///
    /// Fails with `AssignmentNotFound` when the assignment belongs to a
    /// different employee.
    pub fn update_assignment(
        &self,
        employee_id: &str,
        id: Uuid,
        patch: EmployeeAdjustmentPatch,
    ) -> EngineResult<EmployeeAdjustment> {
        let mut state = self.write();
        let mut candidate = state.current_assignment(id)?.clone();
        if candidate.employee_id != employee_id {
            return Err(EngineError::AssignmentNotFound { id });
        }
        let adjustment_type = state.current_type(candidate.adjustment_type_id)?.clone();

        if let Some(rate) = patch.override_rate_or_amount {
            candidate.override_rate_or_amount = rate;
        }
        if let Some(cap) = patch.override_cap {
            candidate.override_cap = cap;
        }
        if let Some(replace_global) = patch.replace_global {
            candidate.replace_global = replace_global;
        }
        if let Some(status) = patch.status {
            candidate.status = status;
        }
        if let Some(note) = patch.note {
            candidate.note = note;
        }
        if let Some(start) = patch.effective_start {
            candidate.effective_start = start;
        }
        if let Some(end) = patch.effective_end {
            candidate.effective_end = end;
        }
        candidate.revision += 1;
        candidate.updated_at = Utc::now();

        validate_assignment(&candidate, &adjustment_type, self.max_percent_rate)?;

        state
            .assignments
            .entry(id)
            .or_default()
            .push(candidate.clone());

        info!(
            assignment_id = %id,
            employee_id = %employee_id,
            revision = candidate.revision,
            status = ?candidate.status,
            "Updated employee adjustment"
        );
        Ok(candidate)
    }

    /// Returns every revision of an assignment, oldest first.
    pub fn assignment_history(&self, id: Uuid) -> EngineResult<Vec<EmployeeAdjustment>> {
        self.read()
            .assignments
            .get(&id)
            .cloned()
            .ok_or(EngineError::AssignmentNotFound { id })
    }

    /// Lists an employee's assignments in any status, in creation order.
    pub fn list_employee_assignments(&self, employee_id: &str) -> Vec<EmployeeAdjustment> {
        self.read().employee_assignments(employee_id)
    }

    /// Lists an employee's active assignments effective on `on_date`.
    pub fn list_assignments(&self, employee_id: &str, on_date: NaiveDate) -> Vec<EmployeeAdjustment> {
        self.read()
            .employee_assignments(employee_id)
            .into_iter()
            .filter(|a| a.is_applicable_on(on_date))
            .collect()
    }

    /// Takes a consistent snapshot of the catalog for one employee.
    pub fn snapshot_for(&self, employee_id: &str) -> CatalogSnapshot {
        let state = self.read();
        CatalogSnapshot {
            types: state.current_types(),
            assignments: state.employee_assignments(employee_id),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ApplyOn, AssignmentStatus, Direction, Mode, OvertimeRule};
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn make_date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn new_catalog() -> AdjustmentCatalog {
        AdjustmentCatalog::new(dec("1000"))
    }

    fn tax_type(rate: &str) -> NewAdjustmentType {
        NewAdjustmentType {
            name: "Tax".to_string(),
            direction: Direction::Deduct,
            mode: Mode::Percent,
            rate_or_amount: dec(rate),
            cap_per_period: None,
            apply_on: ApplyOn::All,
            overtime_rule: OvertimeRule::None,
            applies_globally: true,
            note: None,
            effective_start: None,
            effective_end: None,
        }
    }

    fn assignment_for(type_id: Uuid) -> NewEmployeeAdjustment {
        NewEmployeeAdjustment {
            adjustment_type_id: type_id,
            override_rate_or_amount: None,
            override_cap: None,
            replace_global: false,
            status: AssignmentStatus::Active,
            note: None,
            effective_start: None,
            effective_end: None,
        }
    }

    #[test]
    fn test_create_type_assigns_increasing_sequence() {
        let catalog = new_catalog();
        let first = catalog.create_type(tax_type("10")).unwrap();
        let mut second_input = tax_type("5");
        second_input.name = "Union Dues".to_string();
        let second = catalog.create_type(second_input).unwrap();

        assert!(second.sequence > first.sequence);
        let listed = catalog.list_types();
        assert_eq!(listed[0].id, first.id);
        assert_eq!(listed[1].id, second.id);
    }

    #[test]
    fn test_create_invalid_type_writes_nothing() {
        let catalog = new_catalog();
        let result = catalog.create_type(tax_type("-1"));

        assert!(matches!(result, Err(EngineError::Validation { .. })));
        assert!(catalog.list_types().is_empty());
    }

    #[test]
    fn test_update_type_appends_revision() {
        let catalog = new_catalog();
        let created = catalog.create_type(tax_type("10")).unwrap();

        let updated = catalog
            .update_type(
                created.id,
                AdjustmentTypePatch {
                    rate_or_amount: Some(dec("12")),
                    cap_per_period: Some(Some(dec("50"))),
                    ..AdjustmentTypePatch::default()
                },
            )
            .unwrap();

        assert_eq!(updated.revision, 2);
        assert_eq!(updated.rate_or_amount, dec("12"));
        assert_eq!(updated.cap_per_period, Some(dec("50")));
        assert_eq!(updated.sequence, created.sequence);

        let history = catalog.type_history(created.id).unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].rate_or_amount, dec("10"));
        assert_eq!(catalog.get_type(created.id).unwrap().rate_or_amount, dec("12"));
    }

    #[test]
    fn test_rejected_update_keeps_previous_revision() {
        let catalog = new_catalog();
        let created = catalog.create_type(tax_type("10")).unwrap();

        let result = catalog.update_type(
            created.id,
            AdjustmentTypePatch {
                rate_or_amount: Some(dec("5000")),
                ..AdjustmentTypePatch::default()
            },
        );

        assert!(matches!(result, Err(EngineError::Validation { .. })));
        assert_eq!(catalog.type_history(created.id).unwrap().len(), 1);
    }

    #[test]
    fn test_mode_change_revalidates_existing_overrides() {
        let catalog = new_catalog();
        let mut garnishment = tax_type("100");
        garnishment.mode = Mode::Flat;
        garnishment.applies_globally = false;
        let created = catalog.create_type(garnishment).unwrap();
        let mut assignment = assignment_for(created.id);
        assignment.override_rate_or_amount = Some(dec("5000"));
        catalog.assign("emp_001", assignment).unwrap();

        let result = catalog.update_type(
            created.id,
            AdjustmentTypePatch {
                mode: Some(Mode::Percent),
                rate_or_amount: Some(dec("10")),
                ..AdjustmentTypePatch::default()
            },
        );

        match result {
            Err(EngineError::Validation { field, .. }) => {
                assert_eq!(field, "override_rate_or_amount")
            }
            other => panic!("Expected validation error, got {:?}", other),
        }
        let current = catalog.get_type(created.id).unwrap();
        assert_eq!(current.revision, 1);
        assert_eq!(current.mode, Mode::Flat);
    }

    #[test]
    fn test_mode_change_allowed_when_overrides_fit() {
        let catalog = new_catalog();
        let mut garnishment = tax_type("100");
        garnishment.mode = Mode::Flat;
        let created = catalog.create_type(garnishment).unwrap();
        let mut assignment = assignment_for(created.id);
        assignment.override_rate_or_amount = Some(dec("15"));
        catalog.assign("emp_001", assignment).unwrap();

        let updated = catalog
            .update_type(
                created.id,
                AdjustmentTypePatch {
                    mode: Some(Mode::Percent),
                    rate_or_amount: Some(dec("10")),
                    ..AdjustmentTypePatch::default()
                },
            )
            .unwrap();
        assert_eq!(updated.revision, 2);
    }

    #[test]
    fn test_update_unknown_type_is_not_found() {
        let catalog = new_catalog();
        let result = catalog.update_type(Uuid::new_v4(), AdjustmentTypePatch::default());
        assert!(matches!(result, Err(EngineError::AdjustmentTypeNotFound { .. })));
    }

    #[test]
    fn test_assign_unknown_type_is_validation_error() {
        let catalog = new_catalog();
        let result = catalog.assign("emp_001", assignment_for(Uuid::new_v4()));

        match result {
            Err(EngineError::Validation { field, .. }) => assert_eq!(field, "adjustment_type_id"),
            other => panic!("Expected validation error, got {:?}", other),
        }
    }

    #[test]
    fn test_list_assignments_filters_status_and_window() {
        let catalog = new_catalog();
        let tax = catalog.create_type(tax_type("10")).unwrap();

        let mut windowed = assignment_for(tax.id);
        windowed.effective_start = Some(make_date("2025-01-01"));
        windowed.effective_end = Some(make_date("2025-03-31"));
        let windowed = catalog.assign("emp_001", windowed).unwrap();

        let mut paused = assignment_for(tax.id);
        paused.status = AssignmentStatus::Paused;
        catalog.assign("emp_001", paused).unwrap();

        catalog.assign("emp_002", assignment_for(tax.id)).unwrap();

        let in_window = catalog.list_assignments("emp_001", make_date("2025-02-15"));
        assert_eq!(in_window.len(), 1);
        assert_eq!(in_window[0].id, windowed.id);

        assert!(catalog
            .list_assignments("emp_001", make_date("2025-04-01"))
            .is_empty());
        assert_eq!(catalog.list_employee_assignments("emp_001").len(), 2);
    }

    #[test]
    fn test_pausing_assignment_keeps_history() {
        let catalog = new_catalog();
        let tax = catalog.create_type(tax_type("10")).unwrap();
        let assignment = catalog.assign("emp_001", assignment_for(tax.id)).unwrap();

        let paused = catalog
            .update_assignment(
                "emp_001",
                assignment.id,
                EmployeeAdjustmentPatch {
                    status: Some(AssignmentStatus::Paused),
                    ..EmployeeAdjustmentPatch::default()
                },
            )
            .unwrap();

        assert_eq!(paused.status, AssignmentStatus::Paused);
        assert_eq!(paused.revision, 2);
        assert_eq!(catalog.assignment_history(assignment.id).unwrap().len(), 2);
        assert!(catalog
            .list_assignments("emp_001", make_date("2025-02-15"))
            .is_empty());
    }

    #[test]
    fn test_update_assignment_of_other_employee_is_not_found() {
        let catalog = new_catalog();
        let tax = catalog.create_type(tax_type("10")).unwrap();
        let assignment = catalog.assign("emp_001", assignment_for(tax.id)).unwrap();

        let result =
            catalog.update_assignment("emp_002", assignment.id, EmployeeAdjustmentPatch::default());
        assert!(matches!(result, Err(EngineError::AssignmentNotFound { .. })));
    }

    #[test]
    fn test_seed_skips_existing_names() {
        let catalog = new_catalog();
        catalog.create_type(tax_type("10")).unwrap();

        let mut dues = tax_type("2");
        dues.name = "Union Dues".to_string();
        let created = catalog.seed(&[tax_type("99"), dues]).unwrap();

        assert_eq!(created, 1);
        assert_eq!(catalog.list_types().len(), 2);
        assert_eq!(
            catalog.find_type_by_name("Tax").unwrap().rate_or_amount,
            dec("10")
        );
    }

    #[test]
    fn test_snapshot_only_contains_employee_assignments() {
        let catalog = new_catalog();
        let tax = catalog.create_type(tax_type("10")).unwrap();
        catalog.assign("emp_001", assignment_for(tax.id)).unwrap();
        catalog.assign("emp_002", assignment_for(tax.id)).unwrap();

        let snapshot = catalog.snapshot_for("emp_001");
        assert_eq!(snapshot.types.len(), 1);
        assert_eq!(snapshot.assignments.len(), 1);
        assert_eq!(snapshot.assignments[0].employee_id, "emp_001");
    }
}
