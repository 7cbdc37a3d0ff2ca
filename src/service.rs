//! The payroll service facade.
//!
//! [`PayrollService`] wires the adjustment catalog, the computation engine and
//! the pay record lifecycle together behind one library boundary. The HTTP
//! layer is a thin transport over it.

use std::sync::Arc;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use tracing::info;
use uuid::Uuid;

use crate::calculation::{EffectiveAdjustment, OvertimeByRule, PayrollInput};
use crate::catalog::AdjustmentCatalog;
use crate::config::{ConfigLoader, PayrollPolicy};
use crate::error::EngineResult;
use crate::lifecycle::PayrollLifecycle;
use crate::models::{
    AdjustmentType, AdjustmentTypePatch, ApprovalSummary, EmployeeAdjustment,
    EmployeeAdjustmentPatch, GenerationSummary, NewAdjustmentType, NewEmployeeAdjustment,
    PayRecord, PayRecordDraft, WorkedHours,
};
use crate::workforce::{AttendanceSource, EmployeeDirectory};

/// The payroll engine's public operations.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use payroll_engine::config::{ConfigLoader, PayrollPolicy};
/// use payroll_engine::service::PayrollService;
/// use payroll_engine::workforce::InMemoryWorkforce;
///
/// let workforce = Arc::new(InMemoryWorkforce::new());
/// let config = ConfigLoader::from_policy(PayrollPolicy::default());
/// let service = PayrollService::new(&config, workforce.clone(), workforce).unwrap();
/// assert!(service.list_adjustment_types().is_empty());
/// ```
pub struct PayrollService {
    catalog: Arc<AdjustmentCatalog>,
    policy: PayrollPolicy,
    lifecycle: PayrollLifecycle,
}

impl PayrollService {
    /// Creates the service and installs the configured seed adjustment types.
    pub fn new(
        config: &ConfigLoader,
        attendance: Arc<dyn AttendanceSource>,
        employees: Arc<dyn EmployeeDirectory>,
    ) -> EngineResult<Self> {
        let policy = config.policy().clone();
        let catalog = Arc::new(AdjustmentCatalog::new(policy.max_percent_rate));
        let seeded = catalog.seed(config.seed_types())?;
        if seeded > 0 {
            info!(seeded, "Installed seed adjustment types");
        }

        let lifecycle = PayrollLifecycle::new(catalog.clone(), policy.clone(), attendance, employees);
        Ok(Self {
            catalog,
            policy,
            lifecycle,
        })
    }

    /// The payroll policy in force.
    pub fn policy(&self) -> &PayrollPolicy {
        &self.policy
    }

    /// The adjustment catalog.
    pub fn catalog(&self) -> &AdjustmentCatalog {
        &self.catalog
    }

    /// Creates an adjustment type.
    pub fn create_adjustment_type(&self, input: NewAdjustmentType) -> EngineResult<AdjustmentType> {
        self.catalog.create_type(input)
    }

    /// Partially updates an adjustment type.
    pub fn update_adjustment_type(
        &self,
        id: Uuid,
        patch: AdjustmentTypePatch,
    ) -> EngineResult<AdjustmentType> {
        self.catalog.update_type(id, patch)
    }

    /// Lists adjustment types in creation order.
    pub fn list_adjustment_types(&self) -> Vec<AdjustmentType> {
        self.catalog.list_types()
    }

    /// Assigns an adjustment type to an employee.
    pub fn assign_adjustment(
        &self,
        employee_id: &str,
        input: NewEmployeeAdjustment,
    ) -> EngineResult<EmployeeAdjustment> {
        self.catalog.assign(employee_id, input)
    }

    /// Partially updates an employee assignment.
    pub fn update_employee_adjustment(
        &self,
        employee_id: &str,
        id: Uuid,
        patch: EmployeeAdjustmentPatch,
    ) -> EngineResult<EmployeeAdjustment> {
        self.catalog.update_assignment(employee_id, id, patch)
    }

    /// Lists an employee's assignments in any status.
    pub fn list_employee_adjustments(&self, employee_id: &str) -> Vec<EmployeeAdjustment> {
        self.catalog.list_employee_assignments(employee_id)
    }

    /// Lists an employee's active assignments effective on `on_date`.
    pub fn list_assignments(&self, employee_id: &str, on_date: NaiveDate) -> Vec<EmployeeAdjustment> {
        self.catalog.list_assignments(employee_id, on_date)
    }

    /// Resolves the ordered adjustments for an employee and period.
    pub fn resolve_adjustments(
        &self,
        employee_id: &str,
        period_start: NaiveDate,
        period_end: NaiveDate,
        overtime_hours_by_rule: &OvertimeByRule,
    ) -> EngineResult<Vec<EffectiveAdjustment>> {
        let snapshot = self.catalog.snapshot_for(employee_id);
        crate::calculation::resolve_adjustments(
            &snapshot,
            employee_id,
            period_start,
            period_end,
            overtime_hours_by_rule,
        )
    }

    /// Computes a payroll draft without persisting it.
    pub fn compute_payroll(
        &self,
        employee_id: &str,
        period_start: NaiveDate,
        period_end: NaiveDate,
        worked_hours: WorkedHours,
        pay_rate: Decimal,
    ) -> EngineResult<PayRecordDraft> {
        let snapshot = self.catalog.snapshot_for(employee_id);
        let input = PayrollInput {
            employee_id: employee_id.to_string(),
            period_start,
            period_end,
            worked_hours,
            pay_rate,
        };
        crate::calculation::compute_payroll(&snapshot, &self.policy, &input)
    }

    /// Generates pending pay records for the weeks intersecting the range.
    pub fn generate_payrolls(
        &self,
        range_start: NaiveDate,
        range_end: NaiveDate,
    ) -> EngineResult<GenerationSummary> {
        self.lifecycle.generate(range_start, range_end)
    }

    /// Approves a pending pay record.
    pub fn approve(&self, id: Uuid, approved_by: &str) -> EngineResult<PayRecord> {
        self.lifecycle.approve(id, approved_by)
    }

    /// Holds a pending pay record.
    pub fn hold(&self, id: Uuid) -> EngineResult<PayRecord> {
        self.lifecycle.hold(id)
    }

    /// Releases a held pay record.
    pub fn unhold(&self, id: Uuid) -> EngineResult<PayRecord> {
        self.lifecycle.unhold(id)
    }

    /// Holds a pending record or releases a held one.
    pub fn toggle_hold(&self, id: Uuid) -> EngineResult<PayRecord> {
        self.lifecycle.toggle_hold(id)
    }

    /// Approves every currently pending pay record.
    pub fn approve_all(&self, approved_by: &str) -> ApprovalSummary {
        self.lifecycle.approve_all(approved_by)
    }

    /// Returns a pay record by id.
    pub fn get_pay_record(&self, id: Uuid) -> EngineResult<PayRecord> {
        self.lifecycle.store().get(id)
    }

    /// Pending and held records awaiting review.
    pub fn list_pending(&self) -> Vec<PayRecord> {
        self.lifecycle.store().list_pending()
    }

    /// Approved records, newest week first.
    pub fn list_approved(&self) -> Vec<PayRecord> {
        self.lifecycle.store().list_approved()
    }

    /// An employee's approved pay history.
    pub fn employee_history(&self, employee_id: &str) -> Vec<PayRecord> {
        self.lifecycle.store().list_employee_history(employee_id)
    }
}
