//! Payroll generation and approval.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::NaiveDate;
use tracing::{info, warn};
use uuid::Uuid;

use crate::calculation::{PayrollInput, compute_payroll};
use crate::catalog::AdjustmentCatalog;
use crate::config::PayrollPolicy;
use crate::error::{EngineError, EngineResult};
use crate::models::{
    ApprovalSummary, GenerationFailure, GenerationSummary, PayPeriod, PayRecord, PayRecordDraft,
    PayRecordStatus, TransitionAction, WorkedHours,
};
use crate::workforce::{AttendanceSource, EmployeeDirectory};

use super::PayRecordStore;

/// One employee-week awaiting computation.
#[derive(Debug)]
struct GenerationJob {
    period: PayPeriod,
    employee_id: String,
    worked: WorkedHours,
}

/// Generates weekly pay records from attendance and moves them through
/// `pending`, `held` and `approved`.
pub struct PayrollLifecycle {
    catalog: Arc<AdjustmentCatalog>,
    policy: PayrollPolicy,
    attendance: Arc<dyn AttendanceSource>,
    employees: Arc<dyn EmployeeDirectory>,
    store: PayRecordStore,
}

impl PayrollLifecycle {
    /// Creates a lifecycle manager with an empty record store.
    pub fn new(
        catalog: Arc<AdjustmentCatalog>,
        policy: PayrollPolicy,
        attendance: Arc<dyn AttendanceSource>,
        employees: Arc<dyn EmployeeDirectory>,
    ) -> Self {
        Self {
            catalog,
            policy,
            attendance,
            employees,
            store: PayRecordStore::new(),
        }
    }

    /// The underlying record store.
    pub fn store(&self) -> &PayRecordStore {
        &self.store
    }

    /// Generates pending pay records for every ISO week intersecting
    /// `[range_start, range_end]`.
    ///
    /// Only completed attendance is counted. Employee-weeks that already have a
    /// record are skipped, so running generation twice over the same range
    /// inserts nothing the second time. One employee's failure is recorded in
    /// the summary and never aborts the batch.
    pub fn generate(
        &self,
        range_start: NaiveDate,
        range_end: NaiveDate,
    ) -> EngineResult<GenerationSummary> {
        if range_start > range_end {
            return Err(EngineError::validation(
                "range_start",
                format!("{} is after range_end {}", range_start, range_end),
            ));
        }

        let weeks = PayPeriod::weeks_between(range_start, range_end);
        let (Some(first), Some(last)) = (weeks.first(), weeks.last()) else {
            return Ok(GenerationSummary::default());
        };

        let mut groups: BTreeMap<PayPeriod, BTreeMap<String, WorkedHours>> = BTreeMap::new();
        for record in self
            .attendance
            .completed_between(first.week_start, last.week_end)
        {
            let Some(hours) = record.worked_hours() else {
                continue;
            };
            groups
                .entry(PayPeriod::containing(record.work_date()))
                .or_default()
                .entry(record.employee_id.clone())
                .or_default()
                .add(record.work_date(), hours);
        }

        let mut summary = GenerationSummary {
            weeks_processed: groups.len() as u32,
            ..GenerationSummary::default()
        };

        let mut jobs = Vec::new();
        for (period, employees) in groups {
            for (employee_id, worked) in employees {
                if worked.is_empty() {
                    continue;
                }
                if self
                    .store
                    .exists(&employee_id, period.week_start, period.week_end)
                {
                    summary.skipped_existing += 1;
                    continue;
                }
                jobs.push(GenerationJob {
                    period,
                    employee_id,
                    worked,
                });
            }
        }

        for chunk in jobs.chunks(self.policy.generation_chunk_size.max(1)) {
            let outcomes: Vec<(&GenerationJob, Option<EngineResult<PayRecordDraft>>)> =
                std::thread::scope(|scope| {
                    let handles: Vec<_> = chunk
                        .iter()
                        .map(|job| (job, scope.spawn(move || self.compute_job(job))))
                        .collect();
                    handles
                        .into_iter()
                        .map(|(job, handle)| (job, handle.join().ok()))
                        .collect()
                });

            for (job, outcome) in outcomes {
                let result = match outcome {
                    Some(computed) => {
                        computed.and_then(|draft| self.store.insert(PayRecord::from_draft(draft)))
                    }
                    None => {
                        summary.failures.push(failure(
                            job,
                            "INTERNAL_ERROR",
                            "computation panicked".to_string(),
                        ));
                        continue;
                    }
                };

                match result {
                    Ok(record) => {
                        info!(
                            record_id = %record.id,
                            employee_id = %record.user_id,
                            week_start = %record.week_start,
                            amount = %record.amount,
                            "Generated pay record"
                        );
                        summary.generated += 1;
                    }
                    Err(EngineError::DuplicatePeriod { .. }) => {
                        summary.skipped_existing += 1;
                    }
                    Err(e) => {
                        warn!(
                            employee_id = %job.employee_id,
                            week_start = %job.period.week_start,
                            error = %e,
                            "Pay record generation failed"
                        );
                        summary.failures.push(failure(job, e.code(), e.to_string()));
                    }
                }
            }
        }

        info!(
            range_start = %range_start,
            range_end = %range_end,
            generated = summary.generated,
            weeks_processed = summary.weeks_processed,
            skipped_existing = summary.skipped_existing,
            failures = summary.failures.len(),
            "Payroll generation complete"
        );
        Ok(summary)
    }

    fn compute_job(&self, job: &GenerationJob) -> EngineResult<PayRecordDraft> {
        let employee =
            self.employees
                .employee(&job.employee_id)
                .ok_or_else(|| EngineError::EmployeeNotFound {
                    id: job.employee_id.clone(),
                })?;
        let input = PayrollInput {
            employee_id: job.employee_id.clone(),
            period_start: job.period.week_start,
            period_end: job.period.week_end,
            worked_hours: job.worked.clone(),
            pay_rate: employee.pay_rate,
        };
        let snapshot = self.catalog.snapshot_for(&job.employee_id);
        compute_payroll(&snapshot, &self.policy, &input)
    }

    /// Approves a pending record.
    pub fn approve(&self, id: Uuid, approved_by: &str) -> EngineResult<PayRecord> {
        let record = self
            .store
            .transition(id, None, TransitionAction::Approve, Some(approved_by))?;
        info!(record_id = %id, approved_by = %approved_by, "Approved pay record");
        Ok(record)
    }

    /// Moves a pending record to held.
    pub fn hold(&self, id: Uuid) -> EngineResult<PayRecord> {
        let record = self.store.transition(id, None, TransitionAction::Hold, None)?;
        info!(record_id = %id, "Held pay record");
        Ok(record)
    }

    /// Returns a held record to pending.
    pub fn unhold(&self, id: Uuid) -> EngineResult<PayRecord> {
        let record = self
            .store
            .transition(id, None, TransitionAction::Unhold, None)?;
        info!(record_id = %id, "Released held pay record");
        Ok(record)
    }

    /// Holds a pending record or releases a held one.
    ///
    /// The choice is made against the version read, so a concurrent change in
    /// between surfaces as `StaleRecord` rather than the opposite action.
    pub fn toggle_hold(&self, id: Uuid) -> EngineResult<PayRecord> {
        let current = self.store.get(id)?;
        let action = match current.status {
            PayRecordStatus::Held => TransitionAction::Unhold,
            PayRecordStatus::Pending | PayRecordStatus::Approved => TransitionAction::Hold,
        };
        let record = self
            .store
            .transition(id, Some(current.version), action, None)?;
        info!(record_id = %id, action = %action, "Toggled hold on pay record");
        Ok(record)
    }

    /// Approves every record that was pending when the call started.
    ///
    /// Records that changed after the snapshot (held, approved elsewhere, or
    /// otherwise modified) are counted as skipped.
    pub fn approve_all(&self, approved_by: &str) -> ApprovalSummary {
        let mut summary = ApprovalSummary::default();
        for (id, version) in self.store.pending_snapshot() {
            match self
                .store
                .transition(id, Some(version), TransitionAction::Approve, Some(approved_by))
            {
                Ok(_) => summary.approved += 1,
                Err(EngineError::StaleRecord { .. } | EngineError::InvalidTransition { .. }) => {
                    summary.skipped += 1;
                }
                Err(e) => {
                    warn!(record_id = %id, error = %e, "Bulk approval failed for record");
                    summary.failed += 1;
                }
            }
        }

        info!(
            approved = summary.approved,
            failed = summary.failed,
            skipped = summary.skipped,
            approved_by = %approved_by,
            "Bulk approval complete"
        );
        summary
    }
}

fn failure(job: &GenerationJob, code: &str, message: String) -> GenerationFailure {
    GenerationFailure {
        employee_id: job.employee_id.clone(),
        week_start: job.period.week_start,
        code: code.to_string(),
        message,
    }
}
