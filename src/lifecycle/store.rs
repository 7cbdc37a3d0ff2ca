//! Pay record storage.
//!
//! Records are unique per `(employee_id, week_start, week_end)`; the uniqueness
//! index is the serialization point for concurrent generation of the same week.
//! State changes are compare-and-set on the record's `version`.

use std::cmp::Reverse;
use std::collections::HashMap;
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use chrono::{NaiveDate, Utc};
use uuid::Uuid;

use crate::error::{EngineError, EngineResult};
use crate::models::{PayRecord, PayRecordStatus, TransitionAction};

type PeriodKey = (String, NaiveDate, NaiveDate);

#[derive(Debug, Default)]
struct StoreState {
    records: HashMap<Uuid, PayRecord>,
    by_period: HashMap<PeriodKey, Uuid>,
}

/// Returns the status an action moves a record to, if the move is allowed.
///
/// `held → approved` is not a transition; a held record must be unheld first.
fn next_status(status: PayRecordStatus, action: TransitionAction) -> Option<PayRecordStatus> {
    match (status, action) {
        (PayRecordStatus::Pending, TransitionAction::Approve) => Some(PayRecordStatus::Approved),
        (PayRecordStatus::Pending, TransitionAction::Hold) => Some(PayRecordStatus::Held),
        (PayRecordStatus::Held, TransitionAction::Unhold) => Some(PayRecordStatus::Pending),
        _ => None,
    }
}

/// Thread-safe store of pay records.
#[derive(Debug, Default)]
pub struct PayRecordStore {
    state: RwLock<StoreState>,
}

impl PayRecordStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> RwLockReadGuard<'_, StoreState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, StoreState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Inserts a new record.
    ///
    /// Fails with `DuplicatePeriod` when the employee already has a record for
    /// the same week; the existing record is untouched.
    pub fn insert(&self, record: PayRecord) -> EngineResult<PayRecord> {
        let mut state = self.write();
        let key = record.period_key();
        if state.by_period.contains_key(&key) {
            return Err(EngineError::DuplicatePeriod {
                employee_id: record.user_id,
                week_start: record.week_start,
                week_end: record.week_end,
            });
        }
        state.by_period.insert(key, record.id);
        state.records.insert(record.id, record.clone());
        Ok(record)
    }

    /// Returns a record by id.
    pub fn get(&self, id: Uuid) -> EngineResult<PayRecord> {
        self.read()
            .records
            .get(&id)
            .cloned()
            .ok_or(EngineError::PayRecordNotFound { id })
    }

    /// Returns true when a record exists for the employee and week.
    pub fn exists(&self, employee_id: &str, week_start: NaiveDate, week_end: NaiveDate) -> bool {
        self.read()
            .by_period
            .contains_key(&(employee_id.to_string(), week_start, week_end))
    }

    /// Applies a lifecycle action to a record.
    ///
    /// When `expected_version` is given, the action only applies if the record
    /// has not changed since that version was read. Approval stamps
    /// `approved_by` and `approved_at`. Every applied action bumps `version`.
    ///
    /// # Errors
    ///
    /// - `PayRecordNotFound` for an unknown id
    /// - `StaleRecord` when the version no longer matches
    /// - `InvalidTransition` when the action is not allowed from the current
    ///   status; the record is left unchanged
    pub fn transition(
        &self,
        id: Uuid,
        expected_version: Option<u64>,
        action: TransitionAction,
        actor: Option<&str>,
    ) -> EngineResult<PayRecord> {
        let mut state = self.write();
        let record = state
            .records
            .get_mut(&id)
            .ok_or(EngineError::PayRecordNotFound { id })?;

        if let Some(expected) = expected_version.filter(|v| *v != record.version) {
            return Err(EngineError::StaleRecord {
                record_id: id,
                expected,
                found: record.version,
            });
        }

        let status = next_status(record.status, action).ok_or(EngineError::InvalidTransition {
            record_id: id,
            status: record.status,
            action,
        })?;

        record.status = status;
        record.version += 1;
        if action == TransitionAction::Approve {
            record.approved_by = actor.map(str::to_string);
            record.approved_at = Some(Utc::now());
        }
        Ok(record.clone())
    }

    /// Snapshot of `(id, version)` for every pending record.
    pub fn pending_snapshot(&self) -> Vec<(Uuid, u64)> {
        let state = self.read();
        let mut pending: Vec<&PayRecord> = state
            .records
            .values()
            .filter(|r| r.status == PayRecordStatus::Pending)
            .collect();
        pending.sort_by_key(|r| (r.week_start, r.user_id.clone(), r.id));
        pending.into_iter().map(|r| (r.id, r.version)).collect()
    }

    /// Pending and held records: pending first, newest week first, then oldest
    /// record first.
    pub fn list_pending(&self) -> Vec<PayRecord> {
        let mut records: Vec<PayRecord> = self
            .read()
            .records
            .values()
            .filter(|r| r.status != PayRecordStatus::Approved)
            .cloned()
            .collect();
        records.sort_by_key(|r| (r.status, Reverse(r.week_end), r.created_at, r.id));
        records
    }

    /// Approved records, newest week first.
    pub fn list_approved(&self) -> Vec<PayRecord> {
        self.approved_where(|_| true)
    }

    /// Approved records for one employee, newest week first.
    pub fn list_employee_history(&self, employee_id: &str) -> Vec<PayRecord> {
        self.approved_where(|r| r.user_id == employee_id)
    }

    fn approved_where(&self, include: impl Fn(&PayRecord) -> bool) -> Vec<PayRecord> {
        let mut records: Vec<PayRecord> = self
            .read()
            .records
            .values()
            .filter(|r| r.status == PayRecordStatus::Approved && include(r))
            .cloned()
            .collect();
        records.sort_by_key(|r| (Reverse(r.week_end), r.created_at, r.id));
        records
    }

    /// Number of stored records.
    pub fn len(&self) -> usize {
        self.read().records.len()
    }

    /// Returns true when the store holds no records.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AuditTrace, PayRecordDraft};
    use rust_decimal::Decimal;
    use std::sync::Barrier;

    fn make_date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn make_record(employee_id: &str, week_start: &str) -> PayRecord {
        let start = make_date(week_start);
        PayRecord::from_draft(PayRecordDraft {
            employee_id: employee_id.to_string(),
            week_start: start,
            week_end: start + chrono::Days::new(6),
            hours_worked: Decimal::new(40, 0),
            regular_hours: Decimal::new(40, 0),
            overtime_hours: Decimal::ZERO,
            pay_rate: Decimal::new(20, 0),
            gross_amount: Decimal::new(800, 0),
            adjustments: vec![],
            amount: Decimal::new(800, 0),
            negative_net_clamped: false,
            audit_trace: AuditTrace::default(),
        })
    }

    #[test]
    fn test_duplicate_period_rejected() {
        let store = PayRecordStore::new();
        store.insert(make_record("emp_001", "2025-09-15")).unwrap();

        let result = store.insert(make_record("emp_001", "2025-09-15"));
        assert!(matches!(result, Err(EngineError::DuplicatePeriod { .. })));
        assert_eq!(store.len(), 1);
        assert!(store.exists("emp_001", make_date("2025-09-15"), make_date("2025-09-21")));
    }

    #[test]
    fn test_approve_stamps_actor_and_bumps_version() {
        let store = PayRecordStore::new();
        let record = store.insert(make_record("emp_001", "2025-09-15")).unwrap();

        let approved = store
            .transition(record.id, None, TransitionAction::Approve, Some("admin"))
            .unwrap();

        assert_eq!(approved.status, PayRecordStatus::Approved);
        assert_eq!(approved.approved_by.as_deref(), Some("admin"));
        assert!(approved.approved_at.is_some());
        assert_eq!(approved.version, 2);
    }

    #[test]
    fn test_held_record_cannot_be_approved() {
        let store = PayRecordStore::new();
        let record = store.insert(make_record("emp_001", "2025-09-15")).unwrap();
        store
            .transition(record.id, None, TransitionAction::Hold, None)
            .unwrap();

        let result = store.transition(record.id, None, TransitionAction::Approve, Some("admin"));
        match result {
            Err(EngineError::InvalidTransition { status, action, .. }) => {
                assert_eq!(status, PayRecordStatus::Held);
                assert_eq!(action, TransitionAction::Approve);
            }
            other => panic!("Expected invalid transition, got {:?}", other),
        }
        assert_eq!(store.get(record.id).unwrap().status, PayRecordStatus::Held);
    }

    #[test]
    fn test_transition_table() {
        use PayRecordStatus::*;
        use TransitionAction::*;

        assert_eq!(next_status(Pending, Approve), Some(Approved));
        assert_eq!(next_status(Pending, Hold), Some(Held));
        assert_eq!(next_status(Held, Unhold), Some(Pending));
        assert_eq!(next_status(Held, Approve), None);
        assert_eq!(next_status(Held, Hold), None);
        assert_eq!(next_status(Pending, Unhold), None);
        assert_eq!(next_status(Approved, Approve), None);
        assert_eq!(next_status(Approved, Hold), None);
        assert_eq!(next_status(Approved, Unhold), None);
    }

    #[test]
    fn test_stale_version_rejected() {
        let store = PayRecordStore::new();
        let record = store.insert(make_record("emp_001", "2025-09-15")).unwrap();
        store
            .transition(record.id, Some(1), TransitionAction::Hold, None)
            .unwrap();

        let result = store.transition(record.id, Some(1), TransitionAction::Unhold, None);
        assert!(matches!(
            result,
            Err(EngineError::StaleRecord { expected: 1, found: 2, .. })
        ));
    }

    #[test]
    fn test_unknown_record_not_found() {
        let store = PayRecordStore::new();
        let result = store.transition(Uuid::new_v4(), None, TransitionAction::Approve, None);
        assert!(matches!(result, Err(EngineError::PayRecordNotFound { .. })));
    }

    #[test]
    fn test_listing_order() {
        let store = PayRecordStore::new();
        let older = store.insert(make_record("emp_001", "2025-09-08")).unwrap();
        let newer = store.insert(make_record("emp_001", "2025-09-15")).unwrap();
        let held = store.insert(make_record("emp_002", "2025-09-22")).unwrap();
        store
            .transition(held.id, None, TransitionAction::Hold, None)
            .unwrap();

        let pending: Vec<Uuid> = store.list_pending().iter().map(|r| r.id).collect();
        assert_eq!(pending, vec![newer.id, older.id, held.id]);

        store
            .transition(older.id, None, TransitionAction::Approve, None)
            .unwrap();
        store
            .transition(newer.id, None, TransitionAction::Approve, None)
            .unwrap();
        let approved: Vec<Uuid> = store.list_approved().iter().map(|r| r.id).collect();
        assert_eq!(approved, vec![newer.id, older.id]);
        assert!(store.list_employee_history("emp_002").is_empty());
        assert_eq!(store.list_employee_history("emp_001").len(), 2);
    }

    #[test]
    fn test_pending_snapshot_excludes_held() {
        let store = PayRecordStore::new();
        let pending = store.insert(make_record("emp_001", "2025-09-15")).unwrap();
        let held = store.insert(make_record("emp_002", "2025-09-15")).unwrap();
        store
            .transition(held.id, None, TransitionAction::Hold, None)
            .unwrap();

        assert_eq!(store.pending_snapshot(), vec![(pending.id, 1)]);
    }

    #[test]
    fn test_concurrent_approve_and_hold_have_one_winner() {
        for _ in 0..50 {
            let store = PayRecordStore::new();
            let record = store.insert(make_record("emp_001", "2025-09-15")).unwrap();
            let barrier = Barrier::new(2);

            let (approve, hold) = std::thread::scope(|scope| {
                let approve = scope.spawn(|| {
                    barrier.wait();
                    store.transition(record.id, None, TransitionAction::Approve, Some("admin"))
                });
                let hold = scope.spawn(|| {
                    barrier.wait();
                    store.transition(record.id, None, TransitionAction::Hold, None)
                });
                (approve.join().unwrap(), hold.join().unwrap())
            });

            let stored = store.get(record.id).unwrap();
            assert_eq!(stored.version, 2);
            match (approve, hold) {
                (Ok(_), Err(EngineError::InvalidTransition { .. })) => {
                    assert_eq!(stored.status, PayRecordStatus::Approved);
                    assert_eq!(stored.approved_by.as_deref(), Some("admin"));
                }
                (Err(EngineError::InvalidTransition { .. }), Ok(_)) => {
                    assert_eq!(stored.status, PayRecordStatus::Held);
                    assert!(stored.approved_by.is_none());
                }
                other => panic!("Expected exactly one winner, got {:?}", other),
            }
        }
    }

    #[test]
    fn test_hold_after_snapshot_makes_bulk_approval_stale() {
        let store = PayRecordStore::new();
        let record = store.insert(make_record("emp_001", "2025-09-15")).unwrap();
        let snapshot = store.pending_snapshot();

        store
            .transition(record.id, None, TransitionAction::Hold, None)
            .unwrap();

        let (id, version) = snapshot[0];
        let result = store.transition(id, Some(version), TransitionAction::Approve, Some("admin"));
        assert!(matches!(result, Err(EngineError::StaleRecord { .. })));
        assert_eq!(store.get(record.id).unwrap().status, PayRecordStatus::Held);
    }
}
