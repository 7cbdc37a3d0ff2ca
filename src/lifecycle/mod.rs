//! Pay record lifecycle.
//!
//! Weekly pay records are generated from completed attendance as `pending`,
//! may be `held` and released, and are finally `approved`. Approval is
//! terminal and a held record must be released before it can be approved.

mod manager;
mod store;

pub use manager::PayrollLifecycle;
pub use store::PayRecordStore;
