//! The adjustment catalog.
//!
//! Stores adjustment type definitions (global rules) and per-employee
//! assignments (overrides), validating every write before it is stored.

mod store;
mod validation;

pub use store::{AdjustmentCatalog, CatalogSnapshot};
