//! Payroll adjustment resolution and pay record lifecycle engine.
//!
//! This crate resolves which deductions and additions apply to an employee's
//! pay period, computes gross and net pay with a full audit trace, and
//! manages generated pay records through review, hold and approval.

#![warn(missing_docs)]

pub mod api;
pub mod calculation;
pub mod catalog;
pub mod config;
pub mod error;
pub mod lifecycle;
pub mod models;
pub mod service;
pub mod workforce;
