//! Configuration loading and management for the payroll engine.
//!
//! This module loads the payroll policy (overtime multiplier and thresholds,
//! validation bounds, generation chunking) and the optional seed adjustment
//! catalog from YAML files.
//!
//! # Example
//!
//! ```no_run
//! use payroll_engine::config::ConfigLoader;
//!
//! let config = ConfigLoader::load("./config/payroll").unwrap();
//! println!("Max percent: {}", config.policy().max_percent_rate);
//! ```

mod loader;
mod types;

pub use loader::ConfigLoader;
pub use types::{PayrollPolicy, SeedCatalog};
