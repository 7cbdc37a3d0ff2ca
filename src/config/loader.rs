//! Configuration loading functionality.
//!
//! This module provides the [`ConfigLoader`] type for loading payroll
//! configuration from YAML files.

use std::fs;
use std::path::Path;

use tracing::debug;

use crate::error::{EngineError, EngineResult};
use crate::models::NewAdjustmentType;

use super::types::{PayrollPolicy, SeedCatalog};

/// Loads and provides access to payroll configuration.
///
/// # Directory Structure
///
/// ```text
/// config/payroll/
/// ├── policy.yaml       # Overtime and validation policy (required)
/// └── adjustments.yaml  # Seed adjustment types (optional)
/// ```
///
/// # Example
///
/// ```no_run
/// use payroll_engine::config::ConfigLoader;
///
/// let loader = ConfigLoader::load("./config/payroll").unwrap();
/// println!("Overtime multiplier: {}", loader.policy().overtime_multiplier);
/// ```
#[derive(Debug, Clone, Default)]
pub struct ConfigLoader {
    policy: PayrollPolicy,
    seed_types: Vec<NewAdjustmentType>,
}

impl ConfigLoader {
    /// Loads configuration from the specified directory.
    ///
    /// Returns an error if `policy.yaml` is missing, if any file contains
    /// invalid YAML, or if the policy values are out of range.
    pub fn load<P: AsRef<Path>>(path: P) -> EngineResult<Self> {
        let path = path.as_ref();

        let policy_path = path.join("policy.yaml");
        let policy = Self::load_yaml::<PayrollPolicy>(&policy_path)?;
        if let Some(problem) = policy.problems() {
            return Err(EngineError::ConfigParseError {
                path: policy_path.display().to_string(),
                message: problem,
            });
        }

        let seed_path = path.join("adjustments.yaml");
        let seed = if seed_path.exists() {
            Self::load_yaml::<SeedCatalog>(&seed_path)?
        } else {
            SeedCatalog::default()
        };

        debug!(
            path = %path.display(),
            seed_types = seed.adjustment_types.len(),
            "Loaded payroll configuration"
        );

        Ok(Self {
            policy,
            seed_types: seed.adjustment_types,
        })
    }

    /// Builds a loader from an in-memory policy with no seed types.
    pub fn from_policy(policy: PayrollPolicy) -> Self {
        Self {
            policy,
            seed_types: Vec::new(),
        }
    }

    /// Loads and parses a YAML file.
    fn load_yaml<T: serde::de::DeserializeOwned>(path: &Path) -> EngineResult<T> {
        let path_str = path.display().to_string();

        let content = fs::read_to_string(path).map_err(|_| EngineError::ConfigNotFound {
            path: path_str.clone(),
        })?;

        serde_yaml::from_str(&content).map_err(|e| EngineError::ConfigParseError {
            path: path_str,
            message: e.to_string(),
        })
    }

    /// Returns the payroll policy.
    pub fn policy(&self) -> &PayrollPolicy {
        &self.policy
    }

    /// Returns the adjustment types to seed the catalog with.
    pub fn seed_types(&self) -> &[NewAdjustmentType] {
        &self.seed_types
    }
}
