//! Application state for the payroll engine API.

use std::sync::Arc;

use crate::config::ConfigLoader;
use crate::error::EngineResult;
use crate::service::PayrollService;
use crate::workforce::InMemoryWorkforce;

/// Shared application state.
///
/// Holds the payroll service and the in-memory workforce that feeds it
/// attendance and employee metadata.
#[derive(Clone)]
pub struct AppState {
    service: Arc<PayrollService>,
    workforce: Arc<InMemoryWorkforce>,
}

impl AppState {
    /// Builds the state from loaded configuration, seeding the catalog.
    pub fn new(config: &ConfigLoader) -> EngineResult<Self> {
        let workforce = Arc::new(InMemoryWorkforce::new());
        let service = PayrollService::new(config, workforce.clone(), workforce.clone())?;
        Ok(Self {
            service: Arc::new(service),
            workforce,
        })
    }

    /// Returns the payroll service.
    pub fn service(&self) -> &Arc<PayrollService> {
        &self.service
    }

    /// Returns the workforce backing attendance and employee lookups.
    pub fn workforce(&self) -> &InMemoryWorkforce {
        &self.workforce
    }
}
