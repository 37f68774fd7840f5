//! Application state

use std::sync::Arc;

use crate::config::ServiceConfig;
use crate::error::ProcessError;
use crate::orchestrator::Orchestrator;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<ServiceConfig>,
    pub orchestrator: Arc<Orchestrator>,
}

impl AppState {
    pub fn new(config: ServiceConfig) -> Result<Self, ProcessError> {
        let orchestrator = Orchestrator::from_config(&config)?;
        Ok(Self::with_orchestrator(config, orchestrator))
    }

    pub fn with_orchestrator(config: ServiceConfig, orchestrator: Orchestrator) -> Self {
        Self {
            config: Arc::new(config),
            orchestrator: Arc::new(orchestrator),
        }
    }
}
