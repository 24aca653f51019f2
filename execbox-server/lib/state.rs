//! Application state shared by every request.

use std::sync::Arc;

use execbox_core::{registry::LanguageRegistry, sandbox::Orchestrator};
use getset::Getters;
use tokio::sync::Semaphore;

use crate::config::Config;

//--------------------------------------------------------------------------------------------------
// Types
//--------------------------------------------------------------------------------------------------

/// Application state structure
#[derive(Clone, Getters)]
#[getset(get = "pub with_prefix")]
pub struct AppState {
    /// The application configuration
    config: Arc<Config>,

    /// Languages the server can run
    registry: Arc<LanguageRegistry>,

    /// Provisions and tears down execution units
    orchestrator: Orchestrator,

    /// Caps the number of units alive at once
    permits: Arc<Semaphore>,
}

//--------------------------------------------------------------------------------------------------
// Methods
//--------------------------------------------------------------------------------------------------

impl AppState {
    /// Create a new application state instance
    pub fn new(
        config: Arc<Config>,
        registry: Arc<LanguageRegistry>,
        orchestrator: Orchestrator,
    ) -> Self {
        let permits = Arc::new(Semaphore::new(*config.get_max_concurrent()));

        Self {
            config,
            registry,
            orchestrator,
            permits,
        }
    }
}
