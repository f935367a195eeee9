//! Shared application state for the webhook gateway

use crate::config::GatewayConfig;
use crate::error::GatewayResult;
use crate::services::Dispatcher;
use std::sync::Arc;

/// Shared application state passed to all handlers
#[derive(Debug, Clone)]
pub struct AppState {
    /// Gateway configuration
    pub config: Arc<GatewayConfig>,
    /// Dispatcher that answers webhook calls
    pub dispatcher: Arc<Dispatcher>,
}

impl AppState {
    /// Create a new AppState with the given configuration
    pub fn new(config: GatewayConfig) -> GatewayResult<Self> {
        let config = Arc::new(config);
        let dispatcher = Dispatcher::new(Arc::clone(&config))?;
        Ok(Self {
            config,
            dispatcher: Arc::new(dispatcher),
        })
    }

    /// Get a reference to the configuration
    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }
}
