//! Gateway state
//!
//! Application state shared by every socket task.

use crate::hub::SocketHub;
use std::sync::Arc;
use tether_common::AppConfig;

/// Gateway application state
#[derive(Clone)]
pub struct GatewayState {
    /// Registry of connected sockets
    hub: Arc<SocketHub>,
    /// Application configuration
    config: Arc<AppConfig>,
}

impl GatewayState {
    pub fn new(config: AppConfig) -> Self {
        Self::with_hub(SocketHub::new_shared(), config)
    }

    /// Build state around an existing hub, so callers can observe it
    pub fn with_hub(hub: Arc<SocketHub>, config: AppConfig) -> Self {
        Self {
            hub,
            config: Arc::new(config),
        }
    }

    pub fn hub(&self) -> &Arc<SocketHub> {
        &self.hub
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }
}

impl std::fmt::Debug for GatewayState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GatewayState")
            .field("hub", &self.hub)
            .field("config", &"AppConfig")
            .finish()
    }
}
