//! Connection observer
//!
//! What the connection reports to: handlers for inbound actions and a status sink.

use crate::handlers::HandlerRegistry;
use crate::status::StatusSink;
use std::sync::Arc;

/// Caller-supplied collaborator of a [`LiveConnection`](crate::LiveConnection)
pub struct Observer {
    handlers: HandlerRegistry,
    status: Arc<dyn StatusSink>,
}

impl Observer {
    pub fn new(handlers: HandlerRegistry, status: Arc<dyn StatusSink>) -> Self {
        Self { handlers, status }
    }

    pub fn handlers(&self) -> &HandlerRegistry {
        &self.handlers
    }

    pub fn status(&self) -> &dyn StatusSink {
        self.status.as_ref()
    }
}

impl std::fmt::Debug for Observer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Observer")
            .field("handlers", &self.handlers)
            .field("status", &"StatusSink")
            .finish()
    }
}
