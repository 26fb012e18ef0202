//! Action handlers
//!
//! Routes inbound envelopes to the handler registered for their `action`.

mod error;

pub use error::{HandlerError, HandlerResult};

use crate::protocol::Envelope;
use std::collections::HashMap;
use std::fmt;

/// Handles every envelope carrying one action
pub trait ActionHandler: Send + Sync {
    fn handle(&self, envelope: &Envelope) -> HandlerResult<()>;
}

impl<F> ActionHandler for F
where
    F: Fn(&Envelope) -> HandlerResult<()> + Send + Sync,
{
    fn handle(&self, envelope: &Envelope) -> HandlerResult<()> {
        self(envelope)
    }
}

/// Explicit action → handler mapping, filled in before the connection starts
#[derive(Default)]
pub struct HandlerRegistry {
    handlers: HashMap<String, Box<dyn ActionHandler>>,
}

impl HandlerRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a closure for an action, builder style
    #[must_use]
    pub fn on<F>(mut self, action: impl Into<String>, handler: F) -> Self
    where
        F: Fn(&Envelope) -> HandlerResult<()> + Send + Sync + 'static,
    {
        self.register(action, handler);
        self
    }

    /// Register a handler, returning the one it replaced
    pub fn register<H>(
        &mut self,
        action: impl Into<String>,
        handler: H,
    ) -> Option<Box<dyn ActionHandler>>
    where
        H: ActionHandler + 'static,
    {
        self.handlers.insert(action.into(), Box::new(handler))
    }

    pub fn contains(&self, action: &str) -> bool {
        self.handlers.contains_key(action)
    }

    /// Registered action names, sorted
    pub fn actions(&self) -> Vec<&str> {
        let mut actions: Vec<&str> = self.handlers.keys().map(String::as_str).collect();
        actions.sort_unstable();
        actions
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    /// Invoke the handler for the envelope's action
    pub fn dispatch(&self, envelope: &Envelope) -> HandlerResult<()> {
        let handler = self
            .handlers
            .get(&envelope.action)
            .ok_or_else(|| HandlerError::UnknownAction(envelope.action.clone()))?;

        tracing::trace!(action = %envelope.action, "Dispatching envelope");
        handler.handle(envelope)
    }
}

impl fmt::Debug for HandlerRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HandlerRegistry")
            .field("actions", &self.actions())
            .finish()
    }
}
