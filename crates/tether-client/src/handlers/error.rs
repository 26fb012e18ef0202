//! Handler error types

use crate::protocol::EnvelopeError;
use std::fmt;
use thiserror::Error;

/// Handler error type
#[derive(Debug, Error)]
pub enum HandlerError {
    /// No handler registered for the action
    #[error("No handler registered for action {0:?}")]
    UnknownAction(String),

    /// Envelope fields did not match what the handler expects
    #[error("Invalid payload: {0}")]
    InvalidPayload(#[from] EnvelopeError),

    /// Handler ran and reported a failure
    #[error("{0}")]
    Failed(String),
}

impl HandlerError {
    /// Create a failure from any displayable error
    #[must_use]
    pub fn failed(err: impl fmt::Display) -> Self {
        Self::Failed(err.to_string())
    }
}

/// Handler result type
pub type HandlerResult<T> = Result<T, HandlerError>;
