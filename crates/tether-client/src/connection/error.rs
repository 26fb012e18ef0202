//! Client error types

use thiserror::Error;

/// Errors returned to callers of [`LiveConnection`](super::LiveConnection)
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ClientError {
    /// The connection was closed and its driver has stopped
    #[error("Connection is closed")]
    Closed,
}
