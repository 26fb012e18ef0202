//! Application error types
//!
//! Unified error handling for the binaries and anything that crosses crate boundaries.

use crate::config::ConfigError;

/// Application-wide error type
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    // Configuration errors
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("Invalid endpoint: {0}")]
    Endpoint(String),

    // Network errors
    #[error("Failed to bind {addr}: {reason}")]
    Bind { addr: String, reason: String },

    #[error("Transport error: {0}")]
    Transport(String),
}

impl AppError {
    /// Get error code for structured logs
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Config(_) => "CONFIG_ERROR",
            Self::Endpoint(_) => "INVALID_ENDPOINT",
            Self::Bind { .. } => "BIND_FAILED",
            Self::Transport(_) => "TRANSPORT_ERROR",
        }
    }

    /// Whether retrying the same operation later can succeed
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Transport(_) | Self::Bind { .. })
    }
}

/// Result type alias for application operations
pub type AppResult<T> = Result<T, AppError>;
