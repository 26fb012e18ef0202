//! Endpoint resolution
//!
//! Builds the WebSocket URL from explicit host, port, security flag and path.

use std::fmt;
use tether_common::EndpointConfig;
use thiserror::Error;

/// Endpoint errors
#[derive(Debug, Error, PartialEq, Eq)]
pub enum EndpointError {
    #[error("Endpoint host is empty")]
    EmptyHost,

    #[error("Invalid endpoint path: {0:?}")]
    InvalidPath(String),
}

/// Target of a persistent connection
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    host: String,
    port: u16,
    secure: bool,
    path: String,
}

impl Endpoint {
    /// Create an endpoint. `secure` selects `wss`, otherwise `ws`.
    ///
    /// A path without a leading `/` gets one.
    pub fn new(
        host: impl Into<String>,
        port: u16,
        secure: bool,
        path: &str,
    ) -> Result<Self, EndpointError> {
        let host = host.into();
        if host.trim().is_empty() {
            return Err(EndpointError::EmptyHost);
        }
        if path.chars().any(|c| c.is_whitespace() || c == '#') {
            return Err(EndpointError::InvalidPath(path.to_string()));
        }

        let path = if path.starts_with('/') {
            path.to_string()
        } else {
            format!("/{path}")
        };

        Ok(Self {
            host,
            port,
            secure,
            path,
        })
    }

    /// Build an endpoint from loaded configuration
    pub fn from_config(config: &EndpointConfig) -> Result<Self, EndpointError> {
        Self::new(config.host.clone(), config.port, config.secure, &config.path)
    }

    #[must_use]
    pub fn scheme(&self) -> &'static str {
        if self.secure {
            "wss"
        } else {
            "ws"
        }
    }

    #[must_use]
    pub fn host(&self) -> &str {
        &self.host
    }

    #[must_use]
    pub fn port(&self) -> u16 {
        self.port
    }

    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Fully resolved URL: `{ws|wss}://{host}:{port}{path}`
    #[must_use]
    pub fn url(&self) -> String {
        format!("{}://{}:{}{}", self.scheme(), self.host, self.port, self.path)
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.url())
    }
}
