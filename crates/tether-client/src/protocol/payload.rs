//! Outbound payloads

use super::{Envelope, EnvelopeError};
use serde::Serialize;
use serde_json::Value;

/// Something to write to the socket
///
/// Structured values are serialized to JSON text; strings and primitives go
/// out verbatim.
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    Text(String),
    Json(Value),
}

impl Payload {
    /// Serialize any value into a structured payload
    pub fn json<T: Serialize>(value: &T) -> Result<Self, EnvelopeError> {
        serde_json::to_value(value)
            .map(Self::Json)
            .map_err(EnvelopeError::Encode)
    }

    /// The exact text frame written to the wire
    #[must_use]
    pub fn into_frame(self) -> String {
        match self {
            Self::Text(text) | Self::Json(Value::String(text)) => text,
            Self::Json(value) => value.to_string(),
        }
    }
}

impl From<String> for Payload {
    fn from(text: String) -> Self {
        Self::Text(text)
    }
}

impl From<&str> for Payload {
    fn from(text: &str) -> Self {
        Self::Text(text.to_string())
    }
}

impl From<Value> for Payload {
    fn from(value: Value) -> Self {
        Self::Json(value)
    }
}

impl From<Envelope> for Payload {
    fn from(envelope: Envelope) -> Self {
        Self::Text(envelope.to_json())
    }
}
