//! Message envelope
//!
//! Every structured message is a JSON object with an `action` discriminator.
//! All other fields are opaque here and travel untouched to the handler.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

/// Envelope parsing errors
#[derive(Debug, Error)]
pub enum EnvelopeError {
    #[error("Invalid JSON: {0}")]
    InvalidJson(#[source] serde_json::Error),

    #[error("Expected a JSON object, got {0}")]
    NotAnObject(&'static str),

    #[error("Missing string field `action`")]
    MissingAction,

    #[error("Failed to decode envelope: {0}")]
    Decode(#[source] serde_json::Error),

    #[error("Failed to encode payload: {0}")]
    Encode(#[source] serde_json::Error),
}

/// A structured message routed by its `action`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    pub action: String,

    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl Envelope {
    #[must_use]
    pub fn new(action: impl Into<String>) -> Self {
        Self {
            action: action.into(),
            fields: Map::new(),
        }
    }

    /// Add a field, builder style
    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.insert(key.into(), value.into());
        self
    }

    /// Look up an additional field
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    /// Parse an envelope from raw text
    pub fn from_json(raw: &str) -> Result<Self, EnvelopeError> {
        let value: Value = serde_json::from_str(raw).map_err(EnvelopeError::InvalidJson)?;
        Self::from_value(value)
    }

    /// Build an envelope from an already parsed JSON value
    pub fn from_value(value: Value) -> Result<Self, EnvelopeError> {
        let mut fields = match value {
            Value::Object(map) => map,
            Value::Null => return Err(EnvelopeError::NotAnObject("null")),
            Value::Bool(_) => return Err(EnvelopeError::NotAnObject("a boolean")),
            Value::Number(_) => return Err(EnvelopeError::NotAnObject("a number")),
            Value::String(_) => return Err(EnvelopeError::NotAnObject("a string")),
            Value::Array(_) => return Err(EnvelopeError::NotAnObject("an array")),
        };

        match fields.remove("action") {
            Some(Value::String(action)) => Ok(Self { action, fields }),
            _ => Err(EnvelopeError::MissingAction),
        }
    }

    /// Decode the whole envelope (action included) into a typed message
    pub fn decode<T: DeserializeOwned>(&self) -> Result<T, EnvelopeError> {
        let value = Value::Object(self.to_map());
        serde_json::from_value(value).map_err(EnvelopeError::Decode)
    }

    /// Serialize to JSON text
    #[must_use]
    pub fn to_json(&self) -> String {
        Value::Object(self.to_map()).to_string()
    }

    fn to_map(&self) -> Map<String, Value> {
        let mut map = self.fields.clone();
        map.insert("action".to_string(), Value::String(self.action.clone()));
        map
    }
}

impl std::fmt::Display for Envelope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Envelope(action={}, fields={})", self.action, self.fields.len())
    }
}
