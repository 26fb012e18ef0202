//! Wire protocol
//!
//! Liveness sentinels plus the JSON envelope that carries everything else.

mod envelope;
mod payload;

pub use envelope::{Envelope, EnvelopeError};
pub use payload::Payload;

/// Liveness ping sent by the client
pub const PING: &str = "__ping";

/// Reply to [`PING`], recognized before any JSON parsing
pub const PONG: &str = "__pong";
