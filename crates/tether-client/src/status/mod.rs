//! Status reporting
//!
//! The connection surfaces connectivity problems only through a [`StatusSink`].

mod alert;
mod severity;
mod sink;

pub use alert::{Alert, AlertStatus};
pub use severity::Severity;
pub use sink::StatusSink;

/// Shown while a connection attempt has not been confirmed open
pub const CONNECTING_MESSAGE: &str = "Connecting to the websocket...";

/// Shown when a ping went unanswered
pub const LOST_MESSAGE: &str = "Lost connection to the websocket...";
