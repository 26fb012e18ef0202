//! Status sink contract

use super::Severity;
use std::fmt;

/// Observer-side surface for transient connectivity messages
///
/// Implementations are called from the connection driver task and must not
/// block.
pub trait StatusSink: Send + Sync {
    /// Replace the current message
    fn set(&self, message: &str, severity: Severity, allow_rich_text: bool);

    /// Remove the current message
    fn clear(&self);

    /// Remove the current message only if it is exactly `message`
    fn clear_if_equal(&self, message: &str);

    /// Report a failure as `"{base}: {error}"`
    fn log_error(&self, base: &str, error: &dyn fmt::Display, severity: Severity) {
        self.set(&format!("{base}: {error}"), severity, false);
    }
}
