//! Transient alert holder
//!
//! Keeps a single current message. Setting replaces it, clearing empties it.

use super::{Severity, StatusSink};
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::Serialize;

/// Snapshot of the current alert
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Alert {
    pub message: String,
    pub severity: Severity,
    pub allow_rich_text: bool,
    /// When the message was last set or cleared
    pub updated_at: Option<DateTime<Utc>>,
}

impl Alert {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.message.is_empty()
    }
}

/// [`StatusSink`] that holds the latest alert in memory
#[derive(Debug, Default)]
pub struct AlertStatus {
    current: Mutex<Alert>,
}

impl AlertStatus {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of the current alert
    pub fn snapshot(&self) -> Alert {
        self.current.lock().clone()
    }

    /// Current message text (empty when nothing is shown)
    pub fn message(&self) -> String {
        self.current.lock().message.clone()
    }
}

impl StatusSink for AlertStatus {
    fn set(&self, message: &str, severity: Severity, allow_rich_text: bool) {
        let mut current = self.current.lock();
        current.message = message.to_string();
        current.severity = severity;
        current.allow_rich_text = allow_rich_text;
        current.updated_at = Some(Utc::now());

        match severity {
            Severity::Danger => tracing::error!(alert = message, "Alert set"),
            Severity::Warning => tracing::warn!(alert = message, "Alert set"),
            Severity::Info | Severity::Success => tracing::info!(alert = message, "Alert set"),
        }
    }

    fn clear(&self) {
        let mut current = self.current.lock();
        if !current.message.is_empty() {
            tracing::debug!(alert = %current.message, "Alert cleared");
        }
        current.message.clear();
        current.updated_at = Some(Utc::now());
    }

    fn clear_if_equal(&self, message: &str) {
        let mut current = self.current.lock();
        if current.message == message {
            tracing::debug!(alert = message, "Alert cleared");
            current.message.clear();
            current.updated_at = Some(Utc::now());
        }
    }
}
