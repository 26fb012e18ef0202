//! Link state

use serde::Serialize;
use std::fmt;

/// Transport-level state of a connection
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LinkState {
    /// No transport, or the last one went away
    #[default]
    Disconnected,
    /// Transport opened, handshake not finished
    Connecting,
    /// Transport ready for frames
    Open,
    /// A ping went unanswered; a fresh attempt follows immediately
    SuspectedDead,
    /// `close()` was called; nothing will reconnect
    Closed,
}

impl LinkState {
    #[must_use]
    pub fn is_open(&self) -> bool {
        matches!(self, Self::Open)
    }

    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Disconnected => "disconnected",
            Self::Connecting => "connecting",
            Self::Open => "open",
            Self::SuspectedDead => "suspected_dead",
            Self::Closed => "closed",
        }
    }
}

impl fmt::Display for LinkState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
