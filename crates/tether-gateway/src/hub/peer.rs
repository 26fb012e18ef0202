//! One connected socket

use std::time::{Duration, Instant};
use tokio::sync::mpsc;

/// A connected socket, addressed by its sequential handle
pub struct Peer {
    /// Handle id, unique for the hub's lifetime
    handle: u64,

    /// Channel to the socket's writer task
    sender: mpsc::Sender<String>,

    /// Connection creation time
    connected_at: Instant,
}

impl Peer {
    pub fn new(handle: u64, sender: mpsc::Sender<String>) -> Self {
        Self {
            handle,
            sender,
            connected_at: Instant::now(),
        }
    }

    pub fn handle(&self) -> u64 {
        self.handle
    }

    /// Queue a text frame, waiting if the writer is behind
    pub async fn send(&self, text: String) -> Result<(), mpsc::error::SendError<String>> {
        self.sender.send(text).await
    }

    /// Queue a text frame without waiting
    pub fn try_send(&self, text: String) -> Result<(), mpsc::error::TrySendError<String>> {
        self.sender.try_send(text)
    }

    pub fn is_closed(&self) -> bool {
        self.sender.is_closed()
    }

    pub fn age(&self) -> Duration {
        self.connected_at.elapsed()
    }
}

impl std::fmt::Debug for Peer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Peer")
            .field("handle", &self.handle)
            .field("connected_at", &self.connected_at)
            .finish()
    }
}
