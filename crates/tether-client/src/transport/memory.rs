//! In-memory transport
//!
//! Every `open` hands a [`MemoryPeer`] to whoever holds the receiving end, so
//! a test can play the server: accept, deliver frames, drop the link, and
//! inspect what the client wrote.

use super::{Connector, TransportCommand, TransportEvents, TransportHandle};
use std::collections::VecDeque;
use tokio::sync::mpsc;

/// Connector that produces scripted peers
#[derive(Debug, Clone)]
pub struct MemoryConnector {
    peers: mpsc::UnboundedSender<MemoryPeer>,
}

impl MemoryConnector {
    /// Create a connector and the stream of peers it will open
    #[must_use]
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<MemoryPeer>) {
        let (peers, rx) = mpsc::unbounded_channel();
        (Self { peers }, rx)
    }
}

impl Connector for MemoryConnector {
    fn open(&self, url: &str, events: TransportEvents) -> TransportHandle {
        let (tx, commands) = mpsc::unbounded_channel();
        let handle = TransportHandle::new(events.generation(), tx);

        let peer = MemoryPeer {
            url: url.to_string(),
            events,
            commands,
            frames: VecDeque::new(),
            closed: false,
        };
        if self.peers.send(peer).is_err() {
            tracing::debug!(url, "Memory peer receiver dropped");
        }

        handle
    }
}

/// Server side of one in-memory transport
#[derive(Debug)]
pub struct MemoryPeer {
    url: String,
    events: TransportEvents,
    commands: mpsc::UnboundedReceiver<TransportCommand>,
    frames: VecDeque<String>,
    closed: bool,
}

impl MemoryPeer {
    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn generation(&self) -> u64 {
        self.events.generation()
    }

    /// Complete the handshake
    pub fn accept(&self) {
        self.events.opened();
    }

    /// Push an inbound text frame to the client
    pub fn deliver(&self, text: impl Into<String>) {
        self.events.message(text);
    }

    /// Drop the link from the server side
    pub fn disconnect(&mut self) {
        self.closed = true;
        self.events.closed(Some("peer disconnected".to_string()));
    }

    /// Frames written by the client so far (drained)
    pub fn take_frames(&mut self) -> Vec<String> {
        self.pump();
        self.frames.drain(..).collect()
    }

    /// Whether the client has closed or discarded this transport
    pub fn is_closed(&mut self) -> bool {
        self.pump();
        self.closed
    }

    fn pump(&mut self) {
        loop {
            match self.commands.try_recv() {
                Ok(TransportCommand::Frame(frame)) => self.frames.push_back(frame),
                Ok(TransportCommand::Close) | Err(mpsc::error::TryRecvError::Disconnected) => {
                    self.closed = true;
                    break;
                }
                Err(mpsc::error::TryRecvError::Empty) => break,
            }
        }
    }
}
