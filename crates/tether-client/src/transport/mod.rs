//! Transport layer
//!
//! A [`Connector`] opens one duplex text transport per connection attempt.
//! Opening never blocks: the transport reports `Opened`, `Message` and
//! `Closed` events back to the driver, tagged with the attempt generation.

#[cfg(any(test, feature = "testing"))]
pub mod memory;
mod websocket;

#[cfg(any(test, feature = "testing"))]
pub use memory::{MemoryConnector, MemoryPeer};
pub use websocket::WebSocketConnector;

use thiserror::Error;
use tokio::sync::mpsc;

/// Transport errors
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TransportError {
    #[error("Transport is closed")]
    Closed,
}

/// Instruction from the driver to a transport task
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportCommand {
    /// Write one text frame
    Frame(String),
    /// Close the transport and stop
    Close,
}

/// What happened on a transport
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportEventKind {
    Opened,
    Message(String),
    Closed { reason: Option<String> },
}

/// Transport event tagged with the attempt that produced it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportEvent {
    pub generation: u64,
    pub kind: TransportEventKind,
}

/// Event sink handed to a connector for one attempt
#[derive(Debug, Clone)]
pub struct TransportEvents {
    generation: u64,
    tx: mpsc::UnboundedSender<TransportEvent>,
}

impl TransportEvents {
    pub fn new(generation: u64, tx: mpsc::UnboundedSender<TransportEvent>) -> Self {
        Self { generation, tx }
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Report that the transport is ready for frames
    pub fn opened(&self) -> bool {
        self.emit(TransportEventKind::Opened)
    }

    /// Report an inbound text frame
    pub fn message(&self, text: impl Into<String>) -> bool {
        self.emit(TransportEventKind::Message(text.into()))
    }

    /// Report that the transport is gone
    pub fn closed(&self, reason: Option<String>) -> bool {
        self.emit(TransportEventKind::Closed { reason })
    }

    /// Returns false once the driver has stopped listening
    fn emit(&self, kind: TransportEventKind) -> bool {
        self.tx
            .send(TransportEvent {
                generation: self.generation,
                kind,
            })
            .is_ok()
    }
}

/// Driver-side handle to one transport
#[derive(Debug)]
pub struct TransportHandle {
    generation: u64,
    commands: mpsc::UnboundedSender<TransportCommand>,
}

impl TransportHandle {
    pub fn new(generation: u64, commands: mpsc::UnboundedSender<TransportCommand>) -> Self {
        Self {
            generation,
            commands,
        }
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Queue a text frame
    pub fn send(&self, frame: String) -> Result<(), TransportError> {
        self.commands
            .send(TransportCommand::Frame(frame))
            .map_err(|_| TransportError::Closed)
    }

    /// Ask the transport to close. Consumes the handle.
    pub fn close(self) {
        let _ = self.commands.send(TransportCommand::Close);
    }
}

/// Opens transports to a URL
pub trait Connector: Send + Sync + 'static {
    /// Start connecting in the background and return the handle immediately
    fn open(&self, url: &str, events: TransportEvents) -> TransportHandle;
}
