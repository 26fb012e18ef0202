//! Socket registry
//!
//! Tracks connected sockets and fans envelopes out to them.

mod manager;
mod peer;

pub use manager::SocketHub;
pub use peer::Peer;
