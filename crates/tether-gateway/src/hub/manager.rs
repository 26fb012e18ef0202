//! Socket hub
//!
//! Manages all connected sockets using DashMap for thread-safe access.

use super::Peer;
use dashmap::DashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc;

/// Registry of connected sockets
///
/// Handles are allocated sequentially starting at 1 and never reused.
pub struct SocketHub {
    peers: DashMap<u64, Arc<Peer>>,
    allocated: AtomicU64,
}

impl SocketHub {
    #[must_use]
    pub fn new() -> Self {
        Self {
            peers: DashMap::new(),
            allocated: AtomicU64::new(0),
        }
    }

    /// Create a new hub wrapped in Arc
    #[must_use]
    pub fn new_shared() -> Arc<Self> {
        Arc::new(Self::new())
    }

    /// Register a socket and allocate its handle
    pub fn add_peer(&self, sender: mpsc::Sender<String>) -> Arc<Peer> {
        let handle = self.allocated.fetch_add(1, Ordering::SeqCst) + 1;
        let peer = Arc::new(Peer::new(handle, sender));
        self.peers.insert(handle, peer.clone());

        tracing::debug!(handle, "Peer added");

        peer
    }

    /// Deregister a socket
    pub fn remove_peer(&self, handle: u64) -> Option<Arc<Peer>> {
        let removed = self.peers.remove(&handle).map(|(_, peer)| peer);
        if removed.is_some() {
            tracing::debug!(handle, "Peer removed");
        }
        removed
    }

    pub fn get_peer(&self, handle: u64) -> Option<Arc<Peer>> {
        self.peers.get(&handle).map(|r| r.clone())
    }

    /// Send one frame to one socket
    pub async fn send_to(&self, handle: u64, text: String) -> bool {
        // Clone out of the map so no shard lock is held across the await
        let Some(peer) = self.get_peer(handle) else {
            return false;
        };
        peer.send(text).await.is_ok()
    }

    /// Queue a frame for every socket, returning how many accepted it
    ///
    /// Sockets whose buffers are full miss the frame rather than stalling
    /// the sender.
    pub fn broadcast(&self, text: &str) -> usize {
        self.broadcast_except(text, &[])
    }

    /// Queue a frame for every socket whose handle is not in `excluded`
    pub fn broadcast_except(&self, text: &str, excluded: &[u64]) -> usize {
        let peers: Vec<Arc<Peer>> = self
            .peers
            .iter()
            .filter(|r| !excluded.contains(r.key()))
            .map(|r| r.value().clone())
            .collect();

        let mut delivered = 0;
        for peer in peers {
            match peer.try_send(text.to_string()) {
                Ok(()) => delivered += 1,
                Err(e) => tracing::debug!(handle = peer.handle(), error = %e, "Broadcast skipped peer"),
            }
        }
        delivered
    }

    /// Number of connected sockets
    pub fn len(&self) -> usize {
        self.peers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.peers.is_empty()
    }

    /// Handles of all connected sockets, sorted
    pub fn handles(&self) -> Vec<u64> {
        let mut handles: Vec<u64> = self.peers.iter().map(|r| *r.key()).collect();
        handles.sort_unstable();
        handles
    }
}

impl Default for SocketHub {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for SocketHub {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SocketHub")
            .field("peers", &self.peers.len())
            .field("allocated", &self.allocated.load(Ordering::SeqCst))
            .finish()
    }
}
