//! # tether-gateway
//!
//! Peer side of a tether connection: answers liveness pings and relays
//! envelopes between every connected socket.

pub mod hub;
pub mod server;

pub use hub::{Peer, SocketHub};
pub use server::{bind, create_app, create_router, gateway_handler, run, run_server, GatewayState};
