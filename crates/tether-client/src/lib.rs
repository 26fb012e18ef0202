//! # tether-client
//!
//! A persistent WebSocket connection that proves it is alive with
//! application-level pings and reconnects when it is not.

pub mod connection;
pub mod endpoint;
pub mod handlers;
pub mod observer;
pub mod protocol;
pub mod status;
pub mod transport;

pub use connection::{ClientError, LinkState, LiveConnection};
pub use endpoint::{Endpoint, EndpointError};
pub use handlers::{ActionHandler, HandlerError, HandlerRegistry, HandlerResult};
pub use observer::Observer;
pub use protocol::{Envelope, EnvelopeError, Payload, PING, PONG};
pub use status::{AlertStatus, Severity, StatusSink, CONNECTING_MESSAGE, LOST_MESSAGE};
pub use transport::{Connector, WebSocketConnector};
