//! Liveness-checked connection
//!
//! A [`LiveConnection`] is a cheap handle to a driver task that owns the
//! transport, the ping bookkeeping and every timer.

mod driver;
mod error;
mod live;
mod state;

pub use error::ClientError;
pub use live::LiveConnection;
pub use state::LinkState;
