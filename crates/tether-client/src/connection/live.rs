//! Public connection handle

use super::driver::{Command, Driver};
use super::{ClientError, LinkState};
use crate::endpoint::Endpoint;
use crate::observer::Observer;
use crate::protocol::Payload;
use crate::transport::Connector;
use std::sync::Arc;
use tether_common::LivenessConfig;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;

/// Handle to a liveness-checked connection
///
/// Cloning is cheap; every clone talks to the same driver task. The driver
/// keeps reconnecting until [`close`](Self::close) is called or every handle
/// is dropped.
#[derive(Debug, Clone)]
pub struct LiveConnection {
    url: Arc<str>,
    commands: mpsc::UnboundedSender<Command>,
    state: watch::Receiver<LinkState>,
}

impl LiveConnection {
    /// Start connecting to `endpoint` on the current Tokio runtime
    ///
    /// The returned join handle completes once the driver has stopped.
    pub fn spawn<C: Connector>(
        endpoint: &Endpoint,
        config: LivenessConfig,
        observer: Observer,
        connector: C,
    ) -> (Self, JoinHandle<()>) {
        let url = endpoint.url();
        let (commands, commands_rx) = mpsc::unbounded_channel();
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let (state_tx, state) = watch::channel(LinkState::Disconnected);

        let driver = Driver::new(
            url.clone(),
            config,
            observer,
            Box::new(connector),
            state_tx,
            events_tx,
        );
        let task = tokio::spawn(driver.run(commands_rx, events_rx));

        let connection = Self {
            url: url.into(),
            commands,
            state,
        };
        (connection, task)
    }

    /// The resolved endpoint URL
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Write a payload if the transport is open; otherwise it is dropped
    pub fn send(&self, payload: impl Into<Payload>) -> Result<(), ClientError> {
        self.command(Command::Send(payload.into()))
    }

    /// Discard the current transport and start a fresh attempt now
    pub fn reconnect(&self) -> Result<(), ClientError> {
        self.command(Command::Reconnect)
    }

    pub fn state(&self) -> LinkState {
        *self.state.borrow()
    }

    /// Watch link state changes
    pub fn subscribe(&self) -> watch::Receiver<LinkState> {
        self.state.clone()
    }

    /// Wait until the link reaches `target`
    pub async fn wait_for(&self, target: LinkState) -> Result<(), ClientError> {
        let mut state = self.state.clone();
        state
            .wait_for(|current| *current == target)
            .await
            .map(|_| ())
            .map_err(|_| ClientError::Closed)
    }

    /// Cancel every timer, close the transport and stop the driver
    ///
    /// Closing an already closed connection is a no-op.
    pub async fn close(&self) -> Result<(), ClientError> {
        let (ack, done) = oneshot::channel();
        if self.commands.send(Command::Close(ack)).is_err() {
            return Ok(());
        }
        // A dropped ack means the driver stopped on its own
        let _ = done.await;
        Ok(())
    }

    fn command(&self, command: Command) -> Result<(), ClientError> {
        self.commands.send(command).map_err(|_| ClientError::Closed)
    }
}
