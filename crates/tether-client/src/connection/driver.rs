//! Connection driver
//!
//! Single task that owns all connection state. Transport events, timer
//! expiries, the ping ticker and caller commands are all serialized through
//! one `select!` loop, so no operation ever runs concurrently with another.
//!
//! Every `connect()` bumps the attempt generation. Per-attempt timers and
//! transport events carry the generation they were created under and are
//! ignored once a newer attempt exists. Only `close()` cancels timers
//! outright.
//!
//! Pings are numbered. A pong timeout acts only for the oldest unanswered
//! ping, so overlapping ping windows never blame an answered ping.

use super::LinkState;
use crate::observer::Observer;
use crate::protocol::{Envelope, Payload, PING, PONG};
use crate::status::{Severity, CONNECTING_MESSAGE, LOST_MESSAGE};
use crate::transport::{Connector, TransportEvent, TransportEventKind, TransportEvents, TransportHandle};
use std::time::Duration;
use tether_common::LivenessConfig;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinSet;
use tokio::time::{interval_at, sleep, Instant, MissedTickBehavior};

/// Requests from a [`LiveConnection`](super::LiveConnection)
pub(crate) enum Command {
    Send(Payload),
    Reconnect,
    Close(oneshot::Sender<()>),
}

/// One-shot timers; each fires once and is then checked against current state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Timer {
    VerifyConnected { generation: u64 },
    RetryConnect { generation: u64 },
    PongTimeout { generation: u64, ping: u64 },
}

pub(crate) struct Driver {
    url: String,
    config: LivenessConfig,
    observer: Observer,
    connector: Box<dyn Connector>,

    /// At most one live transport
    transport: Option<TransportHandle>,
    link: LinkState,
    state_tx: watch::Sender<LinkState>,

    /// Attempt generation, bumped by every `connect()`
    generation: u64,
    /// Pings sent over the driver's lifetime
    pings_sent: u64,
    /// Oldest ping still waiting for a pong; any pong answers all of them
    outstanding: Option<u64>,

    timers: JoinSet<Timer>,
    events_tx: mpsc::UnboundedSender<TransportEvent>,
}

impl Driver {
    pub(crate) fn new(
        url: String,
        config: LivenessConfig,
        observer: Observer,
        connector: Box<dyn Connector>,
        state_tx: watch::Sender<LinkState>,
        events_tx: mpsc::UnboundedSender<TransportEvent>,
    ) -> Self {
        Self {
            url,
            config,
            observer,
            connector,
            transport: None,
            link: LinkState::Disconnected,
            state_tx,
            generation: 0,
            pings_sent: 0,
            outstanding: None,
            timers: JoinSet::new(),
            events_tx,
        }
    }

    pub(crate) async fn run(
        mut self,
        mut commands: mpsc::UnboundedReceiver<Command>,
        mut events: mpsc::UnboundedReceiver<TransportEvent>,
    ) {
        self.connect();

        // Lives as long as the driver; first ping one full period after start
        let period = self.config.ping_interval();
        let mut ticker = interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = ticker.tick() => self.ping(),
                Some(event) = events.recv() => self.on_transport_event(event),
                Some(fired) = self.timers.join_next() => match fired {
                    Ok(timer) => self.on_timer(timer),
                    Err(e) if e.is_cancelled() => {}
                    Err(e) => tracing::error!(error = %e, "Timer task failed"),
                },
                command = commands.recv() => match command {
                    Some(Command::Send(payload)) => self.send(payload),
                    Some(Command::Reconnect) => self.connect(),
                    Some(Command::Close(ack)) => {
                        self.shutdown();
                        let _ = ack.send(());
                        break;
                    }
                    None => {
                        self.shutdown();
                        break;
                    }
                },
            }
        }

        tracing::debug!(url = %self.url, "Connection driver stopped");
    }

    fn is_open(&self) -> bool {
        self.transport.is_some() && self.link.is_open()
    }

    fn set_link(&mut self, link: LinkState) {
        if self.link != link {
            tracing::debug!(generation = self.generation, from = %self.link, to = %link, "Link state changed");
            self.link = link;
            self.state_tx.send_replace(link);
        }
    }

    fn schedule(&mut self, after: Duration, timer: Timer) {
        self.timers.spawn(async move {
            sleep(after).await;
            timer
        });
    }

    /// Discard the current transport and start a fresh attempt
    fn connect(&mut self) {
        if let Some(previous) = self.transport.take() {
            tracing::debug!(generation = previous.generation(), "Discarding previous transport");
            previous.close();
        }

        self.generation += 1;
        let generation = self.generation;
        tracing::info!(generation, url = %self.url, "Connecting");

        let events = TransportEvents::new(generation, self.events_tx.clone());
        self.transport = Some(self.connector.open(&self.url, events));
        self.outstanding = None;
        self.set_link(LinkState::Connecting);

        self.schedule(
            self.config.reconnect_delay(),
            Timer::VerifyConnected { generation },
        );
    }

    fn on_transport_event(&mut self, event: TransportEvent) {
        if event.generation != self.generation {
            tracing::trace!(
                generation = event.generation,
                current = self.generation,
                "Ignoring event from stale transport"
            );
            return;
        }

        match event.kind {
            TransportEventKind::Opened => {
                tracing::info!(generation = event.generation, url = %self.url, "Connection open");
                self.set_link(LinkState::Open);
            }
            TransportEventKind::Message(raw) => self.on_message(&raw),
            TransportEventKind::Closed { reason } => {
                tracing::warn!(
                    generation = event.generation,
                    reason = reason.as_deref().unwrap_or("none"),
                    "Transport closed"
                );
                self.transport = None;
                self.set_link(LinkState::Disconnected);
            }
        }
    }

    fn on_message(&mut self, raw: &str) {
        if raw == PONG {
            tracing::trace!(generation = self.generation, ping = ?self.outstanding, "Pong received");
            self.outstanding = None;
            self.observer.status().clear_if_equal(LOST_MESSAGE);
            return;
        }

        let envelope = match Envelope::from_json(raw) {
            Ok(envelope) => envelope,
            Err(e) => {
                tracing::warn!(error = %e, "Rejected inbound message");
                self.observer
                    .status()
                    .log_error("Socket message rejected", &e, Severity::Danger);
                return;
            }
        };

        if let Err(e) = self.observer.handlers().dispatch(&envelope) {
            tracing::warn!(action = %envelope.action, error = %e, "Socket action failed");
            self.observer.status().log_error(
                &format!("Socket action {} failed", envelope.action),
                &e,
                Severity::Danger,
            );
        }
    }

    fn on_timer(&mut self, timer: Timer) {
        match timer {
            Timer::VerifyConnected { generation } if generation == self.generation => {
                self.verify_connected();
            }
            Timer::RetryConnect { generation } if generation == self.generation => {
                self.connect();
            }
            Timer::PongTimeout { generation, ping } => self.pong_timeout(generation, ping),
            stale => tracing::trace!(timer = ?stale, current = self.generation, "Ignoring stale timer"),
        }
    }

    fn verify_connected(&mut self) {
        let status = self.observer.status();
        if self.is_open() {
            status.clear_if_equal(CONNECTING_MESSAGE);
            status.clear_if_equal(LOST_MESSAGE);
            return;
        }

        tracing::info!(
            generation = self.generation,
            retry_in_ms = self.config.reconnect_delay_ms,
            "Connection not open yet, retrying"
        );
        status.set(CONNECTING_MESSAGE, Severity::Warning, false);
        self.schedule(
            self.config.reconnect_delay(),
            Timer::RetryConnect {
                generation: self.generation,
            },
        );
    }

    fn ping(&mut self) {
        self.pings_sent += 1;
        let ping = self.pings_sent;
        let awaited = *self.outstanding.get_or_insert(ping);
        let generation = self.generation;

        let sent = self.is_open()
            && self
                .transport
                .as_ref()
                .is_some_and(|transport| transport.send(PING.to_string()).is_ok());

        if sent {
            tracing::trace!(generation, ping, "Ping sent");
            self.schedule(
                self.config.pong_timeout(),
                Timer::PongTimeout { generation, ping },
            );
        } else {
            self.pong_timeout(generation, awaited);
        }
    }

    /// Acts only if `ping` is still the outstanding ping of the current attempt
    fn pong_timeout(&mut self, generation: u64, ping: u64) {
        if self.outstanding != Some(ping) || generation != self.generation {
            tracing::trace!(generation, ping, "Ignoring pong timeout of an answered ping");
            return;
        }

        tracing::warn!(generation, ping, "No pong received, reconnecting");
        self.set_link(LinkState::SuspectedDead);
        self.observer
            .status()
            .set(LOST_MESSAGE, Severity::Danger, false);
        self.connect();
    }

    fn send(&mut self, payload: Payload) {
        if !self.is_open() {
            tracing::trace!(generation = self.generation, "Dropping send while not open");
            return;
        }

        if let Some(transport) = &self.transport {
            if transport.send(payload.into_frame()).is_err() {
                tracing::debug!(generation = self.generation, "Transport gone before send");
            }
        }
    }

    fn shutdown(&mut self) {
        self.timers.abort_all();
        if let Some(transport) = self.transport.take() {
            transport.close();
        }
        self.outstanding = None;
        self.set_link(LinkState::Closed);
        tracing::info!(url = %self.url, "Connection closed");
    }
}
