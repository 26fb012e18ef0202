//! WebSocket transport over tokio-tungstenite

use super::{Connector, TransportCommand, TransportEvents, TransportHandle};
use futures_util::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;

/// Connects with `tokio-tungstenite`; `wss` goes through rustls
#[derive(Debug, Clone, Copy, Default)]
pub struct WebSocketConnector;

impl WebSocketConnector {
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl Connector for WebSocketConnector {
    fn open(&self, url: &str, events: TransportEvents) -> TransportHandle {
        install_crypto_provider();

        let (tx, rx) = mpsc::unbounded_channel();
        let handle = TransportHandle::new(events.generation(), tx);
        tokio::spawn(run(url.to_string(), events, rx));
        handle
    }
}

/// `wss` handshakes need a process-wide rustls provider; keep one set up
fn install_crypto_provider() {
    if rustls::crypto::CryptoProvider::get_default().is_none() {
        // Losing a race to another installer is fine
        let _ = rustls::crypto::ring::default_provider().install_default();
    }
}

async fn run(
    url: String,
    events: TransportEvents,
    mut commands: mpsc::UnboundedReceiver<TransportCommand>,
) {
    let generation = events.generation();

    let stream = tokio::select! {
        result = connect_async(url.as_str()) => match result {
            Ok((stream, response)) => {
                tracing::debug!(
                    generation,
                    url = %url,
                    status = %response.status(),
                    "WebSocket handshake complete"
                );
                stream
            }
            Err(e) => {
                tracing::warn!(generation, url = %url, error = %e, "WebSocket connect failed");
                events.closed(Some(e.to_string()));
                return;
            }
        },
        () = wait_for_close(&mut commands) => {
            tracing::debug!(generation, "Transport closed while connecting");
            events.closed(None);
            return;
        }
    };

    if !events.opened() {
        return;
    }

    let (mut sink, mut stream) = stream.split();

    let reason = loop {
        tokio::select! {
            inbound = stream.next() => match inbound {
                Some(Ok(Message::Text(text))) => {
                    if !events.message(text.to_string()) {
                        break None;
                    }
                }
                Some(Ok(Message::Close(frame))) => {
                    tracing::debug!(generation, frame = ?frame, "Peer closed WebSocket");
                    break frame.map(|f| f.reason.to_string());
                }
                Some(Ok(_)) => {
                    // Binary and control frames carry nothing for us
                }
                Some(Err(e)) => {
                    tracing::warn!(generation, error = %e, "WebSocket error");
                    break Some(e.to_string());
                }
                None => break None,
            },
            command = commands.recv() => match command {
                Some(TransportCommand::Frame(frame)) => {
                    if let Err(e) = sink.send(Message::Text(frame.into())).await {
                        tracing::warn!(generation, error = %e, "Failed to write frame");
                        break Some(e.to_string());
                    }
                }
                Some(TransportCommand::Close) | None => {
                    let _ = sink.close().await;
                    break None;
                }
            },
        }
    };

    events.closed(reason);
}

/// Resolves once the driver asks to close (or drops the handle)
async fn wait_for_close(commands: &mut mpsc::UnboundedReceiver<TransportCommand>) {
    while let Some(command) = commands.recv().await {
        if command == TransportCommand::Close {
            return;
        }
        // Frames are only sent once open; drop any that race the handshake
    }
}
