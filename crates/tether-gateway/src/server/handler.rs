//! WebSocket handler
//!
//! Handles WebSocket connections and message processing.

use crate::hub::Peer;
use crate::server::GatewayState;
use axum::{
    extract::{
        ws::{Message, WebSocket},
        State, WebSocketUpgrade,
    },
    response::IntoResponse,
};
use futures_util::{SinkExt, StreamExt};
use serde_json::Value;
use std::sync::Arc;
use tether_client::{Envelope, PING, PONG};
use tokio::sync::mpsc;

/// Channel buffer size for outgoing messages
const MESSAGE_BUFFER_SIZE: usize = 100;

/// WebSocket gateway handler
pub async fn gateway_handler(
    State(state): State<GatewayState>,
    ws: WebSocketUpgrade,
) -> impl IntoResponse {
    ws.on_upgrade(|socket| handle_socket(state, socket))
}

/// Handle an upgraded WebSocket connection
async fn handle_socket(state: GatewayState, socket: WebSocket) {
    let (tx, mut rx) = mpsc::channel::<String>(MESSAGE_BUFFER_SIZE);
    let peer = state.hub().add_peer(tx);
    let handle = peer.handle();

    tracing::info!(handle, peers = state.hub().len(), "WebSocket connection established");

    let (mut ws_sink, mut ws_stream) = socket.split();

    // Init goes out before anything queued on the channel
    let init = Envelope::new("Init").with("handle", handle).to_json();
    if ws_sink.send(Message::Text(init)).await.is_err() {
        tracing::warn!(handle, "Failed to send Init message");
        cleanup_peer(&state, handle);
        return;
    }

    let state_recv = state.clone();
    let peer_recv = peer.clone();

    let mut recv_task = tokio::spawn(async move {
        while let Some(msg) = ws_stream.next().await {
            match msg {
                Ok(Message::Text(text)) => handle_text_message(&state_recv, &peer_recv, &text).await,
                Ok(Message::Binary(_)) => {
                    tracing::debug!(handle, "Binary messages not supported");
                }
                Ok(Message::Ping(_) | Message::Pong(_)) => {
                    // Protocol-level control frames are answered by axum
                }
                Ok(Message::Close(_)) => {
                    tracing::info!(handle, "Client closed connection");
                    return;
                }
                Err(e) => {
                    tracing::warn!(handle, error = %e, "WebSocket error");
                    return;
                }
            }
        }
    });

    let mut send_task = tokio::spawn(async move {
        while let Some(text) = rx.recv().await {
            if ws_sink.send(Message::Text(text)).await.is_err() {
                tracing::warn!(handle, "Failed to send message to WebSocket");
                break;
            }
        }

        // Close the WebSocket when channel is closed
        let _ = ws_sink.close().await;
    });

    // Whichever side finishes first ends the socket
    tokio::select! {
        _ = &mut recv_task => {
            tracing::debug!(handle, "Receive task ended");
            send_task.abort();
        }
        _ = &mut send_task => {
            tracing::debug!(handle, "Send task ended");
            recv_task.abort();
        }
    }

    cleanup_peer(&state, handle);
}

/// Handle a text frame from the client
async fn handle_text_message(state: &GatewayState, peer: &Arc<Peer>, text: &str) {
    if text == PING {
        tracing::trace!(handle = peer.handle(), "Ping received");
        if peer.send(PONG.to_string()).await.is_err() {
            tracing::debug!(handle = peer.handle(), "Pong dropped, writer gone");
        }
        return;
    }

    let mut envelope = match Envelope::from_json(text) {
        Ok(envelope) => envelope,
        Err(e) => {
            tracing::debug!(handle = peer.handle(), error = %e, "Ignoring non-envelope text");
            return;
        }
    };

    envelope
        .fields
        .insert("handle".to_string(), Value::from(peer.handle()));

    let delivered = state.hub().broadcast(&envelope.to_json());
    tracing::debug!(
        handle = peer.handle(),
        action = %envelope.action,
        delivered,
        "Envelope relayed"
    );
}

/// Deregister the socket and tell everyone it left
fn cleanup_peer(state: &GatewayState, handle: u64) {
    let Some(peer) = state.hub().remove_peer(handle) else {
        return;
    };

    let close = Envelope::new("Close").with("handle", handle).to_json();
    let notified = state.hub().broadcast(&close);

    tracing::info!(
        handle,
        notified,
        connected_ms = peer.age().as_millis() as u64,
        peers = state.hub().len(),
        "WebSocket connection closed"
    );
}
