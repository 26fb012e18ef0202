//! Tether client entry point
//!
//! Run with:
//! ```bash
//! TETHER_PORT=9000 cargo run -p tether-client
//! ```
//!
//! Each stdin line is sent to the gateway: valid JSON as-is, anything else as
//! `{"action": "Note", "text": <line>}`. Configuration is loaded from
//! environment variables.

use serde::Deserialize;
use std::sync::Arc;
use tether_client::{
    AlertStatus, Endpoint, Envelope, HandlerRegistry, LinkState, LiveConnection, Observer,
    Payload, WebSocketConnector,
};
use tether_common::{try_init_tracing_with_config, AppConfig, AppError, TracingConfig};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{error, info};

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        error!(error = %e, "Client failed");
        std::process::exit(1);
    }
}

async fn run() -> anyhow::Result<()> {
    // No subscriber exists yet, so configuration errors go straight to stderr
    let config = AppConfig::from_env().map_err(|e| {
        eprintln!("Failed to load configuration: {e}");
        e
    })?;

    if let Err(e) = try_init_tracing_with_config(TracingConfig::for_environment(config.app.env)) {
        eprintln!("Warning: Failed to initialize tracing: {e}");
    }

    let endpoint =
        Endpoint::from_config(&config.endpoint).map_err(|e| AppError::Endpoint(e.to_string()))?;
    info!(
        env = ?config.app.env,
        url = %endpoint,
        ping_interval_ms = config.liveness.ping_interval_ms,
        "Configuration loaded"
    );

    let status = Arc::new(AlertStatus::new());
    let observer = Observer::new(handlers(), status);
    let (connection, driver) =
        LiveConnection::spawn(&endpoint, config.liveness, observer, WebSocketConnector::new());

    tokio::spawn(log_state_changes(connection.clone()));

    tokio::select! {
        result = forward_stdin(&connection) => result?,
        _ = tokio::signal::ctrl_c() => info!("Interrupted"),
    }

    connection.close().await?;
    driver.await?;
    Ok(())
}

/// Fields the gateway sends with `Init` and `Close`
#[derive(Deserialize)]
struct Peer {
    handle: u64,
}

fn handlers() -> HandlerRegistry {
    HandlerRegistry::new()
        .on("Init", |envelope| {
            let Peer { handle } = envelope.decode::<Peer>()?;
            info!(handle, "Gateway assigned handle");
            Ok(())
        })
        .on("Close", |envelope| {
            let Peer { handle } = envelope.decode::<Peer>()?;
            info!(handle, "Peer left");
            Ok(())
        })
        .on("Note", |envelope| {
            info!(
                from = ?envelope.get("handle"),
                text = ?envelope.get("text"),
                "Note received"
            );
            Ok(())
        })
}

async fn forward_stdin(connection: &LiveConnection) -> anyhow::Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let payload = match serde_json::from_str::<serde_json::Value>(line) {
            Ok(value) => Payload::Json(value),
            Err(_) => Payload::from(Envelope::new("Note").with("text", line)),
        };

        if !connection.state().is_open() {
            info!("Not connected, line dropped");
        }
        connection.send(payload)?;
    }

    Ok(())
}

async fn log_state_changes(connection: LiveConnection) {
    let mut state = connection.subscribe();
    while state.changed().await.is_ok() {
        let current = *state.borrow_and_update();
        info!(state = %current, "Link state");
        if current == LinkState::Closed {
            break;
        }
    }
}
