//! Test helpers for integration tests
//!
//! Provides utilities for spawning gateways on ephemeral ports, a server that
//! accepts sockets but never answers, and a client wrapper that records the
//! envelopes it receives.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use futures_util::StreamExt;
use tether_client::{
    AlertStatus, Endpoint, Envelope, HandlerRegistry, LinkState, LiveConnection, Observer,
    WebSocketConnector,
};
use tether_common::{AppConfig, LivenessConfig};
use tether_gateway::{create_app, run_server, GatewayState, SocketHub};
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{sleep, timeout, Instant};

/// Upper bound for anything a test waits on
pub const WAIT_LIMIT: Duration = Duration::from_secs(5);

/// Liveness timing short enough for tests to observe several cycles
pub fn fast_liveness() -> LivenessConfig {
    LivenessConfig {
        ping_interval_ms: 200,
        reconnect_delay_ms: 300,
        pong_timeout_ms: 400,
    }
}

/// Build a config pointing at `127.0.0.1:{port}`
pub fn test_config(port: u16, liveness: LivenessConfig) -> Result<AppConfig> {
    let vars: HashMap<&str, String> = HashMap::from([
        ("APP_ENV", "development".to_string()),
        ("TETHER_HOST", "127.0.0.1".to_string()),
        ("TETHER_PORT", port.to_string()),
        ("TETHER_PING_INTERVAL_MS", liveness.ping_interval_ms.to_string()),
        ("TETHER_RECONNECT_DELAY_MS", liveness.reconnect_delay_ms.to_string()),
        ("TETHER_PONG_TIMEOUT_MS", liveness.pong_timeout_ms.to_string()),
    ]);

    Ok(AppConfig::from_lookup(|key| vars.get(key).cloned())?)
}

/// Find a port nothing is listening on right now
pub async fn free_port() -> Result<u16> {
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    Ok(listener.local_addr()?.port())
}

/// Poll `check` until it holds or [`WAIT_LIMIT`] passes
pub async fn eventually<F>(what: &str, mut check: F) -> Result<()>
where
    F: FnMut() -> bool,
{
    let deadline = Instant::now() + WAIT_LIMIT;
    while !check() {
        if Instant::now() >= deadline {
            return Err(anyhow!("timed out waiting for {what}"));
        }
        sleep(Duration::from_millis(20)).await;
    }
    Ok(())
}

/// Gateway instance that manages lifecycle
pub struct TestGateway {
    pub addr: SocketAddr,
    pub hub: Arc<SocketHub>,
    config: AppConfig,
    handle: JoinHandle<()>,
}

impl TestGateway {
    /// Start a gateway on an ephemeral port
    pub async fn start() -> Result<Self> {
        Self::start_on(0).await
    }

    /// Start a gateway on a specific port
    pub async fn start_on(port: u16) -> Result<Self> {
        let listener = TcpListener::bind(("127.0.0.1", port))
            .await
            .with_context(|| format!("binding gateway on port {port}"))?;
        let addr = listener.local_addr()?;

        let config = test_config(addr.port(), fast_liveness())?;
        let hub = SocketHub::new_shared();
        let app = create_app(GatewayState::with_hub(hub.clone(), config.clone()));

        let handle = tokio::spawn(async move {
            run_server(app, listener).await.ok();
        });

        Ok(Self {
            addr,
            hub,
            config,
            handle,
        })
    }

    /// Endpoint a client should dial
    pub fn endpoint(&self) -> Result<Endpoint> {
        Ok(Endpoint::from_config(&self.config.endpoint)?)
    }
}

impl Drop for TestGateway {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

/// WebSocket server that accepts sockets and never writes anything back
pub struct MuteServer {
    pub addr: SocketAddr,
    accepted: Arc<AtomicUsize>,
    handle: JoinHandle<()>,
}

impl MuteServer {
    pub async fn start() -> Result<Self> {
        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;
        let accepted = Arc::new(AtomicUsize::new(0));

        let counter = accepted.clone();
        let handle = tokio::spawn(async move {
            while let Ok((stream, _)) = listener.accept().await {
                let counter = counter.clone();
                tokio::spawn(async move {
                    let Ok(mut socket) = tokio_tungstenite::accept_async(stream).await else {
                        return;
                    };
                    counter.fetch_add(1, Ordering::SeqCst);
                    // Drain frames, including pings, without ever replying
                    while let Some(Ok(_)) = socket.next().await {}
                });
            }
        });

        Ok(Self {
            addr,
            accepted,
            handle,
        })
    }

    /// Number of completed WebSocket handshakes
    pub fn accepted(&self) -> usize {
        self.accepted.load(Ordering::SeqCst)
    }

    pub fn endpoint(&self) -> Result<Endpoint> {
        Ok(Endpoint::new("127.0.0.1", self.addr.port(), false, "/ws")?)
    }
}

impl Drop for MuteServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

/// A real client over WebSocket, recording envelopes for chosen actions
pub struct TestClient {
    pub connection: LiveConnection,
    pub status: Arc<AlertStatus>,
    inbox: mpsc::UnboundedReceiver<Envelope>,
    driver: JoinHandle<()>,
}

impl TestClient {
    /// Connect with handlers recording every action in `actions`
    pub fn connect(endpoint: &Endpoint, liveness: LivenessConfig, actions: &[&str]) -> Self {
        let (tx, inbox) = mpsc::unbounded_channel();

        let mut registry = HandlerRegistry::new();
        for action in actions {
            let tx = tx.clone();
            registry = registry.on(*action, move |envelope| {
                let _ = tx.send(envelope.clone());
                Ok(())
            });
        }

        let status = Arc::new(AlertStatus::new());
        let observer = Observer::new(registry, status.clone());
        let (connection, driver) =
            LiveConnection::spawn(endpoint, liveness, observer, WebSocketConnector::new());

        Self {
            connection,
            status,
            inbox,
            driver,
        }
    }

    /// Next recorded envelope with `action`, skipping others
    pub async fn next_envelope(&mut self, action: &str) -> Result<Envelope> {
        let inbox = &mut self.inbox;
        timeout(WAIT_LIMIT, async {
            while let Some(envelope) = inbox.recv().await {
                if envelope.action == action {
                    return Ok(envelope);
                }
            }
            Err(anyhow!("client inbox closed"))
        })
        .await
        .with_context(|| format!("timed out waiting for {action}"))?
    }

    /// Wait until the link reaches `target`
    pub async fn wait_for_state(&self, target: LinkState) -> Result<()> {
        timeout(WAIT_LIMIT, self.connection.wait_for(target))
            .await
            .with_context(|| format!("timed out waiting for {target}"))??;
        Ok(())
    }

    /// Close the connection and wait for the driver to stop
    pub async fn shutdown(self) -> Result<()> {
        self.connection.close().await?;
        self.driver.await?;
        Ok(())
    }
}
