//! Gateway server setup
//!
//! Provides the WebSocket route, the health check and the listener loop.

mod handler;
mod state;

pub use handler::gateway_handler;
pub use state::GatewayState;

use axum::{routing::get, Router};
use std::net::SocketAddr;
use tether_common::{AppConfig, AppError, AppResult};
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

/// Create the gateway router with the socket mounted at `path`
pub fn create_router(path: &str) -> Router<GatewayState> {
    Router::new()
        .route(path, get(gateway_handler))
        .route("/health", get(health_check))
}

/// Health check endpoint
async fn health_check() -> &'static str {
    "OK"
}

/// Build the complete application
pub fn create_app(state: GatewayState) -> Router {
    create_router(&state.config().endpoint.path)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Serve `app` on an already bound listener
pub async fn run_server(app: Router, listener: TcpListener) -> AppResult<()> {
    let addr = listener
        .local_addr()
        .map_or_else(|_| "unknown".to_string(), |addr| addr.to_string());
    tracing::info!(%addr, "Gateway listening");

    axum::serve(listener, app)
        .await
        .map_err(|e| AppError::Transport(format!("Server error: {e}")))?;

    Ok(())
}

/// Bind the configured address
pub async fn bind(config: &AppConfig) -> AppResult<TcpListener> {
    let addr = config.endpoint.address();
    let addr: SocketAddr = tokio::net::lookup_host(&addr)
        .await
        .map_err(|e| AppError::Bind {
            addr: addr.clone(),
            reason: e.to_string(),
        })?
        .next()
        .ok_or_else(|| AppError::Bind {
            addr: addr.clone(),
            reason: "no address resolved".to_string(),
        })?;

    TcpListener::bind(addr).await.map_err(|e| AppError::Bind {
        addr: addr.to_string(),
        reason: e.to_string(),
    })
}

/// Run the complete gateway server with configuration
pub async fn run(config: AppConfig) -> AppResult<()> {
    let listener = bind(&config).await?;
    tracing::info!(path = %config.endpoint.path, "Accepting sockets");

    let app = create_app(GatewayState::new(config));
    run_server(app, listener).await
}
