//! Tether Gateway entry point
//!
//! Run with:
//! ```bash
//! TETHER_PORT=9000 cargo run -p tether-gateway
//! ```
//!
//! Configuration is loaded from environment variables.

use tether_common::{try_init_tracing_with_config, AppConfig, TracingConfig};
use tracing::{error, info};

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        error!(error = %e, "Gateway failed to start");
        std::process::exit(1);
    }
}

async fn run() -> anyhow::Result<()> {
    let config = AppConfig::from_env().map_err(|e| {
        eprintln!("Failed to load configuration: {e}");
        e
    })?;

    if let Err(e) = try_init_tracing_with_config(TracingConfig::for_environment(config.app.env)) {
        eprintln!("Warning: Failed to initialize tracing: {e}");
    }

    info!(
        env = ?config.app.env,
        address = %config.endpoint.address(),
        path = %config.endpoint.path,
        "Starting Tether Gateway"
    );

    tether_gateway::run(config).await?;

    Ok(())
}
