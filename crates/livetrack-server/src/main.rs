//! Livetrack server - live pilot list over REST and WebSocket.

use anyhow::Result;
use std::net::SocketAddr;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use livetrack_server::config::Config;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(tracing_subscriber::EnvFilter::from_default_env()
            .add_directive("livetrack_server=debug".parse()?))
        .init();

    tracing::info!("Starting livetrack server...");

    let config = Config::from_env();
    tracing::info!(
        port = config.server_port,
        schema = %config.pilot_schema,
        producer_auth = config.producer_token.is_some(),
        "Configuration loaded"
    );

    let port = config.server_port;
    let (app, _state) = livetrack_server::build(config)?;

    // Run server
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Livetrack server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
