//! Waypoint Server Library
//!
//! Resolves a context for every inbound operation: fresh per request over
//! HTTP, pinned per connection over WebSocket subscriptions.

pub mod connectors;
pub mod core;
pub mod handlers;
pub mod operations;
pub mod protocol;

use std::net::SocketAddr;
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use crate::core::config::{AppState, ServerConfig};
use crate::core::store::MemoryStore;

/// Install the global `tracing` subscriber (`RUST_LOG`, default `info`)
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let subscriber = FmtSubscriber::builder().with_env_filter(filter).finish();
    if tracing::subscriber::set_global_default(subscriber).is_err() {
        // Already set, ignore
    }
}

pub async fn run() -> anyhow::Result<()> {
    init_tracing();

    info!("=== Waypoint Server ===");

    let config = ServerConfig::from_env()?;

    // One store for the whole process, injected everywhere from here
    let store = Arc::new(MemoryStore::seeded());
    let state = AppState::new(config, store);

    serve(state).await
}

/// Bind the configured port and serve until the listener fails
pub async fn serve(state: AppState) -> anyhow::Result<()> {
    let addr = SocketAddr::from(([0, 0, 0, 0], state.config.port));
    let app = crate::core::router(state);

    let listener = match tokio::net::TcpListener::bind(addr).await {
        Ok(listener) => listener,
        Err(e) => {
            error!("Create server failed: could not bind {}: {}", addr, e);
            return Err(e.into());
        }
    };

    let local_addr = listener.local_addr()?;
    info!("Server ready at http://{}/graphql", local_addr);
    info!("Subscriptions ready at ws://{}/subscriptions", local_addr);

    if let Err(e) = axum::serve(listener, app).await {
        error!("Server stopped: {}", e);
        return Err(e.into());
    }

    Ok(())
}
