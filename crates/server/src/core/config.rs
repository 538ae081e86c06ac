//! Server configuration and shared state

use std::sync::Arc;

use crate::core::hooks::{ConnectionLifecycleHooks, SessionHooks};
use crate::core::pubsub::EventChannel;
use crate::core::resolver::ContextResolver;
use crate::core::session::SessionTable;
use crate::core::store::DataSource;

/// Configuration for the Waypoint server
#[derive(Clone, Debug)]
pub struct ServerConfig {
    /// Port the transport listens on
    pub port: u16,
    /// Interval between `ka` keep-alive frames on streaming connections
    pub keepalive_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: waypoint_common::DEFAULT_PORT,
            keepalive_secs: 30,
        }
    }
}

impl ServerConfig {
    /// Resolve the port from environment, persistent config, or default
    pub fn from_env() -> anyhow::Result<Self> {
        Ok(Self {
            port: waypoint_common::resolve_port()?,
            ..Self::default()
        })
    }

    pub fn with_port(port: u16) -> Self {
        Self {
            port,
            ..Self::default()
        }
    }
}

/// App state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub config: ServerConfig,
    pub store: Arc<dyn DataSource>,
    pub events: EventChannel,
    pub resolver: Arc<ContextResolver>,
    pub hooks: Arc<dyn ConnectionLifecycleHooks>,
}

impl AppState {
    /// Wire the store, event channel, session table, resolver and hooks together
    pub fn new(config: ServerConfig, store: Arc<dyn DataSource>) -> Self {
        let events = EventChannel::new();
        let sessions = Arc::new(SessionTable::new(events.clone()));
        let resolver = Arc::new(ContextResolver::new(
            store.clone(),
            events.clone(),
            sessions,
        ));
        let hooks: Arc<dyn ConnectionLifecycleHooks> = Arc::new(SessionHooks::new(resolver.clone()));

        Self {
            config,
            store,
            events,
            resolver,
            hooks,
        }
    }
}
