//! Streaming connection lifecycle
//!
//! The transport calls `on_connect` once when a streaming connection opens
//! and `on_disconnect` once when it closes. Whatever context `on_connect`
//! attaches is what every operation on that connection sees.

use crate::core::auth::{self, AuthError};
use crate::core::ctx::Ctx;
use crate::core::resolver::ContextResolver;
use crate::core::session::ConnectionId;
use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;
use tracing::{info, warn};

#[async_trait]
pub trait ConnectionLifecycleHooks: Send + Sync {
    /// Derive and attach the connection's context.
    ///
    /// An `Err` refuses the connection; `Ok(None)` accepts it without a
    /// context.
    async fn on_connect(
        &self,
        connection_id: ConnectionId,
        params: &Value,
    ) -> Result<Option<Arc<Ctx>>, AuthError>;

    /// Release everything owned by the connection
    async fn on_disconnect(&self, connection_id: ConnectionId);
}

/// Hooks backed by the resolver's session table
pub struct SessionHooks {
    resolver: Arc<ContextResolver>,
}

impl SessionHooks {
    pub fn new(resolver: Arc<ContextResolver>) -> Self {
        Self { resolver }
    }
}

#[async_trait]
impl ConnectionLifecycleHooks for SessionHooks {
    async fn on_connect(
        &self,
        connection_id: ConnectionId,
        params: &Value,
    ) -> Result<Option<Arc<Ctx>>, AuthError> {
        info!("[Hooks] websocket connect {}", connection_id);
        info!("[Hooks] connectionParams: {}", params);

        let context = match auth::validate_connection_params(params) {
            Ok(Some(token)) => Some(Arc::new(self.resolver.build_context(&token))),
            Ok(None) => None,
            Err(e) => {
                warn!("[Hooks] refusing {}: {}", connection_id, e);
                return Err(e);
            }
        };

        self.resolver
            .sessions()
            .open(connection_id, context.clone());
        Ok(context)
    }

    async fn on_disconnect(&self, connection_id: ConnectionId) {
        info!("[Hooks] websocket disconnect {}", connection_id);
        self.resolver.sessions().close(connection_id);
    }
}
