//! Context resolution
//!
//! Every inbound operation is resolved into a [`Ctx`] here, on one of two
//! branches:
//!
//! - **request**: validate the token, interpret it as a role name, look the
//!   user up and build a brand-new [`ConnectorSet`]. Nothing is shared with
//!   any other operation except the store itself.
//! - **streaming**: hand back the context pinned to the connection when it
//!   opened. The token is not looked at again.

use crate::connectors::{ConnectorSet, UserConnector};
use crate::core::auth::{self, AuthError, Token};
use crate::core::ctx::Ctx;
use crate::core::pubsub::EventChannel;
use crate::core::session::{ConnectionId, SessionTable};
use crate::core::store::DataSource;
use http::HeaderMap;
use std::sync::Arc;
use tracing::debug;

/// The two shapes of inbound call
#[derive(Debug, Clone, Copy)]
pub enum Inbound<'a> {
    /// A transient request/response operation (query or mutation)
    Request(&'a HeaderMap),
    /// An operation sent over an open streaming connection
    Streaming(ConnectionId),
}

pub struct ContextResolver {
    store: Arc<dyn DataSource>,
    events: EventChannel,
    sessions: Arc<SessionTable>,
}

impl ContextResolver {
    pub fn new(store: Arc<dyn DataSource>, events: EventChannel, sessions: Arc<SessionTable>) -> Self {
        Self {
            store,
            events,
            sessions,
        }
    }

    /// Resolve the context for one inbound operation.
    ///
    /// The request branch always yields `Some` or an [`AuthError`]. The
    /// streaming branch never fails and yields `None` when nothing was
    /// attached at connect time.
    pub fn resolve(&self, inbound: Inbound<'_>) -> Result<Option<Arc<Ctx>>, AuthError> {
        match inbound {
            Inbound::Request(headers) => self.resolve_request(headers).map(Some),
            Inbound::Streaming(connection_id) => Ok(self.resolve_streaming(connection_id)),
        }
    }

    pub fn resolve_request(&self, headers: &HeaderMap) -> Result<Arc<Ctx>, AuthError> {
        let token = auth::validate_token(headers)?;
        Ok(Arc::new(self.build_context(&token)))
    }

    pub fn resolve_streaming(&self, connection_id: ConnectionId) -> Option<Arc<Ctx>> {
        let ctx = self.sessions.context(connection_id);
        if ctx.is_none() {
            debug!("[Resolver] {} has no attached context", connection_id);
        }
        ctx
    }

    /// Build a fresh context for a validated token.
    ///
    /// A token naming no known role produces a context without a user.
    pub fn build_context(&self, token: &Token) -> Ctx {
        let user_connector = UserConnector::new(self.store.clone());
        let user = user_connector.find_user_by_token(token.as_str());

        match &user {
            Some(user) => debug!("[Resolver] token resolved to {} ({})", user.user_type, user.id),
            None => debug!("[Resolver] token {:?} matches no known user", token.as_str()),
        }

        let connectors =
            ConnectorSet::with_user_connector(user_connector, self.store.clone(), self.events.clone());
        Ctx::new(user, connectors)
    }

    pub fn sessions(&self) -> &Arc<SessionTable> {
        &self.sessions
    }

    pub fn events(&self) -> &EventChannel {
        &self.events
    }
}
