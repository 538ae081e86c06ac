use crate::connectors::ConnectorSet;
use crate::core::error::{Error, Result};
use crate::core::models::User;
use axum::{extract::FromRequestParts, http::request::Parts};
use std::sync::Arc;

/// Everything resolver logic may use for one operation: who is calling
/// (possibly nobody known) and the connectors scoped to that operation.
pub struct Ctx {
    user: Option<User>,
    connectors: ConnectorSet,
}

impl Ctx {
    pub fn new(user: Option<User>, connectors: ConnectorSet) -> Self {
        Self { user, connectors }
    }

    pub fn user(&self) -> Option<&User> {
        self.user.as_ref()
    }

    pub fn connectors(&self) -> &ConnectorSet {
        &self.connectors
    }
}

impl std::fmt::Debug for Ctx {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Ctx").field("user", &self.user).finish_non_exhaustive()
    }
}

/// Extractor for the context placed in request extensions by
/// [`mw_resolve_context`](crate::core::auth::middleware::mw_resolve_context).
#[derive(Clone, Debug)]
pub struct ResolvedCtx(pub Arc<Ctx>);

impl<S> FromRequestParts<S> for ResolvedCtx
where
    S: Send + Sync,
{
    type Rejection = Error;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self> {
        parts
            .extensions
            .get::<Arc<Ctx>>()
            .cloned()
            .map(ResolvedCtx)
            .ok_or(Error::CtxNotInRequestExt)
    }
}
