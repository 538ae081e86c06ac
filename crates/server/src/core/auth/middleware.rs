use crate::core::config::AppState;
use crate::core::error::Result;
use crate::core::resolver::Inbound;
use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use tracing::{debug, warn};

/// Resolve the request-branch context and store it in request extensions.
///
/// An invalid or missing token fails the whole request; no partial context
/// is handed on.
pub async fn mw_resolve_context(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response> {
    debug!("MIDDLEWARE: resolve_context");

    let ctx = state
        .resolver
        .resolve(Inbound::Request(req.headers()))
        .inspect_err(|e| warn!("Request rejected: {}", e))?;

    if let Some(ctx) = ctx {
        req.extensions_mut().insert(ctx);
    }

    Ok(next.run(req).await)
}
