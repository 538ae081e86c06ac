use crate::core::ctx::ResolvedCtx;
use crate::operations::{self, Operation, OperationResult};
use axum::Json;
use tracing::info;

/// POST /graphql
///
/// Runs one query or mutation against the context resolved by
/// `mw_resolve_context`. Subscriptions are only served over `/subscriptions`.
pub async fn graphql(
    ResolvedCtx(ctx): ResolvedCtx,
    Json(operation): Json<Operation>,
) -> Json<OperationResult> {
    info!(
        "POST /graphql - {} ({:?})",
        operation.field_name(),
        operation.kind()
    );

    Json(operations::execute(Some(&ctx), operation))
}

pub async fn health_check() -> &'static str {
    "OK - Waypoint Server"
}
