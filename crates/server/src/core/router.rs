//! Core Router
//!
//! `/graphql` sits behind the context-resolving middleware; the streaming
//! endpoint resolves its context through the lifecycle hooks instead.

use crate::core::auth::middleware::mw_resolve_context;
use crate::core::AppState;
use crate::handlers::{graphql, health_check, subscriptions};
use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

pub fn router(state: AppState) -> Router {
    let request_routes = Router::new()
        .route("/graphql", post(graphql))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            mw_resolve_context,
        ));

    Router::new()
        .merge(request_routes)
        .route("/subscriptions", get(subscriptions))
        .route("/health", get(health_check))
        .with_state(state)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive()),
        )
}
