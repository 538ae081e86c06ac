//! Core Service Layer
//!
//! Context resolution and everything it binds together: authentication,
//! the data store, the event channel and the streaming session table.

pub mod auth;
pub mod config;
pub mod ctx;
pub mod error;
pub mod hooks;
pub mod models;
pub mod pubsub;
pub mod resolver;
pub mod router;
pub mod session;
pub mod store;

// Re-exports for convenience
pub use config::{AppState, ServerConfig};
pub use ctx::Ctx;
pub use error::{Error, Result};
pub use resolver::{ContextResolver, Inbound};
pub use router::router;
