//! Handlers for server
//!
//! `graphql` serves the request branch, `subscriptions` the streaming branch.

pub mod graphql;
pub mod subscriptions;

pub use graphql::{graphql, health_check};
pub use subscriptions::{subscriptions, StreamingConnection};
