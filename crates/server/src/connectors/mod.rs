//! Entity-scoped data-access objects
//!
//! A [`ConnectorSet`] is the least-privilege view of the store handed to one
//! operation (or one streaming connection). Every call to
//! [`ConnectorSet::new`] builds fresh connector instances.

pub mod location;
pub mod template;
pub mod user;

pub use location::LocationConnector;
pub use template::TemplateConnector;
pub use user::UserConnector;

use crate::core::pubsub::EventChannel;
use crate::core::store::DataSource;
use std::sync::Arc;

#[derive(Clone)]
pub struct ConnectorSet {
    pub user_connector: UserConnector,
    pub location_connector: LocationConnector,
    pub template_connector: TemplateConnector,
}

impl ConnectorSet {
    pub fn new(store: Arc<dyn DataSource>, events: EventChannel) -> Self {
        Self::with_user_connector(UserConnector::new(store.clone()), store, events)
    }

    /// Build a set around an already constructed user connector
    pub fn with_user_connector(
        user_connector: UserConnector,
        store: Arc<dyn DataSource>,
        events: EventChannel,
    ) -> Self {
        Self {
            user_connector,
            location_connector: LocationConnector::new(store.clone()),
            template_connector: TemplateConnector::new(store, events),
        }
    }
}
