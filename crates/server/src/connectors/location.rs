use crate::core::models::{Location, NewLocation};
use crate::core::store::DataSource;
use std::sync::Arc;

#[derive(Clone)]
pub struct LocationConnector {
    store: Arc<dyn DataSource>,
}

impl LocationConnector {
    pub fn new(store: Arc<dyn DataSource>) -> Self {
        Self { store }
    }

    pub fn find_location(&self, id: &str) -> Option<Location> {
        self.store.location(id)
    }

    pub fn all_locations(&self) -> Vec<Location> {
        self.store.locations()
    }

    pub fn add_location(&self, input: NewLocation) -> Location {
        let location = Location::from(input);
        self.store.insert_location(location.clone());
        location
    }
}
