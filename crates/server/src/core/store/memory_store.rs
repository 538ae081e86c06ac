//! Process-lifetime store backed by locked hash maps
//!
//! Each collection sits behind its own lock. Reads clone the record while
//! holding the read lock, so a caller always sees a whole record; writes to
//! the same collection are serialized.

use super::DataSource;
use crate::core::models::{Location, Template, TemplatePatch, User, UserType};
use parking_lot::RwLock;
use std::collections::HashMap;
use tracing::{debug, info};

#[derive(Default)]
pub struct MemoryStore {
    users: RwLock<HashMap<UserType, User>>,
    locations: RwLock<HashMap<String, Location>>,
    templates: RwLock<HashMap<String, Template>>,
}

impl MemoryStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store populated with one user per role and a few sample records
    pub fn seeded() -> Self {
        let store = Self::new();

        store.insert_user(User::new("Ada Admin", "admin@waypoint.local", UserType::Admin));
        store.insert_user(User::new("Uma User", "user@waypoint.local", UserType::User));
        store.insert_user(User::new("Gus Guest", "guest@waypoint.local", UserType::Guest));

        store.insert_location(Location {
            id: "hq".to_string(),
            name: "Headquarters".to_string(),
            address: "1 Main Street".to_string(),
            latitude: 51.5072,
            longitude: -0.1276,
        });
        store.insert_location(Location {
            id: "depot".to_string(),
            name: "North Depot".to_string(),
            address: "42 Canal Road".to_string(),
            latitude: 53.4808,
            longitude: -2.2426,
        });

        let mut welcome = Template::new("Welcome", "Hello {{name}}, welcome aboard.");
        welcome.id = "welcome".to_string();
        store.templates.write().insert(welcome.id.clone(), welcome);

        let mut reminder = Template::new("Reminder", "Your visit to {{location}} is tomorrow.");
        reminder.id = "reminder".to_string();
        store.templates.write().insert(reminder.id.clone(), reminder);

        info!(
            "MemoryStore seeded: {} users, {} locations, {} templates",
            store.users.read().len(),
            store.locations.read().len(),
            store.templates.read().len()
        );

        store
    }
}

impl DataSource for MemoryStore {
    fn user_by_type(&self, user_type: UserType) -> Option<User> {
        self.users.read().get(&user_type).cloned()
    }

    fn insert_user(&self, user: User) {
        self.users.write().insert(user.user_type, user);
    }

    fn location(&self, id: &str) -> Option<Location> {
        self.locations.read().get(id).cloned()
    }

    fn locations(&self) -> Vec<Location> {
        let mut locations: Vec<_> = self.locations.read().values().cloned().collect();
        locations.sort_by(|a, b| a.id.cmp(&b.id));
        locations
    }

    fn insert_location(&self, location: Location) {
        self.locations.write().insert(location.id.clone(), location);
    }

    fn template(&self, id: &str) -> Option<Template> {
        self.templates.read().get(id).cloned()
    }

    fn templates(&self) -> Vec<Template> {
        let mut templates: Vec<_> = self.templates.read().values().cloned().collect();
        templates.sort_by(|a, b| a.id.cmp(&b.id));
        templates
    }

    fn insert_template(&self, template: Template, on_commit: &dyn Fn(&Template)) {
        let mut templates = self.templates.write();
        on_commit(&template);
        templates.insert(template.id.clone(), template);
    }

    fn update_template(
        &self,
        id: &str,
        patch: TemplatePatch,
        on_commit: &dyn Fn(&Template),
    ) -> Option<Template> {
        let mut templates = self.templates.write();
        let template = templates.get_mut(id)?;
        patch.apply(template);
        debug!("Updated template {}", id);
        on_commit(template);
        Some(template.clone())
    }
}
