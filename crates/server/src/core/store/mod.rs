//! In-memory data store
//!
//! One store instance is built by the process entry point and shared by
//! `Arc` with every connector and the context resolver.

pub mod memory_store;

pub use memory_store::MemoryStore;

use crate::core::models::{Location, Template, TemplatePatch, User, UserType};

/// Keyed access to the domain records.
///
/// Lookups return `None` when a key has no record; absence is never an error.
pub trait DataSource: Send + Sync {
    fn user_by_type(&self, user_type: UserType) -> Option<User>;
    fn insert_user(&self, user: User);

    fn location(&self, id: &str) -> Option<Location>;
    fn locations(&self) -> Vec<Location>;
    fn insert_location(&self, location: Location);

    fn template(&self, id: &str) -> Option<Template>;
    fn templates(&self) -> Vec<Template>;
    /// Insert a template. `on_commit` runs before the write lock is released.
    fn insert_template(&self, template: Template, on_commit: &dyn Fn(&Template));

    /// Apply `patch` to the template `id` as one serialized write.
    ///
    /// `on_commit` sees the updated record before the write lock is released,
    /// so anything it publishes is ordered like the writes themselves.
    fn update_template(
        &self,
        id: &str,
        patch: TemplatePatch,
        on_commit: &dyn Fn(&Template),
    ) -> Option<Template>;
}
