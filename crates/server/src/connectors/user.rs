use crate::core::models::{User, UserType};
use crate::core::store::DataSource;
use std::sync::Arc;

#[derive(Clone)]
pub struct UserConnector {
    store: Arc<dyn DataSource>,
}

impl UserConnector {
    pub fn new(store: Arc<dyn DataSource>) -> Self {
        Self { store }
    }

    /// Look up the user of a role category. No match is `None`, not an error.
    pub fn find_user_by_user_type(&self, user_type: UserType) -> Option<User> {
        self.store.user_by_type(user_type)
    }

    /// Interpret a token value as a role name and look the user up.
    ///
    /// Names outside the role table degrade silently to `None`.
    pub fn find_user_by_token(&self, token: &str) -> Option<User> {
        UserType::from_token(token).and_then(|user_type| self.find_user_by_user_type(user_type))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::store::MemoryStore;

    #[test]
    fn test_find_user_by_token() {
        let connector = UserConnector::new(Arc::new(MemoryStore::seeded()));

        let admin = connector.find_user_by_token("ADMIN").unwrap();
        assert_eq!(admin.user_type, UserType::Admin);

        assert!(connector.find_user_by_token("nonexistent").is_none());
    }

    #[test]
    fn test_known_role_without_record_is_absent() {
        let connector = UserConnector::new(Arc::new(MemoryStore::new()));
        assert!(connector.find_user_by_user_type(UserType::User).is_none());
    }
}
