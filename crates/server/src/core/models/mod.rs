use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Role category of a user.
///
/// An identity token is interpreted directly as the name of one of these
/// categories, so the token `"ADMIN"` means [`UserType::Admin`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UserType {
    Admin,
    User,
    Guest,
}

/// Explicit token-name to role table. Matching is exact and case-sensitive.
const USER_TYPE_NAMES: [(&str, UserType); 3] = [
    ("ADMIN", UserType::Admin),
    ("USER", UserType::User),
    ("GUEST", UserType::Guest),
];

impl UserType {
    /// Map a role-category name to a role. Unknown names yield `None`.
    pub fn from_token(name: &str) -> Option<Self> {
        USER_TYPE_NAMES
            .iter()
            .find(|(key, _)| *key == name)
            .map(|(_, user_type)| *user_type)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            UserType::Admin => "ADMIN",
            UserType::User => "USER",
            UserType::Guest => "GUEST",
        }
    }

    pub fn all() -> impl Iterator<Item = UserType> {
        USER_TYPE_NAMES.iter().map(|(_, user_type)| *user_type)
    }
}

impl std::fmt::Display for UserType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A user profile, one per role category
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub name: String,
    pub email: String,
    pub user_type: UserType,
}

impl User {
    pub fn new(name: impl Into<String>, email: impl Into<String>, user_type: UserType) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            name: name.into(),
            email: email.into(),
            user_type,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub id: String,
    pub name: String,
    pub address: String,
    pub latitude: f64,
    pub longitude: f64,
}

/// Fields accepted when creating a location
#[derive(Debug, Clone, Deserialize)]
pub struct NewLocation {
    pub name: String,
    pub address: String,
    #[serde(default)]
    pub latitude: f64,
    #[serde(default)]
    pub longitude: f64,
}

impl From<NewLocation> for Location {
    fn from(input: NewLocation) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            name: input.name,
            address: input.address,
            latitude: input.latitude,
            longitude: input.longitude,
        }
    }
}

/// A template record. Changes to templates are published to live subscribers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Template {
    pub id: String,
    pub name: String,
    pub content: String,
    pub updated_at: DateTime<Utc>,
}

impl Template {
    pub fn new(name: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            name: name.into(),
            content: content.into(),
            updated_at: Utc::now(),
        }
    }
}

/// Fields accepted when creating a template
#[derive(Debug, Clone, Deserialize)]
pub struct NewTemplate {
    pub name: String,
    #[serde(default)]
    pub content: String,
}

/// Partial update of a template; `None` fields are left untouched
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TemplatePatch {
    pub name: Option<String>,
    pub content: Option<String>,
}

impl TemplatePatch {
    pub fn apply(self, template: &mut Template) {
        if let Some(name) = self.name {
            template.name = name;
        }
        if let Some(content) = self.content {
            template.content = content;
        }
        template.updated_at = Utc::now();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_type_from_token() {
        assert_eq!(UserType::from_token("ADMIN"), Some(UserType::Admin));
        assert_eq!(UserType::from_token("GUEST"), Some(UserType::Guest));
        assert_eq!(UserType::from_token("nonexistent"), None);
        // Enum keys are matched exactly
        assert_eq!(UserType::from_token("admin"), None);
    }

    #[test]
    fn test_user_type_serializes_as_token_name() {
        for user_type in UserType::all() {
            let json = serde_json::to_value(user_type).unwrap();
            assert_eq!(json, user_type.as_str());
            assert_eq!(UserType::from_token(user_type.as_str()), Some(user_type));
        }
    }

    #[test]
    fn test_template_patch_keeps_missing_fields() {
        let mut template = Template::new("Welcome", "Hello {{name}}");
        let before = template.updated_at;

        TemplatePatch {
            name: None,
            content: Some("Hi {{name}}".to_string()),
        }
        .apply(&mut template);

        assert_eq!(template.name, "Welcome");
        assert_eq!(template.content, "Hi {{name}}");
        assert!(template.updated_at >= before);
    }
}
