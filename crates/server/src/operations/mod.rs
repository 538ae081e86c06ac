//! Operation dispatch
//!
//! A deliberately small GraphQL-style surface: each operation names one
//! field, runs against a resolved [`Ctx`] and answers with a
//! `{"data": {<field>: ...}}` or `{"errors": [...]}` envelope.

use crate::core::ctx::Ctx;
use crate::core::models::{NewLocation, NewTemplate, TemplatePatch};
use crate::core::pubsub::TEMPLATE_TOPIC;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationKind {
    Query,
    Mutation,
    Subscription,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "operation", rename_all = "camelCase")]
pub enum Operation {
    // Queries
    Me,
    Location { id: String },
    Locations,
    Template { id: String },
    Templates,

    // Mutations
    AddLocation(NewLocation),
    AddTemplate(NewTemplate),
    UpdateTemplate {
        id: String,
        name: Option<String>,
        content: Option<String>,
    },

    // Subscriptions
    TemplateChanged,
}

impl Operation {
    pub fn kind(&self) -> OperationKind {
        match self {
            Operation::Me
            | Operation::Location { .. }
            | Operation::Locations
            | Operation::Template { .. }
            | Operation::Templates => OperationKind::Query,
            Operation::AddLocation(_)
            | Operation::AddTemplate(_)
            | Operation::UpdateTemplate { .. } => OperationKind::Mutation,
            Operation::TemplateChanged => OperationKind::Subscription,
        }
    }

    /// Name of the result field in the `data` object
    pub fn field_name(&self) -> &'static str {
        match self {
            Operation::Me => "me",
            Operation::Location { .. } => "location",
            Operation::Locations => "locations",
            Operation::Template { .. } => "template",
            Operation::Templates => "templates",
            Operation::AddLocation(_) => "addLocation",
            Operation::AddTemplate(_) => "addTemplate",
            Operation::UpdateTemplate { .. } => "updateTemplate",
            Operation::TemplateChanged => "templateChanged",
        }
    }

    /// Event topic a subscription listens on
    pub fn topic(&self) -> Option<&'static str> {
        match self {
            Operation::TemplateChanged => Some(TEMPLATE_TOPIC),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OperationError {
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OperationResult {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<OperationError>,
}

impl OperationResult {
    pub fn data(field: &str, value: Value) -> Self {
        Self {
            data: Some(json!({ field: value })),
            errors: Vec::new(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            data: None,
            errors: vec![OperationError {
                message: message.into(),
            }],
        }
    }

    pub fn is_ok(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Run a query or mutation.
///
/// A missing context (a streaming connection that attached none) is reported
/// as `unauthenticated`. A context whose user is absent is still served:
/// `me` answers `null`.
pub fn execute(ctx: Option<&Ctx>, operation: Operation) -> OperationResult {
    let Some(ctx) = ctx else {
        return OperationResult::error("unauthenticated");
    };

    let field = operation.field_name();
    debug!("[Operations] executing {}", field);

    let connectors = ctx.connectors();
    let value = match operation {
        Operation::Me => serde_json::to_value(ctx.user()),
        Operation::Location { id } => serde_json::to_value(connectors.location_connector.find_location(&id)),
        Operation::Locations => serde_json::to_value(connectors.location_connector.all_locations()),
        Operation::Template { id } => serde_json::to_value(connectors.template_connector.find_template(&id)),
        Operation::Templates => serde_json::to_value(connectors.template_connector.all_templates()),
        Operation::AddLocation(input) => serde_json::to_value(connectors.location_connector.add_location(input)),
        Operation::AddTemplate(input) => serde_json::to_value(connectors.template_connector.add_template(input)),
        Operation::UpdateTemplate { id, name, content } => serde_json::to_value(
            connectors
                .template_connector
                .update_template(&id, TemplatePatch { name, content }),
        ),
        Operation::TemplateChanged => {
            return OperationResult::error("subscriptions require a streaming connection");
        }
    };

    match value {
        Ok(value) => OperationResult::data(field, value),
        Err(e) => OperationResult::error(e.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connectors::ConnectorSet;
    use crate::core::models::UserType;
    use crate::core::pubsub::EventChannel;
    use crate::core::store::{DataSource, MemoryStore};
    use std::sync::Arc;

    fn ctx_for(user_type: Option<UserType>) -> Ctx {
        let store = Arc::new(MemoryStore::seeded());
        let user = user_type.and_then(|t| store.user_by_type(t));
        Ctx::new(user, ConnectorSet::new(store, EventChannel::new()))
    }

    fn parse(value: Value) -> Operation {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_operation_parsing() {
        assert!(matches!(parse(json!({"operation": "me"})), Operation::Me));
        assert!(matches!(
            parse(json!({"operation": "template", "id": "welcome"})),
            Operation::Template { id } if id == "welcome"
        ));
        assert!(matches!(
            parse(json!({"operation": "updateTemplate", "id": "welcome", "content": "x"})),
            Operation::UpdateTemplate { name: None, content: Some(_), .. }
        ));
        assert_eq!(
            parse(json!({"operation": "templateChanged"})).kind(),
            OperationKind::Subscription
        );
        assert!(serde_json::from_value::<Operation>(json!({"operation": "dropTables"})).is_err());
    }

    #[test]
    fn test_me_with_known_and_absent_user() {
        let result = execute(Some(&ctx_for(Some(UserType::Admin))), Operation::Me);
        assert_eq!(result.data.unwrap()["me"]["userType"], "ADMIN");

        let result = execute(Some(&ctx_for(None)), Operation::Me);
        assert!(result.is_ok());
        assert_eq!(result.data.unwrap(), json!({"me": null}));
    }

    #[test]
    fn test_missing_context_is_unauthenticated() {
        let result = execute(None, Operation::Templates);
        assert_eq!(result.errors[0].message, "unauthenticated");
        assert!(result.data.is_none());
    }

    #[test]
    fn test_unknown_keys_are_null_not_errors() {
        let ctx = ctx_for(Some(UserType::User));
        let result = execute(
            Some(&ctx),
            Operation::Location {
                id: "nowhere".to_string(),
            },
        );
        assert_eq!(result, OperationResult::data("location", Value::Null));
    }

    #[test]
    fn test_subscription_is_not_executed_directly() {
        let result = execute(Some(&ctx_for(None)), Operation::TemplateChanged);
        assert!(!result.is_ok());
    }
}
