use crate::core::models::{NewTemplate, Template, TemplatePatch};
use crate::core::pubsub::{EventChannel, TEMPLATE_TOPIC};
use crate::core::store::DataSource;
use std::sync::Arc;
use tracing::{info, warn};

/// Template access. Every mutation is published on [`TEMPLATE_TOPIC`].
#[derive(Clone)]
pub struct TemplateConnector {
    store: Arc<dyn DataSource>,
    events: EventChannel,
}

impl TemplateConnector {
    pub fn new(store: Arc<dyn DataSource>, events: EventChannel) -> Self {
        Self { store, events }
    }

    pub fn find_template(&self, id: &str) -> Option<Template> {
        self.store.template(id)
    }

    pub fn all_templates(&self) -> Vec<Template> {
        self.store.templates()
    }

    pub fn add_template(&self, input: NewTemplate) -> Template {
        let template = Template::new(input.name, input.content);
        self.store
            .insert_template(template.clone(), &|committed| self.publish(committed));
        template
    }

    /// Apply a partial update. Unknown ids yield `None` and publish nothing.
    ///
    /// The event is published inside the store write, so subscribers see
    /// updates in the order the store applied them.
    pub fn update_template(&self, id: &str, patch: TemplatePatch) -> Option<Template> {
        self.store
            .update_template(id, patch, &|committed| self.publish(committed))
    }

    fn publish(&self, template: &Template) {
        match serde_json::to_value(template) {
            Ok(payload) => {
                let delivered = self.events.publish(TEMPLATE_TOPIC, payload);
                info!(
                    "[TemplateConnector] published {} to {} subscriber(s)",
                    template.id, delivered
                );
            }
            Err(e) => warn!("Failed to serialize template {}: {}", template.id, e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::store::MemoryStore;
    use futures::{FutureExt, StreamExt};

    fn connector() -> (TemplateConnector, EventChannel) {
        let events = EventChannel::new();
        let connector = TemplateConnector::new(Arc::new(MemoryStore::seeded()), events.clone());
        (connector, events)
    }

    #[tokio::test]
    async fn test_update_publishes_updated_template() {
        let (connector, events) = connector();
        let mut sub = events.subscribe(TEMPLATE_TOPIC);

        let updated = connector
            .update_template(
                "welcome",
                TemplatePatch {
                    name: Some("Greeting".to_string()),
                    content: None,
                },
            )
            .unwrap();

        let event = sub.next().await.unwrap();
        assert_eq!(event.topic, TEMPLATE_TOPIC);
        assert_eq!(event.payload, serde_json::to_value(&updated).unwrap());
        assert_eq!(event.payload["name"], "Greeting");
    }

    #[tokio::test]
    async fn test_add_publishes() {
        let (connector, events) = connector();
        let mut sub = events.subscribe(TEMPLATE_TOPIC);

        let added = connector.add_template(NewTemplate {
            name: "Invoice".to_string(),
            content: "Total: {{amount}}".to_string(),
        });

        let event = sub.next().await.unwrap();
        assert_eq!(event.payload["id"], added.id.as_str());
        assert_eq!(connector.find_template(&added.id), Some(added));
    }

    #[test]
    fn test_unknown_template_update_publishes_nothing() {
        let (connector, events) = connector();
        let mut sub = tokio_test::task::spawn(events.subscribe(TEMPLATE_TOPIC));

        assert!(connector
            .update_template("missing", TemplatePatch::default())
            .is_none());
        tokio_test::assert_pending!(sub.poll_next());
    }

    #[test]
    fn test_concurrent_updates_publish_in_write_order() {
        for round in 0..20 {
            let store: Arc<dyn DataSource> = Arc::new(MemoryStore::seeded());
            let events = EventChannel::new();
            let mut sub = events.subscribe(TEMPLATE_TOPIC);

            // One connector per writer, as with separate request contexts
            let handles: Vec<_> = (0..4)
                .map(|i| {
                    let connector = TemplateConnector::new(store.clone(), events.clone());
                    std::thread::spawn(move || {
                        for j in 0..50 {
                            connector.update_template(
                                "welcome",
                                TemplatePatch {
                                    name: Some(format!("{}-{}", i, j)),
                                    content: None,
                                },
                            );
                        }
                    })
                })
                .collect();
            for handle in handles {
                handle.join().unwrap();
            }

            let mut last = None;
            while let Some(Some(event)) = sub.next().now_or_never() {
                last = Some(event);
            }

            let last = last.unwrap();
            let stored = store.template("welcome").unwrap();
            assert_eq!(
                last.payload,
                serde_json::to_value(&stored).unwrap(),
                "round {}",
                round
            );
        }
    }
}
