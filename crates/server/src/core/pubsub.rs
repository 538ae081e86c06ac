//! Topic-based publish/subscribe channel for live updates
//!
//! Every subscriber owns an unbounded queue. Publishing fans an event out to
//! the subscribers registered on its topic at that moment; late subscribers
//! get nothing from the past. Dropping a [`Subscription`] unregisters it.

use futures::Stream;
use parking_lot::Mutex;
use serde::Serialize;
use std::collections::HashMap;
use std::pin::Pin;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use std::task::{Context, Poll};
use tokio::sync::mpsc;
use tracing::debug;

/// Topic on which template mutations are published
pub const TEMPLATE_TOPIC: &str = "template";

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Event {
    pub topic: String,
    pub payload: serde_json::Value,
}

type SubscriberList = Vec<(u64, mpsc::UnboundedSender<Event>)>;

#[derive(Default)]
struct Inner {
    topics: Mutex<HashMap<String, SubscriberList>>,
    next_id: AtomicU64,
}

impl Inner {
    fn remove(&self, topic: &str, id: u64) {
        let mut topics = self.topics.lock();
        if let Some(subscribers) = topics.get_mut(topic) {
            subscribers.retain(|(sub_id, _)| *sub_id != id);
            if subscribers.is_empty() {
                topics.remove(topic);
            }
        }
    }
}

/// Cloneable handle to one shared publish/subscribe bus
#[derive(Clone, Default)]
pub struct EventChannel {
    inner: Arc<Inner>,
}

impl EventChannel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Deliver `payload` to every current subscriber of `topic`.
    ///
    /// Returns the number of subscribers that received the event. The topic
    /// table stays locked for the whole fan-out, so concurrent publishers on
    /// one topic are observed in the same order by every subscriber.
    pub fn publish(&self, topic: &str, payload: serde_json::Value) -> usize {
        let event = Event {
            topic: topic.to_string(),
            payload,
        };

        let mut topics = self.inner.topics.lock();
        let Some(subscribers) = topics.get_mut(topic) else {
            debug!("[EventChannel] publish on {} with no subscribers", topic);
            return 0;
        };

        subscribers.retain(|(_, tx)| !tx.is_closed());
        let delivered = subscribers
            .iter()
            .filter(|(_, tx)| tx.send(event.clone()).is_ok())
            .count();

        if subscribers.is_empty() {
            topics.remove(topic);
        }

        debug!("[EventChannel] {} -> {} subscriber(s)", topic, delivered);
        delivered
    }

    /// Register a new subscriber on `topic`
    pub fn subscribe(&self, topic: &str) -> Subscription {
        let id = self.inner.next_id.fetch_add(1, Ordering::Relaxed);
        let (tx, rx) = mpsc::unbounded_channel();

        self.inner
            .topics
            .lock()
            .entry(topic.to_string())
            .or_default()
            .push((id, tx));

        debug!("[EventChannel] subscriber {} joined {}", id, topic);

        Subscription {
            id,
            topic: topic.to_string(),
            rx,
            channel: Arc::downgrade(&self.inner),
        }
    }

    /// Unregister subscriber `id` from `topic`, ending its stream.
    ///
    /// Used when the [`Subscription`] itself lives inside a task that cannot
    /// be dropped synchronously.
    pub fn unsubscribe(&self, topic: &str, id: u64) {
        self.inner.remove(topic, id);
    }

    pub fn subscriber_count(&self, topic: &str) -> usize {
        self.inner
            .topics
            .lock()
            .get(topic)
            .map_or(0, |subscribers| subscribers.len())
    }
}

/// A lazy, unbounded stream of events on one topic.
///
/// The stream ends once the subscription is unregistered; dropping it
/// unregisters it immediately.
#[derive(Debug)]
pub struct Subscription {
    id: u64,
    topic: String,
    rx: mpsc::UnboundedReceiver<Event>,
    channel: Weak<Inner>,
}

impl Subscription {
    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn topic(&self) -> &str {
        &self.topic
    }

    /// Next event, or `None` once the channel is gone
    pub async fn recv(&mut self) -> Option<Event> {
        self.rx.recv().await
    }

    /// Explicitly stop receiving events
    pub fn unsubscribe(self) {
        drop(self);
    }
}

impl Stream for Subscription {
    type Item = Event;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Event>> {
        self.get_mut().rx.poll_recv(cx)
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(inner) = self.channel.upgrade() {
            inner.remove(&self.topic, self.id);
            debug!("[EventChannel] subscriber {} left {}", self.id, self.topic);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::StreamExt;
    use serde_json::json;
    use tokio_test::{assert_pending, assert_ready, assert_ready_eq, task};

    #[tokio::test]
    async fn test_events_arrive_in_publish_order() {
        let channel = EventChannel::new();
        let mut sub = channel.subscribe("t");

        for i in 0..10 {
            assert_eq!(channel.publish("t", json!(i)), 1);
        }

        for i in 0..10 {
            let event = sub.next().await.unwrap();
            assert_eq!(event.topic, "t");
            assert_eq!(event.payload, json!(i));
        }
    }

    #[tokio::test]
    async fn test_no_replay_for_late_subscribers() {
        let channel = EventChannel::new();
        assert_eq!(channel.publish("t", json!("early")), 0);

        let sub = channel.subscribe("t");
        let mut next = task::spawn(sub.into_future());
        assert_pending!(next.poll());

        channel.publish("t", json!("late"));
        assert!(next.is_woken());
        let (event, _sub) = assert_ready!(next.poll());
        assert_eq!(event.unwrap().payload, json!("late"));
    }

    #[test]
    fn test_topics_are_isolated() {
        let channel = EventChannel::new();
        let mut a = task::spawn(channel.subscribe("a"));

        channel.publish("b", json!(1));
        assert_pending!(a.poll_next());

        channel.publish("a", json!(2));
        assert_ready_eq!(
            a.poll_next(),
            Some(Event {
                topic: "a".to_string(),
                payload: json!(2)
            })
        );
    }

    #[test]
    fn test_unsubscribe_releases_subscriber() {
        let channel = EventChannel::new();
        let sub = channel.subscribe("t");
        let other = channel.subscribe("t");
        assert_eq!(channel.subscriber_count("t"), 2);

        sub.unsubscribe();
        assert_eq!(channel.subscriber_count("t"), 1);
        assert_eq!(channel.publish("t", json!(1)), 1);

        drop(other);
        assert_eq!(channel.subscriber_count("t"), 0);
        assert_eq!(channel.publish("t", json!(2)), 0);
    }

    #[tokio::test]
    async fn test_unsubscribe_by_id_ends_stream() {
        let channel = EventChannel::new();
        let mut sub = channel.subscribe("t");
        channel.publish("t", json!("before"));

        channel.unsubscribe("t", sub.id());
        channel.publish("t", json!("after"));

        // Already-queued events drain, then the stream ends
        assert_eq!(sub.recv().await.unwrap().payload, json!("before"));
        assert!(sub.recv().await.is_none());
    }
}
