//! Streaming session table
//!
//! One entry per open streaming connection, created by `on_connect` and
//! removed by `on_disconnect`. The entry pins the connection's context for
//! its whole lifetime and owns the connection's event subscriptions.

use crate::core::ctx::Ctx;
use crate::core::pubsub::EventChannel;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{debug, info};
use uuid::Uuid;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ConnectionId(Uuid);

impl ConnectionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ConnectionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "conn_{}", self.0)
    }
}

/// An event subscription forwarded to the client by a background task
struct ActiveSubscription {
    topic: String,
    subscriber_id: u64,
    task: JoinHandle<()>,
}

struct Session {
    context: Option<Arc<Ctx>>,
    subscriptions: HashMap<String, ActiveSubscription>,
}

pub struct SessionTable {
    sessions: RwLock<HashMap<ConnectionId, Session>>,
    events: EventChannel,
}

impl SessionTable {
    pub fn new(events: EventChannel) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            events,
        }
    }

    /// Register a connection with the context it keeps until disconnect.
    ///
    /// Opening an id that is already open replaces (and releases) the old session.
    pub fn open(&self, connection_id: ConnectionId, context: Option<Arc<Ctx>>) {
        let previous = self.sessions.write().insert(
            connection_id,
            Session {
                context,
                subscriptions: HashMap::new(),
            },
        );
        if let Some(previous) = previous {
            self.release(connection_id, previous);
        }
    }

    /// The context attached at connect time, if any
    pub fn context(&self, connection_id: ConnectionId) -> Option<Arc<Ctx>> {
        self.sessions
            .read()
            .get(&connection_id)
            .and_then(|session| session.context.clone())
    }

    pub fn is_open(&self, connection_id: ConnectionId) -> bool {
        self.sessions.read().contains_key(&connection_id)
    }

    /// Record a forwarding task for `operation_id`.
    ///
    /// If the connection is already gone the subscription is released at once
    /// and `false` is returned. An existing subscription under the same
    /// operation id is stopped first.
    pub fn attach_subscription(
        &self,
        connection_id: ConnectionId,
        operation_id: &str,
        topic: &str,
        subscriber_id: u64,
        task: JoinHandle<()>,
    ) -> bool {
        let active = ActiveSubscription {
            topic: topic.to_string(),
            subscriber_id,
            task,
        };

        let outcome = match self.sessions.write().get_mut(&connection_id) {
            Some(session) => Ok(session
                .subscriptions
                .insert(operation_id.to_string(), active)),
            None => Err(active),
        };

        match outcome {
            Ok(replaced) => {
                if let Some(replaced) = replaced {
                    self.stop(replaced);
                }
                true
            }
            Err(orphan) => {
                self.stop(orphan);
                false
            }
        }
    }

    /// Stop one subscription of a connection. Returns whether it existed.
    pub fn detach_subscription(&self, connection_id: ConnectionId, operation_id: &str) -> bool {
        let removed = self
            .sessions
            .write()
            .get_mut(&connection_id)
            .and_then(|session| session.subscriptions.remove(operation_id));

        match removed {
            Some(active) => {
                self.stop(active);
                true
            }
            None => false,
        }
    }

    pub fn subscription_count(&self, connection_id: ConnectionId) -> usize {
        self.sessions
            .read()
            .get(&connection_id)
            .map_or(0, |session| session.subscriptions.len())
    }

    /// Remove a connection and release every subscription it owns.
    /// Returns whether the connection was open.
    pub fn close(&self, connection_id: ConnectionId) -> bool {
        let removed = self.sessions.write().remove(&connection_id);
        match removed {
            Some(session) => {
                self.release(connection_id, session);
                true
            }
            None => false,
        }
    }

    pub fn len(&self) -> usize {
        self.sessions.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.read().is_empty()
    }

    fn release(&self, connection_id: ConnectionId, session: Session) {
        let count = session.subscriptions.len();
        for (_, active) in session.subscriptions {
            self.stop(active);
        }
        info!("[Sessions] {} released {} subscription(s)", connection_id, count);
    }

    fn stop(&self, active: ActiveSubscription) {
        // Unregistering first ends the stream even before the abort lands
        self.events.unsubscribe(&active.topic, active.subscriber_id);
        active.task.abort();
        debug!(
            "[Sessions] stopped subscriber {} on {}",
            active.subscriber_id, active.topic
        );
    }
}
