//! Streaming endpoint
//!
//! GET /subscriptions upgrades to a WebSocket speaking `graphql-ws`. The
//! connection's context is fixed by `connection_init` (through the lifecycle
//! hooks) and reused for every operation started on it afterwards.

use crate::core::config::AppState;
use crate::core::session::ConnectionId;
use crate::operations::{self, Operation, OperationResult};
use crate::protocol::{ClientMessage, ErrorPayload, ServerMessage, SUBPROTOCOL};
use axum::extract::ws::{Message as WsMessage, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::response::IntoResponse;
use futures::{SinkExt, StreamExt};
use serde_json::Value;
use std::ops::ControlFlow;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

/// GET /subscriptions
pub async fn subscriptions(ws: WebSocketUpgrade, State(state): State<AppState>) -> impl IntoResponse {
    ws.protocols([SUBPROTOCOL])
        .on_upgrade(move |socket| handle_socket(socket, state))
}

/// Split the socket into a writer task fed by a queue and a reader loop
/// that drives the [`StreamingConnection`].
async fn handle_socket(socket: WebSocket, state: AppState) {
    let (mut sink, mut stream) = socket.split();
    let (tx, mut rx) = mpsc::unbounded_channel::<ServerMessage>();
    let keepalive_secs = state.config.keepalive_secs.max(1);

    let mut connection = StreamingConnection::new(state, tx.clone());
    let connection_id = connection.id();
    info!("[Subscriptions] client connected {}", connection_id);

    let writer = tokio::spawn(async move {
        while let Some(message) = rx.recv().await {
            let text = match serde_json::to_string(&message) {
                Ok(text) => text,
                Err(e) => {
                    warn!("[Subscriptions] failed to encode {:?}: {}", message, e);
                    continue;
                }
            };
            if sink.send(WsMessage::Text(text.into())).await.is_err() {
                break;
            }
        }
        let _ = sink.close().await;
    });

    let mut keepalive = tokio::time::interval(Duration::from_secs(keepalive_secs));

    loop {
        tokio::select! {
            frame = stream.next() => {
                let text = match frame {
                    Some(Ok(WsMessage::Text(text))) => text,
                    Some(Ok(WsMessage::Close(_))) | None => break,
                    Some(Ok(_)) => continue,
                    Some(Err(e)) => {
                        warn!("[Subscriptions] {} read error: {}", connection_id, e);
                        break;
                    }
                };
                if connection.handle_text(text.as_str()).await.is_break() {
                    break;
                }
            }
            _ = keepalive.tick(), if connection.is_initialized() => {
                let _ = tx.send(ServerMessage::KeepAlive);
            }
        }
    }

    connection.close().await;
    drop(tx);
    let _ = writer.await;
    info!("[Subscriptions] client disconnected {}", connection_id);
}

/// Protocol state of one streaming connection, independent of the socket.
///
/// Outbound messages go to the queue given at construction.
pub struct StreamingConnection {
    id: ConnectionId,
    state: AppState,
    tx: mpsc::UnboundedSender<ServerMessage>,
    initialized: bool,
}

impl StreamingConnection {
    pub fn new(state: AppState, tx: mpsc::UnboundedSender<ServerMessage>) -> Self {
        Self {
            id: ConnectionId::new(),
            state,
            tx,
            initialized: false,
        }
    }

    pub fn id(&self) -> ConnectionId {
        self.id
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// Handle one text frame. `Break` means the connection should close.
    pub async fn handle_text(&mut self, text: &str) -> ControlFlow<()> {
        match serde_json::from_str::<ClientMessage>(text) {
            Ok(message) => self.handle(message).await,
            Err(e) => {
                debug!("[Subscriptions] {} sent invalid message: {}", self.id, e);
                self.send(ServerMessage::ConnectionError {
                    payload: ErrorPayload::new(format!("Invalid message: {}", e)),
                });
                ControlFlow::Continue(())
            }
        }
    }

    pub async fn handle(&mut self, message: ClientMessage) -> ControlFlow<()> {
        match message {
            ClientMessage::ConnectionInit { payload } => self.init(payload).await,
            ClientMessage::Start { id, payload } => {
                self.start(id, payload);
                ControlFlow::Continue(())
            }
            ClientMessage::Stop { id } => {
                self.stop(&id);
                ControlFlow::Continue(())
            }
            ClientMessage::ConnectionTerminate => ControlFlow::Break(()),
        }
    }

    /// Run the disconnect hook; releases the session and its subscriptions
    pub async fn close(self) {
        self.state.hooks.on_disconnect(self.id).await;
    }

    async fn init(&mut self, params: Value) -> ControlFlow<()> {
        if self.initialized {
            self.send(ServerMessage::ConnectionError {
                payload: ErrorPayload::new("connection already initialized"),
            });
            return ControlFlow::Continue(());
        }

        match self.state.hooks.on_connect(self.id, &params).await {
            Ok(ctx) => {
                self.initialized = true;
                debug!(
                    "[Subscriptions] {} initialized (context attached: {})",
                    self.id,
                    ctx.is_some()
                );
                self.send(ServerMessage::ConnectionAck);
                ControlFlow::Continue(())
            }
            Err(e) => {
                self.send(ServerMessage::ConnectionError {
                    payload: ErrorPayload::new(e.to_string()),
                });
                ControlFlow::Break(())
            }
        }
    }

    fn start(&self, id: String, payload: Value) {
        if !self.initialized {
            self.send(ServerMessage::Error {
                id,
                payload: ErrorPayload::new("connection not initialized"),
            });
            return;
        }

        let operation = match serde_json::from_value::<Operation>(payload) {
            Ok(operation) => operation,
            Err(e) => {
                debug!("[Subscriptions] {} sent invalid operation {}: {}", self.id, id, e);
                self.send(ServerMessage::Error {
                    id,
                    payload: ErrorPayload::new(format!("Invalid operation: {}", e)),
                });
                return;
            }
        };

        if let Some(topic) = operation.topic() {
            self.subscribe(id, &operation, topic);
            return;
        }

        let ctx = self.state.resolver.resolve_streaming(self.id);
        let result = operations::execute(ctx.as_deref(), operation);
        self.send(ServerMessage::Data {
            id: id.clone(),
            payload: result,
        });
        self.send(ServerMessage::Complete { id });
    }

    fn subscribe(&self, id: String, operation: &Operation, topic: &'static str) {
        let mut subscription = self.state.events.subscribe(topic);
        let subscriber_id = subscription.id();
        let field = operation.field_name();
        let tx = self.tx.clone();
        let operation_id = id.clone();

        let task = tokio::spawn(async move {
            while let Some(event) = subscription.recv().await {
                let message = ServerMessage::Data {
                    id: operation_id.clone(),
                    payload: OperationResult::data(field, event.payload),
                };
                if tx.send(message).is_err() {
                    break;
                }
            }
        });

        let attached = self
            .state
            .resolver
            .sessions()
            .attach_subscription(self.id, &id, topic, subscriber_id, task);
        debug!(
            "[Subscriptions] {} started {} on {} (attached: {})",
            self.id, id, topic, attached
        );
    }

    fn stop(&self, id: &str) {
        if self
            .state
            .resolver
            .sessions()
            .detach_subscription(self.id, id)
        {
            self.send(ServerMessage::Complete { id: id.to_string() });
        }
    }

    fn send(&self, message: ServerMessage) {
        if self.tx.send(message).is_err() {
            debug!("[Subscriptions] {} outbound queue closed", self.id);
        }
    }
}
