//! Streaming wire protocol
//!
//! JSON text frames in the `graphql-ws` (subscriptions-transport-ws) shape:
//!
//! ```text
//! client: connection_init, start, stop, connection_terminate
//! server: connection_ack, connection_error, data, error, complete, ka
//! ```

use crate::operations::OperationResult;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// WebSocket subprotocol name
pub const SUBPROTOCOL: &str = "graphql-ws";

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    ConnectionInit {
        #[serde(default)]
        payload: Value,
    },
    /// `payload` is parsed as an [`Operation`](crate::operations::Operation)
    /// once the id is known, so a bad operation is reported against its id.
    Start {
        id: String,
        payload: Value,
    },
    Stop {
        id: String,
    },
    ConnectionTerminate,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorPayload {
    pub message: String,
}

impl ErrorPayload {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    ConnectionAck,
    ConnectionError { payload: ErrorPayload },
    Data { id: String, payload: OperationResult },
    Error { id: String, payload: ErrorPayload },
    Complete { id: String },
    #[serde(rename = "ka")]
    KeepAlive,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_client_message_parsing() {
        let init: ClientMessage =
            serde_json::from_value(json!({"type": "connection_init", "payload": {"authToken": "ADMIN"}}))
                .unwrap();
        assert!(matches!(init, ClientMessage::ConnectionInit { payload } if payload["authToken"] == "ADMIN"));

        let bare: ClientMessage = serde_json::from_value(json!({"type": "connection_init"})).unwrap();
        assert!(matches!(bare, ClientMessage::ConnectionInit { payload: Value::Null }));

        let start: ClientMessage = serde_json::from_value(json!({
            "type": "start",
            "id": "1",
            "payload": {"operation": "templateChanged"}
        }))
        .unwrap();
        assert!(matches!(start, ClientMessage::Start { id, payload } if id == "1" && payload["operation"] == "templateChanged"));

        let unknown: ClientMessage = serde_json::from_value(json!({
            "type": "start",
            "id": "2",
            "payload": {"operation": "nope"}
        }))
        .unwrap();
        assert!(matches!(unknown, ClientMessage::Start { id, .. } if id == "2"));
    }

    #[test]
    fn test_server_message_format() {
        assert_eq!(
            serde_json::to_value(ServerMessage::KeepAlive).unwrap(),
            json!({"type": "ka"})
        );
        assert_eq!(
            serde_json::to_value(ServerMessage::Complete { id: "7".to_string() }).unwrap(),
            json!({"type": "complete", "id": "7"})
        );
        assert_eq!(
            serde_json::to_value(ServerMessage::Data {
                id: "1".to_string(),
                payload: OperationResult::data("templateChanged", json!({"id": "welcome"})),
            })
            .unwrap(),
            json!({"type": "data", "id": "1", "payload": {"data": {"templateChanged": {"id": "welcome"}}}})
        );
    }
}
