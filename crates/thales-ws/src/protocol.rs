//! The graphql-transport-ws message set.
//!
//! Every protocol message is a JSON text frame with a `type` discriminator:
//!
//! ```text
//! client                                   server
//!   │── connection_init ─────────────────────►│
//!   │◄──────────────────────── connection_ack ─│
//!   │── subscribe {id, payload} ─────────────►│
//!   │◄──────────────────────── next {id, ..} ──│
//!   │◄──────────────────────── complete {id} ──│
//! ```

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thales_core::{ExecutionResult, GraphQlRequest, ResponseError};

use crate::error::WsResult;
use crate::message::Message;

/// The sub-protocol name sent during the handshake.
pub const GRAPHQL_TRANSPORT_WS: &str = "graphql-transport-ws";

/// A graphql-transport-ws message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ProtocolMessage {
    /// Client → server: opens the session.
    ConnectionInit {
        /// Connection parameters.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        payload: Option<Map<String, Value>>,
    },

    /// Server → client: the session is open.
    ConnectionAck {
        /// Acknowledgement parameters.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        payload: Option<Map<String, Value>>,
    },

    /// Either direction: liveness check.
    Ping {
        /// Optional payload.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        payload: Option<Map<String, Value>>,
    },

    /// Either direction: answer to `ping`.
    Pong {
        /// Optional payload.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        payload: Option<Map<String, Value>>,
    },

    /// Client → server: run an operation.
    Subscribe {
        /// Operation id, unique among active operations.
        id: String,
        /// The GraphQL request.
        payload: GraphQlRequest,
    },

    /// Server → client: one execution result.
    Next {
        /// Operation id.
        id: String,
        /// The result.
        payload: ExecutionResult,
    },

    /// Server → client: the operation failed before producing a result.
    Error {
        /// Operation id.
        id: String,
        /// The errors.
        payload: Vec<ResponseError>,
    },

    /// Either direction: the operation is over.
    Complete {
        /// Operation id.
        id: String,
    },
}

impl ProtocolMessage {
    /// Creates a `connection_init` without payload.
    pub fn connection_init() -> Self {
        Self::ConnectionInit { payload: None }
    }

    /// Creates a `connection_ack` without payload.
    pub fn connection_ack() -> Self {
        Self::ConnectionAck { payload: None }
    }

    /// Creates a `pong` without payload.
    pub fn pong() -> Self {
        Self::Pong { payload: None }
    }

    /// Returns the `type` tag.
    pub fn message_type(&self) -> &'static str {
        match self {
            Self::ConnectionInit { .. } => "connection_init",
            Self::ConnectionAck { .. } => "connection_ack",
            Self::Ping { .. } => "ping",
            Self::Pong { .. } => "pong",
            Self::Subscribe { .. } => "subscribe",
            Self::Next { .. } => "next",
            Self::Error { .. } => "error",
            Self::Complete { .. } => "complete",
        }
    }

    /// Returns the operation id, for the messages that carry one.
    pub fn id(&self) -> Option<&str> {
        match self {
            Self::Subscribe { id, .. }
            | Self::Next { id, .. }
            | Self::Error { id, .. }
            | Self::Complete { id } => Some(id),
            _ => None,
        }
    }

    /// Decodes a protocol message from a WebSocket frame.
    ///
    /// # Errors
    ///
    /// Fails for non-text frames and for text that is not a known message.
    pub fn decode(message: &Message) -> WsResult<Self> {
        message.json()
    }

    /// Encodes the message as a text frame.
    ///
    /// # Errors
    ///
    /// Fails when a payload cannot be serialized.
    pub fn encode(&self) -> WsResult<Message> {
        Message::from_json(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_subscribe_wire_shape() {
        let msg = ProtocolMessage::Subscribe {
            id: "1".to_string(),
            payload: GraphQlRequest::new("{ Query }").with_operation_name("Q"),
        };
        let value = serde_json::to_value(&msg).unwrap();
        assert_eq!(
            value,
            json!({"type": "subscribe", "id": "1", "payload": {"query": "{ Query }", "operationName": "Q"}})
        );
    }

    #[test]
    fn test_bare_messages() {
        let value = serde_json::to_value(ProtocolMessage::connection_init()).unwrap();
        assert_eq!(value, json!({"type": "connection_init"}));

        let decoded = ProtocolMessage::decode(&Message::text(r#"{"type":"ping"}"#)).unwrap();
        assert_eq!(decoded, ProtocolMessage::Ping { payload: None });
        assert_eq!(decoded.message_type(), "ping");
        assert_eq!(decoded.id(), None);
    }

    #[test]
    fn test_error_payload_decodes() {
        let text = r#"{"type":"error","id":"7","payload":[{"message":"boom"}]}"#;
        let decoded = ProtocolMessage::decode(&Message::text(text)).unwrap();
        match decoded {
            ProtocolMessage::Error { id, payload } => {
                assert_eq!(id, "7");
                assert_eq!(payload[0].message, "boom");
            }
            other => panic!("unexpected message: {other:?}"),
        }
    }

    #[test]
    fn test_unknown_type_is_rejected() {
        assert!(ProtocolMessage::decode(&Message::text(r#"{"type":"start","id":"1"}"#)).is_err());
        assert!(ProtocolMessage::decode(&Message::text("not json")).is_err());
        assert!(ProtocolMessage::decode(&Message::Binary(vec![1, 2])).is_err());
    }

    #[test]
    fn test_encode_produces_text_frame() {
        let frame = ProtocolMessage::Complete { id: "3".to_string() }.encode().unwrap();
        assert_eq!(frame.as_text(), Some(r#"{"type":"complete","id":"3"}"#));
    }
}
