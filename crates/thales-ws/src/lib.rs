//! GraphQL over WebSocket for Thales.
//!
//! This crate implements the graphql-transport-ws protocol on in-memory
//! connections, so testers can exercise the WebSocket path without a
//! network:
//!
//! - [`WebSocketConnection`] - one end of a bounded channel pair
//! - [`GraphQlWebSocketHandler`] - server session driving a
//!   [`WebGraphQlHandler`](thales_core::WebGraphQlHandler)
//! - [`WebSocketClient`] and [`TestWebSocketClient`] - opening connections
//!   served in-process
//! - [`ProtocolMessage`] - the wire messages
//!
//! # Architecture
//!
//! ```text
//! TestWebSocketClient::connect(uri, headers)
//!        │
//!        ├──► WebSocketConnection (client end) ──► caller
//!        │
//!        └──► spawn GraphQlWebSocketHandler::handle_connection(server end)
//!                   │
//!                   ├─ connection_init ─► connection_ack
//!                   └─ subscribe ─► WebGraphQlHandler ─► next + complete | error
//! ```

#![doc(html_root_url = "https://docs.rs/thales-ws/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod client;
pub mod config;
pub mod connection;
pub mod error;
pub mod handler;
pub mod message;
pub mod protocol;

pub use client::{TestWebSocketClient, WebSocketClient};
pub use config::WebSocketConfig;
pub use connection::{
    ConnectionId, ConnectionReceiver, ConnectionSender, HandshakeInfo, WebSocketConnection,
};
pub use error::{CloseCode, WsError, WsResult};
pub use handler::GraphQlWebSocketHandler;
pub use message::{CloseFrame, Message};
pub use protocol::{ProtocolMessage, GRAPHQL_TRANSPORT_WS};
