//! In-memory WebSocket connections.
//!
//! A [`WebSocketConnection`] is one end of a pair of bounded channels. The
//! client end is handed to the test code, the server end to a session
//! handler. Both ends carry the [`HandshakeInfo`] of the upgrade request the
//! connection stands in for.

use http::{HeaderMap, Uri};
use tokio::sync::mpsc;
use tracing::{debug, instrument, trace};
use uuid::Uuid;

use crate::config::WebSocketConfig;
use crate::error::{CloseCode, WsError, WsResult};
use crate::message::Message;
use crate::protocol::ProtocolMessage;

/// A unique identifier for a WebSocket connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId(Uuid);

impl ConnectionId {
    /// Create a new connection ID.
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    /// Get the underlying UUID.
    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for ConnectionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The upgrade request a connection was opened with.
#[derive(Debug, Clone)]
pub struct HandshakeInfo {
    uri: Uri,
    headers: HeaderMap,
}

impl HandshakeInfo {
    /// Creates handshake details.
    pub fn new(uri: Uri, headers: HeaderMap) -> Self {
        Self { uri, headers }
    }

    /// Returns the request URI.
    pub fn uri(&self) -> &Uri {
        &self.uri
    }

    /// Returns the request headers.
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }
}

/// One end of an in-memory WebSocket connection.
#[derive(Debug)]
pub struct WebSocketConnection {
    sender: ConnectionSender,
    receiver: ConnectionReceiver,
    handshake: HandshakeInfo,
}

impl WebSocketConnection {
    /// Creates a connected `(client, server)` pair.
    pub fn pair(handshake: HandshakeInfo, config: &WebSocketConfig) -> (Self, Self) {
        let connection_id = ConnectionId::new();
        let capacity = config.channel_capacity.max(1);
        let (to_server, from_client) = mpsc::channel(capacity);
        let (to_client, from_server) = mpsc::channel(capacity);

        debug!(%connection_id, uri = %handshake.uri(), "Opening in-memory connection");

        let client = Self {
            sender: ConnectionSender::new(connection_id, to_server),
            receiver: ConnectionReceiver::new(connection_id, from_server),
            handshake: handshake.clone(),
        };
        let server = Self {
            sender: ConnectionSender::new(connection_id, to_client),
            receiver: ConnectionReceiver::new(connection_id, from_client),
            handshake,
        };
        (client, server)
    }

    /// Get the connection ID.
    pub fn connection_id(&self) -> ConnectionId {
        self.sender.connection_id
    }

    /// Returns the handshake details.
    pub fn handshake(&self) -> &HandshakeInfo {
        &self.handshake
    }

    /// Check if a close frame was received.
    pub fn is_closed(&self) -> bool {
        self.receiver.closed
    }

    /// Get a handle that can be used to send messages from other tasks.
    pub fn sender(&self) -> ConnectionSender {
        self.sender.clone()
    }

    /// Send a message to the peer.
    ///
    /// # Errors
    ///
    /// Fails when the peer end was dropped.
    pub async fn send(&self, msg: Message) -> WsResult<()> {
        self.sender.send(msg).await
    }

    /// Send a protocol message to the peer.
    ///
    /// # Errors
    ///
    /// Fails when the peer end was dropped.
    pub async fn send_protocol(&self, msg: &ProtocolMessage) -> WsResult<()> {
        self.sender.send_protocol(msg).await
    }

    /// Receive the next message.
    ///
    /// Returns `None` once a close frame was received or the peer is gone.
    pub async fn recv(&mut self) -> Option<Message> {
        self.receiver.recv().await
    }

    /// Send a close frame.
    ///
    /// # Errors
    ///
    /// Fails when the peer end was dropped.
    pub async fn close(&self, code: CloseCode, reason: impl Into<String>) -> WsResult<()> {
        self.sender.close(code, reason).await
    }

    /// Splits the connection into independently owned halves.
    pub fn into_split(self) -> (ConnectionSender, ConnectionReceiver) {
        (self.sender, self.receiver)
    }
}

/// A handle for sending messages to the peer from other tasks.
#[derive(Debug, Clone)]
pub struct ConnectionSender {
    connection_id: ConnectionId,
    tx: mpsc::Sender<Message>,
}

impl ConnectionSender {
    fn new(connection_id: ConnectionId, tx: mpsc::Sender<Message>) -> Self {
        Self { connection_id, tx }
    }

    /// Get the connection ID.
    pub fn connection_id(&self) -> ConnectionId {
        self.connection_id
    }

    /// Send a message.
    ///
    /// # Errors
    ///
    /// Fails when the peer end was dropped.
    #[instrument(skip(self, msg), fields(connection_id = %self.connection_id, msg_type = msg.kind()))]
    pub async fn send(&self, msg: Message) -> WsResult<()> {
        self.tx
            .send(msg)
            .await
            .map_err(|_| WsError::connection_closed(None, "peer dropped the connection"))
    }

    /// Send a protocol message as a JSON text frame.
    ///
    /// # Errors
    ///
    /// Fails when the message cannot be encoded or the peer end was dropped.
    pub async fn send_protocol(&self, msg: &ProtocolMessage) -> WsResult<()> {
        trace!(connection_id = %self.connection_id, message_type = msg.message_type(), "Sending protocol message");
        self.send(msg.encode()?).await
    }

    /// Send a protocol message without waiting for buffer space.
    ///
    /// # Errors
    ///
    /// Fails when the message cannot be encoded, the buffer is full or the
    /// peer end was dropped.
    pub fn try_send_protocol(&self, msg: &ProtocolMessage) -> WsResult<()> {
        self.tx.try_send(msg.encode()?).map_err(|e| match e {
            mpsc::error::TrySendError::Full(_) => WsError::send_failed("connection buffer full"),
            mpsc::error::TrySendError::Closed(_) => {
                WsError::connection_closed(None, "peer dropped the connection")
            }
        })
    }

    /// Send a close frame.
    ///
    /// # Errors
    ///
    /// Fails when the peer end was dropped.
    pub async fn close(&self, code: CloseCode, reason: impl Into<String>) -> WsResult<()> {
        let reason = reason.into();
        debug!(connection_id = %self.connection_id, code = code.as_u16(), reason = %reason, "Closing connection");
        self.send(Message::close(code, reason)).await
    }
}

/// The receiving half of a connection.
#[derive(Debug)]
pub struct ConnectionReceiver {
    connection_id: ConnectionId,
    rx: mpsc::Receiver<Message>,
    closed: bool,
}

impl ConnectionReceiver {
    fn new(connection_id: ConnectionId, rx: mpsc::Receiver<Message>) -> Self {
        Self {
            connection_id,
            rx,
            closed: false,
        }
    }

    /// Receive the next message.
    ///
    /// The close frame itself is returned; after it, `None`.
    pub async fn recv(&mut self) -> Option<Message> {
        if self.closed {
            return None;
        }
        let msg = self.rx.recv().await;
        match &msg {
            Some(m) if m.is_close() => {
                debug!(connection_id = %self.connection_id, "Received close frame");
                self.closed = true;
            }
            None => self.closed = true,
            Some(_) => {}
        }
        msg
    }
}
