//! Server side of graphql-transport-ws.
//!
//! [`GraphQlWebSocketHandler::handle_connection`] drives one session until
//! the client goes away or a protocol violation closes it:
//!
//! | violation | close code |
//! |---|---|
//! | frame that is not a client protocol message | 4400 |
//! | `subscribe` before `connection_ack` | 4401 |
//! | no `connection_init` within the timeout | 4408 |
//! | `subscribe` with an id already in flight | 4409 |
//! | second `connection_init` | 4429 |
//!
//! Each `subscribe` runs on its own task with a [`WebInput`] built from the
//! handshake URI and headers and the subscription id.

use std::ops::ControlFlow;
use std::sync::Arc;

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use thales_core::{GraphQlRequest, ResponseError, WebGraphQlHandler, WebInput};
use tokio::task::AbortHandle;
use tokio::time::Instant;
use tracing::{debug, info_span, instrument, warn, Instrument};

use crate::config::WebSocketConfig;
use crate::connection::{ConnectionSender, HandshakeInfo, WebSocketConnection};
use crate::error::CloseCode;
use crate::message::Message;
use crate::protocol::ProtocolMessage;

/// Serves GraphQL over in-memory WebSocket connections.
#[derive(Debug, Clone)]
pub struct GraphQlWebSocketHandler {
    handler: WebGraphQlHandler,
    config: WebSocketConfig,
}

impl GraphQlWebSocketHandler {
    /// Creates a handler with the default configuration.
    pub fn new(handler: WebGraphQlHandler) -> Self {
        Self::with_config(handler, WebSocketConfig::default())
    }

    /// Creates a handler with the given configuration.
    pub fn with_config(handler: WebGraphQlHandler, config: WebSocketConfig) -> Self {
        Self { handler, config }
    }

    /// Returns the session configuration.
    pub fn config(&self) -> &WebSocketConfig {
        &self.config
    }

    /// Runs a session on the server end of a connection.
    ///
    /// Returns when the peer closes or drops the connection, or after the
    /// session closed it. Operations still running are aborted.
    #[instrument(skip(self, connection), fields(connection_id = %connection.connection_id()))]
    pub async fn handle_connection(&self, connection: WebSocketConnection) {
        let handshake = connection.handshake().clone();
        let (sender, mut receiver) = connection.into_split();
        let mut session = Session {
            handler: self.handler.clone(),
            handshake,
            sender,
            active: Arc::new(DashMap::new()),
            acknowledged: false,
        };

        let init_deadline = Instant::now() + self.config.connection_init_timeout;

        loop {
            let next = if session.acknowledged {
                receiver.recv().await
            } else {
                match tokio::time::timeout_at(init_deadline, receiver.recv()).await {
                    Ok(next) => next,
                    Err(_) => {
                        session
                            .close(CloseCode::ConnectionInitTimeout, "Connection initialisation timeout")
                            .await;
                        break;
                    }
                }
            };

            let Some(message) = next else {
                debug!("Client went away");
                break;
            };

            if session.on_message(message).await.is_break() {
                break;
            }
        }

        session.abort_all();
    }
}

struct Session {
    handler: WebGraphQlHandler,
    handshake: HandshakeInfo,
    sender: ConnectionSender,
    active: Arc<DashMap<String, AbortHandle>>,
    acknowledged: bool,
}

impl Session {
    async fn on_message(&mut self, message: Message) -> ControlFlow<()> {
        match message {
            Message::Close(frame) => {
                debug!(?frame, "Client closed the connection");
                return ControlFlow::Break(());
            }
            Message::Ping(data) => {
                return self.send(Message::Pong(data)).await;
            }
            Message::Pong(_) => return ControlFlow::Continue(()),
            Message::Text(_) | Message::Binary(_) => {}
        }

        let protocol = match ProtocolMessage::decode(&message) {
            Ok(protocol) => protocol,
            Err(e) => {
                debug!(error = %e, "Undecodable message");
                return self.close(CloseCode::BadRequest, "Invalid message received").await;
            }
        };

        match protocol {
            ProtocolMessage::ConnectionInit { .. } => {
                if self.acknowledged {
                    return self.close(CloseCode::TooManyInitRequests, "Too many initialisation requests").await;
                }
                self.acknowledged = true;
                self.send_protocol(&ProtocolMessage::connection_ack()).await
            }
            ProtocolMessage::Ping { .. } => self.send_protocol(&ProtocolMessage::pong()).await,
            ProtocolMessage::Pong { .. } => ControlFlow::Continue(()),
            ProtocolMessage::Subscribe { id, payload } => {
                if !self.acknowledged {
                    return self.close(CloseCode::Unauthorized, "Unauthorized").await;
                }
                self.subscribe(id, payload).await
            }
            ProtocolMessage::Complete { id } => {
                if let Some((_, handle)) = self.active.remove(&id) {
                    debug!(%id, "Operation cancelled by client");
                    handle.abort();
                }
                ControlFlow::Continue(())
            }
            other @ (ProtocolMessage::ConnectionAck { .. }
            | ProtocolMessage::Next { .. }
            | ProtocolMessage::Error { .. }) => {
                debug!(message_type = other.message_type(), "Server message sent by client");
                self.close(CloseCode::BadRequest, "Invalid message received").await
            }
        }
    }

    async fn subscribe(&mut self, id: String, payload: GraphQlRequest) -> ControlFlow<()> {
        match self.active.entry(id.clone()) {
            Entry::Vacant(slot) => {
                let input = WebInput::new(
                    self.handshake.uri().clone(),
                    self.handshake.headers().clone(),
                    payload,
                    id.clone(),
                );
                let handler = self.handler.clone();
                let sender = self.sender.clone();
                let active = Arc::clone(&self.active);
                let span = info_span!("operation", %id);

                let task = tokio::spawn(
                    async move {
                        for reply in execute(&handler, input).await {
                            if let Err(e) = sender.send_protocol(&reply).await {
                                warn!(error = %e, "Failed to deliver operation result");
                                break;
                            }
                        }
                        active.remove(&id);
                    }
                    .instrument(span),
                );
                slot.insert(task.abort_handle());
                return ControlFlow::Continue(());
            }
            Entry::Occupied(_) => {}
        }

        self.close(
            CloseCode::SubscriberAlreadyExists,
            format!("Subscriber for {id} already exists"),
        )
        .await
    }

    async fn send(&self, message: Message) -> ControlFlow<()> {
        match self.sender.send(message).await {
            Ok(()) => ControlFlow::Continue(()),
            Err(e) => {
                debug!(error = %e, "Send failed, ending session");
                ControlFlow::Break(())
            }
        }
    }

    async fn send_protocol(&self, message: &ProtocolMessage) -> ControlFlow<()> {
        match message.encode() {
            Ok(frame) => self.send(frame).await,
            Err(e) => {
                warn!(error = %e, "Failed to encode protocol message");
                ControlFlow::Continue(())
            }
        }
    }

    async fn close(&self, code: CloseCode, reason: impl Into<String>) -> ControlFlow<()> {
        if let Err(e) = self.sender.close(code, reason).await {
            debug!(error = %e, "Close frame not delivered");
        }
        ControlFlow::Break(())
    }

    fn abort_all(&self) {
        for entry in self.active.iter() {
            entry.value().abort();
        }
        self.active.clear();
    }
}

async fn execute(handler: &WebGraphQlHandler, input: WebInput) -> Vec<ProtocolMessage> {
    let id = input.id().to_string();
    if let Err(e) = input.request().validate() {
        return vec![ProtocolMessage::Error {
            id,
            payload: vec![ResponseError::new(e.to_string())],
        }];
    }

    match handler.handle_request(input).await {
        Ok(output) => {
            let (result, _) = output.into_parts();
            vec![
                ProtocolMessage::Next {
                    id: id.clone(),
                    payload: result,
                },
                ProtocolMessage::Complete { id },
            ]
        }
        Err(e) => vec![ProtocolMessage::Error {
            id,
            payload: vec![ResponseError::new(e.to_string())],
        }],
    }
}
