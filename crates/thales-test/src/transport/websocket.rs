use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use http::{HeaderMap, Uri};
use thales_core::{BoxFuture, ExecutionResult, GraphQlRequest};
use thales_ws::{
    ConnectionReceiver, ConnectionSender, Message, ProtocolMessage, WebSocketClient,
    WebSocketConfig, WebSocketConnection, WsError,
};
use tokio::sync::{oneshot, OnceCell};
use tokio::task::JoinHandle;
use tracing::{debug, instrument, trace, warn};

use super::{GraphQlTransport, TransportFactory};
use crate::error::TesterError;
use crate::settings::TesterSettings;

type Pending = Arc<DashMap<String, oneshot::Sender<Result<ExecutionResult, TesterError>>>>;

/// Sends requests as graphql-transport-ws `subscribe` messages.
///
/// Each built tester opens its own session on first use, sending the tester
/// URL and headers with the handshake. The `connection_ack` wait has its own
/// bound, separate from the response timeout.
#[derive(Clone)]
pub struct WebSocket {
    client: Arc<dyn WebSocketClient>,
    ack_timeout: Duration,
}

impl WebSocket {
    /// Connects through `client`.
    pub fn new(client: impl WebSocketClient) -> Self {
        Self::from_shared(Arc::new(client))
    }

    /// Connects through a shared client.
    pub fn from_shared(client: Arc<dyn WebSocketClient>) -> Self {
        Self {
            client,
            ack_timeout: WebSocketConfig::default().connection_init_timeout,
        }
    }

    /// Sets how long a new session waits for `connection_ack`.
    #[must_use]
    pub fn connection_init_timeout(mut self, timeout: Duration) -> Self {
        self.ack_timeout = timeout;
        self
    }

    /// Returns how long a new session waits for `connection_ack`.
    pub fn ack_timeout(&self) -> Duration {
        self.ack_timeout
    }
}

impl std::fmt::Debug for WebSocket {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WebSocket")
            .field("ack_timeout", &self.ack_timeout)
            .finish_non_exhaustive()
    }
}

impl TransportFactory for WebSocket {
    const NAME: &'static str = "websocket";

    fn create_transport(&self, settings: &TesterSettings) -> Arc<dyn GraphQlTransport> {
        Arc::new(WebSocketTransport {
            client: Arc::clone(&self.client),
            uri: settings.request_uri(),
            headers: settings.headers().clone(),
            ack_timeout: self.ack_timeout,
            session: OnceCell::new(),
        })
    }
}

struct WebSocketTransport {
    client: Arc<dyn WebSocketClient>,
    uri: Uri,
    headers: HeaderMap,
    ack_timeout: Duration,
    session: OnceCell<Session>,
}

impl WebSocketTransport {
    #[instrument(skip(self), fields(uri = %self.uri))]
    async fn open_session(&self) -> Result<Session, TesterError> {
        let mut connection = self.client.connect(self.uri.clone(), self.headers.clone()).await?;
        connection.send_protocol(&ProtocolMessage::connection_init()).await?;

        tokio::time::timeout(self.ack_timeout, await_ack(&mut connection))
            .await
            .map_err(|_| WsError::AckTimeout {
                timeout_ms: u64::try_from(self.ack_timeout.as_millis()).unwrap_or(u64::MAX),
            })??;

        debug!(connection_id = %connection.connection_id(), "Session acknowledged");

        let (sender, receiver) = connection.into_split();
        let pending: Pending = Arc::new(DashMap::new());
        let reader = tokio::spawn(read_loop(receiver, sender.clone(), Arc::clone(&pending)));

        Ok(Session {
            sender,
            pending,
            reader,
            next_id: AtomicU64::new(1),
        })
    }

    async fn session(&self) -> Result<&Session, TesterError> {
        self.session.get_or_try_init(|| self.open_session()).await
    }
}

impl GraphQlTransport for WebSocketTransport {
    fn connect(&self) -> BoxFuture<'_, Result<(), TesterError>> {
        Box::pin(async move { self.session().await.map(|_| ()) })
    }

    fn execute(&self, request: GraphQlRequest) -> BoxFuture<'_, Result<ExecutionResult, TesterError>> {
        Box::pin(async move {
            let session = self.session().await?;

            let id = session.next_id.fetch_add(1, Ordering::Relaxed).to_string();
            let (tx, rx) = oneshot::channel();
            session.pending.insert(id.clone(), tx);
            let in_flight = InFlight { session, id };

            let subscribe = ProtocolMessage::Subscribe {
                id: in_flight.id.clone(),
                payload: request,
            };
            if let Err(e) = session.sender.send_protocol(&subscribe).await {
                session.pending.remove(&in_flight.id);
                return Err(e.into());
            }
            trace!(operation_id = %in_flight.id, "Subscribed");

            match rx.await {
                Ok(result) => result,
                Err(_) => Err(WsError::connection_closed(None, "session ended").into()),
            }
        })
    }
}

/// An operation awaiting its result.
///
/// Dropped before the result arrives, it forgets the id and tells the
/// server to stop with `complete`.
struct InFlight<'a> {
    session: &'a Session,
    id: String,
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        if self.session.pending.remove(&self.id).is_none() {
            return;
        }
        debug!(operation_id = %self.id, "Operation abandoned");
        let complete = ProtocolMessage::Complete {
            id: std::mem::take(&mut self.id),
        };
        if let Err(e) = self.session.sender.try_send_protocol(&complete) {
            warn!(error = %e, "Failed to complete abandoned operation");
        }
    }
}

struct Session {
    sender: ConnectionSender,
    pending: Pending,
    reader: JoinHandle<()>,
    next_id: AtomicU64,
}

impl Drop for Session {
    fn drop(&mut self) {
        self.reader.abort();
    }
}

async fn await_ack(connection: &mut WebSocketConnection) -> Result<(), WsError> {
    loop {
        let Some(message) = connection.recv().await else {
            return Err(WsError::connection_closed(None, "closed before connection_ack"));
        };
        if let Some(frame) = message.close_frame() {
            return Err(WsError::connection_closed(Some(frame.code), frame.reason.to_string()));
        }
        match ProtocolMessage::decode(&message)? {
            ProtocolMessage::ConnectionAck { .. } => return Ok(()),
            ProtocolMessage::Ping { .. } => connection.send_protocol(&ProtocolMessage::pong()).await?,
            other => {
                return Err(WsError::protocol_error(format!(
                    "expected connection_ack, got {}",
                    other.message_type()
                )))
            }
        }
    }
}

async fn read_loop(mut receiver: ConnectionReceiver, sender: ConnectionSender, pending: Pending) {
    let mut close = None;

    while let Some(message) = receiver.recv().await {
        if message.is_close() {
            close = message.close_frame().cloned();
            break;
        }
        if let Message::Ping(payload) = &message {
            let _ = sender.send(Message::Pong(payload.clone())).await;
            continue;
        }

        match ProtocolMessage::decode(&message) {
            Ok(ProtocolMessage::Next { id, payload }) => {
                deliver(&pending, &id, Ok(payload));
            }
            Ok(ProtocolMessage::Error { id, payload }) => {
                deliver(&pending, &id, Err(TesterError::RequestFailed { errors: payload }));
            }
            Ok(ProtocolMessage::Complete { id }) => {
                deliver(
                    &pending,
                    &id,
                    Err(WsError::protocol_error("completed without a result").into()),
                );
            }
            Ok(ProtocolMessage::Ping { .. }) => {
                let _ = sender.send_protocol(&ProtocolMessage::pong()).await;
            }
            Ok(other) => trace!(message_type = other.message_type(), "Ignoring message"),
            Err(e) => warn!(error = %e, "Dropping undecodable message"),
        }
    }

    let (code, reason) = close.map_or((None, "connection closed".to_string()), |frame| {
        (Some(frame.code), frame.reason.to_string())
    });
    debug!(?code, %reason, pending = pending.len(), "Session ended");

    let ids: Vec<String> = pending.iter().map(|entry| entry.key().clone()).collect();
    for id in ids {
        deliver(&pending, &id, Err(WsError::connection_closed(code, reason.clone()).into()));
    }
}

/// Completes the request waiting on `id`, if any. Later messages for the id are dropped.
fn deliver(pending: &Pending, id: &str, result: Result<ExecutionResult, TesterError>) {
    if let Some((_, tx)) = pending.remove(id) {
        let _ = tx.send(result);
    }
}
