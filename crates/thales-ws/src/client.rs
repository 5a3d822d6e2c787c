//! Opening client connections.

use std::sync::Arc;

use http::{HeaderMap, Uri};
use thales_core::BoxFuture;
use tracing::debug;

use crate::config::WebSocketConfig;
use crate::connection::{HandshakeInfo, WebSocketConnection};
use crate::error::WsResult;
use crate::handler::GraphQlWebSocketHandler;

/// Opens WebSocket connections.
pub trait WebSocketClient: Send + Sync + 'static {
    /// Connects to `uri`, sending `headers` with the upgrade request.
    fn connect(&self, uri: Uri, headers: HeaderMap) -> BoxFuture<'_, WsResult<WebSocketConnection>>;
}

impl<C: WebSocketClient + ?Sized> WebSocketClient for Arc<C> {
    fn connect(&self, uri: Uri, headers: HeaderMap) -> BoxFuture<'_, WsResult<WebSocketConnection>> {
        (**self).connect(uri, headers)
    }
}

/// A client whose connections are served in-process.
///
/// Every [`connect`](WebSocketClient::connect) creates a fresh connection
/// pair and spawns a [`GraphQlWebSocketHandler`] session on the server end.
///
/// # Example
///
/// ```
/// use http::{HeaderMap, Uri};
/// use thales_core::{ExecutionError, ExecutionResult, WebGraphQlHandler, WebInput};
/// use thales_ws::{GraphQlWebSocketHandler, ProtocolMessage, TestWebSocketClient, WebSocketClient};
///
/// # tokio_test::block_on(async {
/// let web = WebGraphQlHandler::builder(|_input: WebInput| async {
///     Ok::<_, ExecutionError>(ExecutionResult::empty())
/// })
/// .build();
/// let client = TestWebSocketClient::new(GraphQlWebSocketHandler::new(web));
///
/// let mut connection = client.connect(Uri::from_static("/graphql"), HeaderMap::new()).await.unwrap();
/// connection.send_protocol(&ProtocolMessage::connection_init()).await.unwrap();
/// let ack = ProtocolMessage::decode(&connection.recv().await.unwrap()).unwrap();
/// assert_eq!(ack, ProtocolMessage::connection_ack());
/// # });
/// ```
#[derive(Debug, Clone)]
pub struct TestWebSocketClient {
    handler: GraphQlWebSocketHandler,
}

impl TestWebSocketClient {
    /// Creates a client serving connections with `handler`.
    pub fn new(handler: GraphQlWebSocketHandler) -> Self {
        Self { handler }
    }

    /// Returns the session configuration used for new connections.
    pub fn config(&self) -> &WebSocketConfig {
        self.handler.config()
    }
}

impl WebSocketClient for TestWebSocketClient {
    fn connect(&self, uri: Uri, headers: HeaderMap) -> BoxFuture<'_, WsResult<WebSocketConnection>> {
        Box::pin(async move {
            let handshake = HandshakeInfo::new(uri, headers);
            let (client, server) = WebSocketConnection::pair(handshake, self.handler.config());
            debug!(connection_id = %client.connection_id(), "Spawning in-process session");

            let handler = self.handler.clone();
            tokio::spawn(async move { handler.handle_connection(server).await });
            Ok(client)
        })
    }
}
