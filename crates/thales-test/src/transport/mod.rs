//! The paths a request takes from a tester to a handler.
//!
//! | factory | transport | reaches the handler through |
//! |---|---|---|
//! | [`Direct`] | `DirectTransport` | a direct call |
//! | [`Http`] | `HttpTransport` | an in-memory [`TestClient`](crate::TestClient) |
//! | [`WebSocket`] | `WebSocketTransport` | a graphql-transport-ws session |
//!
//! The factory is the builder's type parameter. Each `build` asks it for a
//! fresh transport bound to that build's settings, so testers never share a
//! transport.

use std::sync::Arc;

use thales_core::{BoxFuture, ExecutionResult, GraphQlRequest};

use crate::error::TesterError;
use crate::settings::TesterSettings;

mod direct;
mod http_transport;
mod websocket;

pub use direct::Direct;
pub use http_transport::Http;
pub use websocket::WebSocket;

/// Sends one GraphQL request and waits for its result.
pub trait GraphQlTransport: Send + Sync + 'static {
    /// Completes any connection setup before requests are timed.
    ///
    /// Called before every request. Setup bounded by its own timeout, such as
    /// the WebSocket `connection_ack` wait, belongs here.
    fn connect(&self) -> BoxFuture<'_, Result<(), TesterError>> {
        Box::pin(async { Ok(()) })
    }

    /// Sends the request.
    fn execute(&self, request: GraphQlRequest) -> BoxFuture<'_, Result<ExecutionResult, TesterError>>;
}

/// Creates transports for a tester builder.
pub trait TransportFactory: Clone + Send + Sync + 'static {
    /// Name used in logs.
    const NAME: &'static str;

    /// Creates a transport sending with the given settings.
    fn create_transport(&self, settings: &TesterSettings) -> Arc<dyn GraphQlTransport>;
}
