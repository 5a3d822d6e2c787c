//! Immutable testers.

use std::fmt;
use std::sync::Arc;

use thales_core::WebGraphQlHandler;
use thales_ws::WebSocketClient;

use crate::builder::TesterBuilder;
use crate::client::TestClient;
use crate::request::RequestSpec;
use crate::settings::TesterSettings;
use crate::transport::{Direct, GraphQlTransport, Http, TransportFactory, WebSocket};

/// Tester calling a handler directly.
pub type WebGraphQlTester = GraphQlTester<Direct>;

/// Tester posting through an in-memory HTTP client.
pub type HttpGraphQlTester = GraphQlTester<Http>;

/// Tester sending over a graphql-transport-ws session.
pub type WebSocketGraphQlTester = GraphQlTester<WebSocket>;

/// A configured, immutable GraphQL tester.
///
/// Settings are fixed at build time. [`mutate`](Self::mutate) returns a
/// builder holding a copy of them, so testers built from it never affect
/// this one.
#[derive(Clone)]
pub struct GraphQlTester<T> {
    factory: T,
    settings: TesterSettings,
    transport: Arc<dyn GraphQlTransport>,
}

impl<T: TransportFactory> GraphQlTester<T> {
    pub(crate) fn new(factory: T, settings: TesterSettings) -> Self {
        let transport = factory.create_transport(&settings);
        Self {
            factory,
            settings,
            transport,
        }
    }

    /// Starts a request for a literal document.
    pub fn document(&self, text: impl Into<String>) -> RequestSpec<'_> {
        RequestSpec::document(&self.settings, self.transport.as_ref(), T::NAME, text.into())
    }

    /// Starts a request for a named document.
    ///
    /// The name is resolved with the document source when the request is
    /// executed.
    pub fn document_name(&self, name: impl Into<String>) -> RequestSpec<'_> {
        RequestSpec::document_name(&self.settings, self.transport.as_ref(), T::NAME, name.into())
    }

    /// Returns a builder seeded with a copy of this tester's settings.
    pub fn mutate(&self) -> TesterBuilder<T> {
        TesterBuilder::from_parts(self.factory.clone(), self.settings.clone())
    }

    /// Returns the settings this tester sends with.
    pub fn settings(&self) -> &TesterSettings {
        &self.settings
    }
}

impl GraphQlTester<Direct> {
    /// Creates a builder for testers calling `handler` directly.
    pub fn builder(handler: WebGraphQlHandler) -> TesterBuilder<Direct> {
        TesterBuilder::new(Direct::new(handler))
    }
}

impl GraphQlTester<Http> {
    /// Creates a builder for testers posting through `client`.
    pub fn builder(client: TestClient) -> TesterBuilder<Http> {
        TesterBuilder::new(Http::new(client))
    }
}

impl GraphQlTester<WebSocket> {
    /// Creates a builder for testers connecting to `url` through `client`.
    ///
    /// An empty `url` leaves the URL unset, so sessions open on `/` until
    /// [`TesterBuilder::url`] sets one.
    pub fn builder(url: &str, client: impl WebSocketClient) -> TesterBuilder<WebSocket> {
        let builder = TesterBuilder::new(WebSocket::new(client));
        if url.is_empty() {
            builder
        } else {
            builder.url(url)
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for GraphQlTester<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GraphQlTester")
            .field("factory", &self.factory)
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}
