//! Tester builders.

use std::sync::Arc;
use std::time::Duration;

use http::HeaderMap;
use thales_config::TesterConfig;
use thales_core::DocumentSource;
use tracing::debug;

use crate::client::TestClientBuilder;
use crate::error::{InvalidSetting, TesterError};
use crate::settings::{replace_header, TesterSettings};
use crate::tester::GraphQlTester;
use crate::transport::{Http, TransportFactory, WebSocket};

/// Accumulates tester settings and builds immutable testers.
///
/// Methods stay chainable even when a value is rejected; the first rejected
/// value is reported by [`build`](Self::build). Building does not consume or
/// reset the builder.
///
/// # Example
///
/// ```
/// use thales_core::{ExecutionError, ExecutionResult, WebGraphQlHandler, WebInput};
/// use thales_test::WebGraphQlTester;
///
/// let handler = WebGraphQlHandler::builder(|_input: WebInput| async {
///     Err::<ExecutionResult, _>(ExecutionError::unsupported("no engine"))
/// })
/// .build();
///
/// let tester = WebGraphQlTester::builder(handler)
///     .url("/graphql-one")
///     .header("h", ["one"])
///     .build()
///     .unwrap();
///
/// assert_eq!(tester.settings().url().unwrap(), "/graphql-one");
/// ```
#[derive(Debug, Clone)]
#[must_use]
pub struct TesterBuilder<T> {
    factory: T,
    settings: TesterSettings,
    invalid: Option<InvalidSetting>,
}

impl<T: TransportFactory> TesterBuilder<T> {
    /// Creates a builder with default settings.
    pub fn new(factory: T) -> Self {
        Self::from_parts(factory, TesterSettings::default())
    }

    pub(crate) fn from_parts(factory: T, settings: TesterSettings) -> Self {
        Self {
            factory,
            settings,
            invalid: None,
        }
    }

    /// Sets the URL requests are sent to.
    ///
    /// The value is used as given. It must not be empty.
    pub fn url(mut self, url: impl AsRef<str>) -> Self {
        if let Err(invalid) = self.settings.set_url(url.as_ref()) {
            self.reject(invalid);
        }
        self
    }

    /// Replaces all values of `name` with `values`.
    pub fn header<I, V>(mut self, name: &str, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: AsRef<str>,
    {
        if let Err(invalid) = replace_header(self.settings.headers_mut(), name, values) {
            self.reject(invalid);
        }
        self
    }

    /// Edits the headers in place.
    ///
    /// # Example
    ///
    /// ```
    /// use http::HeaderValue;
    /// # use thales_core::{ExecutionError, ExecutionResult, WebGraphQlHandler, WebInput};
    /// use thales_test::WebGraphQlTester;
    /// # let handler = WebGraphQlHandler::builder(|_input: WebInput| async {
    /// #     Err::<ExecutionResult, _>(ExecutionError::unsupported("no engine"))
    /// # })
    /// # .build();
    ///
    /// let tester = WebGraphQlTester::builder(handler)
    ///     .header("h", ["one"])
    ///     .headers(|headers| {
    ///         headers.append("h", HeaderValue::from_static("two"));
    ///     })
    ///     .build()
    ///     .unwrap();
    ///
    /// assert_eq!(tester.settings().headers().get_all("h").iter().count(), 2);
    /// ```
    pub fn headers(mut self, mutate: impl FnOnce(&mut HeaderMap)) -> Self {
        mutate(self.settings.headers_mut());
        self
    }

    /// Sets the source that named documents are resolved with.
    pub fn document_source(mut self, source: impl DocumentSource) -> Self {
        self.settings.set_document_source(Arc::new(source));
        self
    }

    /// Bounds the wait for each response.
    pub fn response_timeout(mut self, timeout: Duration) -> Self {
        self.settings.set_response_timeout(timeout);
        self
    }

    /// Applies a loaded configuration.
    ///
    /// Sets the URL when one is configured, the response timeout and the
    /// document source. Later builder calls still override these.
    pub fn configure(mut self, config: &TesterConfig) -> Self {
        if let Some(url) = &config.tester.url {
            self = self.url(url);
        }
        self.settings.set_response_timeout(config.tester.response_timeout());
        self.settings
            .set_document_source(config.documents.document_source());
        self
    }

    /// Returns the settings accumulated so far.
    pub fn settings(&self) -> &TesterSettings {
        &self.settings
    }

    /// Builds a tester from a copy of the current settings.
    ///
    /// # Errors
    ///
    /// Returns [`TesterError::InvalidUrl`] or [`TesterError::InvalidHeader`]
    /// for the first value that was rejected.
    pub fn build(&self) -> Result<GraphQlTester<T>, TesterError> {
        if let Some(invalid) = &self.invalid {
            return Err(invalid.clone().into());
        }

        debug!(
            transport = T::NAME,
            url = ?self.settings.url(),
            headers = self.settings.headers().len(),
            "Building tester"
        );
        Ok(GraphQlTester::new(self.factory.clone(), self.settings.clone()))
    }

    fn reject(&mut self, invalid: InvalidSetting) {
        self.invalid.get_or_insert(invalid);
    }
}

impl TesterBuilder<Http> {
    /// Reconfigures the underlying [`TestClient`](crate::TestClient).
    ///
    /// The closure edits a copy of the client's configuration; testers built
    /// earlier keep the client they were built with.
    pub fn web_test_client(mut self, configure: impl FnOnce(&mut TestClientBuilder)) -> Self {
        let mut client = self.factory.client().mutate();
        configure(&mut client);
        match client.try_build() {
            Ok(client) => self.factory.set_client(client),
            Err(invalid) => self.reject(invalid),
        }
        self
    }
}

impl TesterBuilder<WebSocket> {
    /// Bounds the wait for `connection_ack` when a session opens.
    ///
    /// The wait happens before the response timeout starts. Defaults to the
    /// [`WebSocketConfig`](thales_ws::WebSocketConfig) init timeout.
    pub fn connection_init_timeout(mut self, timeout: Duration) -> Self {
        self.factory = self.factory.connection_init_timeout(timeout);
        self
    }
}
