//! Request specs.

use serde_json::{Map, Value};
use thales_core::GraphQlRequest;
use tracing::{debug, instrument};

use crate::error::TesterError;
use crate::response::TesterResponse;
use crate::settings::TesterSettings;
use crate::transport::GraphQlTransport;

enum Document {
    Text(String),
    Name(String),
}

/// A request being prepared by a tester.
///
/// # Example
///
/// ```
/// use serde_json::json;
/// use thales_core::{ExecutionError, ExecutionResult, WebGraphQlHandler, WebInput};
/// use thales_test::WebGraphQlTester;
///
/// # tokio_test::block_on(async {
/// let handler = WebGraphQlHandler::builder(|input: WebInput| async move {
///     Ok::<_, ExecutionError>(ExecutionResult::from_data(json!({
///         "user": { "id": input.variables()["id"] }
///     })))
/// })
/// .build();
/// let tester = WebGraphQlTester::builder(handler).build().unwrap();
///
/// let response = tester
///     .document("query User($id: ID!) { user(id: $id) { id } }")
///     .operation_name("User")
///     .variable("id", "42")
///     .execute()
///     .await
///     .unwrap();
///
/// response.path("user.id").assert_value_eq(&json!("42"));
/// # });
/// ```
#[must_use]
pub struct RequestSpec<'a> {
    settings: &'a TesterSettings,
    transport: &'a dyn GraphQlTransport,
    transport_name: &'static str,
    document: Document,
    operation_name: Option<String>,
    variables: Map<String, Value>,
    extensions: Map<String, Value>,
}

impl<'a> RequestSpec<'a> {
    pub(crate) fn document(
        settings: &'a TesterSettings,
        transport: &'a dyn GraphQlTransport,
        transport_name: &'static str,
        text: String,
    ) -> Self {
        Self::new(settings, transport, transport_name, Document::Text(text))
    }

    pub(crate) fn document_name(
        settings: &'a TesterSettings,
        transport: &'a dyn GraphQlTransport,
        transport_name: &'static str,
        name: String,
    ) -> Self {
        Self::new(settings, transport, transport_name, Document::Name(name))
    }

    fn new(
        settings: &'a TesterSettings,
        transport: &'a dyn GraphQlTransport,
        transport_name: &'static str,
        document: Document,
    ) -> Self {
        Self {
            settings,
            transport,
            transport_name,
            document,
            operation_name: None,
            variables: Map::new(),
            extensions: Map::new(),
        }
    }

    /// Selects the operation to run.
    pub fn operation_name(mut self, name: impl Into<String>) -> Self {
        self.operation_name = Some(name.into());
        self
    }

    /// Adds a variable, replacing a previous value with the same name.
    pub fn variable(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.variables.insert(name.into(), value.into());
        self
    }

    /// Adds a protocol extension entry.
    pub fn extension(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.extensions.insert(name.into(), value.into());
        self
    }

    /// Resolves the document, sends the request and waits for the result.
    ///
    /// # Errors
    ///
    /// - [`TesterError::Document`] when a named document cannot be resolved
    /// - [`TesterError::Timeout`] when no response arrives in time
    /// - [`TesterError::WebSocket`] when a WebSocket session cannot be opened
    /// - a transport specific error when the handler fails the request
    #[instrument(name = "tester.execute", skip_all, fields(transport = self.transport_name))]
    pub async fn execute(self) -> Result<TesterResponse, TesterError> {
        let query = match self.document {
            Document::Text(text) => text,
            Document::Name(name) => {
                debug!(document = %name, "Resolving document");
                self.settings.document_source().get_document(&name).await?
            }
        };

        let request = GraphQlRequest {
            query,
            operation_name: self.operation_name,
            variables: self.variables,
            extensions: self.extensions,
        };

        self.transport.connect().await?;

        let timeout = self.settings.response_timeout();
        let result = tokio::time::timeout(timeout, self.transport.execute(request))
            .await
            .map_err(|_| TesterError::Timeout(timeout))??;

        debug!(errors = result.errors.len(), "Request completed");
        Ok(TesterResponse::new(result))
    }
}
