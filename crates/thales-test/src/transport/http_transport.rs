use std::sync::Arc;

use http::HeaderMap;
use thales_core::{BoxFuture, ExecutionResult, GraphQlRequest};
use thales_server::GraphQlHttpHandler;
use tracing::debug;

use super::{GraphQlTransport, TransportFactory};
use crate::client::TestClient;
use crate::error::TesterError;
use crate::settings::TesterSettings;

/// Posts requests through an in-memory [`TestClient`].
///
/// Tester headers are sent after the client's default headers.
#[derive(Debug, Clone)]
pub struct Http {
    client: TestClient,
}

impl Http {
    /// Sends through `client`.
    pub fn new(client: TestClient) -> Self {
        Self { client }
    }

    /// Sends to `handler`, served on every POST path.
    pub fn bind_to_http_handler(handler: &GraphQlHttpHandler) -> Self {
        Self::new(TestClient::bind_to_http_handler(handler))
    }

    /// Returns the client.
    pub fn client(&self) -> &TestClient {
        &self.client
    }

    pub(crate) fn set_client(&mut self, client: TestClient) {
        self.client = client;
    }
}

impl TransportFactory for Http {
    const NAME: &'static str = "http";

    fn create_transport(&self, settings: &TesterSettings) -> Arc<dyn GraphQlTransport> {
        Arc::new(HttpTransport {
            client: self.client.clone(),
            uri: settings.request_uri().to_string(),
            headers: settings.headers().clone(),
        })
    }
}

struct HttpTransport {
    client: TestClient,
    uri: String,
    headers: HeaderMap,
}

impl GraphQlTransport for HttpTransport {
    fn execute(&self, request: GraphQlRequest) -> BoxFuture<'_, Result<ExecutionResult, TesterError>> {
        Box::pin(async move {
            let response = self
                .client
                .post(self.uri.as_str())
                .headers(&self.headers)
                .json(&request)
                .send()
                .await?;

            debug!(uri = %self.uri, status = %response.status(), "Received HTTP response");

            if !response.is_success() {
                return Err(TesterError::Http {
                    status: response.status(),
                    body: response.text(),
                });
            }
            response.json()
        })
    }
}
