use std::sync::Arc;

use http::{HeaderMap, Uri};
use thales_core::{BoxFuture, ExecutionResult, GraphQlRequest, WebGraphQlHandler, WebInput};
use tracing::debug;

use super::{GraphQlTransport, TransportFactory};
use crate::error::TesterError;
use crate::settings::TesterSettings;

/// Calls a [`WebGraphQlHandler`] directly.
#[derive(Debug, Clone)]
pub struct Direct {
    handler: WebGraphQlHandler,
}

impl Direct {
    /// Wraps the handler.
    pub fn new(handler: WebGraphQlHandler) -> Self {
        Self { handler }
    }

    /// Returns the handler.
    pub fn handler(&self) -> &WebGraphQlHandler {
        &self.handler
    }
}

impl TransportFactory for Direct {
    const NAME: &'static str = "direct";

    fn create_transport(&self, settings: &TesterSettings) -> Arc<dyn GraphQlTransport> {
        Arc::new(DirectTransport {
            handler: self.handler.clone(),
            uri: settings.request_uri(),
            headers: settings.headers().clone(),
        })
    }
}

struct DirectTransport {
    handler: WebGraphQlHandler,
    uri: Uri,
    headers: HeaderMap,
}

impl GraphQlTransport for DirectTransport {
    fn execute(&self, request: GraphQlRequest) -> BoxFuture<'_, Result<ExecutionResult, TesterError>> {
        Box::pin(async move {
            let input = WebInput::with_generated_id(self.uri.clone(), self.headers.clone(), request);
            debug!(request_id = input.id(), uri = %self.uri, "Handling request directly");

            let output = self.handler.handle_request(input).await?;
            let (result, _headers) = output.into_parts();
            Ok(result)
        })
    }
}
