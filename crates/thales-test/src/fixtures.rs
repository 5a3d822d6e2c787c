//! Handler fixtures for tests.
//!
//! The usual setup is a handler whose executor always fails, fronted by a
//! [`CapturingInterceptor`] that records each [`WebInput`] and answers with
//! an empty result. Assertions then run against what the handler received.
//!
//! # Example
//!
//! ```
//! use thales_test::fixtures::capturing_handler;
//! use thales_test::WebGraphQlTester;
//!
//! # tokio_test::block_on(async {
//! let (handler, capture) = capturing_handler();
//! let tester = WebGraphQlTester::builder(handler)
//!     .url("/graphql-one")
//!     .build()
//!     .unwrap();
//!
//! tester.document("{ Query }").execute().await.unwrap();
//!
//! let input = capture.last().unwrap();
//! assert_eq!(input.uri().to_string(), "/graphql-one");
//! assert_eq!(input.document(), "{ Query }");
//! # });
//! ```

use std::sync::Arc;

use parking_lot::Mutex;
use thales_core::{
    BoxFuture, Chain, ExecutionError, ExecutionResult, RequestExecutor, WebGraphQlHandler,
    WebInput, WebInterceptor, WebOutput,
};

/// Records every request that reaches it.
///
/// Clones share the same record.
#[derive(Debug, Clone)]
pub struct CapturingInterceptor {
    captured: Arc<Mutex<Vec<WebInput>>>,
    passthrough: bool,
}

impl Default for CapturingInterceptor {
    fn default() -> Self {
        Self::new()
    }
}

impl CapturingInterceptor {
    /// Creates an interceptor that answers every request with an empty result.
    pub fn new() -> Self {
        Self {
            captured: Arc::new(Mutex::new(Vec::new())),
            passthrough: false,
        }
    }

    /// Creates an interceptor that passes requests on down the chain.
    pub fn passthrough() -> Self {
        Self {
            passthrough: true,
            ..Self::new()
        }
    }

    /// Returns the most recent request.
    pub fn last(&self) -> Option<WebInput> {
        self.captured.lock().last().cloned()
    }

    /// Returns all requests, oldest first.
    pub fn captured(&self) -> Vec<WebInput> {
        self.captured.lock().clone()
    }

    /// Returns the number of requests seen.
    pub fn count(&self) -> usize {
        self.captured.lock().len()
    }

    /// Forgets all requests.
    pub fn clear(&self) {
        self.captured.lock().clear();
    }
}

impl WebInterceptor for CapturingInterceptor {
    fn name(&self) -> &'static str {
        "capturing"
    }

    fn intercept<'a>(
        &'a self,
        input: WebInput,
        chain: Chain<'a>,
    ) -> BoxFuture<'a, Result<WebOutput, ExecutionError>> {
        self.captured.lock().push(input.clone());
        if self.passthrough {
            chain.next(input)
        } else {
            Box::pin(async { Ok(WebOutput::new(ExecutionResult::empty())) })
        }
    }
}

/// Returns an executor that fails every request as unsupported.
pub fn failing_executor() -> impl RequestExecutor {
    |_input: WebInput| async {
        Err::<ExecutionResult, _>(ExecutionError::unsupported("no GraphQL engine configured"))
    }
}

/// Returns a handler with a failing executor behind a [`CapturingInterceptor`].
pub fn capturing_handler() -> (WebGraphQlHandler, CapturingInterceptor) {
    let capture = CapturingInterceptor::new();
    let handler = WebGraphQlHandler::builder(failing_executor())
        .interceptor(capture.clone())
        .build();
    (handler, capture)
}

/// Returns a handler whose requests all fail, with a passthrough recorder.
pub fn failing_handler() -> (WebGraphQlHandler, CapturingInterceptor) {
    let capture = CapturingInterceptor::passthrough();
    let handler = WebGraphQlHandler::builder(failing_executor())
        .interceptor(capture.clone())
        .build();
    (handler, capture)
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::{HeaderMap, Uri};
    use thales_core::GraphQlRequest;

    fn input(query: &str) -> WebInput {
        WebInput::with_generated_id(Uri::from_static("/"), HeaderMap::new(), GraphQlRequest::new(query))
    }

    #[tokio::test]
    async fn test_capturing_handler_short_circuits() {
        let (handler, capture) = capturing_handler();

        let output = handler.handle_request(input("{ a }")).await.unwrap();
        assert!(output.data().is_none());
        assert_eq!(capture.count(), 1);
        assert_eq!(capture.last().unwrap().document(), "{ a }");

        capture.clear();
        assert!(capture.last().is_none());
    }

    #[tokio::test]
    async fn test_failing_handler_records_then_fails() {
        let (handler, capture) = failing_handler();

        let err = handler.handle_request(input("{ b }")).await.unwrap_err();
        assert!(matches!(err, ExecutionError::Unsupported(_)));
        assert_eq!(capture.captured().len(), 1);
    }
}
