//! The web request handler and its interceptor chain.
//!
//! A [`WebGraphQlHandler`] is built from a terminal [`RequestExecutor`] and an
//! ordered list of [`WebInterceptor`]s. Every transport (direct call, HTTP,
//! WebSocket) ends up in [`WebGraphQlHandler::handle_request`].
//!
//! ```text
//! WebInput ──► interceptor 1 ──► interceptor 2 ──► ... ──► executor
//!                   │                  │                      │
//! WebOutput ◄───────┴──────────────────┴──────────────────────┘
//! ```
//!
//! # Example
//!
//! ```
//! use thales_core::{
//!     BoxFuture, Chain, ExecutionError, ExecutionResult, WebGraphQlHandler, WebInput,
//!     WebInterceptor, WebOutput,
//! };
//!
//! struct ShortCircuit;
//!
//! impl WebInterceptor for ShortCircuit {
//!     fn name(&self) -> &'static str {
//!         "short-circuit"
//!     }
//!
//!     fn intercept<'a>(
//!         &'a self,
//!         _input: WebInput,
//!         _chain: Chain<'a>,
//!     ) -> BoxFuture<'a, Result<WebOutput, ExecutionError>> {
//!         Box::pin(async { Ok(WebOutput::new(ExecutionResult::empty())) })
//!     }
//! }
//!
//! let handler = WebGraphQlHandler::builder(|_input: WebInput| async {
//!     Err::<ExecutionResult, _>(ExecutionError::unsupported("no engine"))
//! })
//! .interceptor(ShortCircuit)
//! .build();
//!
//! assert_eq!(handler.interceptor_names(), vec!["short-circuit"]);
//! ```

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use tracing::{debug, instrument};

use crate::error::ExecutionError;
use crate::request::WebInput;
use crate::response::{ExecutionResult, WebOutput};

/// A boxed, sendable future.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// The terminal step of the chain: turns a request into a result.
///
/// Implemented for any `Fn(WebInput) -> impl Future<Output = Result<ExecutionResult, ExecutionError>>`.
pub trait RequestExecutor: Send + Sync + 'static {
    /// Executes the request.
    fn execute(&self, input: WebInput) -> BoxFuture<'static, Result<ExecutionResult, ExecutionError>>;
}

impl<F, Fut> RequestExecutor for F
where
    F: Fn(WebInput) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<ExecutionResult, ExecutionError>> + Send + 'static,
{
    fn execute(&self, input: WebInput) -> BoxFuture<'static, Result<ExecutionResult, ExecutionError>> {
        Box::pin(self(input))
    }
}

/// Intercepts requests on their way to the executor.
///
/// An interceptor either calls [`Chain::next`] to continue, optionally
/// changing the input or the output, or returns its own output to stop the
/// chain.
pub trait WebInterceptor: Send + Sync + 'static {
    /// Returns the name used in logs and errors.
    fn name(&self) -> &'static str;

    /// Processes the request.
    fn intercept<'a>(
        &'a self,
        input: WebInput,
        chain: Chain<'a>,
    ) -> BoxFuture<'a, Result<WebOutput, ExecutionError>>;
}

/// The rest of the interceptor chain.
///
/// Consumed by [`Chain::next`], so each interceptor can continue at most once.
pub struct Chain<'a> {
    interceptors: &'a [Arc<dyn WebInterceptor>],
    executor: &'a dyn RequestExecutor,
}

impl<'a> Chain<'a> {
    fn new(interceptors: &'a [Arc<dyn WebInterceptor>], executor: &'a dyn RequestExecutor) -> Self {
        Self {
            interceptors,
            executor,
        }
    }

    /// Passes the input to the next interceptor, or to the executor at the end.
    pub fn next(self, input: WebInput) -> BoxFuture<'a, Result<WebOutput, ExecutionError>> {
        match self.interceptors.split_first() {
            Some((first, rest)) => {
                debug!(interceptor = first.name(), "Invoking interceptor");
                first.intercept(input, Chain::new(rest, self.executor))
            }
            None => {
                let execution = self.executor.execute(input);
                Box::pin(async move { execution.await.map(WebOutput::new) })
            }
        }
    }
}

/// Handles web requests through the interceptor chain.
///
/// Cheap to clone; clones share the same chain.
#[derive(Clone)]
pub struct WebGraphQlHandler {
    inner: Arc<HandlerInner>,
}

struct HandlerInner {
    interceptors: Vec<Arc<dyn WebInterceptor>>,
    executor: Arc<dyn RequestExecutor>,
}

impl WebGraphQlHandler {
    /// Starts a builder around the terminal executor.
    pub fn builder(executor: impl RequestExecutor) -> WebGraphQlHandlerBuilder {
        WebGraphQlHandlerBuilder {
            interceptors: Vec::new(),
            executor: Arc::new(executor),
        }
    }

    /// Runs the request through the interceptors and the executor.
    ///
    /// # Errors
    ///
    /// Returns the first [`ExecutionError`] raised along the chain.
    #[instrument(skip(self, input), fields(request_id = %input.id(), uri = %input.uri()))]
    pub async fn handle_request(&self, input: WebInput) -> Result<WebOutput, ExecutionError> {
        let chain = Chain::new(&self.inner.interceptors, self.inner.executor.as_ref());
        let result = chain.next(input).await;
        if let Err(e) = &result {
            debug!(error = %e, "Request handling failed");
        }
        result
    }

    /// Returns the names of the registered interceptors, in order.
    pub fn interceptor_names(&self) -> Vec<&'static str> {
        self.inner.interceptors.iter().map(|i| i.name()).collect()
    }
}

impl std::fmt::Debug for WebGraphQlHandler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WebGraphQlHandler")
            .field("interceptors", &self.interceptor_names())
            .finish_non_exhaustive()
    }
}

/// Builder for [`WebGraphQlHandler`].
#[must_use]
pub struct WebGraphQlHandlerBuilder {
    interceptors: Vec<Arc<dyn WebInterceptor>>,
    executor: Arc<dyn RequestExecutor>,
}

impl WebGraphQlHandlerBuilder {
    /// Appends an interceptor.
    pub fn interceptor(mut self, interceptor: impl WebInterceptor) -> Self {
        self.interceptors.push(Arc::new(interceptor));
        self
    }

    /// Appends an already shared interceptor.
    pub fn shared_interceptor(mut self, interceptor: Arc<dyn WebInterceptor>) -> Self {
        self.interceptors.push(interceptor);
        self
    }

    /// Builds the handler.
    pub fn build(self) -> WebGraphQlHandler {
        WebGraphQlHandler {
            inner: Arc::new(HandlerInner {
                interceptors: self.interceptors,
                executor: self.executor,
            }),
        }
    }
}
