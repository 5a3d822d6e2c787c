//! # Thales Core
//!
//! Shared building blocks for the Thales GraphQL test client:
//!
//! - [`GraphQlRequest`] and [`WebInput`] - the request as a handler sees it
//! - [`ExecutionResult`] and [`WebOutput`] - the response envelope
//! - [`WebGraphQlHandler`] - interceptor chain in front of a terminal executor
//! - [`DocumentSource`] - lazy resolution of named documents
//!
//! The crate contains no GraphQL engine. The terminal [`RequestExecutor`] is
//! always supplied by the caller, which in tests is usually a function that
//! fails, with an interceptor in front of it that records the [`WebInput`].

#![doc(html_root_url = "https://docs.rs/thales-core/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod document;
pub mod error;
pub mod handler;
pub mod request;
pub mod response;

pub use document::{
    CachingDocumentSource, DocumentSource, FnDocumentSource, ResourceDocumentSource,
    StaticDocumentSource,
};
pub use error::{DocumentError, ExecutionError};
pub use handler::{
    BoxFuture, Chain, RequestExecutor, WebGraphQlHandler, WebGraphQlHandlerBuilder, WebInterceptor,
};
pub use request::{GraphQlRequest, WebInput};
pub use response::{ExecutionResult, ResponseError, SourceLocation, WebOutput};
