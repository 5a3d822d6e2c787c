//! # Thales Server
//!
//! In-memory HTTP plumbing for the Thales GraphQL test client.
//!
//! - [`Router`] - method and path-pattern routing (`/graphql`, `/{id}`, `*`, `/**`)
//! - [`GraphQlHttpHandler`] - GraphQL over HTTP in front of a
//!   [`WebGraphQlHandler`](thales_core::WebGraphQlHandler)
//!
//! Nothing here opens a socket. Requests are plain [`http::Request`] values
//! that a test client hands to [`Router::handle`].
//!
//! ## Example
//!
//! ```rust
//! use thales_core::{ExecutionError, ExecutionResult, WebGraphQlHandler, WebInput};
//! use thales_server::{GraphQlHttpHandler, Router};
//!
//! let web = WebGraphQlHandler::builder(|_input: WebInput| async {
//!     Err::<ExecutionResult, _>(ExecutionError::unsupported("no engine"))
//! })
//! .build();
//!
//! let route = GraphQlHttpHandler::new(web).route_handler();
//! let router = Router::new().post("/**", move |req| route(req));
//! assert_eq!(router.route_count(), 1);
//! ```

#![doc(html_root_url = "https://docs.rs/thales-server/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod handler;
pub mod router;
pub mod types;

pub use handler::GraphQlHttpHandler;
pub use router::{RouteHandler, RouteMatch, Router};
pub use types::{Request, Response, ResponseExt, APPLICATION_GRAPHQL_RESPONSE_JSON, APPLICATION_JSON};
