//! # Thales Test
//!
//! GraphQL testers with copy-on-write builders.
//!
//! A [`TesterBuilder`] accumulates settings (URL, headers, document source,
//! response timeout) and builds an immutable [`GraphQlTester`]. Calling
//! [`GraphQlTester::mutate`] returns a new builder seeded with a copy of the
//! tester's settings, so a tester never changes after it is built.
//!
//! ## Transports
//!
//! | Tester | Request path |
//! |--------|--------------|
//! | [`WebGraphQlTester`] | direct call into a [`WebGraphQlHandler`](thales_core::WebGraphQlHandler) |
//! | [`HttpGraphQlTester`] | POST through an in-memory [`TestClient`] and router |
//! | [`WebSocketGraphQlTester`] | graphql-transport-ws session on an in-memory connection |
//!
//! ## Example
//!
//! ```
//! use http::HeaderValue;
//! use thales_test::fixtures::capturing_handler;
//! use thales_test::WebGraphQlTester;
//!
//! # tokio_test::block_on(async {
//! let (handler, capture) = capturing_handler();
//!
//! let tester = WebGraphQlTester::builder(handler).header("h", ["one"]).build().unwrap();
//! tester.document("{ Query }").execute().await.unwrap();
//! assert_eq!(capture.last().unwrap().header_values("h"), vec!["one"]);
//!
//! let tester = tester
//!     .mutate()
//!     .headers(|h| {
//!         h.append("h", HeaderValue::from_static("two"));
//!     })
//!     .build()
//!     .unwrap();
//! tester.document("{ Query }").execute().await.unwrap();
//! assert_eq!(capture.last().unwrap().header_values("h"), vec!["one", "two"]);
//! # });
//! ```

#![doc(html_root_url = "https://docs.rs/thales-test/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod builder;
mod client;
mod error;
pub mod fixtures;
mod request;
mod response;
mod settings;
mod tester;
pub mod transport;

pub use builder::TesterBuilder;
pub use client::{TestClient, TestClientBuilder, TestClientRequest, TestResponse};
pub use error::TesterError;
pub use request::RequestSpec;
pub use response::{PathSpec, TesterResponse};
pub use settings::{TesterSettings, DEFAULT_RESPONSE_TIMEOUT};
pub use tester::{GraphQlTester, HttpGraphQlTester, WebGraphQlTester, WebSocketGraphQlTester};
pub use transport::{Direct, GraphQlTransport, Http, TransportFactory, WebSocket};
