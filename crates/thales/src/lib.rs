//! # Thales
//!
//! **GraphQL test client with immutable testers and copy-on-write builders**
//!
//! - **Immutable testers** – settings are frozen at `build()`; `mutate()` starts a new builder from a copy
//! - **Three transports** – direct handler calls, HTTP through an in-memory router, graphql-transport-ws
//! - **Lazy documents** – named documents are resolved per request from a pluggable source
//! - **Layered configuration** – defaults, TOML/JSON files and `THALES__*` environment overrides
//!
//! ## Quick Start
//!
//! ```rust
//! use http::HeaderValue;
//! use thales::prelude::*;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> Result<(), TesterError> {
//! let (handler, capture) = thales::test::fixtures::capturing_handler();
//! let client = TestClient::bind_to_http_handler(&GraphQlHttpHandler::new(handler));
//!
//! let tester = HttpGraphQlTester::builder(client)
//!     .url("/graphql-one")
//!     .header("h", ["one"])
//!     .build()?;
//!
//! let tester = tester
//!     .mutate()
//!     .headers(|h| {
//!         h.append("h", HeaderValue::from_static("two"));
//!     })
//!     .build()?;
//!
//! tester.document("{ Query }").execute().await?;
//! assert_eq!(capture.last().unwrap().header_values("h"), vec!["one", "two"]);
//! # Ok(())
//! # }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! TesterBuilder ──build()──► GraphQlTester ──mutate()──► TesterBuilder (copy)
//!                                 │
//!                  document / document_name ──► DocumentSource
//!                                 │
//!           ┌─────────────────────┼──────────────────────┐
//!        Direct                 Http                 WebSocket
//!           │          TestClient ─► Router      TestWebSocketClient
//!           │                 GraphQlHttpHandler   GraphQlWebSocketHandler
//!           └─────────────────────┴──────────────────────┘
//!                                 ▼
//!                 WebGraphQlHandler (interceptors ─► executor)
//! ```

#![doc(html_root_url = "https://docs.rs/thales/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

// Re-export core types
pub use thales_core as core;

// Re-export HTTP plumbing
pub use thales_server as server;

// Re-export WebSocket types
pub use thales_ws as ws;

// Re-export logging setup
pub use thales_telemetry as telemetry;

// Re-export configuration
pub use thales_config as config;

// Re-export testers
pub use thales_test as test;

/// Prelude module for convenient imports.
///
/// # Example
///
/// ```rust
/// use thales::prelude::*;
///
/// let config = TesterConfig::default();
/// assert!(config.validate().is_ok());
/// ```
pub mod prelude {
    pub use thales_core::{
        DocumentError, DocumentSource, ExecutionError, ExecutionResult, FnDocumentSource,
        GraphQlRequest, ResourceDocumentSource, StaticDocumentSource, WebGraphQlHandler, WebInput,
        WebInterceptor, WebOutput,
    };

    // Re-export HTTP types
    pub use thales_server::{GraphQlHttpHandler, Router};

    // Re-export WebSocket types
    pub use thales_ws::{GraphQlWebSocketHandler, TestWebSocketClient, WebSocketClient, WsError};

    // Re-export configuration and logging
    pub use thales_config::{ConfigLoader, TesterConfig};
    pub use thales_telemetry::{init_logging, init_test_logging, LogConfig};

    // Re-export testers
    pub use thales_test::{
        GraphQlTester, HttpGraphQlTester, PathSpec, RequestSpec, TestClient, TesterBuilder,
        TesterError, TesterResponse, WebGraphQlTester, WebSocketGraphQlTester,
    };
}
