//! Layered configuration for Thales GraphQL testers.
//!
//! Tester defaults can be kept out of test code:
//! - TOML and JSON configuration files
//! - Environment variable overrides
//! - Strict validation (fails on unknown fields)
//! - Layered configuration (defaults → file → env)
//!
//! A loaded [`TesterConfig`] is applied to a tester builder with
//! `configure`, after which individual settings can still be overridden.
//!
//! # Example
//!
//! ```no_run
//! use thales_config::ConfigLoader;
//!
//! # fn main() -> Result<(), thales_config::ConfigError> {
//! let config = ConfigLoader::new()
//!     .with_defaults()
//!     .with_dotenv()?
//!     .with_optional_file("thales.toml")?
//!     .with_env_prefix("THALES")
//!     .load()?;
//!
//! println!("Documents are loaded from {:?}", config.documents.locations);
//! # Ok(())
//! # }
//! ```
//!
//! # Configuration File Format
//!
//! ```toml
//! [tester]
//! url = "/graphql"
//! response_timeout_ms = 5000
//!
//! [documents]
//! locations = ["graphql-test"]
//! extensions = [".graphql", ".gql"]
//! cache = true
//!
//! [websocket]
//! connection_init_timeout_ms = 5000
//! channel_capacity = 64
//!
//! [logging]
//! enabled = true
//! level = "info,thales_ws=debug"
//! format = "compact"
//! ```
//!
//! # Environment Variable Overrides
//!
//! Values are overridden with `PREFIX__SECTION__KEY`:
//!
//! - `THALES__TESTER__URL=/graphql`
//! - `THALES__DOCUMENTS__LOCATIONS=tests/graphql,graphql-test`
//! - `THALES__LOGGING__FORMAT=json`

#![doc(html_root_url = "https://docs.rs/thales-config/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod config;
mod error;
mod loader;
mod schema;

pub use config::TesterConfig;
pub use error::ConfigError;
pub use loader::ConfigLoader;
pub use schema::{DocumentsSection, LoggingSection, TesterSection, WebSocketSection};
