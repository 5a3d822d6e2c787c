//! Logging setup for Thales.
//!
//! The library crates only emit `tracing` events and spans. This crate
//! installs a `tracing-subscriber` pipeline to print them:
//!
//! - [`init_logging`] for applications and example binaries
//! - [`init_test_logging`] for test suites
//!
//! # Example
//!
//! ```rust
//! use thales_telemetry::{LogConfig, LogFormat};
//!
//! let config = LogConfig {
//!     format: LogFormat::Json,
//!     ..LogConfig::default()
//! };
//! assert_eq!(config.level, "info");
//! ```

#![doc(html_root_url = "https://docs.rs/thales-telemetry/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod error;
pub mod logging;

pub use error::TelemetryError;
pub use logging::{create_env_filter, fields, init_logging, init_test_logging, LogConfig, LogFormat};

/// Result type for telemetry operations.
pub type TelemetryResult<T> = Result<T, TelemetryError>;
