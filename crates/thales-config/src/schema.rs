//! Configuration schema types.
//!
//! Every section rejects unknown fields and falls back to defaults for
//! fields that are not set.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thales_core::document::{DEFAULT_DOCUMENT_EXTENSIONS, DEFAULT_DOCUMENT_LOCATION};
use thales_core::{CachingDocumentSource, DocumentSource, ResourceDocumentSource};
use thales_telemetry::{LogConfig, LogFormat};

/// Tester defaults.
///
/// # Example
///
/// ```
/// use thales_config::TesterSection;
///
/// let section = TesterSection {
///     url: Some("/graphql".to_string()),
///     response_timeout_ms: 2_000,
/// };
/// assert_eq!(section.response_timeout().as_millis(), 2_000);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct TesterSection {
    /// Base URL requests are sent to. Unset means the transport default.
    #[serde(default)]
    pub url: Option<String>,

    /// Bound on waiting for a response, in milliseconds.
    #[serde(default = "default_response_timeout")]
    pub response_timeout_ms: u64,
}

impl Default for TesterSection {
    fn default() -> Self {
        Self {
            url: None,
            response_timeout_ms: default_response_timeout(),
        }
    }
}

impl TesterSection {
    /// Returns the response timeout as a duration.
    #[must_use]
    pub fn response_timeout(&self) -> Duration {
        Duration::from_millis(self.response_timeout_ms)
    }
}

fn default_response_timeout() -> u64 {
    5_000
}

/// Where named documents are loaded from.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct DocumentsSection {
    /// Directories searched in order.
    #[serde(default = "default_locations")]
    pub locations: Vec<PathBuf>,

    /// File extensions tried in order, with the leading dot.
    #[serde(default = "default_extensions")]
    pub extensions: Vec<String>,

    /// Whether loaded documents are kept in memory.
    #[serde(default)]
    pub cache: bool,
}

impl Default for DocumentsSection {
    fn default() -> Self {
        Self {
            locations: default_locations(),
            extensions: default_extensions(),
            cache: false,
        }
    }
}

impl DocumentsSection {
    /// Builds the document source described by this section.
    #[must_use]
    pub fn document_source(&self) -> Arc<dyn DocumentSource> {
        let source = ResourceDocumentSource::new(self.locations.clone(), self.extensions.clone());
        if self.cache {
            Arc::new(CachingDocumentSource::new(source))
        } else {
            Arc::new(source)
        }
    }
}

fn default_locations() -> Vec<PathBuf> {
    vec![PathBuf::from(DEFAULT_DOCUMENT_LOCATION)]
}

fn default_extensions() -> Vec<String> {
    DEFAULT_DOCUMENT_EXTENSIONS.iter().map(|e| (*e).to_string()).collect()
}

/// WebSocket session settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct WebSocketSection {
    /// How long a server waits for `connection_init`, in milliseconds.
    #[serde(default = "default_init_timeout")]
    pub connection_init_timeout_ms: u64,

    /// Buffered frames per direction of an in-memory connection.
    #[serde(default = "default_channel_capacity")]
    pub channel_capacity: usize,
}

impl Default for WebSocketSection {
    fn default() -> Self {
        Self {
            connection_init_timeout_ms: default_init_timeout(),
            channel_capacity: default_channel_capacity(),
        }
    }
}

impl WebSocketSection {
    /// Returns the `connection_init` timeout as a duration.
    #[must_use]
    pub fn connection_init_timeout(&self) -> Duration {
        Duration::from_millis(self.connection_init_timeout_ms)
    }
}

fn default_init_timeout() -> u64 {
    5_000
}

fn default_channel_capacity() -> usize {
    64
}

/// Log output settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct LoggingSection {
    /// Whether a subscriber should be installed.
    #[serde(default)]
    pub enabled: bool,

    /// Filter directives.
    #[serde(default = "default_level")]
    pub level: String,

    /// Output format.
    #[serde(default)]
    pub format: LogFormat,
}

impl Default for LoggingSection {
    fn default() -> Self {
        Self {
            enabled: false,
            level: default_level(),
            format: LogFormat::default(),
        }
    }
}

impl LoggingSection {
    /// Converts the section into a telemetry configuration.
    #[must_use]
    pub fn to_log_config(&self) -> LogConfig {
        LogConfig {
            enabled: self.enabled,
            level: self.level.clone(),
            format: self.format,
            ..LogConfig::default()
        }
    }
}

fn default_level() -> String {
    "info".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_section_defaults() {
        assert_eq!(TesterSection::default().response_timeout(), Duration::from_secs(5));
        assert_eq!(DocumentsSection::default().locations, vec![PathBuf::from("graphql-test")]);
        assert_eq!(DocumentsSection::default().extensions, vec![".graphql", ".gql"]);
        assert_eq!(
            WebSocketSection::default().connection_init_timeout(),
            Duration::from_secs(5)
        );
        assert!(!LoggingSection::default().enabled);
    }

    #[test]
    fn test_partial_section_keeps_defaults() {
        let section: DocumentsSection = toml::from_str("cache = true").unwrap();
        assert!(section.cache);
        assert_eq!(section.extensions, vec![".graphql", ".gql"]);
    }

    #[test]
    fn test_unknown_field_rejected() {
        let result: Result<TesterSection, _> = toml::from_str("base_url = \"/x\"");
        assert!(result.is_err());
    }

    #[test]
    fn test_logging_section_to_log_config() {
        let section = LoggingSection {
            enabled: true,
            level: "debug".to_string(),
            format: LogFormat::Json,
        };
        let config = section.to_log_config();
        assert!(config.enabled);
        assert_eq!(config.level, "debug");
        assert_eq!(config.format, LogFormat::Json);
    }

    #[tokio::test]
    async fn test_document_source_reads_configured_location() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("name.gql"), "{ Query }").unwrap();

        let section = DocumentsSection {
            locations: vec![dir.path().to_path_buf()],
            cache: true,
            ..DocumentsSection::default()
        };
        let source = section.document_source();
        assert_eq!(source.get_document("name").await.unwrap(), "{ Query }");
        assert!(source.get_document("other").await.is_err());
    }
}
