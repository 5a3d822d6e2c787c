//! The root configuration type.

use serde::{Deserialize, Serialize};

use crate::{ConfigError, DocumentsSection, LoggingSection, TesterSection, WebSocketSection};

/// Complete Thales tester configuration.
///
/// Use [`ConfigLoader`](crate::ConfigLoader) to load it from files and
/// environment variables.
///
/// # Example
///
/// ```
/// use thales_config::TesterConfig;
///
/// let config = TesterConfig::default();
/// assert_eq!(config.tester.response_timeout_ms, 5_000);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(deny_unknown_fields)]
pub struct TesterConfig {
    /// Tester defaults.
    #[serde(default)]
    pub tester: TesterSection,

    /// Document lookup.
    #[serde(default)]
    pub documents: DocumentsSection,

    /// WebSocket sessions.
    #[serde(default)]
    pub websocket: WebSocketSection,

    /// Log output.
    #[serde(default)]
    pub logging: LoggingSection,
}

impl TesterConfig {
    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` if:
    /// - `tester.url` is set but empty
    /// - a timeout is zero
    /// - no document location or extension is configured
    /// - the log filter does not parse
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(url) = &self.tester.url {
            if url.trim().is_empty() {
                return Err(ConfigError::invalid_value("tester.url", "must not be empty"));
            }
        }

        if self.tester.response_timeout_ms == 0 {
            return Err(ConfigError::invalid_value(
                "tester.response_timeout_ms",
                "must be greater than zero",
            ));
        }

        if self.documents.locations.is_empty() {
            return Err(ConfigError::invalid_value(
                "documents.locations",
                "at least one location is required",
            ));
        }

        if self.documents.extensions.is_empty() {
            return Err(ConfigError::invalid_value(
                "documents.extensions",
                "at least one extension is required",
            ));
        }

        if self.websocket.connection_init_timeout_ms == 0 {
            return Err(ConfigError::invalid_value(
                "websocket.connection_init_timeout_ms",
                "must be greater than zero",
            ));
        }

        if self.logging.enabled {
            thales_telemetry::create_env_filter(&self.logging.level)
                .map_err(|e| ConfigError::invalid_value("logging.level", e.to_string()))?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        assert!(TesterConfig::default().validate().is_ok());
    }

    #[test]
    fn test_empty_url_rejected() {
        let mut config = TesterConfig::default();
        config.tester.url = Some("  ".to_string());
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("tester.url"));
    }

    #[test]
    fn test_zero_timeouts_rejected() {
        let mut config = TesterConfig::default();
        config.tester.response_timeout_ms = 0;
        assert!(config.validate().is_err());

        let mut config = TesterConfig::default();
        config.websocket.connection_init_timeout_ms = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_empty_document_lists_rejected() {
        let mut config = TesterConfig::default();
        config.documents.extensions.clear();
        assert!(config.validate().is_err());

        let mut config = TesterConfig::default();
        config.documents.locations.clear();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_bad_log_filter_rejected_only_when_enabled() {
        let mut config = TesterConfig::default();
        config.logging.level = "thales=loud".to_string();
        assert!(config.validate().is_ok());

        config.logging.enabled = true;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_unknown_section_rejected() {
        let result: Result<TesterConfig, _> = toml::from_str("[server]\nport = 1");
        assert!(result.is_err());
    }
}
