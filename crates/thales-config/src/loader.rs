//! Configuration loader with layered approach.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use crate::{ConfigError, TesterConfig};

/// Configuration loader with layered approach.
///
/// Later layers override earlier ones:
/// 1. Default values
/// 2. Configuration file (TOML or JSON)
/// 3. Environment variables (`PREFIX__SECTION__KEY`)
///
/// # Example
///
/// ```no_run
/// use thales_config::ConfigLoader;
///
/// # fn main() -> Result<(), thales_config::ConfigError> {
/// let config = ConfigLoader::new()
///     .with_optional_file("thales.toml")?
///     .with_env_prefix("THALES")
///     .load()?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Default)]
pub struct ConfigLoader {
    config: TesterConfig,
    env_prefix: Option<String>,
    env_vars: Option<Vec<(String, String)>>,
}

impl ConfigLoader {
    /// Create a new configuration loader.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Reset to the default configuration.
    #[must_use]
    pub fn with_defaults(mut self) -> Self {
        self.config = TesterConfig::default();
        self
    }

    /// Load configuration from a file.
    ///
    /// The format is picked from the extension: `.toml` or `.json`.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the file is missing, unreadable, malformed
    /// or contains unknown fields.
    pub fn with_file<P: AsRef<Path>>(mut self, path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(ConfigError::file_not_found(path));
        }

        let content = fs::read_to_string(path).map_err(|e| ConfigError::read_error(path, e))?;
        self.config = Self::parse_file(&content, path)?;
        Ok(self)
    }

    /// Load configuration from a file if it exists.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the file exists but cannot be loaded.
    pub fn with_optional_file<P: AsRef<Path>>(self, path: P) -> Result<Self, ConfigError> {
        if path.as_ref().exists() {
            self.with_file(path)
        } else {
            Ok(self)
        }
    }

    /// Load configuration from a string in the given format (`toml` or `json`).
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if parsing fails.
    ///
    /// # Example
    ///
    /// ```
    /// use thales_config::ConfigLoader;
    ///
    /// let toml = r#"
    ///     [tester]
    ///     url = "/graphql-one"
    /// "#;
    ///
    /// let config = ConfigLoader::new()
    ///     .with_string(toml, "toml")
    ///     .unwrap()
    ///     .load()
    ///     .unwrap();
    ///
    /// assert_eq!(config.tester.url.as_deref(), Some("/graphql-one"));
    /// ```
    pub fn with_string(mut self, content: &str, format: &str) -> Result<Self, ConfigError> {
        self.config = match format.to_lowercase().as_str() {
            "toml" => toml::from_str(content)?,
            "json" => serde_json::from_str(content)?,
            _ => {
                return Err(ConfigError::validation_error(format!(
                    "unsupported configuration format: {format}"
                )))
            }
        };
        Ok(self)
    }

    /// Set environment variable prefix for overrides.
    ///
    /// With prefix `THALES`, `THALES__TESTER__URL=/graphql` sets
    /// `tester.url`.
    #[must_use]
    pub fn with_env_prefix(mut self, prefix: &str) -> Self {
        self.env_prefix = Some(prefix.to_uppercase());
        self
    }

    /// Read overrides from the given variables instead of the process
    /// environment.
    #[must_use]
    pub fn with_env_vars<I, K, V>(mut self, vars: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.env_vars = Some(vars.into_iter().map(|(k, v)| (k.into(), v.into())).collect());
        self
    }

    /// Load a `.env` file from the current directory or its parents.
    ///
    /// A missing file is not an error.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Dotenv` if the file exists but cannot be parsed.
    pub fn with_dotenv(self) -> Result<Self, ConfigError> {
        match dotenvy::dotenv() {
            Ok(_) => Ok(self),
            Err(e) if e.not_found() => Ok(self),
            Err(e) => Err(e.into()),
        }
    }

    /// Apply environment overrides, validate and return the configuration.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if an override does not parse or validation fails.
    pub fn load(mut self) -> Result<TesterConfig, ConfigError> {
        if let Some(prefix) = self.env_prefix.take() {
            let vars = match self.env_vars.take() {
                Some(vars) => vars,
                None => env::vars().collect(),
            };
            for (key, value) in vars.iter().filter(|(k, _)| k.starts_with(&prefix)) {
                self.apply_env_var(key, value, &prefix)?;
            }
        }

        self.config.validate()?;
        Ok(self.config)
    }

    /// Finalize without environment overrides or validation.
    #[must_use]
    pub fn load_unvalidated(self) -> TesterConfig {
        self.config
    }

    fn parse_file(content: &str, path: &Path) -> Result<TesterConfig, ConfigError> {
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_lowercase);

        match extension.as_deref() {
            Some("toml") => Ok(toml::from_str(content)?),
            Some("json") => Ok(serde_json::from_str(content)?),
            _ => Err(ConfigError::validation_error(format!(
                "unsupported configuration file format: {}",
                path.display()
            ))),
        }
    }

    fn apply_env_var(&mut self, key: &str, value: &str, prefix: &str) -> Result<(), ConfigError> {
        let Some(key_without_prefix) = key.strip_prefix(prefix).and_then(|k| k.strip_prefix("__"))
        else {
            return Ok(());
        };

        let parts: Vec<&str> = key_without_prefix.split("__").collect();

        match parts.as_slice() {
            ["TESTER", "URL"] => {
                self.config.tester.url = if value.is_empty() {
                    None
                } else {
                    Some(value.to_string())
                };
            }
            ["TESTER", "RESPONSE_TIMEOUT_MS"] => {
                self.config.tester.response_timeout_ms = parse_number(key, value)?;
            }

            ["DOCUMENTS", "LOCATIONS"] => {
                self.config.documents.locations = split_list(value).map(PathBuf::from).collect();
            }
            ["DOCUMENTS", "EXTENSIONS"] => {
                self.config.documents.extensions = split_list(value).map(String::from).collect();
            }
            ["DOCUMENTS", "CACHE"] => {
                self.config.documents.cache = parse_bool(value)
                    .ok_or_else(|| ConfigError::env_parse_error(key, "expected boolean"))?;
            }

            ["WEBSOCKET", "CONNECTION_INIT_TIMEOUT_MS"] => {
                self.config.websocket.connection_init_timeout_ms = parse_number(key, value)?;
            }
            ["WEBSOCKET", "CHANNEL_CAPACITY"] => {
                self.config.websocket.channel_capacity = parse_number(key, value)?;
            }

            ["LOGGING", "ENABLED"] => {
                self.config.logging.enabled = parse_bool(value)
                    .ok_or_else(|| ConfigError::env_parse_error(key, "expected boolean"))?;
            }
            ["LOGGING", "LEVEL"] => {
                self.config.logging.level = value.to_string();
            }
            ["LOGGING", "FORMAT"] => {
                self.config.logging.format = value
                    .parse()
                    .map_err(|_| ConfigError::env_parse_error(key, "expected 'json', 'pretty' or 'compact'"))?;
            }

            _ => {}
        }

        Ok(())
    }
}

fn parse_number<T: std::str::FromStr>(key: &str, value: &str) -> Result<T, ConfigError> {
    value
        .trim()
        .parse()
        .map_err(|_| ConfigError::env_parse_error(key, "expected integer"))
}

fn split_list(value: &str) -> impl Iterator<Item = &str> {
    value.split(',').map(str::trim).filter(|s| !s.is_empty())
}

/// Parse a boolean from a string.
fn parse_bool(s: &str) -> Option<bool> {
    match s.to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use thales_telemetry::LogFormat;

    #[test]
    fn test_loader_defaults() {
        let config = ConfigLoader::new().load().unwrap();
        assert_eq!(config, TesterConfig::default());
    }

    #[test]
    fn test_loader_with_string_json() {
        let json = r#"{"tester": {"url": "/graphql-one", "response_timeout_ms": 250}}"#;
        let config = ConfigLoader::new().with_string(json, "json").unwrap().load().unwrap();
        assert_eq!(config.tester.url.as_deref(), Some("/graphql-one"));
        assert_eq!(config.tester.response_timeout_ms, 250);
    }

    #[test]
    fn test_loader_with_string_unknown_format() {
        assert!(ConfigLoader::new().with_string("", "yaml").is_err());
    }

    #[test]
    fn test_loader_with_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("thales.toml");
        fs::write(
            &path,
            r#"
                [documents]
                locations = ["tests/graphql", "graphql-test"]
                cache = true

                [websocket]
                connection_init_timeout_ms = 100
            "#,
        )
        .unwrap();

        let config = ConfigLoader::new().with_file(&path).unwrap().load().unwrap();
        assert_eq!(
            config.documents.locations,
            vec![PathBuf::from("tests/graphql"), PathBuf::from("graphql-test")]
        );
        assert!(config.documents.cache);
        assert_eq!(config.websocket.connection_init_timeout_ms, 100);
        assert_eq!(config.tester, crate::TesterSection::default());
    }

    #[test]
    fn test_loader_with_file_unknown_field() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("thales.json");
        fs::write(&path, r#"{"tester": {"uri": "/x"}}"#).unwrap();

        let err = ConfigLoader::new().with_file(&path).unwrap_err();
        assert!(matches!(err, ConfigError::JsonError(_)));
    }

    #[test]
    fn test_loader_with_file_not_found() {
        let err = ConfigLoader::new().with_file("/nonexistent/thales.toml").unwrap_err();
        assert!(matches!(err, ConfigError::FileNotFound { .. }));
    }

    #[test]
    fn test_loader_with_optional_file_not_found() {
        assert!(ConfigLoader::new().with_optional_file("/nonexistent/thales.toml").is_ok());
    }

    #[test]
    fn test_env_overrides() {
        let config = ConfigLoader::new()
            .with_env_prefix("thales")
            .with_env_vars([
                ("THALES__TESTER__URL", "/graphql-two"),
                ("THALES__TESTER__RESPONSE_TIMEOUT_MS", "1500"),
                ("THALES__DOCUMENTS__LOCATIONS", "a, b ,"),
                ("THALES__DOCUMENTS__EXTENSIONS", ".graphqls"),
                ("THALES__DOCUMENTS__CACHE", "yes"),
                ("THALES__WEBSOCKET__CONNECTION_INIT_TIMEOUT_MS", "200"),
                ("THALES__LOGGING__ENABLED", "on"),
                ("THALES__LOGGING__LEVEL", "debug"),
                ("THALES__LOGGING__FORMAT", "json"),
                ("THALES__UNKNOWN__KEY", "ignored"),
                ("OTHER__TESTER__URL", "/ignored"),
            ])
            .load()
            .unwrap();

        assert_eq!(config.tester.url.as_deref(), Some("/graphql-two"));
        assert_eq!(config.tester.response_timeout_ms, 1500);
        assert_eq!(config.documents.locations, vec![PathBuf::from("a"), PathBuf::from("b")]);
        assert_eq!(config.documents.extensions, vec![".graphqls"]);
        assert!(config.documents.cache);
        assert_eq!(config.websocket.connection_init_timeout_ms, 200);
        assert!(config.logging.enabled);
        assert_eq!(config.logging.level, "debug");
        assert_eq!(config.logging.format, LogFormat::Json);
    }

    #[test]
    fn test_env_override_overrides_file() {
        let config = ConfigLoader::new()
            .with_string("[tester]\nurl = \"/from-file\"", "toml")
            .unwrap()
            .with_env_prefix("THALES")
            .with_env_vars([("THALES__TESTER__URL", "/from-env")])
            .load()
            .unwrap();
        assert_eq!(config.tester.url.as_deref(), Some("/from-env"));
    }

    #[test]
    fn test_env_invalid_number() {
        let err = ConfigLoader::new()
            .with_env_prefix("THALES")
            .with_env_vars([("THALES__TESTER__RESPONSE_TIMEOUT_MS", "soon")])
            .load()
            .unwrap_err();
        assert!(matches!(err, ConfigError::EnvParseError { .. }));
    }

    #[test]
    fn test_env_zero_timeout_fails_validation() {
        let err = ConfigLoader::new()
            .with_env_prefix("THALES")
            .with_env_vars([("THALES__TESTER__RESPONSE_TIMEOUT_MS", "0")])
            .load()
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { .. }));
    }

    #[test]
    fn test_parse_bool() {
        assert_eq!(parse_bool("TRUE"), Some(true));
        assert_eq!(parse_bool("off"), Some(false));
        assert_eq!(parse_bool("maybe"), None);
    }
}
