//! Tester error types.

use std::time::Duration;

use http::StatusCode;
use thales_core::{DocumentError, ExecutionError, ResponseError};
use thales_ws::WsError;
use thiserror::Error;

/// Errors that can occur while building testers or executing requests.
#[derive(Debug, Error)]
pub enum TesterError {
    /// The configured URL is empty or does not parse as a URI.
    #[error("invalid url '{value}': {reason}")]
    InvalidUrl {
        /// The rejected value.
        value: String,
        /// Why it was rejected.
        reason: String,
    },

    /// A header name or value is invalid.
    #[error("invalid header '{name}': {reason}")]
    InvalidHeader {
        /// The header name as given.
        name: String,
        /// Why it was rejected.
        reason: String,
    },

    /// A named document could not be resolved.
    #[error(transparent)]
    Document(#[from] DocumentError),

    /// The handler failed the request (direct transport).
    #[error("execution failed: {0}")]
    Execution(#[from] ExecutionError),

    /// The HTTP endpoint answered with a non-success status.
    #[error("HTTP {status}: {body}")]
    Http {
        /// Response status.
        status: StatusCode,
        /// Response body, lossily decoded.
        body: String,
    },

    /// The server answered with a graphql-transport-ws `error` message.
    #[error("request failed: {}", first_message(.errors))]
    RequestFailed {
        /// The errors from the `error` payload.
        errors: Vec<ResponseError>,
    },

    /// No response arrived within the response timeout.
    #[error("no response within {0:?}")]
    Timeout(Duration),

    /// The WebSocket session failed.
    #[error("websocket: {0}")]
    WebSocket(#[from] WsError),

    /// A response body or value could not be decoded.
    #[error("failed to decode response: {0}")]
    Decode(#[from] serde_json::Error),
}

impl TesterError {
    /// Returns true when a document name could not be resolved.
    pub fn is_document_error(&self) -> bool {
        matches!(self, Self::Document(_))
    }

    /// Returns true when the request reached the handler and handling failed.
    pub fn is_execution_error(&self) -> bool {
        matches!(
            self,
            Self::Execution(_) | Self::Http { .. } | Self::RequestFailed { .. }
        )
    }

    /// Returns true when the response timeout elapsed.
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout(_))
    }
}

fn first_message(errors: &[ResponseError]) -> &str {
    errors.first().map_or("no error details", |e| e.message.as_str())
}

/// A builder setting that was rejected when it was made.
///
/// Builder methods stay chainable; the first rejection is reported by `build`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum InvalidSetting {
    Url { value: String, reason: String },
    Header { name: String, reason: String },
}

impl InvalidSetting {
    pub(crate) fn url(value: &str, reason: impl ToString) -> Self {
        Self::Url {
            value: value.to_string(),
            reason: reason.to_string(),
        }
    }

    pub(crate) fn header(name: &str, reason: impl ToString) -> Self {
        Self::Header {
            name: name.to_string(),
            reason: reason.to_string(),
        }
    }
}

impl From<InvalidSetting> for TesterError {
    fn from(invalid: InvalidSetting) -> Self {
        match invalid {
            InvalidSetting::Url { value, reason } => Self::InvalidUrl { value, reason },
            InvalidSetting::Header { name, reason } => Self::InvalidHeader { name, reason },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_document_and_execution_errors_are_distinct() {
        let document: TesterError = DocumentError::not_found("other").into();
        assert!(document.is_document_error());
        assert!(!document.is_execution_error());
        assert_eq!(document.to_string(), "document not found: other");

        let execution: TesterError = ExecutionError::unsupported("no engine").into();
        assert!(execution.is_execution_error());
        assert!(!execution.is_document_error());
    }

    #[test]
    fn test_request_failed_display() {
        let err = TesterError::RequestFailed {
            errors: vec![ResponseError::new("boom")],
        };
        assert_eq!(err.to_string(), "request failed: boom");

        let err = TesterError::RequestFailed { errors: Vec::new() };
        assert_eq!(err.to_string(), "request failed: no error details");
    }

    #[test]
    fn test_invalid_setting_conversion() {
        let err: TesterError = InvalidSetting::header("bad name", "invalid HTTP header name").into();
        assert!(matches!(err, TesterError::InvalidHeader { ref name, .. } if name == "bad name"));

        let err: TesterError = InvalidSetting::url("", "must not be empty").into();
        assert_eq!(err.to_string(), "invalid url '': must not be empty");
    }
}
