//! Error types for request handling and document resolution.
//!
//! Two failure families are kept apart so callers can tell them apart:
//!
//! - [`DocumentError`] - a named document could not be resolved to text
//! - [`ExecutionError`] - the request reached a handler and handling failed

use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while resolving a document name to document text.
#[derive(Debug, Error)]
pub enum DocumentError {
    /// No document is registered or stored under the given name.
    #[error("document not found: {name}")]
    NotFound {
        /// The unresolvable document name.
        name: String,
    },

    /// The document exists but could not be read.
    #[error("failed to read document {name} from {path}")]
    Read {
        /// The requested document name.
        name: String,
        /// The file that failed to load.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The document source refused the name for another reason.
    #[error("document {name} rejected: {reason}")]
    Rejected {
        /// The requested document name.
        name: String,
        /// Explanation supplied by the source.
        reason: String,
    },
}

impl DocumentError {
    /// Create a "not found" error.
    pub fn not_found(name: impl Into<String>) -> Self {
        Self::NotFound { name: name.into() }
    }

    /// Create a "rejected" error.
    pub fn rejected(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Rejected {
            name: name.into(),
            reason: reason.into(),
        }
    }

    /// Returns the document name the error refers to.
    pub fn name(&self) -> &str {
        match self {
            Self::NotFound { name } | Self::Read { name, .. } | Self::Rejected { name, .. } => name,
        }
    }
}

/// Errors raised by a request handler, an interceptor or the terminal executor.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ExecutionError {
    /// The executor does not support the request.
    #[error("unsupported operation: {0}")]
    Unsupported(String),

    /// The request was malformed.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// An interceptor failed the request.
    #[error("interceptor {interceptor} failed: {reason}")]
    Interceptor {
        /// Name of the failing interceptor.
        interceptor: String,
        /// Failure description.
        reason: String,
    },

    /// Any other failure inside the handler.
    #[error("internal error: {0}")]
    Internal(String),
}

impl ExecutionError {
    /// Create an "unsupported" error.
    pub fn unsupported(reason: impl Into<String>) -> Self {
        Self::Unsupported(reason.into())
    }

    /// Create an "invalid request" error.
    pub fn invalid_request(reason: impl Into<String>) -> Self {
        Self::InvalidRequest(reason.into())
    }

    /// Create an interceptor failure.
    pub fn interceptor(interceptor: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Interceptor {
            interceptor: interceptor.into(),
            reason: reason.into(),
        }
    }

    /// Create an internal error.
    pub fn internal(reason: impl Into<String>) -> Self {
        Self::Internal(reason.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_document_error_name() {
        assert_eq!(DocumentError::not_found("getUser").name(), "getUser");
        assert_eq!(DocumentError::rejected("x", "bad").name(), "x");
    }

    #[test]
    fn test_document_error_display() {
        let err = DocumentError::not_found("missing");
        assert_eq!(err.to_string(), "document not found: missing");
    }

    #[test]
    fn test_execution_error_display() {
        let err = ExecutionError::unsupported("no executor");
        assert_eq!(err.to_string(), "unsupported operation: no executor");

        let err = ExecutionError::interceptor("auth", "denied");
        assert_eq!(err.to_string(), "interceptor auth failed: denied");
    }
}
