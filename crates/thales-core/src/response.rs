//! Response envelopes.

use http::{HeaderMap, HeaderName, HeaderValue};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A source location inside a GraphQL document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceLocation {
    /// 1-based line.
    pub line: u32,
    /// 1-based column.
    pub column: u32,
}

/// A GraphQL error entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponseError {
    /// Human readable message.
    pub message: String,

    /// Locations in the document.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub locations: Vec<SourceLocation>,

    /// Path to the failing field, as names and list indexes.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub path: Vec<Value>,

    /// Error extensions.
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub extensions: Map<String, Value>,
}

impl ResponseError {
    /// Creates an error with only a message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            locations: Vec::new(),
            path: Vec::new(),
            extensions: Map::new(),
        }
    }

    /// Sets the field path.
    #[must_use]
    pub fn with_path(mut self, path: Vec<Value>) -> Self {
        self.path = path;
        self
    }

    /// Adds an extension entry.
    #[must_use]
    pub fn with_extension(mut self, name: impl Into<String>, value: Value) -> Self {
        self.extensions.insert(name.into(), value);
        self
    }
}

/// The result of executing a GraphQL request.
///
/// An empty result (no data, no errors) is what interceptors that stop the
/// chain usually return.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ExecutionResult {
    /// Response data; absent when execution did not start.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,

    /// Errors raised during execution.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<ResponseError>,

    /// Response extensions.
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub extensions: Map<String, Value>,
}

impl ExecutionResult {
    /// Creates an empty result.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Creates a result carrying data.
    pub fn from_data(data: Value) -> Self {
        Self {
            data: Some(data),
            ..Self::default()
        }
    }

    /// Creates a result carrying errors only.
    pub fn from_errors(errors: Vec<ResponseError>) -> Self {
        Self {
            errors,
            ..Self::default()
        }
    }

    /// Returns true when data is present.
    pub fn is_data_present(&self) -> bool {
        self.data.is_some()
    }
}

/// The response as produced by a web handler.
#[derive(Debug, Clone, Default)]
pub struct WebOutput {
    result: ExecutionResult,
    response_headers: HeaderMap,
}

impl WebOutput {
    /// Wraps an execution result.
    pub fn new(result: ExecutionResult) -> Self {
        Self {
            result,
            response_headers: HeaderMap::new(),
        }
    }

    /// Adds a header to send back with the response (HTTP only).
    #[must_use]
    pub fn with_response_header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.response_headers.append(name, value);
        self
    }

    /// Returns the execution result.
    pub fn result(&self) -> &ExecutionResult {
        &self.result
    }

    /// Returns the response data.
    pub fn data(&self) -> Option<&Value> {
        self.result.data.as_ref()
    }

    /// Returns the response errors.
    pub fn errors(&self) -> &[ResponseError] {
        &self.result.errors
    }

    /// Returns true when data is present.
    pub fn is_valid(&self) -> bool {
        self.result.is_data_present()
    }

    /// Returns the headers to send back with the response.
    pub fn response_headers(&self) -> &HeaderMap {
        &self.response_headers
    }

    /// Splits the output into result and response headers.
    pub fn into_parts(self) -> (ExecutionResult, HeaderMap) {
        (self.result, self.response_headers)
    }
}

impl From<ExecutionResult> for WebOutput {
    fn from(result: ExecutionResult) -> Self {
        Self::new(result)
    }
}
