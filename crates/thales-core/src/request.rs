//! Request envelopes.
//!
//! [`GraphQlRequest`] is the transport-neutral GraphQL payload in the standard
//! GraphQL-over-HTTP JSON shape. [`WebInput`] wraps it with the web details
//! (URI, headers, request id) that a handler and its interceptors observe.

use http::{HeaderMap, Uri};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::error::ExecutionError;

/// A GraphQL request payload.
///
/// # Example
///
/// ```
/// use thales_core::GraphQlRequest;
/// use serde_json::json;
///
/// let request = GraphQlRequest::new("query User($id: ID!) { user(id: $id) { name } }")
///     .with_operation_name("User")
///     .with_variable("id", json!("42"));
///
/// assert_eq!(request.operation_name.as_deref(), Some("User"));
/// assert_eq!(request.variables["id"], "42");
/// ```
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphQlRequest {
    /// The document text.
    pub query: String,

    /// Operation to run when the document holds several.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub operation_name: Option<String>,

    /// Variable values keyed by name.
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub variables: Map<String, Value>,

    /// Protocol extensions.
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub extensions: Map<String, Value>,
}

impl GraphQlRequest {
    /// Creates a request for the given document text.
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            ..Self::default()
        }
    }

    /// Sets the operation name.
    #[must_use]
    pub fn with_operation_name(mut self, name: impl Into<String>) -> Self {
        self.operation_name = Some(name.into());
        self
    }

    /// Adds a variable, replacing a previous value with the same name.
    #[must_use]
    pub fn with_variable(mut self, name: impl Into<String>, value: Value) -> Self {
        self.variables.insert(name.into(), value);
        self
    }

    /// Adds an extension entry.
    #[must_use]
    pub fn with_extension(mut self, name: impl Into<String>, value: Value) -> Self {
        self.extensions.insert(name.into(), value);
        self
    }

    /// Decodes a request from a JSON body.
    ///
    /// # Errors
    ///
    /// Returns [`ExecutionError::InvalidRequest`] when the body is not a JSON
    /// request object or the `query` field is blank.
    pub fn from_json_slice(body: &[u8]) -> Result<Self, ExecutionError> {
        let request: Self = serde_json::from_slice(body)
            .map_err(|e| ExecutionError::invalid_request(format!("malformed body: {e}")))?;
        request.validate()?;
        Ok(request)
    }

    /// Checks that the request carries a document.
    ///
    /// # Errors
    ///
    /// Returns [`ExecutionError::InvalidRequest`] when `query` is blank.
    pub fn validate(&self) -> Result<(), ExecutionError> {
        if self.query.trim().is_empty() {
            return Err(ExecutionError::invalid_request("no document"));
        }
        Ok(())
    }
}

/// The request as seen by a web handler.
///
/// Carries the request URI and headers exactly as sent, without any
/// normalization, so interceptors can assert on them.
#[derive(Debug, Clone)]
pub struct WebInput {
    uri: Uri,
    headers: HeaderMap,
    request: GraphQlRequest,
    id: String,
}

impl WebInput {
    /// Creates an input with an explicit request id.
    pub fn new(uri: Uri, headers: HeaderMap, request: GraphQlRequest, id: impl Into<String>) -> Self {
        Self {
            uri,
            headers,
            request,
            id: id.into(),
        }
    }

    /// Creates an input with a generated request id.
    pub fn with_generated_id(uri: Uri, headers: HeaderMap, request: GraphQlRequest) -> Self {
        Self::new(uri, headers, request, Uuid::now_v7().to_string())
    }

    /// Returns the request URI.
    pub fn uri(&self) -> &Uri {
        &self.uri
    }

    /// Returns the request headers.
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Returns all values of a header, in the order they were added.
    pub fn header_values(&self, name: &str) -> Vec<String> {
        self.headers
            .get_all(name)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .map(String::from)
            .collect()
    }

    /// Returns the document text.
    pub fn document(&self) -> &str {
        &self.request.query
    }

    /// Returns the operation name, if any.
    pub fn operation_name(&self) -> Option<&str> {
        self.request.operation_name.as_deref()
    }

    /// Returns the request variables.
    pub fn variables(&self) -> &Map<String, Value> {
        &self.request.variables
    }

    /// Returns the GraphQL payload.
    pub fn request(&self) -> &GraphQlRequest {
        &self.request
    }

    /// Returns the request id.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Consumes the input, returning the GraphQL payload.
    pub fn into_request(self) -> GraphQlRequest {
        self.request
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::HeaderValue;
    use serde_json::json;

    #[test]
    fn test_request_serializes_camel_case() {
        let request = GraphQlRequest::new("{ greeting }").with_operation_name("Greeting");
        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(value, json!({"query": "{ greeting }", "operationName": "Greeting"}));
    }

    #[test]
    fn test_request_from_json_slice() {
        let body = br#"{"query":"{ a }","variables":{"x":1}}"#;
        let request = GraphQlRequest::from_json_slice(body).unwrap();
        assert_eq!(request.query, "{ a }");
        assert_eq!(request.variables["x"], 1);
        assert!(request.operation_name.is_none());
    }

    #[test]
    fn test_request_from_json_slice_rejects_blank_query() {
        let err = GraphQlRequest::from_json_slice(br#"{"query":"  "}"#).unwrap_err();
        assert!(matches!(err, ExecutionError::InvalidRequest(_)));
    }

    #[test]
    fn test_request_from_json_slice_rejects_garbage() {
        let err = GraphQlRequest::from_json_slice(b"not json").unwrap_err();
        assert!(err.to_string().contains("malformed body"));
    }

    #[test]
    fn test_web_input_header_values_keep_order() {
        let mut headers = HeaderMap::new();
        headers.append("h", HeaderValue::from_static("one"));
        headers.append("h", HeaderValue::from_static("two"));

        let input = WebInput::new(
            Uri::from_static("/graphql-one"),
            headers,
            GraphQlRequest::new("{ Query }"),
            "1",
        );

        assert_eq!(input.uri().to_string(), "/graphql-one");
        assert_eq!(input.header_values("h"), vec!["one", "two"]);
        assert_eq!(input.document(), "{ Query }");
        assert_eq!(input.id(), "1");
    }

    #[test]
    fn test_generated_ids_differ() {
        let a = WebInput::with_generated_id(Uri::from_static("/"), HeaderMap::new(), GraphQlRequest::new("{ a }"));
        let b = WebInput::with_generated_id(Uri::from_static("/"), HeaderMap::new(), GraphQlRequest::new("{ a }"));
        assert_ne!(a.id(), b.id());
    }
}
