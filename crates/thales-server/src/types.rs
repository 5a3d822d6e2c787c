//! HTTP request and response types used by routes and handlers.

use bytes::Bytes;
use http::{header, StatusCode};
use http_body_util::Full;

/// The in-memory HTTP request type.
pub type Request = http::Request<Full<Bytes>>;

/// The in-memory HTTP response type.
pub type Response = http::Response<Full<Bytes>>;

/// Media type of JSON request and response bodies.
pub const APPLICATION_JSON: &str = "application/json";

/// Media type of GraphQL responses as defined by GraphQL over HTTP.
pub const APPLICATION_GRAPHQL_RESPONSE_JSON: &str = "application/graphql-response+json";

/// Extension trait for building responses.
pub trait ResponseExt {
    /// Creates a plain-text response.
    fn text(status: StatusCode, message: &str) -> Response;

    /// Creates a JSON response from a value.
    fn json(status: StatusCode, body: &serde_json::Value) -> Response;

    /// Creates a GraphQL-style error response: `{"errors":[{"message":..}]}`.
    fn graphql_error(status: StatusCode, message: &str) -> Response;
}

impl ResponseExt for Response {
    fn text(status: StatusCode, message: &str) -> Response {
        http::Response::builder()
            .status(status)
            .header(header::CONTENT_TYPE, "text/plain; charset=utf-8")
            .body(Full::new(Bytes::from(message.to_string())))
            .expect("failed to build text response")
    }

    fn json(status: StatusCode, body: &serde_json::Value) -> Response {
        http::Response::builder()
            .status(status)
            .header(header::CONTENT_TYPE, APPLICATION_JSON)
            .body(Full::new(Bytes::from(body.to_string())))
            .expect("failed to build JSON response")
    }

    fn graphql_error(status: StatusCode, message: &str) -> Response {
        Self::json(
            status,
            &serde_json::json!({
                "errors": [{ "message": message }]
            }),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text_response() {
        let response = Response::text(StatusCode::NOT_FOUND, "no route");
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(
            response.headers().get(header::CONTENT_TYPE).unwrap(),
            "text/plain; charset=utf-8"
        );
    }

    #[test]
    fn test_graphql_error_response() {
        let response = Response::graphql_error(StatusCode::BAD_REQUEST, "bad");
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(response.headers().get(header::CONTENT_TYPE).unwrap(), APPLICATION_JSON);
    }
}
