//! GraphQL over HTTP.
//!
//! [`GraphQlHttpHandler`] turns a POST request with a JSON body into a
//! [`WebInput`], runs it through a [`WebGraphQlHandler`] and writes the
//! [`ExecutionResult`](thales_core::ExecutionResult) back as JSON.
//!
//! | outcome | status |
//! |---|---|
//! | result produced | 200 |
//! | content type other than JSON | 415 |
//! | body not a GraphQL request | 400 |
//! | handler failed | 500 |

use std::sync::Arc;

use http::{header, StatusCode};
use http_body_util::BodyExt;
use thales_core::{ExecutionError, GraphQlRequest, WebGraphQlHandler, WebInput};
use tracing::{debug, instrument, warn};

use crate::router::RouteHandler;
use crate::types::{Request, Response, ResponseExt, APPLICATION_JSON};

/// Adapts a [`WebGraphQlHandler`] to HTTP requests.
#[derive(Debug, Clone)]
pub struct GraphQlHttpHandler {
    handler: WebGraphQlHandler,
}

impl GraphQlHttpHandler {
    /// Wraps a web handler.
    pub fn new(handler: WebGraphQlHandler) -> Self {
        Self { handler }
    }

    /// Returns the wrapped web handler.
    pub fn web_handler(&self) -> &WebGraphQlHandler {
        &self.handler
    }

    /// Handles one HTTP request.
    #[instrument(skip(self, request), fields(method = %request.method(), uri = %request.uri()))]
    pub async fn handle_request(&self, request: Request) -> Response {
        if !accepts_json_body(&request) {
            debug!("Rejecting request with unsupported content type");
            return Response::graphql_error(
                StatusCode::UNSUPPORTED_MEDIA_TYPE,
                "expected an application/json request body",
            );
        }

        let (parts, body) = request.into_parts();
        let bytes = match body.collect().await {
            Ok(collected) => collected.to_bytes(),
            Err(never) => match never {},
        };

        let graphql_request = match GraphQlRequest::from_json_slice(&bytes) {
            Ok(request) => request,
            Err(e) => {
                debug!(error = %e, "Rejecting malformed GraphQL request");
                return Response::graphql_error(StatusCode::BAD_REQUEST, &e.to_string());
            }
        };

        let input = WebInput::with_generated_id(parts.uri, parts.headers, graphql_request);

        match self.handler.handle_request(input).await {
            Ok(output) => {
                let (result, response_headers) = output.into_parts();
                let body = match serde_json::to_value(&result) {
                    Ok(body) => body,
                    Err(e) => {
                        let error = ExecutionError::internal(format!("unserializable result: {e}"));
                        return Response::graphql_error(StatusCode::INTERNAL_SERVER_ERROR, &error.to_string());
                    }
                };
                let mut response = Response::json(StatusCode::OK, &body);
                for (name, value) in &response_headers {
                    response.headers_mut().append(name, value.clone());
                }
                response
            }
            Err(e) => {
                warn!(error = %e, "GraphQL request failed");
                Response::graphql_error(StatusCode::INTERNAL_SERVER_ERROR, &e.to_string())
            }
        }
    }

    /// Returns a router handler that delegates to this handler.
    pub fn route_handler(&self) -> RouteHandler {
        let this = self.clone();
        Arc::new(move |request| {
            let this = this.clone();
            Box::pin(async move { this.handle_request(request).await })
        })
    }
}

/// A missing content type is accepted; anything else must be JSON.
fn accepts_json_body(request: &Request) -> bool {
    match request.headers().get(header::CONTENT_TYPE) {
        None => true,
        Some(value) => value
            .to_str()
            .map(|v| {
                let media_type = v.split(';').next().unwrap_or_default().trim();
                media_type.eq_ignore_ascii_case(APPLICATION_JSON)
                    || media_type.to_ascii_lowercase().ends_with("+json")
            })
            .unwrap_or(false),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::router::Router;
    use bytes::Bytes;
    use http::{HeaderName, HeaderValue, Method};
    use http_body_util::Full;
    use serde_json::{json, Value};
    use thales_core::{BoxFuture, Chain, ExecutionResult, WebInterceptor, WebOutput};

    fn post(uri: &str, body: &str) -> Request {
        http::Request::builder()
            .method(Method::POST)
            .uri(uri)
            .header(header::CONTENT_TYPE, APPLICATION_JSON)
            .body(Full::new(Bytes::from(body.to_string())))
            .unwrap()
    }

    async fn body_json(response: Response) -> Value {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn echo_handler() -> WebGraphQlHandler {
        WebGraphQlHandler::builder(|input: WebInput| async move {
            Ok::<_, ExecutionError>(ExecutionResult::from_data(json!({
                "uri": input.uri().to_string(),
                "document": input.document(),
                "h": input.header_values("h"),
            })))
        })
        .build()
    }

    struct Tagging;

    impl WebInterceptor for Tagging {
        fn name(&self) -> &'static str {
            "tagging"
        }

        fn intercept<'a>(
            &'a self,
            input: WebInput,
            chain: Chain<'a>,
        ) -> BoxFuture<'a, Result<WebOutput, ExecutionError>> {
            Box::pin(async move {
                let output = chain.next(input).await?;
                Ok(output.with_response_header(
                    HeaderName::from_static("x-tag"),
                    HeaderValue::from_static("tagged"),
                ))
            })
        }
    }

    #[tokio::test]
    async fn test_success_returns_result_json() {
        let handler = GraphQlHttpHandler::new(echo_handler());
        let mut request = post("/graphql-one", r#"{"query":"{ Query }"}"#);
        request.headers_mut().append("h", HeaderValue::from_static("one"));
        request.headers_mut().append("h", HeaderValue::from_static("two"));

        let response = handler.handle_request(request).await;
        assert_eq!(response.status(), StatusCode::OK);

        let body = body_json(response).await;
        assert_eq!(body["data"]["uri"], "/graphql-one");
        assert_eq!(body["data"]["document"], "{ Query }");
        assert_eq!(body["data"]["h"], json!(["one", "two"]));
    }

    #[tokio::test]
    async fn test_response_headers_are_copied() {
        let web = WebGraphQlHandler::builder(|_input: WebInput| async {
            Ok::<_, ExecutionError>(ExecutionResult::empty())
        })
        .interceptor(Tagging)
        .build();
        let handler = GraphQlHttpHandler::new(web);

        let response = handler.handle_request(post("/", r#"{"query":"{ a }"}"#)).await;
        assert_eq!(response.headers().get("x-tag").unwrap(), "tagged");
    }

    #[tokio::test]
    async fn test_malformed_body_is_bad_request() {
        let handler = GraphQlHttpHandler::new(echo_handler());

        let response = handler.handle_request(post("/", "{not json")).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = body_json(response).await;
        assert!(body["errors"][0]["message"].as_str().unwrap().contains("malformed body"));
    }

    #[tokio::test]
    async fn test_non_json_content_type_is_rejected() {
        let handler = GraphQlHttpHandler::new(echo_handler());
        let mut request = post("/", r#"{"query":"{ a }"}"#);
        request
            .headers_mut()
            .insert(header::CONTENT_TYPE, HeaderValue::from_static("text/plain"));

        let response = handler.handle_request(request).await;
        assert_eq!(response.status(), StatusCode::UNSUPPORTED_MEDIA_TYPE);
    }

    #[tokio::test]
    async fn test_charset_parameter_is_accepted() {
        let handler = GraphQlHttpHandler::new(echo_handler());
        let mut request = post("/", r#"{"query":"{ a }"}"#);
        request.headers_mut().insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static("application/json; charset=utf-8"),
        );

        let response = handler.handle_request(request).await;
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_execution_failure_is_server_error() {
        let web = WebGraphQlHandler::builder(|_input: WebInput| async {
            Err::<ExecutionResult, _>(ExecutionError::unsupported("no engine"))
        })
        .build();
        let handler = GraphQlHttpHandler::new(web);

        let response = handler.handle_request(post("/", r#"{"query":"{ a }"}"#)).await;
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = body_json(response).await;
        assert_eq!(body["errors"][0]["message"], "unsupported operation: no engine");
    }

    #[tokio::test]
    async fn test_route_handler_behind_router() {
        let handler = GraphQlHttpHandler::new(echo_handler());
        let route = handler.route_handler();
        let router = Router::new().post("/**", move |req| route(req));

        let response = router.handle(post("/graphql-one", r#"{"query":"{ Query }"}"#)).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await["data"]["uri"], "/graphql-one");
    }
}
