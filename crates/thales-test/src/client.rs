//! In-memory HTTP client.
//!
//! [`TestClient`] hands `http::Request` values straight to a handler or a
//! [`Router`], so HTTP testers run without binding a port. Like testers,
//! clients are immutable: [`TestClient::mutate`] returns a
//! [`TestClientBuilder`] holding a copy of the client's configuration.

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use bytes::Bytes;
use http::{header, HeaderMap, HeaderName, HeaderValue, Method, StatusCode, Uri};
use http_body_util::{BodyExt, Full};
use serde::de::DeserializeOwned;
use serde::Serialize;
use thales_server::{
    GraphQlHttpHandler, Request, Response, ResponseExt, RouteHandler, Router, APPLICATION_JSON,
};
use tracing::debug;

use crate::error::{InvalidSetting, TesterError};
use crate::settings::replace_header;

/// An in-memory HTTP client.
///
/// # Example
///
/// ```
/// use thales_test::TestClient;
///
/// # tokio_test::block_on(async {
/// let client = TestClient::echo()
///     .mutate()
///     .default_header("h", ["one"])
///     .build()
///     .unwrap();
///
/// let response = client.get("/echo").send().await.unwrap();
/// let body: serde_json::Value = response.json().unwrap();
/// assert_eq!(body["headers"]["h"], serde_json::json!(["one"]));
/// # });
/// ```
#[derive(Clone)]
pub struct TestClient {
    handler: RouteHandler,
    default_headers: HeaderMap,
}

impl TestClient {
    /// Creates a client that sends every request to `handler`.
    pub fn new<F, Fut>(handler: F) -> Self
    where
        F: Fn(Request) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Response> + Send + 'static,
    {
        Self {
            handler: Arc::new(move |req| Box::pin(handler(req))),
            default_headers: HeaderMap::new(),
        }
    }

    /// Creates a client bound to a router.
    pub fn bind_to_router(router: Router) -> Self {
        Self::new(move |req| {
            let router = router.clone();
            async move { router.handle(req).await }
        })
    }

    /// Creates a client bound to a GraphQL HTTP handler serving every POST path.
    pub fn bind_to_http_handler(handler: &GraphQlHttpHandler) -> Self {
        let route = handler.route_handler();
        Self::bind_to_router(Router::new().post("/**", move |req| route(req)))
    }

    /// Creates a client whose handler echoes the method, path and headers as JSON.
    ///
    /// Header values are listed per name in the order they were sent.
    pub fn echo() -> Self {
        Self::new(|req: Request| async move {
            let mut headers = serde_json::Map::new();
            for name in req.headers().keys() {
                let values: Vec<_> = req
                    .headers()
                    .get_all(name)
                    .iter()
                    .map(|v| String::from_utf8_lossy(v.as_bytes()).into_owned())
                    .collect();
                headers.insert(name.to_string(), values.into());
            }
            let body = serde_json::json!({
                "method": req.method().as_str(),
                "path": req.uri().path(),
                "headers": headers,
            });
            Response::json(StatusCode::OK, &body)
        })
    }

    /// Returns a builder seeded with a copy of this client's configuration.
    pub fn mutate(&self) -> TestClientBuilder {
        TestClientBuilder {
            handler: Arc::clone(&self.handler),
            default_headers: self.default_headers.clone(),
            invalid: None,
        }
    }

    /// Returns the headers added to every request.
    pub fn default_headers(&self) -> &HeaderMap {
        &self.default_headers
    }

    /// Creates a GET request.
    pub fn get(&self, uri: impl Into<String>) -> TestClientRequest<'_> {
        self.request(Method::GET, uri)
    }

    /// Creates a POST request.
    pub fn post(&self, uri: impl Into<String>) -> TestClientRequest<'_> {
        self.request(Method::POST, uri)
    }

    /// Creates a request with a custom method.
    pub fn request(&self, method: Method, uri: impl Into<String>) -> TestClientRequest<'_> {
        TestClientRequest {
            client: self,
            method,
            uri: uri.into(),
            headers: self.default_headers.clone(),
            body: Bytes::new(),
            error: None,
        }
    }

    async fn send_internal(&self, request: Request) -> TestResponse {
        let response = (self.handler)(request).await;
        TestResponse::from_http(response).await
    }
}

impl fmt::Debug for TestClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TestClient")
            .field("default_headers", &self.default_headers)
            .finish_non_exhaustive()
    }
}

/// Builds a [`TestClient`].
///
/// Methods take `&mut self` so the builder can be configured from a closure.
#[derive(Clone)]
pub struct TestClientBuilder {
    handler: RouteHandler,
    default_headers: HeaderMap,
    invalid: Option<InvalidSetting>,
}

impl TestClientBuilder {
    /// Replaces all default values of `name`.
    pub fn default_header<I, V>(&mut self, name: &str, values: I) -> &mut Self
    where
        I: IntoIterator<Item = V>,
        V: AsRef<str>,
    {
        if let Err(invalid) = replace_header(&mut self.default_headers, name, values) {
            self.invalid.get_or_insert(invalid);
        }
        self
    }

    /// Edits the default headers in place.
    pub fn default_headers(&mut self, mutate: impl FnOnce(&mut HeaderMap)) -> &mut Self {
        mutate(&mut self.default_headers);
        self
    }

    /// Builds the client.
    ///
    /// # Errors
    ///
    /// Returns [`TesterError::InvalidHeader`] for the first rejected header.
    pub fn build(&self) -> Result<TestClient, TesterError> {
        self.try_build().map_err(TesterError::from)
    }

    pub(crate) fn try_build(&self) -> Result<TestClient, InvalidSetting> {
        match &self.invalid {
            Some(invalid) => Err(invalid.clone()),
            None => Ok(TestClient {
                handler: Arc::clone(&self.handler),
                default_headers: self.default_headers.clone(),
            }),
        }
    }
}

impl fmt::Debug for TestClientBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TestClientBuilder")
            .field("default_headers", &self.default_headers)
            .field("invalid", &self.invalid)
            .finish_non_exhaustive()
    }
}

/// A request bound to a [`TestClient`].
///
/// Starts with the client's default headers; headers added here are appended
/// after them.
#[must_use]
pub struct TestClientRequest<'a> {
    client: &'a TestClient,
    method: Method,
    uri: String,
    headers: HeaderMap,
    body: Bytes,
    error: Option<TesterError>,
}

impl TestClientRequest<'_> {
    /// Appends a header value.
    pub fn header(mut self, name: &str, value: &str) -> Self {
        match (HeaderName::try_from(name), HeaderValue::try_from(value)) {
            (Ok(name), Ok(value)) => {
                self.headers.append(name, value);
            }
            (Err(e), _) => self.fail(InvalidSetting::header(name, e).into()),
            (_, Err(e)) => self.fail(InvalidSetting::header(name, e).into()),
        }
        self
    }

    /// Appends every entry of `headers`.
    pub fn headers(mut self, headers: &HeaderMap) -> Self {
        for (name, value) in headers {
            self.headers.append(name.clone(), value.clone());
        }
        self
    }

    /// Sets the raw request body.
    pub fn body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = body.into();
        self
    }

    /// Sets the request body as JSON.
    ///
    /// This also sets the `Content-Type` header to `application/json`.
    pub fn json<T: Serialize>(mut self, value: &T) -> Self {
        match serde_json::to_vec(value) {
            Ok(bytes) => {
                self.body = Bytes::from(bytes);
                self.headers
                    .insert(header::CONTENT_TYPE, HeaderValue::from_static(APPLICATION_JSON));
            }
            Err(e) => self.fail(e.into()),
        }
        self
    }

    /// Sends the request.
    ///
    /// # Errors
    ///
    /// Fails when the URI or a header was invalid, or a body could not be
    /// encoded. A response is returned for every status.
    pub async fn send(self) -> Result<TestResponse, TesterError> {
        if let Some(error) = self.error {
            return Err(error);
        }

        let uri: Uri = self
            .uri
            .parse()
            .map_err(|e| TesterError::from(InvalidSetting::url(&self.uri, e)))?;

        debug!(method = %self.method, %uri, "Sending in-memory request");

        let mut request = http::Request::new(Full::new(self.body));
        *request.method_mut() = self.method;
        *request.uri_mut() = uri;
        *request.headers_mut() = self.headers;

        Ok(self.client.send_internal(request).await)
    }

    fn fail(&mut self, error: TesterError) {
        if self.error.is_none() {
            self.error = Some(error);
        }
    }
}

/// A response from a [`TestClient`].
pub struct TestResponse {
    status: StatusCode,
    headers: HeaderMap,
    body: Bytes,
}

impl TestResponse {
    async fn from_http(response: Response) -> Self {
        let (parts, body) = response.into_parts();
        let body = match body.collect().await {
            Ok(collected) => collected.to_bytes(),
            Err(never) => match never {},
        };
        Self {
            status: parts.status,
            headers: parts.headers,
            body,
        }
    }

    /// Returns the status code.
    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// Returns true if the status is successful (2xx).
    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }

    /// Returns the response headers.
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Returns the raw body bytes.
    pub fn body(&self) -> &Bytes {
        &self.body
    }

    /// Returns the body as text, replacing invalid UTF-8.
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    /// Deserializes the body as JSON.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, TesterError> {
        Ok(serde_json::from_slice(&self.body)?)
    }

    /// Asserts that the status code equals the expected value.
    ///
    /// # Panics
    ///
    /// Panics if the status code doesn't match.
    pub fn assert_status(&self, expected: StatusCode) -> &Self {
        assert_eq!(
            self.status,
            expected,
            "Expected status {}, got {}: {}",
            expected,
            self.status,
            self.text()
        );
        self
    }
}

impl fmt::Debug for TestResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TestResponse")
            .field("status", &self.status)
            .field("headers", &self.headers)
            .field("body_len", &self.body.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use thales_core::{ExecutionError, ExecutionResult, WebGraphQlHandler, WebInput};

    #[tokio::test]
    async fn test_echo_client() {
        let client = TestClient::echo();
        let response = client.get("/test/path").send().await.unwrap();

        response.assert_status(StatusCode::OK);
        let body: serde_json::Value = response.json().unwrap();
        assert_eq!(body["method"], "GET");
        assert_eq!(body["path"], "/test/path");
    }

    #[tokio::test]
    async fn test_default_headers_come_first() {
        let client = TestClient::echo()
            .mutate()
            .default_header("h", ["one"])
            .build()
            .unwrap();

        let response = client.post("/").header("h", "two").send().await.unwrap();
        let body: serde_json::Value = response.json().unwrap();
        assert_eq!(body["headers"]["h"], json!(["one", "two"]));
    }

    #[tokio::test]
    async fn test_mutate_does_not_touch_original() {
        let original = TestClient::echo()
            .mutate()
            .default_header("h", ["one"])
            .build()
            .unwrap();

        let mutated = original
            .mutate()
            .default_headers(|headers| {
                headers.append("h", HeaderValue::from_static("two"));
            })
            .build()
            .unwrap();

        assert_eq!(original.default_headers().get_all("h").iter().count(), 1);
        assert_eq!(mutated.default_headers().get_all("h").iter().count(), 2);
    }

    #[test]
    fn test_invalid_default_header() {
        let err = TestClient::echo()
            .mutate()
            .default_header("bad name", ["x"])
            .default_header("h", ["fine"])
            .build()
            .unwrap_err();
        assert!(matches!(err, TesterError::InvalidHeader { ref name, .. } if name == "bad name"));
    }

    #[tokio::test]
    async fn test_invalid_request_uri() {
        let err = TestClient::echo().get("/has space").send().await.unwrap_err();
        assert!(matches!(err, TesterError::InvalidUrl { .. }));
    }

    #[tokio::test]
    async fn test_invalid_request_header() {
        let err = TestClient::echo()
            .get("/")
            .header("h", "bad\nvalue")
            .send()
            .await
            .unwrap_err();
        assert!(matches!(err, TesterError::InvalidHeader { .. }));
    }

    #[tokio::test]
    async fn test_bound_router_answers_404() {
        let router = Router::new().get("/health", |_req| async {
            http::Response::new(Full::new(Bytes::from_static(b"ok")))
        });
        let client = TestClient::bind_to_router(router);

        let ok = client.get("/health").send().await.unwrap();
        assert_eq!(ok.text(), "ok");

        let missing = client.get("/nope").send().await.unwrap();
        missing.assert_status(StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_bound_http_handler() {
        let web = WebGraphQlHandler::builder(|input: WebInput| async move {
            Ok::<_, ExecutionError>(ExecutionResult::from_data(json!({
                "path": input.uri().path()
            })))
        })
        .build();
        let client = TestClient::bind_to_http_handler(&GraphQlHttpHandler::new(web));

        let response = client
            .post("/graphql-one")
            .json(&json!({"query": "{ Query }"}))
            .send()
            .await
            .unwrap();

        response.assert_status(StatusCode::OK);
        let result: ExecutionResult = response.json().unwrap();
        assert_eq!(result.data.unwrap()["path"], "/graphql-one");
    }
}
