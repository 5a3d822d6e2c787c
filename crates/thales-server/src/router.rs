//! Request routing with path patterns.
//!
//! Routes map a method and a path pattern to a handler function. Patterns
//! are split on `/` into segments:
//!
//! - `graphql` - a literal segment
//! - `{name}` - one segment, captured as a parameter
//! - `*` - any one segment
//! - `**` - zero or more segments
//!
//! Routes are checked in registration order; first match wins.
//!
//! # Example
//!
//! ```rust
//! use thales_server::{Response, ResponseExt, Router};
//! use http::{Method, StatusCode};
//!
//! let router = Router::new()
//!     .post("/**", |_req| async { Response::text(StatusCode::OK, "ok") });
//!
//! let matched = router.match_route(&Method::POST, "/graphql-one").unwrap();
//! assert_eq!(matched.pattern(), "/**");
//! assert!(router.match_route(&Method::GET, "/graphql-one").is_none());
//! ```

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;

use http::{Method, StatusCode};
use thales_core::BoxFuture;
use tracing::debug;

use crate::types::{Request, Response, ResponseExt};

/// A type-erased route handler.
pub type RouteHandler = Arc<dyn Fn(Request) -> BoxFuture<'static, Response> + Send + Sync>;

/// A matched route with extracted path parameters.
///
/// Inserted into the request extensions before the handler runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteMatch {
    pattern: String,
    params: HashMap<String, String>,
}

impl RouteMatch {
    /// Returns the pattern of the matched route.
    #[must_use]
    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    /// Returns the extracted path parameters.
    #[must_use]
    pub fn params(&self) -> &HashMap<String, String> {
        &self.params
    }

    /// Returns a specific path parameter by name.
    #[must_use]
    pub fn param(&self, name: &str) -> Option<&str> {
        self.params.get(name).map(String::as_str)
    }
}

/// A segment of a path pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
enum PathSegment {
    Literal(String),
    Param(String),
    AnySegment,
    AnyRemainder,
}

#[derive(Clone)]
struct Route {
    method: Method,
    segments: Vec<PathSegment>,
    pattern: String,
    handler: RouteHandler,
}

impl Route {
    fn parse_segments(pattern: &str) -> Vec<PathSegment> {
        pattern
            .split('/')
            .filter(|s| !s.is_empty())
            .map(|s| match s {
                "**" => PathSegment::AnyRemainder,
                "*" => PathSegment::AnySegment,
                _ if s.starts_with('{') && s.ends_with('}') => {
                    PathSegment::Param(s[1..s.len() - 1].to_string())
                }
                _ => PathSegment::Literal(s.to_string()),
            })
            .collect()
    }

    fn match_path(&self, path: &str) -> Option<HashMap<String, String>> {
        let path_segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
        let mut params = HashMap::new();
        match_segments(&self.segments, &path_segments, &mut params).then_some(params)
    }
}

fn match_segments(
    pattern: &[PathSegment],
    path: &[&str],
    params: &mut HashMap<String, String>,
) -> bool {
    let Some((head, rest)) = pattern.split_first() else {
        return path.is_empty();
    };

    match head {
        PathSegment::AnyRemainder => {
            (0..=path.len()).any(|skip| match_segments(rest, &path[skip..], params))
        }
        _ => {
            let Some((actual, path_rest)) = path.split_first() else {
                return false;
            };
            match head {
                PathSegment::Literal(expected) if expected != actual => return false,
                PathSegment::Param(name) => {
                    params.insert(name.clone(), (*actual).to_string());
                }
                _ => {}
            }
            match_segments(rest, path_rest, params)
        }
    }
}

/// In-memory HTTP router.
///
/// Answers 404 when no pattern matches the path and 405 when a pattern
/// matches but not for the request method.
#[derive(Clone, Default)]
pub struct Router {
    routes: Vec<Route>,
}

impl Router {
    /// Creates an empty router.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a route.
    #[must_use]
    pub fn route<F, Fut>(mut self, method: Method, pattern: &str, handler: F) -> Self
    where
        F: Fn(Request) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Response> + Send + 'static,
    {
        self.routes.push(Route {
            method,
            segments: Route::parse_segments(pattern),
            pattern: pattern.to_string(),
            handler: Arc::new(move |req| Box::pin(handler(req))),
        });
        self
    }

    /// Adds a GET route.
    #[must_use]
    pub fn get<F, Fut>(self, pattern: &str, handler: F) -> Self
    where
        F: Fn(Request) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Response> + Send + 'static,
    {
        self.route(Method::GET, pattern, handler)
    }

    /// Adds a POST route.
    #[must_use]
    pub fn post<F, Fut>(self, pattern: &str, handler: F) -> Self
    where
        F: Fn(Request) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Response> + Send + 'static,
    {
        self.route(Method::POST, pattern, handler)
    }

    /// Returns the number of registered routes.
    #[must_use]
    pub fn route_count(&self) -> usize {
        self.routes.len()
    }

    /// Matches a method and path against the registered routes.
    #[must_use]
    pub fn match_route(&self, method: &Method, path: &str) -> Option<RouteMatch> {
        self.find(method, path).map(|(_, m)| m)
    }

    fn find(&self, method: &Method, path: &str) -> Option<(&Route, RouteMatch)> {
        self.routes
            .iter()
            .filter(|route| route.method == *method)
            .find_map(|route| {
                route.match_path(path).map(|params| {
                    (
                        route,
                        RouteMatch {
                            pattern: route.pattern.clone(),
                            params,
                        },
                    )
                })
            })
    }

    /// Dispatches a request to the first matching route.
    pub async fn handle(&self, mut request: Request) -> Response {
        let method = request.method().clone();
        let path = request.uri().path().to_string();

        match self.find(&method, &path) {
            Some((route, route_match)) => {
                debug!(%method, %path, pattern = %route.pattern, "Route matched");
                request.extensions_mut().insert(route_match);
                (route.handler)(request).await
            }
            None if self.routes.iter().any(|r| r.match_path(&path).is_some()) => {
                debug!(%method, %path, "Method not allowed");
                Response::text(StatusCode::METHOD_NOT_ALLOWED, "method not allowed")
            }
            None => {
                debug!(%method, %path, "No route matched");
                Response::text(StatusCode::NOT_FOUND, "not found")
            }
        }
    }
}

impl std::fmt::Debug for Router {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let routes: Vec<String> = self
            .routes
            .iter()
            .map(|r| format!("{} {}", r.method, r.pattern))
            .collect();
        f.debug_struct("Router").field("routes", &routes).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;
    use http_body_util::{BodyExt, Full};

    fn ok(body: &'static str) -> impl Fn(Request) -> BoxFuture<'static, Response> + Send + Sync {
        move |_req| Box::pin(async move { Response::text(StatusCode::OK, body) })
    }

    fn request(method: Method, path: &str) -> Request {
        http::Request::builder()
            .method(method)
            .uri(path)
            .body(Full::new(Bytes::new()))
            .unwrap()
    }

    async fn body_text(response: Response) -> String {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[test]
    fn test_catch_all_matches_any_depth() {
        let router = Router::new().post("/**", ok("any"));
        assert!(router.match_route(&Method::POST, "/").is_some());
        assert!(router.match_route(&Method::POST, "/graphql-one").is_some());
        assert!(router.match_route(&Method::POST, "/a/b/c").is_some());
    }

    #[test]
    fn test_catch_all_in_the_middle() {
        let router = Router::new().get("/api/**/graphql", ok("mid"));
        assert!(router.match_route(&Method::GET, "/api/graphql").is_some());
        assert!(router.match_route(&Method::GET, "/api/v1/tenant/graphql").is_some());
        assert!(router.match_route(&Method::GET, "/api/v1/other").is_none());
    }

    #[test]
    fn test_single_segment_wildcard_and_params() {
        let router = Router::new()
            .get("/users/*/posts", ok("posts"))
            .get("/users/{userId}", ok("user"));

        assert!(router.match_route(&Method::GET, "/users/1/posts").is_some());
        assert!(router.match_route(&Method::GET, "/users/1/2/posts").is_none());

        let m = router.match_route(&Method::GET, "/users/42").unwrap();
        assert_eq!(m.param("userId"), Some("42"));
        assert_eq!(m.pattern(), "/users/{userId}");
    }

    #[test]
    fn test_first_match_wins() {
        let router = Router::new()
            .post("/graphql", ok("exact"))
            .post("/**", ok("fallback"));
        assert_eq!(router.match_route(&Method::POST, "/graphql").unwrap().pattern(), "/graphql");
        assert_eq!(router.match_route(&Method::POST, "/other").unwrap().pattern(), "/**");
        assert_eq!(router.route_count(), 2);
    }

    #[tokio::test]
    async fn test_handle_dispatches_and_records_match() {
        let router = Router::new().get("/items/{id}", |req: Request| async move {
            let id = req
                .extensions()
                .get::<RouteMatch>()
                .and_then(|m| m.param("id"))
                .unwrap_or("none")
                .to_string();
            Response::text(StatusCode::OK, &id)
        });

        let response = router.handle(request(Method::GET, "/items/7")).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_text(response).await, "7");
    }

    #[tokio::test]
    async fn test_handle_not_found_and_method_not_allowed() {
        let router = Router::new().post("/graphql", ok("gql"));

        let response = router.handle(request(Method::GET, "/graphql")).await;
        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);

        let response = router.handle(request(Method::POST, "/elsewhere")).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_debug_lists_routes() {
        let router = Router::new().post("/**", ok("x"));
        assert!(format!("{router:?}").contains("POST /**"));
    }
}
