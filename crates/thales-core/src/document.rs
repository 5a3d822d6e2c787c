//! Document sources: resolving a document name to document text.
//!
//! Resolution is lazy. A tester asks its source for the text every time a
//! named request is executed, so a source may be stateful (for example a
//! directory whose files change between runs). Wrap a source in
//! [`CachingDocumentSource`] when repeated lookups should be served from
//! memory.
//!
//! # Implementations
//!
//! | source | backing |
//! |---|---|
//! | [`FnDocumentSource`] | a closure |
//! | [`StaticDocumentSource`] | an in-memory name → text map |
//! | [`ResourceDocumentSource`] | files under one or more directories |
//! | [`CachingDocumentSource`] | any other source, memoized |

use std::path::{Path, PathBuf};
use std::sync::Arc;

use dashmap::DashMap;
use indexmap::IndexMap;
use tracing::{debug, trace};

use crate::error::DocumentError;
use crate::handler::BoxFuture;

/// Default directory searched by [`ResourceDocumentSource::default`].
pub const DEFAULT_DOCUMENT_LOCATION: &str = "graphql-test";

/// Default file extensions tried by [`ResourceDocumentSource::default`].
pub const DEFAULT_DOCUMENT_EXTENSIONS: [&str; 2] = [".graphql", ".gql"];

/// Resolves document names to document text.
pub trait DocumentSource: Send + Sync + 'static {
    /// Returns the text of the named document.
    fn get_document<'a>(&'a self, name: &'a str) -> BoxFuture<'a, Result<String, DocumentError>>;
}

impl<S: DocumentSource + ?Sized> DocumentSource for Arc<S> {
    fn get_document<'a>(&'a self, name: &'a str) -> BoxFuture<'a, Result<String, DocumentError>> {
        (**self).get_document(name)
    }
}

/// A document source backed by a synchronous closure.
///
/// # Example
///
/// ```
/// use thales_core::{DocumentError, DocumentSource, FnDocumentSource};
///
/// let source = FnDocumentSource::new(|name: &str| {
///     if name == "name" {
///         Ok("{ Query }".to_string())
///     } else {
///         Err(DocumentError::not_found(name))
///     }
/// });
///
/// # tokio_test::block_on(async {
/// assert_eq!(source.get_document("name").await.unwrap(), "{ Query }");
/// assert!(source.get_document("other").await.is_err());
/// # });
/// ```
pub struct FnDocumentSource<F> {
    resolve: F,
}

impl<F> FnDocumentSource<F>
where
    F: Fn(&str) -> Result<String, DocumentError> + Send + Sync + 'static,
{
    /// Wraps the closure.
    pub fn new(resolve: F) -> Self {
        Self { resolve }
    }
}

impl<F> DocumentSource for FnDocumentSource<F>
where
    F: Fn(&str) -> Result<String, DocumentError> + Send + Sync + 'static,
{
    fn get_document<'a>(&'a self, name: &'a str) -> BoxFuture<'a, Result<String, DocumentError>> {
        let result = (self.resolve)(name);
        Box::pin(async move { result })
    }
}

/// An in-memory document source.
#[derive(Debug, Clone, Default)]
pub struct StaticDocumentSource {
    documents: IndexMap<String, String>,
}

impl StaticDocumentSource {
    /// Creates an empty source.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a document, replacing any previous text under the name.
    #[must_use]
    pub fn with_document(mut self, name: impl Into<String>, text: impl Into<String>) -> Self {
        self.documents.insert(name.into(), text.into());
        self
    }

    /// Returns the registered names, in registration order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.documents.keys().map(String::as_str)
    }
}

impl DocumentSource for StaticDocumentSource {
    fn get_document<'a>(&'a self, name: &'a str) -> BoxFuture<'a, Result<String, DocumentError>> {
        let result = self
            .documents
            .get(name)
            .cloned()
            .ok_or_else(|| DocumentError::not_found(name));
        Box::pin(async move { result })
    }
}

/// A document source that loads files from directories.
///
/// For a name `getUser` and the default settings, the source tries
/// `graphql-test/getUser.graphql` then `graphql-test/getUser.gql`. A name
/// that already ends with one of the extensions is tried verbatim first.
/// Locations are searched in order and the first readable file wins.
#[derive(Debug, Clone)]
pub struct ResourceDocumentSource {
    locations: Vec<PathBuf>,
    extensions: Vec<String>,
}

impl Default for ResourceDocumentSource {
    fn default() -> Self {
        Self::new(
            vec![PathBuf::from(DEFAULT_DOCUMENT_LOCATION)],
            DEFAULT_DOCUMENT_EXTENSIONS.iter().map(|e| (*e).to_string()).collect(),
        )
    }
}

impl ResourceDocumentSource {
    /// Creates a source over the given locations and extensions.
    pub fn new(locations: Vec<PathBuf>, extensions: Vec<String>) -> Self {
        Self {
            locations,
            extensions,
        }
    }

    /// Returns the searched locations.
    pub fn locations(&self) -> &[PathBuf] {
        &self.locations
    }

    /// Returns the tried extensions.
    pub fn extensions(&self) -> &[String] {
        &self.extensions
    }

    fn candidates(&self, location: &Path, name: &str) -> Vec<PathBuf> {
        let mut candidates = Vec::with_capacity(self.extensions.len() + 1);
        if self.extensions.iter().any(|ext| name.ends_with(ext.as_str())) {
            candidates.push(location.join(name));
        }
        for ext in &self.extensions {
            candidates.push(location.join(format!("{name}{ext}")));
        }
        candidates
    }
}

impl DocumentSource for ResourceDocumentSource {
    fn get_document<'a>(&'a self, name: &'a str) -> BoxFuture<'a, Result<String, DocumentError>> {
        Box::pin(async move {
            for location in &self.locations {
                for path in self.candidates(location, name) {
                    match tokio::fs::read_to_string(&path).await {
                        Ok(text) => {
                            debug!(document = name, path = %path.display(), "Loaded document");
                            return Ok(text);
                        }
                        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                            trace!(path = %path.display(), "Document candidate missing");
                        }
                        Err(source) => {
                            return Err(DocumentError::Read {
                                name: name.to_string(),
                                path,
                                source,
                            });
                        }
                    }
                }
            }
            Err(DocumentError::not_found(name))
        })
    }
}

/// Memoizes successful lookups of another source.
///
/// Failures are not cached, so a document added after a failed lookup is
/// found on the next attempt.
pub struct CachingDocumentSource<S> {
    delegate: S,
    cache: DashMap<String, String>,
}

impl<S: DocumentSource> CachingDocumentSource<S> {
    /// Wraps the delegate.
    pub fn new(delegate: S) -> Self {
        Self {
            delegate,
            cache: DashMap::new(),
        }
    }

    /// Drops every cached document.
    pub fn clear_cache(&self) {
        self.cache.clear();
    }

    /// Returns the number of cached documents.
    pub fn cached_len(&self) -> usize {
        self.cache.len()
    }
}

impl<S: DocumentSource> DocumentSource for CachingDocumentSource<S> {
    fn get_document<'a>(&'a self, name: &'a str) -> BoxFuture<'a, Result<String, DocumentError>> {
        Box::pin(async move {
            if let Some(text) = self.cache.get(name) {
                return Ok(text.value().clone());
            }
            let text = self.delegate.get_document(name).await?;
            self.cache.insert(name.to_string(), text.clone());
            Ok(text)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[tokio::test]
    async fn test_fn_source() {
        let source = FnDocumentSource::new(|name: &str| match name {
            "name" => Ok("{ Query }".to_string()),
            other => Err(DocumentError::not_found(other)),
        });

        assert_eq!(source.get_document("name").await.unwrap(), "{ Query }");
        let err = source.get_document("other").await.unwrap_err();
        assert!(matches!(err, DocumentError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_static_source() {
        let source = StaticDocumentSource::new()
            .with_document("a", "{ a }")
            .with_document("b", "{ b }");

        assert_eq!(source.names().collect::<Vec<_>>(), vec!["a", "b"]);
        assert_eq!(source.get_document("b").await.unwrap(), "{ b }");
        assert!(source.get_document("c").await.is_err());
    }

    #[tokio::test]
    async fn test_resource_source_tries_extensions_in_order() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("user.gql"), "{ user }").unwrap();
        std::fs::write(dir.path().join("books.graphql"), "{ books }").unwrap();

        let source = ResourceDocumentSource::new(
            vec![dir.path().to_path_buf()],
            vec![".graphql".to_string(), ".gql".to_string()],
        );

        assert_eq!(source.get_document("user").await.unwrap(), "{ user }");
        assert_eq!(source.get_document("books").await.unwrap(), "{ books }");
        assert_eq!(source.get_document("books.graphql").await.unwrap(), "{ books }");
        let err = source.get_document("missing").await.unwrap_err();
        assert_eq!(err.name(), "missing");
    }

    #[tokio::test]
    async fn test_resource_source_searches_locations_in_order() {
        let first = tempfile::tempdir().unwrap();
        let second = tempfile::tempdir().unwrap();
        std::fs::write(second.path().join("q.graphql"), "{ second }").unwrap();

        let source = ResourceDocumentSource::new(
            vec![first.path().to_path_buf(), second.path().to_path_buf()],
            vec![".graphql".to_string()],
        );
        assert_eq!(source.get_document("q").await.unwrap(), "{ second }");

        std::fs::write(first.path().join("q.graphql"), "{ first }").unwrap();
        assert_eq!(source.get_document("q").await.unwrap(), "{ first }");
    }

    #[test]
    fn test_resource_source_defaults() {
        let source = ResourceDocumentSource::default();
        assert_eq!(source.locations(), &[PathBuf::from("graphql-test")]);
        assert_eq!(source.extensions(), &[".graphql".to_string(), ".gql".to_string()]);
    }

    #[tokio::test]
    async fn test_caching_source_caches_hits_only() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let source = CachingDocumentSource::new(FnDocumentSource::new(move |name: &str| {
            counter.fetch_add(1, Ordering::SeqCst);
            if name == "hit" {
                Ok("{ hit }".to_string())
            } else {
                Err(DocumentError::not_found(name))
            }
        }));

        source.get_document("hit").await.unwrap();
        source.get_document("hit").await.unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(source.cached_len(), 1);

        assert!(source.get_document("miss").await.is_err());
        assert!(source.get_document("miss").await.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 3);

        source.clear_cache();
        source.get_document("hit").await.unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 4);
    }

    #[tokio::test]
    async fn test_arc_source_delegates() {
        let source: Arc<dyn DocumentSource> =
            Arc::new(StaticDocumentSource::new().with_document("a", "{ a }"));
        assert_eq!(source.get_document("a").await.unwrap(), "{ a }");
    }
}
