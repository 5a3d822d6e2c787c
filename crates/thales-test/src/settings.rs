//! The configuration snapshot shared by builders and testers.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use http::header::{HeaderName, HeaderValue};
use http::{HeaderMap, Uri};
use thales_core::{DocumentSource, ResourceDocumentSource};

use crate::error::InvalidSetting;

/// Default bound on waiting for a response.
pub const DEFAULT_RESPONSE_TIMEOUT: Duration = Duration::from_secs(5);

/// Everything a tester sends with each request.
///
/// Cloning produces an independent copy: the header map is copied and the
/// document source, which is never mutated, is shared.
#[derive(Clone)]
pub struct TesterSettings {
    url: Option<Uri>,
    headers: HeaderMap,
    document_source: Arc<dyn DocumentSource>,
    response_timeout: Duration,
}

impl Default for TesterSettings {
    fn default() -> Self {
        Self {
            url: None,
            headers: HeaderMap::new(),
            document_source: Arc::new(ResourceDocumentSource::default()),
            response_timeout: DEFAULT_RESPONSE_TIMEOUT,
        }
    }
}

impl TesterSettings {
    /// Returns the configured URL, if any.
    pub fn url(&self) -> Option<&Uri> {
        self.url.as_ref()
    }

    /// Returns the URL requests are sent to, `/` when none is configured.
    pub fn request_uri(&self) -> Uri {
        self.url.clone().unwrap_or_else(|| Uri::from_static("/"))
    }

    /// Returns the headers sent with every request.
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Returns the document source.
    pub fn document_source(&self) -> &Arc<dyn DocumentSource> {
        &self.document_source
    }

    /// Returns the response timeout.
    pub fn response_timeout(&self) -> Duration {
        self.response_timeout
    }

    pub(crate) fn set_url(&mut self, value: &str) -> Result<(), InvalidSetting> {
        self.url = Some(parse_url(value)?);
        Ok(())
    }

    pub(crate) fn headers_mut(&mut self) -> &mut HeaderMap {
        &mut self.headers
    }

    pub(crate) fn set_document_source(&mut self, source: Arc<dyn DocumentSource>) {
        self.document_source = source;
    }

    pub(crate) fn set_response_timeout(&mut self, timeout: Duration) {
        self.response_timeout = timeout;
    }
}

impl fmt::Debug for TesterSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TesterSettings")
            .field("url", &self.url)
            .field("headers", &self.headers)
            .field("response_timeout", &self.response_timeout)
            .finish_non_exhaustive()
    }
}

/// Parses a tester URL. The value is kept as given, without normalization.
pub(crate) fn parse_url(value: &str) -> Result<Uri, InvalidSetting> {
    if value.trim().is_empty() {
        return Err(InvalidSetting::url(value, "must not be empty"));
    }
    value.parse::<Uri>().map_err(|e| InvalidSetting::url(value, e))
}

/// Replaces all values of `name` with `values`, in order.
///
/// With no values the header is removed.
pub(crate) fn replace_header<I, V>(
    headers: &mut HeaderMap,
    name: &str,
    values: I,
) -> Result<(), InvalidSetting>
where
    I: IntoIterator<Item = V>,
    V: AsRef<str>,
{
    let header_name = HeaderName::try_from(name).map_err(|e| InvalidSetting::header(name, e))?;
    let parsed = values
        .into_iter()
        .map(|v| HeaderValue::try_from(v.as_ref()))
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| InvalidSetting::header(name, e))?;

    headers.remove(&header_name);
    for value in parsed {
        headers.append(header_name.clone(), value);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let settings = TesterSettings::default();
        assert!(settings.url().is_none());
        assert_eq!(settings.request_uri(), "/");
        assert!(settings.headers().is_empty());
        assert_eq!(settings.response_timeout(), DEFAULT_RESPONSE_TIMEOUT);
    }

    #[test]
    fn test_parse_url_keeps_value() {
        assert_eq!(parse_url("/graphql-one").unwrap().to_string(), "/graphql-one");
        assert_eq!(
            parse_url("http://localhost:8080/graphql").unwrap().to_string(),
            "http://localhost:8080/graphql"
        );
        assert!(parse_url("").is_err());
        assert!(parse_url("/has space").is_err());
    }

    #[test]
    fn test_replace_header() {
        let mut headers = HeaderMap::new();
        headers.append("h", HeaderValue::from_static("one"));
        headers.append("other", HeaderValue::from_static("x"));

        replace_header(&mut headers, "h", ["three", "four"]).unwrap();
        let values: Vec<_> = headers.get_all("h").iter().collect();
        assert_eq!(values, vec!["three", "four"]);
        assert_eq!(headers.get("other").unwrap(), "x");

        replace_header(&mut headers, "h", Vec::<String>::new()).unwrap();
        assert!(headers.get("h").is_none());
    }

    #[test]
    fn test_replace_header_invalid_leaves_map_untouched() {
        let mut headers = HeaderMap::new();
        headers.append("h", HeaderValue::from_static("one"));

        assert!(replace_header(&mut headers, "bad name", ["x"]).is_err());
        assert!(replace_header(&mut headers, "h", ["ok", "bad\nvalue"]).is_err());
        assert_eq!(headers.get("h").unwrap(), "one");
    }

    #[test]
    fn test_clone_is_independent() {
        let mut settings = TesterSettings::default();
        settings.headers_mut().append("h", HeaderValue::from_static("one"));

        let mut copy = settings.clone();
        copy.headers_mut().append("h", HeaderValue::from_static("two"));
        copy.set_url("/graphql-two").unwrap();

        assert_eq!(settings.headers().get_all("h").iter().count(), 1);
        assert!(settings.url().is_none());
    }
}
