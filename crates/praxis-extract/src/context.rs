//! The request parts capability suppliers read from.

use http::{HeaderMap, Method, Uri};

use crate::{ExtractionError, ExtractionSource};

/// Method, URI and headers of one request.
///
/// The body is not here: it travels to the action as an opaque `Body`.
///
/// # Example
///
/// ```rust
/// use praxis_extract::RequestParts;
/// use http::{HeaderMap, Method, Uri};
///
/// let parts = RequestParts::new(
///     Method::GET,
///     Uri::from_static("/widgets?page=2&fields=id,name"),
///     HeaderMap::new(),
/// );
///
/// assert_eq!(parts.query_param("page").unwrap(), Some("2".to_string()));
/// assert_eq!(parts.path(), "/widgets");
/// ```
#[derive(Debug, Clone)]
pub struct RequestParts {
    method: Method,
    uri: Uri,
    headers: HeaderMap,
}

impl RequestParts {
    /// Creates the parts of a request.
    #[must_use]
    pub fn new(method: Method, uri: Uri, headers: HeaderMap) -> Self {
        Self {
            method,
            uri,
            headers,
        }
    }

    /// Returns the transport method.
    #[must_use]
    pub fn method(&self) -> &Method {
        &self.method
    }

    /// Returns the request URI.
    #[must_use]
    pub fn uri(&self) -> &Uri {
        &self.uri
    }

    /// Returns the path portion of the URI.
    #[must_use]
    pub fn path(&self) -> &str {
        self.uri.path()
    }

    /// Returns the query string if present.
    #[must_use]
    pub fn query_string(&self) -> Option<&str> {
        self.uri.query()
    }

    /// Returns the request headers.
    #[must_use]
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Returns a header value as a string.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// Decodes the query string into key/value pairs, in order.
    pub fn query_pairs(&self) -> Result<Vec<(String, String)>, ExtractionError> {
        let query = self.query_string().unwrap_or("");
        serde_urlencoded::from_str(query).map_err(|e| {
            ExtractionError::deserialization_failed(ExtractionSource::Query, e.to_string())
        })
    }

    /// Returns the first value of a query parameter.
    pub fn query_param(&self, name: &str) -> Result<Option<String>, ExtractionError> {
        Ok(self
            .query_pairs()?
            .into_iter()
            .find_map(|(key, value)| (key == name).then_some(value)))
    }
}
