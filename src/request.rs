//! Replayable request descriptors.

use crate::{Error, Result};
use http::{header::CONTENT_TYPE, HeaderMap, HeaderName, HeaderValue, Method};
use serde::Serialize;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use url::Url;

static NEXT_REQUEST_ID: AtomicU64 = AtomicU64::new(1);

/// Identity of a request, used by transports to find the exchange to abort.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RequestId(u64);

impl RequestId {
    fn next() -> Self {
        Self(NEXT_REQUEST_ID.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "req-{}", self.0)
    }
}

/// Everything needed to send one HTTP request, any number of times.
///
/// The body is held in memory so that every retry sends the same bytes.
/// Cloning produces a request with a fresh [`RequestId`].
///
/// # Examples
///
/// ```
/// use steadycall::HttpRequest;
///
/// # fn example() -> Result<(), steadycall::Error> {
/// let request = HttpRequest::get("https://api.example.com/users")?
///     .with_query_param("page", "2")
///     .with_header("accept", "application/json")?;
///
/// assert_eq!(request.url().query(), Some("page=2"));
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct HttpRequest {
    id: RequestId,
    method: Method,
    url: Url,
    headers: HeaderMap,
    body: Option<Vec<u8>>,
}

impl HttpRequest {
    /// Creates a request with the given method and target.
    pub fn new(method: Method, url: Url) -> Self {
        Self {
            id: RequestId::next(),
            method,
            url,
            headers: HeaderMap::new(),
            body: None,
        }
    }

    /// Parses `url` and creates a request for it.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidUrl`] if the URL cannot be parsed.
    pub fn parse(method: Method, url: impl AsRef<str>) -> Result<Self> {
        Ok(Self::new(method, Url::parse(url.as_ref())?))
    }

    /// Creates a GET request.
    pub fn get(url: impl AsRef<str>) -> Result<Self> {
        Self::parse(Method::GET, url)
    }

    /// Creates a POST request.
    pub fn post(url: impl AsRef<str>) -> Result<Self> {
        Self::parse(Method::POST, url)
    }

    /// Adds a header to the request.
    ///
    /// # Errors
    ///
    /// Returns an error if the header name or value is invalid.
    pub fn with_header(mut self, name: impl AsRef<str>, value: impl AsRef<str>) -> Result<Self> {
        let name = HeaderName::try_from(name.as_ref())
            .map_err(|e| Error::ConfigurationError(format!("Invalid header name: {}", e)))?;
        let value = HeaderValue::try_from(value.as_ref())
            .map_err(|e| Error::ConfigurationError(format!("Invalid header value: {}", e)))?;
        self.headers.insert(name, value);
        Ok(self)
    }

    /// Appends a query parameter to the target URL.
    pub fn with_query_param(mut self, key: impl AsRef<str>, value: impl AsRef<str>) -> Self {
        self.url
            .query_pairs_mut()
            .append_pair(key.as_ref(), value.as_ref());
        self
    }

    /// Sets a raw request body.
    pub fn with_body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = Some(body.into());
        self
    }

    /// Serializes `body` as JSON and sets the content type.
    ///
    /// # Errors
    ///
    /// Returns [`Error::SerializationFailed`] if serialization fails.
    pub fn with_json<T: Serialize + ?Sized>(mut self, body: &T) -> Result<Self> {
        let bytes =
            serde_json::to_vec(body).map_err(|e| Error::SerializationFailed(e.to_string()))?;
        self.headers
            .insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        self.body = Some(bytes);
        Ok(self)
    }

    /// The identity transports use to abort this request.
    pub fn id(&self) -> RequestId {
        self.id
    }

    /// The HTTP method.
    pub fn method(&self) -> &Method {
        &self.method
    }

    /// The target URL, query included.
    pub fn url(&self) -> &Url {
        &self.url
    }

    /// The headers sent with every attempt.
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// The body sent with every attempt, if any.
    pub fn body(&self) -> Option<&[u8]> {
        self.body.as_deref()
    }
}

impl Clone for HttpRequest {
    fn clone(&self) -> Self {
        Self {
            id: RequestId::next(),
            method: self.method.clone(),
            url: self.url.clone(),
            headers: self.headers.clone(),
            body: self.body.clone(),
        }
    }
}
