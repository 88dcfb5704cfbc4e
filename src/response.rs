//! Successful responses handed back to the caller.
//!
//! The [`Response`] type wraps the `reqwest::Response` whose body is still
//! unread, along with how many attempts and how much time the call took.
//! Reading or dropping the body is the caller's responsibility.

use http::{HeaderMap, StatusCode};
use std::time::Duration;

/// A 2xx response with its body stream still open.
///
/// # Examples
///
/// ```no_run
/// use steadycall::{Executor, HttpRequest};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let executor = Executor::new()?;
/// let response = executor
///     .execute(None, HttpRequest::get("https://api.example.com/users/123")?)
///     .await?;
///
/// println!("Status: {}", response.status());
/// println!("Request took {:?}", response.latency());
/// println!("Attempts: {}", response.attempts());
///
/// let body = response.text().await?;
/// println!("Body: {}", body);
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct Response {
    inner: reqwest::Response,
    attempts: usize,
    latency: Duration,
}

impl Response {
    pub(crate) fn new(inner: reqwest::Response, attempts: usize, latency: Duration) -> Self {
        Self {
            inner,
            attempts,
            latency,
        }
    }

    /// The HTTP status code of the response.
    pub fn status(&self) -> StatusCode {
        self.inner.status()
    }

    /// The response headers.
    pub fn headers(&self) -> &HeaderMap {
        self.inner.headers()
    }

    /// Returns a header value by name, if present and valid UTF-8.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.inner.headers().get(name)?.to_str().ok()
    }

    /// The declared body length, if known.
    pub fn content_length(&self) -> Option<u64> {
        self.inner.content_length()
    }

    /// The number of exchanges performed, including the successful one.
    pub fn attempts(&self) -> usize {
        self.attempts
    }

    /// Time from the start of the call until the response head arrived,
    /// including retries and waits.
    pub fn latency(&self) -> Duration {
        self.latency
    }

    /// Returns `true` if the request needed more than one attempt.
    pub fn was_retried(&self) -> bool {
        self.attempts > 1
    }

    /// Reads the full body as text.
    pub async fn text(self) -> reqwest::Result<String> {
        self.inner.text().await
    }

    /// Reads the full body as bytes.
    pub async fn bytes(self) -> reqwest::Result<Vec<u8>> {
        Ok(self.inner.bytes().await?.to_vec())
    }

    /// Reads the next chunk of the body, `None` at the end.
    pub async fn chunk(&mut self) -> reqwest::Result<Option<Vec<u8>>> {
        Ok(self.inner.chunk().await?.map(|chunk| chunk.to_vec()))
    }

    /// Deserializes the full body as JSON.
    pub async fn json<T: serde::de::DeserializeOwned>(self) -> reqwest::Result<T> {
        self.inner.json().await
    }

    /// Returns the underlying reqwest response.
    pub fn into_inner(self) -> reqwest::Response {
        self.inner
    }
}

impl AsRef<reqwest::Response> for Response {
    fn as_ref(&self) -> &reqwest::Response {
        &self.inner
    }
}
