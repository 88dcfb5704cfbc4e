//! Error types for executed requests.
//!
//! Failures fall into three families that callers branch on: transient
//! transport failures (retried), non-success responses (never retried) and
//! cancellations (never retried). [`Error::kind`] exposes the family directly.

use crate::signal::CancelReason;
use http::{Method, StatusCode};
use std::time::Duration;
use url::Url;

/// The main error type returned by [`Executor::execute`](crate::Executor::execute).
///
/// # Examples
///
/// ```no_run
/// use steadycall::{Error, Executor, HttpRequest};
///
/// # async fn example() -> Result<(), Error> {
/// let executor = Executor::new()?;
/// let request = HttpRequest::get("https://api.example.com/health")?;
///
/// match executor.execute(None, request).await {
///     Ok(response) => println!("Success: {}", response.status()),
///     Err(Error::Status { status, body, .. }) => {
///         eprintln!("Remote rejected the request ({}): {:?}", status, body);
///     }
///     Err(e) if e.is_retryable() => eprintln!("Network trouble: {}", e),
///     Err(e) => eprintln!("Other error: {}", e),
/// }
/// # Ok(())
/// # }
/// ```
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// The transport failed to complete the exchange.
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    /// A single attempt exceeded the per-attempt timeout.
    #[error("Request timed out after {0:?}")]
    Timeout(Duration),

    /// The exchange completed but the response status was not in the 2xx range.
    ///
    /// This is the "non-success response" error. It is produced once, after
    /// the attempt loop has finished, and is never retried.
    ///
    /// # Fields
    ///
    /// * `status` - The HTTP status code
    /// * `method` - The method of the rejected request
    /// * `url` - The target of the rejected request
    /// * `body` - The trimmed diagnostic body, when one could be read
    #[error("HTTP error {status} for {method} {url}")]
    Status {
        /// The HTTP status code
        status: StatusCode,
        /// The request method
        method: Method,
        /// The request target
        url: Url,
        /// Best-effort diagnostic capture of the response body
        body: Option<String>,
    },

    /// The caller's cancellation signal fired before the call completed.
    #[error("Request canceled: {0}")]
    Canceled(CancelReason),

    /// Every retry was spent on transient failures.
    ///
    /// # Fields
    ///
    /// * `attempts` - The number of exchanges performed
    /// * `last_error` - The most recent transient failure
    #[error("Max retries exceeded after {attempts} attempts: {last_error}")]
    MaxRetriesExceeded {
        /// The number of attempts made
        attempts: usize,
        /// The last error encountered
        #[source]
        last_error: Box<Error>,
    },

    /// Invalid configuration was provided.
    #[error("Configuration error: {0}")]
    ConfigurationError(String),

    /// Failed to serialize a request body.
    #[error("Failed to serialize request: {0}")]
    SerializationFailed(String),

    /// An invalid URL was provided.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
}

/// A failure reported by a [`Transport`](crate::Transport) for one exchange.
#[derive(thiserror::Error, Debug)]
pub enum TransportError {
    /// Error raised by the underlying reqwest client.
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// The exchange was terminated through [`Transport::abort`](crate::Transport::abort).
    #[error("Exchange aborted")]
    Aborted,

    /// Connection-level failure reported by a custom transport.
    #[error("Connection failed: {0}")]
    Connection(String),
}

/// Coarse classification of an [`Error`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Connection, timeout or abort failure during an exchange.
    Transient,
    /// A completed exchange whose status signals rejection.
    Application,
    /// The external cancellation signal fired.
    Canceled,
    /// The request or executor was misconfigured; nothing was sent.
    Configuration,
}

impl Error {
    /// Returns the family this error belongs to.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Transport(_) | Error::Timeout(_) | Error::MaxRetriesExceeded { .. } => {
                ErrorKind::Transient
            }
            Error::Status { .. } => ErrorKind::Application,
            Error::Canceled(_) => ErrorKind::Canceled,
            Error::ConfigurationError(_)
            | Error::SerializationFailed(_)
            | Error::InvalidUrl(_) => ErrorKind::Configuration,
        }
    }

    /// Returns `true` if the attempt loop may retry after this error.
    ///
    /// Only transport failures and per-attempt timeouts qualify. A
    /// non-success status is never retryable.
    ///
    /// # Examples
    ///
    /// ```
    /// use steadycall::{Error, TransportError};
    /// use std::time::Duration;
    ///
    /// assert!(Error::Timeout(Duration::from_millis(100)).is_retryable());
    /// assert!(Error::Transport(TransportError::Aborted).is_retryable());
    /// assert!(!Error::ConfigurationError("bad".to_string()).is_retryable());
    /// ```
    pub fn is_retryable(&self) -> bool {
        matches!(self, Error::Transport(_) | Error::Timeout(_))
    }

    /// Returns `true` for the "non-success response" error.
    pub fn is_status_error(&self) -> bool {
        matches!(self, Error::Status { .. })
    }

    /// Returns `true` if the call ended because the cancellation signal fired.
    pub fn is_canceled(&self) -> bool {
        matches!(self, Error::Canceled(_))
    }

    /// Returns the HTTP status code if this error has one.
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            Error::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// A specialized `Result` type for executed requests.
pub type Result<T> = std::result::Result<T, Error>;
