//! The cancelable transport seam.
//!
//! The executor never speaks HTTP itself. It hands each attempt to a
//! [`Transport`], and when a caller's signal fires it asks the same transport
//! to [`abort`](Transport::abort) whatever exchange is in flight for the
//! request. [`PooledTransport`] is the production implementation on top of a
//! pooled `reqwest::Client`.

use crate::{request::RequestId, Error, HttpRequest, Result, TransportError};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};
use tokio_util::sync::CancellationToken;

/// Performs one request/response exchange and can abort it from elsewhere.
///
/// # Contract
///
/// * `perform` sends the request once and returns the response head, leaving
///   the body unread.
/// * `abort`, called concurrently with a `perform` for the same request, makes
///   that `perform` return an error promptly.
/// * `abort` is a no-op when nothing is in flight for the request.
/// * Dropping a `perform` future must release the exchange.
///
/// # Examples
///
/// ```
/// use async_trait::async_trait;
/// use steadycall::{HttpRequest, Transport, TransportError};
///
/// struct Offline;
///
/// #[async_trait]
/// impl Transport for Offline {
///     async fn perform(
///         &self,
///         _request: &HttpRequest,
///     ) -> Result<reqwest::Response, TransportError> {
///         Err(TransportError::Connection("network unreachable".to_string()))
///     }
///
///     fn abort(&self, _request: &HttpRequest) {}
/// }
/// ```
#[async_trait]
pub trait Transport: Send + Sync {
    /// Performs one exchange.
    async fn perform(
        &self,
        request: &HttpRequest,
    ) -> std::result::Result<reqwest::Response, TransportError>;

    /// Aborts the in-flight exchange for `request`, if any.
    fn abort(&self, request: &HttpRequest);
}

/// A [`Transport`] backed by a connection-pooling `reqwest::Client`.
///
/// In-flight exchanges are tracked by [`RequestId`]; aborting one cancels its
/// token, which drops the reqwest future and with it the connection.
pub struct PooledTransport {
    client: reqwest::Client,
    in_flight: Mutex<HashMap<RequestId, CancellationToken>>,
}

impl PooledTransport {
    /// Builds a transport keeping up to `pool_size` idle connections per host.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying HTTP client cannot be built.
    pub fn new(pool_size: usize) -> Result<Self> {
        let client = reqwest::Client::builder()
            .pool_max_idle_per_host(pool_size)
            .build()
            .map_err(|e| {
                Error::ConfigurationError(format!("Failed to build HTTP client: {}", e))
            })?;
        Ok(Self::from_client(client))
    }

    /// Wraps an already configured client.
    pub fn from_client(client: reqwest::Client) -> Self {
        Self {
            client,
            in_flight: Mutex::new(HashMap::new()),
        }
    }

    /// Number of exchanges currently registered as in flight.
    pub fn in_flight(&self) -> usize {
        self.registry().len()
    }

    fn registry(&self) -> std::sync::MutexGuard<'_, HashMap<RequestId, CancellationToken>> {
        self.in_flight.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn register(&self, id: RequestId) -> InFlight<'_> {
        let token = CancellationToken::new();
        self.registry().insert(id, token.clone());
        InFlight {
            transport: self,
            id,
            token,
        }
    }
}

/// Registration of one in-flight exchange, removed on drop.
struct InFlight<'a> {
    transport: &'a PooledTransport,
    id: RequestId,
    token: CancellationToken,
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.transport.registry().remove(&self.id);
    }
}

#[async_trait]
impl Transport for PooledTransport {
    async fn perform(
        &self,
        request: &HttpRequest,
    ) -> std::result::Result<reqwest::Response, TransportError> {
        let in_flight = self.register(request.id());

        let mut builder = self
            .client
            .request(request.method().clone(), request.url().clone())
            .headers(request.headers().clone());
        if let Some(body) = request.body() {
            builder = builder.body(body.to_vec());
        }

        tokio::select! {
            biased;
            () = in_flight.token.cancelled() => {
                tracing::debug!(request_id = %request.id(), "Exchange aborted");
                Err(TransportError::Aborted)
            }
            result = builder.send() => result.map_err(TransportError::from),
        }
    }

    fn abort(&self, request: &HttpRequest) {
        if let Some(token) = self.registry().get(&request.id()) {
            token.cancel();
        }
    }
}
