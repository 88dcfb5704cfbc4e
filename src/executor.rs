//! The request executor.
//!
//! [`Executor`] is the entry point. It owns the retry, timeout and pool
//! settings and composes the attempt loop, the cancellation race and the
//! status check for every call. Use [`ExecutorBuilder`] to configure one.

use crate::config::ExecutorConfig;
use crate::retry::{run_attempts, Completed};
use crate::{
    race, validate, CancelSignal, HttpRequest, PooledTransport, Response, Result, RetryPolicy,
    Transport,
};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;

/// Executes HTTP requests with bounded retry, per-attempt timeouts and cancellation.
///
/// Only connection failures and timeouts are retried. A response with a
/// non-2xx status is never retried and comes back as [`Error::Status`](crate::Error::Status).
///
/// Configuration can be changed through the `set_*` methods, which take
/// `&mut self`: the borrow checker keeps them away from calls still in
/// flight on the same executor. Clones share the transport and its pool.
///
/// # Examples
///
/// ```no_run
/// use steadycall::{CancelSignal, Executor, HttpRequest};
/// use std::time::Duration;
///
/// # async fn example() -> Result<(), steadycall::Error> {
/// let executor = Executor::builder()
///     .timeout(Duration::from_secs(2))
///     .retry(3)
///     .retry_wait(Duration::from_millis(200))
///     .build()?;
///
/// // Without a signal the call lasts until it succeeds or runs out of retries.
/// let response = executor
///     .execute(None, HttpRequest::get("https://api.example.com/users/123")?)
///     .await?;
/// println!("Status: {}", response.status());
///
/// // With a signal the whole call, retries included, ends by the deadline.
/// let signal = CancelSignal::with_timeout(Duration::from_secs(5));
/// let response = executor
///     .execute(Some(&signal), HttpRequest::get("https://api.example.com/users/456")?)
///     .await?;
/// println!("Took {:?} over {} attempts", response.latency(), response.attempts());
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct Executor {
    transport: Arc<dyn Transport>,
    pool_size: usize,
    timeout: Duration,
    retry_policy: RetryPolicy,
}

impl Executor {
    /// Creates an executor with the default configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the pooled transport cannot be built.
    pub fn new() -> Result<Self> {
        Self::builder().build()
    }

    /// Creates a new `ExecutorBuilder` for configuring an executor.
    pub fn builder() -> ExecutorBuilder {
        ExecutorBuilder::new()
    }

    /// Creates an executor from a loaded configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid or the pooled
    /// transport cannot be built.
    pub fn from_config(config: &ExecutorConfig) -> Result<Self> {
        ExecutorBuilder::from_config(config.clone()).build()
    }

    /// Executes `request`, retrying transport failures.
    ///
    /// When `signal` is given, the attempts run in a separate task; if the
    /// signal fires first the in-flight exchange is aborted, the task is
    /// joined, and [`Error::Canceled`](crate::Error::Canceled) is returned.
    ///
    /// On success the body is left unread for the caller. On every error
    /// path any received body has already been closed.
    ///
    /// # Errors
    ///
    /// * [`Error::Status`](crate::Error::Status) for a non-2xx response
    /// * [`Error::Canceled`](crate::Error::Canceled) when the signal fired
    /// * [`Error::Transport`](crate::Error::Transport),
    ///   [`Error::Timeout`](crate::Error::Timeout) or
    ///   [`Error::MaxRetriesExceeded`](crate::Error::MaxRetriesExceeded)
    ///   when no exchange completed
    pub async fn execute(
        &self,
        signal: Option<&CancelSignal>,
        request: HttpRequest,
    ) -> Result<Response> {
        let start_time = Instant::now();
        let request = Arc::new(request);

        let Completed { response, attempts } = match signal {
            Some(signal) => {
                race::race(
                    self.transport.clone(),
                    request.clone(),
                    self.retry_policy,
                    self.timeout,
                    signal,
                )
                .await?
            }
            None => {
                run_attempts(
                    self.transport.as_ref(),
                    &request,
                    self.retry_policy,
                    self.timeout,
                    None,
                )
                .await?
            }
        };
        let latency = start_time.elapsed();

        tracing::debug!(
            status = response.status().as_u16(),
            method = %request.method(),
            url = %request.url(),
            attempts = attempts,
            latency_ms = latency.as_millis(),
            "Received HTTP response"
        );

        let response = validate::check_status(response, &request, self.timeout).await?;
        Ok(Response::new(response, attempts, latency))
    }

    /// Idle connections kept per destination by the pooled transport.
    ///
    /// This is the configured value only. It has no effect while a custom
    /// transport is installed through [`ExecutorBuilder::transport`] or
    /// [`set_transport`](Self::set_transport).
    pub fn pool_size(&self) -> usize {
        self.pool_size
    }

    /// The per-attempt timeout.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// The retry policy.
    pub fn retry_policy(&self) -> RetryPolicy {
        self.retry_policy
    }

    /// The current settings as a configuration document.
    pub fn config(&self) -> ExecutorConfig {
        ExecutorConfig {
            pool_size: self.pool_size,
            timeout: self.timeout,
            retry: self.retry_policy.max_retries,
            retry_wait: self.retry_policy.wait,
        }
    }

    /// Rebuilds the pooled transport with a new idle-pool size.
    ///
    /// This replaces any custom transport.
    ///
    /// # Errors
    ///
    /// Returns an error if the pooled transport cannot be built.
    pub fn set_pool_size(&mut self, pool_size: usize) -> Result<()> {
        self.transport = Arc::new(PooledTransport::new(pool_size)?);
        self.pool_size = pool_size;
        Ok(())
    }

    /// Sets the per-attempt timeout.
    ///
    /// # Errors
    ///
    /// Returns an error if `timeout` is zero.
    pub fn set_timeout(&mut self, timeout: Duration) -> Result<()> {
        ExecutorConfig {
            timeout,
            ..self.config()
        }
        .validate()?;
        self.timeout = timeout;
        Ok(())
    }

    /// Sets the maximum number of retries after the first attempt.
    pub fn set_retry(&mut self, retry: usize) {
        self.retry_policy.max_retries = retry;
    }

    /// Sets the wait between a failed attempt and the next retry.
    pub fn set_retry_wait(&mut self, wait: Duration) {
        self.retry_policy.wait = wait;
    }

    /// Replaces the transport, e.g. with an instrumented one in tests.
    pub fn set_transport(&mut self, transport: Arc<dyn Transport>) {
        self.transport = transport;
    }
}

impl fmt::Debug for Executor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Executor")
            .field("pool_size", &self.pool_size)
            .field("timeout", &self.timeout)
            .field("retry_policy", &self.retry_policy)
            .finish_non_exhaustive()
    }
}

/// Builder for configuring and creating an [`Executor`].
///
/// # Examples
///
/// ```no_run
/// use steadycall::ExecutorBuilder;
/// use std::time::Duration;
///
/// # fn example() -> Result<(), steadycall::Error> {
/// let executor = ExecutorBuilder::new()
///     .pool_size(16)
///     .timeout(Duration::from_secs(30))
///     .retry(5)
///     .retry_wait(Duration::from_secs(1))
///     .build()?;
/// # Ok(())
/// # }
/// ```
pub struct ExecutorBuilder {
    config: ExecutorConfig,
    transport: Option<Arc<dyn Transport>>,
}

impl ExecutorBuilder {
    /// Creates a new `ExecutorBuilder` with default settings.
    pub fn new() -> Self {
        Self::from_config(ExecutorConfig::default())
    }

    /// Starts from an existing configuration.
    pub fn from_config(config: ExecutorConfig) -> Self {
        Self {
            config,
            transport: None,
        }
    }

    /// Sets the idle connections kept per destination.
    pub fn pool_size(mut self, pool_size: usize) -> Self {
        self.config.pool_size = pool_size;
        self
    }

    /// Sets the per-attempt timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.config.timeout = timeout;
        self
    }

    /// Sets the maximum number of retries after the first attempt.
    pub fn retry(mut self, retry: usize) -> Self {
        self.config.retry = retry;
        self
    }

    /// Sets the wait between a failed attempt and the next retry.
    pub fn retry_wait(mut self, wait: Duration) -> Self {
        self.config.retry_wait = wait;
        self
    }

    /// Uses a custom transport instead of building a pooled one.
    pub fn transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = Some(transport);
        self
    }

    /// Builds the configured `Executor`.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid or the pooled
    /// transport cannot be built.
    pub fn build(self) -> Result<Executor> {
        self.config.validate()?;

        let transport = match self.transport {
            Some(transport) => transport,
            None => Arc::new(PooledTransport::new(self.config.pool_size)?),
        };

        Ok(Executor {
            transport,
            pool_size: self.config.pool_size,
            timeout: self.config.timeout,
            retry_policy: RetryPolicy::new(self.config.retry, self.config.retry_wait),
        })
    }
}

impl Default for ExecutorBuilder {
    fn default() -> Self {
        Self::new()
    }
}
