//! Retry policy and the attempt loop.
//!
//! The loop performs one exchange at a time. Transport failures and
//! per-attempt timeouts consume retry budget; any HTTP response, whatever its
//! status, ends the loop. Status codes are judged afterwards, once, by the
//! executor.
//!
//! # States
//!
//! ```text
//! ATTEMPT ── response ───────────────────────────────▶ SUCCESS
//!    │
//!    └── transport error / timeout
//!          ├── budget left, signal quiet ──▶ WAIT ──▶ ATTEMPT
//!          │                                  └── signal fires ──▶ FAIL
//!          └── otherwise ──────────────────────────────────────▶ FAIL
//! ```

use crate::{CancelSignal, Error, HttpRequest, Result, Transport};
use std::time::Duration;

/// How many times to retry a transient failure, and how long to wait between tries.
///
/// # Examples
///
/// ```
/// use steadycall::RetryPolicy;
/// use std::time::Duration;
///
/// // Up to 4 exchanges in total, 100ms apart.
/// let policy = RetryPolicy::new(3, Duration::from_millis(100));
/// assert_eq!(policy.max_attempts(), 4);
///
/// assert_eq!(RetryPolicy::none().max_attempts(), 1);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Maximum number of retries after the first attempt.
    pub max_retries: usize,
    /// Delay between a failed attempt and the next one.
    pub wait: Duration,
}

impl RetryPolicy {
    /// Creates a policy with a fixed wait between retries.
    pub fn new(max_retries: usize, wait: Duration) -> Self {
        Self { max_retries, wait }
    }

    /// A policy that never retries.
    pub fn none() -> Self {
        Self::new(0, Duration::ZERO)
    }

    /// Total number of exchanges the policy allows.
    pub fn max_attempts(&self) -> usize {
        self.max_retries.saturating_add(1)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(crate::config::DEFAULT_RETRY, crate::config::DEFAULT_RETRY_WAIT)
    }
}

/// A response obtained by the attempt loop, not yet status-checked.
#[derive(Debug)]
pub(crate) struct Completed {
    pub(crate) response: reqwest::Response,
    pub(crate) attempts: usize,
}

/// Runs the attempt loop for one call.
pub(crate) async fn run_attempts(
    transport: &dyn Transport,
    request: &HttpRequest,
    policy: RetryPolicy,
    timeout: Duration,
    signal: Option<&CancelSignal>,
) -> Result<Completed> {
    let mut remaining = policy.max_retries;
    let mut attempt = 0;

    loop {
        if let Some(reason) = signal.and_then(CancelSignal::reason) {
            tracing::debug!(
                method = %request.method(),
                url = %request.url(),
                attempts = attempt,
                reason = %reason,
                "Cancellation signal fired, not starting another attempt"
            );
            return Err(Error::Canceled(reason));
        }

        attempt += 1;

        tracing::debug!(
            method = %request.method(),
            url = %request.url(),
            attempt = attempt,
            "Executing HTTP request"
        );

        let error = match tokio::time::timeout(timeout, transport.perform(request)).await {
            Ok(Ok(response)) => {
                return Ok(Completed {
                    response,
                    attempts: attempt,
                })
            }
            Ok(Err(e)) => Error::Transport(e),
            Err(_) => Error::Timeout(timeout),
        };

        if let Some(reason) = signal.and_then(CancelSignal::reason) {
            tracing::debug!(
                error = %error,
                method = %request.method(),
                url = %request.url(),
                attempt = attempt,
                "Cancellation signal fired, not retrying"
            );
            return Err(Error::Canceled(reason));
        }

        if remaining == 0 {
            tracing::warn!(
                error = %error,
                method = %request.method(),
                url = %request.url(),
                attempts = attempt,
                "HTTP request failed, no retries left"
            );
            return Err(if attempt > 1 {
                Error::MaxRetriesExceeded {
                    attempts: attempt,
                    last_error: Box::new(error),
                }
            } else {
                error
            });
        }
        remaining -= 1;

        tracing::warn!(
            error = %error,
            method = %request.method(),
            url = %request.url(),
            attempt = attempt,
            remaining = remaining,
            wait_ms = policy.wait.as_millis(),
            "HTTP request failed, waiting to retry"
        );

        match signal {
            Some(signal) => tokio::select! {
                () = tokio::time::sleep(policy.wait) => {}
                () = signal.fired() => {
                    let reason = signal.reason().unwrap_or(crate::CancelReason::Canceled);
                    tracing::debug!(
                        method = %request.method(),
                        url = %request.url(),
                        reason = %reason,
                        "Cancellation signal fired while waiting to retry"
                    );
                    return Err(Error::Canceled(reason));
                }
            },
            None => tokio::time::sleep(policy.wait).await,
        }
    }
}
