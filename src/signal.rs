//! Caller-owned cancellation signals.
//!
//! A [`CancelSignal`] combines an explicit cancel switch with an optional
//! deadline. The executor only observes it: it checks [`CancelSignal::is_fired`]
//! before retrying, waits on [`CancelSignal::fired`] while an attempt is
//! running, and reports [`CancelSignal::reason`] when it gives up.

use std::fmt;
use std::sync::{Arc, OnceLock};
use std::time::Duration;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

/// Why a [`CancelSignal`] fired.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CancelReason {
    /// The owner called [`CancelSignal::cancel`].
    Canceled,
    /// The signal's deadline passed.
    DeadlineExceeded,
}

impl fmt::Display for CancelReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CancelReason::Canceled => f.write_str("canceled by caller"),
            CancelReason::DeadlineExceeded => f.write_str("deadline exceeded"),
        }
    }
}

/// A deadline/cancel source supplied per call.
///
/// Clones share state: cancelling one clone fires all of them.
///
/// # Examples
///
/// ```
/// use steadycall::{CancelReason, CancelSignal};
///
/// let signal = CancelSignal::new();
/// assert!(!signal.is_fired());
///
/// signal.cancel();
/// assert!(signal.is_fired());
/// assert_eq!(signal.reason(), Some(CancelReason::Canceled));
/// ```
#[derive(Debug, Clone)]
pub struct CancelSignal {
    token: CancellationToken,
    deadline: Option<Instant>,
    reason: Arc<OnceLock<CancelReason>>,
}

impl CancelSignal {
    /// Creates a signal that only fires on an explicit [`cancel`](Self::cancel).
    pub fn new() -> Self {
        Self::from_token(CancellationToken::new())
    }

    /// Creates a signal that fires `timeout` from now.
    ///
    /// A timeout too large to represent as an instant means no deadline.
    pub fn with_timeout(timeout: Duration) -> Self {
        match Instant::now().checked_add(timeout) {
            Some(deadline) => Self::with_deadline(deadline),
            None => Self::new(),
        }
    }

    /// Creates a signal that fires at `deadline`.
    pub fn with_deadline(deadline: Instant) -> Self {
        Self {
            deadline: Some(deadline),
            ..Self::new()
        }
    }

    /// Observes an existing token. Cancelling the token fires the signal.
    pub fn from_token(token: CancellationToken) -> Self {
        Self {
            token,
            deadline: None,
            reason: Arc::new(OnceLock::new()),
        }
    }

    /// Returns the deadline, if one was set.
    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Fires the signal. Only the owner should call this.
    pub fn cancel(&self) {
        self.reason.get_or_init(|| {
            if self.deadline_passed() {
                CancelReason::DeadlineExceeded
            } else {
                CancelReason::Canceled
            }
        });
        self.token.cancel();
    }

    /// Returns `true` once the signal has fired.
    pub fn is_fired(&self) -> bool {
        self.token.is_cancelled() || self.deadline_passed()
    }

    /// Resolves when the signal fires.
    pub async fn fired(&self) {
        match self.deadline {
            Some(deadline) => tokio::select! {
                () = self.token.cancelled() => {}
                () = tokio::time::sleep_until(deadline) => {}
            },
            None => self.token.cancelled().await,
        }
    }

    /// Returns why the signal fired, or `None` if it has not.
    pub fn reason(&self) -> Option<CancelReason> {
        if let Some(reason) = self.reason.get() {
            return Some(*reason);
        }
        if self.deadline_passed() {
            return Some(CancelReason::DeadlineExceeded);
        }
        // Token cancelled from outside, e.g. a shared shutdown token.
        self.token.is_cancelled().then_some(CancelReason::Canceled)
    }

    fn deadline_passed(&self) -> bool {
        self.deadline
            .is_some_and(|deadline| Instant::now() >= deadline)
    }
}

impl Default for CancelSignal {
    fn default() -> Self {
        Self::new()
    }
}

impl From<CancellationToken> for CancelSignal {
    fn from(token: CancellationToken) -> Self {
        Self::from_token(token)
    }
}
