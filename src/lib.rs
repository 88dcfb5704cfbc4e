//! # Steadycall - resilient HTTP request execution
//!
//! Steadycall sends one HTTP request at a time with bounded automatic retry
//! on transport-level failure, a per-attempt timeout, and cooperative
//! cancellation driven by a caller-supplied [`CancelSignal`]. It is built on
//! top of `reqwest` and never retries a response the server actually sent.
//!
//! ## Quick Start
//!
//! ```no_run
//! use steadycall::{CancelSignal, Executor, HttpRequest};
//! use std::time::Duration;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), steadycall::Error> {
//!     let executor = Executor::builder()
//!         .timeout(Duration::from_secs(5))
//!         .retry(3)
//!         .retry_wait(Duration::from_millis(500))
//!         .build()?;
//!
//!     // Give the whole call, retries included, ten seconds.
//!     let signal = CancelSignal::with_timeout(Duration::from_secs(10));
//!     let request = HttpRequest::get("https://api.example.com/status")?;
//!
//!     let response = executor.execute(Some(&signal), request).await?;
//!     println!("{} after {} attempts", response.status(), response.attempts());
//!     Ok(())
//! }
//! ```
//!
//! ## Failure handling
//!
//! | failure | retried | surfaced as |
//! |---|---|---|
//! | connection error, per-attempt timeout | up to the retry budget | [`Error::Transport`], [`Error::Timeout`], [`Error::MaxRetriesExceeded`] |
//! | non-2xx response | never | [`Error::Status`] |
//! | signal fired | never | [`Error::Canceled`] |
//!
//! Every retry and every rejected response is logged through `tracing` with
//! the method, target and cause.
//!
//! ## Cancellation
//!
//! With a signal, the attempts run in their own task. If the signal fires
//! first, the executor asks the [`Transport`] to abort the in-flight exchange
//! and waits for the task to finish before returning, so no work from the
//! call outlives it.
//!
//! ```no_run
//! use steadycall::{CancelSignal, Error, Executor, HttpRequest};
//!
//! # async fn example(executor: Executor) -> Result<(), Error> {
//! let signal = CancelSignal::new();
//! let trigger = signal.clone();
//! tokio::spawn(async move {
//!     tokio::signal::ctrl_c().await.ok();
//!     trigger.cancel();
//! });
//!
//! match executor
//!     .execute(Some(&signal), HttpRequest::get("https://api.example.com/slow")?)
//!     .await
//! {
//!     Err(Error::Canceled(reason)) => eprintln!("gave up: {}", reason),
//!     other => println!("{:?}", other.map(|r| r.status())),
//! }
//! # Ok(())
//! # }
//! ```

mod config;
mod error;
mod executor;
mod race;
mod request;
mod response;
pub mod retry;
mod signal;
pub mod transport;
mod validate;

#[cfg(test)]
mod test_support;

pub use config::{
    ExecutorConfig, DEFAULT_POOL_SIZE, DEFAULT_RETRY, DEFAULT_RETRY_WAIT, DEFAULT_TIMEOUT,
};
pub use error::{Error, ErrorKind, Result, TransportError};
pub use executor::{Executor, ExecutorBuilder};
pub use request::{HttpRequest, RequestId};
pub use response::Response;
pub use retry::RetryPolicy;
pub use signal::{CancelReason, CancelSignal};
pub use transport::{PooledTransport, Transport};
pub use validate::DIAGNOSTIC_BODY_LIMIT;
