//! Shared helpers for integration tests.

#![allow(dead_code)]

use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use steadycall::{HttpRequest, Transport, TransportError};
use tokio::sync::Notify;

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Answers 200 after a fixed latency, unless aborted first.
pub struct SleepTransport {
    latency: Duration,
    attempts: AtomicUsize,
    aborts: AtomicUsize,
    in_flight: AtomicUsize,
    aborted: Notify,
}

impl SleepTransport {
    pub fn new(latency: Duration) -> Self {
        Self {
            latency,
            attempts: AtomicUsize::new(0),
            aborts: AtomicUsize::new(0),
            in_flight: AtomicUsize::new(0),
            aborted: Notify::new(),
        }
    }

    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }

    pub fn aborts(&self) -> usize {
        self.aborts.load(Ordering::SeqCst)
    }

    pub fn in_flight(&self) -> usize {
        self.in_flight.load(Ordering::SeqCst)
    }
}

struct InFlight<'a>(&'a AtomicUsize);

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl Transport for SleepTransport {
    async fn perform(
        &self,
        _request: &HttpRequest,
    ) -> Result<reqwest::Response, TransportError> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        self.in_flight.fetch_add(1, Ordering::SeqCst);
        let _in_flight = InFlight(&self.in_flight);
        let aborted = self.aborted.notified();

        tokio::select! {
            () = tokio::time::sleep(self.latency) => {
                let response = http::Response::builder()
                    .status(200)
                    .body("")
                    .map_err(|e| TransportError::Connection(e.to_string()))?;
                Ok(response.into())
            }
            () = aborted => Err(TransportError::Aborted),
        }
    }

    fn abort(&self, _request: &HttpRequest) {
        self.aborts.fetch_add(1, Ordering::SeqCst);
        self.aborted.notify_waiters();
    }
}
