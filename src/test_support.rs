//! In-process transports for unit tests.

use crate::{HttpRequest, Transport, TransportError};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;
use tokio::sync::Notify;
use tokio::time::Instant;

/// What a [`ScriptedTransport`] does for one exchange, after its latency.
#[derive(Debug, Clone, Copy)]
pub(crate) enum Step {
    Respond(u16),
    RespondBody(u16, &'static str),
    Fail,
    Hang,
}

pub(crate) fn response(status: u16, body: &'static str) -> reqwest::Response {
    http::Response::builder()
        .status(status)
        .body(body)
        .unwrap()
        .into()
}

/// Plays scripted steps in order, then repeats `fallback` forever.
pub(crate) struct ScriptedTransport {
    latency: Duration,
    fallback: Step,
    script: Mutex<VecDeque<Step>>,
    attempts: AtomicUsize,
    aborts: AtomicUsize,
    active: AtomicUsize,
    aborted: Notify,
}

impl ScriptedTransport {
    pub(crate) fn new(latency: Duration, fallback: Step) -> Self {
        Self {
            latency,
            fallback,
            script: Mutex::new(VecDeque::new()),
            attempts: AtomicUsize::new(0),
            aborts: AtomicUsize::new(0),
            active: AtomicUsize::new(0),
            aborted: Notify::new(),
        }
    }

    pub(crate) fn with_step(self, step: Step) -> Self {
        self.script.lock().unwrap().push_back(step);
        self
    }

    pub(crate) fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }

    pub(crate) fn aborts(&self) -> usize {
        self.aborts.load(Ordering::SeqCst)
    }

    /// Exchanges started and not yet finished or dropped.
    pub(crate) fn active(&self) -> usize {
        self.active.load(Ordering::SeqCst)
    }
}

struct Active<'a>(&'a AtomicUsize);

impl<'a> Active<'a> {
    fn enter(counter: &'a AtomicUsize) -> Self {
        counter.fetch_add(1, Ordering::SeqCst);
        Self(counter)
    }
}

impl Drop for Active<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn perform(
        &self,
        _request: &HttpRequest,
    ) -> Result<reqwest::Response, TransportError> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        let step = self
            .script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(self.fallback);
        let _active = Active::enter(&self.active);
        let aborted = self.aborted.notified();

        let exchange = async {
            tokio::time::sleep(self.latency).await;
            match step {
                Step::Respond(status) => Ok(response(status, "")),
                Step::RespondBody(status, body) => Ok(response(status, body)),
                Step::Fail => Err(TransportError::Connection(
                    "connection reset by peer".to_string(),
                )),
                Step::Hang => std::future::pending().await,
            }
        };

        tokio::select! {
            () = aborted => Err(TransportError::Aborted),
            result = exchange => result,
        }
    }

    fn abort(&self, _request: &HttpRequest) {
        self.aborts.fetch_add(1, Ordering::SeqCst);
        self.aborted.notify_waiters();
    }
}

/// Asserts `start.elapsed()` lies in `[expected, expected + 5ms)`.
pub(crate) fn assert_elapsed(start: Instant, expected: Duration) {
    let elapsed = start.elapsed();
    assert!(
        elapsed >= expected && elapsed < expected + Duration::from_millis(5),
        "Expected about {:?}, got {:?}",
        expected,
        elapsed
    );
}
