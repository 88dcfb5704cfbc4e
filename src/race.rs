//! Racing the attempt loop against a caller's cancellation signal.
//!
//! The loop runs as its own task. The caller waits for whichever comes
//! first: the task finishing, or the signal firing. When the signal wins, the
//! in-flight exchange is aborted through the transport and the task is
//! joined before returning, so nothing from the call is left running.

use crate::retry::{run_attempts, Completed};
use crate::{
    CancelReason, CancelSignal, Error, HttpRequest, Result, RetryPolicy, Transport, TransportError,
};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinError;
use tokio_util::task::AbortOnDropHandle;

/// Runs the attempt loop in a task and waits for it or for `signal`.
///
/// If the returned future is dropped early, the task is aborted with it.
pub(crate) async fn race(
    transport: Arc<dyn Transport>,
    request: Arc<HttpRequest>,
    policy: RetryPolicy,
    timeout: Duration,
    signal: &CancelSignal,
) -> Result<Completed> {
    let mut attempts = AbortOnDropHandle::new(tokio::spawn({
        let transport = transport.clone();
        let request = request.clone();
        let signal = signal.clone();
        async move {
            run_attempts(transport.as_ref(), &request, policy, timeout, Some(&signal)).await
        }
    }));

    tokio::select! {
        biased;
        joined = &mut attempts => settle(joined),
        () = signal.fired() => {
            let reason = signal.reason().unwrap_or(CancelReason::Canceled);
            tracing::debug!(
                method = %request.method(),
                url = %request.url(),
                reason = %reason,
                "Cancellation signal fired, aborting in-flight exchange"
            );
            transport.abort(&request);

            // A response that slipped through is dropped here, closing its body.
            if let Ok(late) = settle(attempts.await) {
                tracing::debug!(
                    status = late.response.status().as_u16(),
                    "Discarding response that completed after cancellation"
                );
            }
            Err(Error::Canceled(reason))
        }
    }
}

fn settle(joined: std::result::Result<Result<Completed>, JoinError>) -> Result<Completed> {
    match joined {
        Ok(result) => result,
        Err(e) if e.is_panic() => std::panic::resume_unwind(e.into_panic()),
        // Only reachable when the runtime is shutting down.
        Err(_) => Err(Error::Transport(TransportError::Aborted)),
    }
}
