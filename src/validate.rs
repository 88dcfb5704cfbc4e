//! Status validation for completed exchanges.
//!
//! A 2xx response is handed back untouched. Any other status becomes
//! [`Error::Status`]; before the response is dropped, up to
//! [`DIAGNOSTIC_BODY_LIMIT`] bytes of its body are read for the log. Reading
//! that body is best-effort: failures are logged and otherwise ignored.

use crate::{Error, HttpRequest, Result};
use http::StatusCode;
use std::time::Duration;

/// Maximum number of body bytes captured from a rejected response.
pub const DIAGNOSTIC_BODY_LIMIT: usize = 4096;

/// Returns the response if its status is 2xx, otherwise a [`Error::Status`].
///
/// `read_timeout` bounds the diagnostic body read.
pub(crate) async fn check_status(
    response: reqwest::Response,
    request: &HttpRequest,
    read_timeout: Duration,
) -> Result<reqwest::Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = if response.content_length() == Some(0) {
        None
    } else {
        match tokio::time::timeout(read_timeout, read_diagnostic(response)).await {
            Ok(Ok(text)) => Some(text.trim().to_string()),
            Ok(Err(e)) => {
                tracing::debug!(
                    error = %e,
                    status = status.as_u16(),
                    "Failed to read response error body"
                );
                None
            }
            Err(_) => {
                tracing::debug!(
                    timeout_ms = read_timeout.as_millis(),
                    status = status.as_u16(),
                    "Timed out reading response error body"
                );
                None
            }
        }
    };

    log_rejection(status, request, body.as_deref());

    Err(Error::Status {
        status,
        method: request.method().clone(),
        url: request.url().clone(),
        body,
    })
}

/// Reads and drops the response, keeping at most [`DIAGNOSTIC_BODY_LIMIT`] bytes.
async fn read_diagnostic(mut response: reqwest::Response) -> reqwest::Result<String> {
    let mut captured = Vec::new();
    while let Some(chunk) = response.chunk().await? {
        let room = DIAGNOSTIC_BODY_LIMIT - captured.len();
        captured.extend_from_slice(&chunk[..chunk.len().min(room)]);
        if captured.len() == DIAGNOSTIC_BODY_LIMIT {
            // Drop a character split by the cut.
            if let Err(e) = std::str::from_utf8(&captured) {
                if e.error_len().is_none() {
                    captured.truncate(e.valid_up_to());
                }
            }
            break;
        }
    }
    Ok(String::from_utf8_lossy(&captured).into_owned())
}

fn log_rejection(status: StatusCode, request: &HttpRequest, body: Option<&str>) {
    let body = body.unwrap_or_default();
    if status.is_client_error() {
        tracing::error!(
            status = status.as_u16(),
            method = %request.method(),
            url = %request.url(),
            response = %body,
            "HTTP request rejected (4xx)"
        );
    } else {
        tracing::warn!(
            status = status.as_u16(),
            method = %request.method(),
            url = %request.url(),
            response = %body,
            "HTTP request failed"
        );
    }
}
