//! Backoff for transient HTTP failures.
//!
//! Timeouts, connection errors, 5xx, 408 and 429 are retried. Other 4xx
//! responses are returned to the caller as-is.

use std::future::Future;
use std::time::Duration;

use reqwest::{Response, StatusCode};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    pub max_retries: u32,
    pub initial_delay_ms: u64,
    pub max_delay_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self { max_retries: 3, initial_delay_ms: 100, max_delay_ms: 5_000 }
    }
}

impl RetryConfig {
    /// Single attempt, no backoff.
    pub const fn none() -> Self {
        Self { max_retries: 0, initial_delay_ms: 0, max_delay_ms: 0 }
    }

    /// `initial_delay * 2^attempt`, capped at `max_delay`.
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let factor = 2u64.saturating_pow(attempt);
        Duration::from_millis(self.initial_delay_ms.saturating_mul(factor).min(self.max_delay_ms))
    }
}

pub fn is_retryable_status(status: StatusCode) -> bool {
    status.is_server_error()
        || status == StatusCode::TOO_MANY_REQUESTS
        || status == StatusCode::REQUEST_TIMEOUT
}

pub fn is_retryable_error(error: &reqwest::Error) -> bool {
    if error.is_timeout() || error.is_connect() {
        return true;
    }
    error.status().is_some_and(is_retryable_status)
}

/// Run `send` until it yields a non-retryable outcome or retries run out.
///
/// The last response is returned even when its status is retryable, so the
/// caller can report it.
pub async fn with_retry<F, Fut>(config: RetryConfig, send: F) -> Result<Response, reqwest::Error>
where
    F: Fn() -> Fut,
    Fut: Future<Output = Result<Response, reqwest::Error>>,
{
    let mut attempt = 0;
    loop {
        let outcome = send().await;
        let retry = match &outcome {
            Ok(response) => is_retryable_status(response.status()),
            Err(e) => is_retryable_error(e),
        };

        if !retry || attempt >= config.max_retries {
            if attempt > 0 && outcome.is_ok() {
                tracing::debug!(attempt, "request finished after retries");
            }
            return outcome;
        }

        let delay = config.delay_for_attempt(attempt);
        match &outcome {
            Ok(response) => tracing::warn!(status = %response.status(), ?delay, "retrying request"),
            Err(e) => tracing::warn!(error = %e, ?delay, "retrying request"),
        }
        tokio::time::sleep(delay).await;
        attempt += 1;
    }
}
