//! Retry/backoff engine.
//!
//! [`RequestExecutor`] wraps one logical request with a bounded number of
//! attempts. Rate limits (429), server errors (>= 500) and transport failures
//! are retried after a delay; every other failure is returned at once.
//!
//! Delays are `2^attempt` seconds (zero-based attempt, no jitter), capped at
//! [`MAX_BACKOFF`]. On 429 the server's `Retry-After` hint replaces the
//! computed delay.

use std::time::Duration;

use serde_json::Value;
use tracing::{debug, warn};

use memu_types::config::DEFAULT_MAX_RETRIES;
use memu_types::error::{MemuError, TransportError};

use crate::classify::{error_for_status, parse_body, parse_retry_after, success_body, StatusClass};
use crate::transport::{ApiRequest, HttpTransport};

/// Upper bound on any single backoff sleep.
pub const MAX_BACKOFF: Duration = Duration::from_secs(60);

/// Attempt bound and delay schedule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first one. Always >= 1.
    pub max_attempts: u32,
    pub max_backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_RETRIES)
    }
}

impl RetryPolicy {
    pub fn new(max_attempts: u32) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            max_backoff: MAX_BACKOFF,
        }
    }

    /// Exponential delay for a zero-based attempt.
    pub fn backoff(&self, attempt: u32) -> Duration {
        let secs = 2u64.checked_pow(attempt).unwrap_or(u64::MAX);
        Duration::from_secs(secs).min(self.max_backoff)
    }

    /// Delay after a 429: the server hint when present, else the exponential delay.
    pub fn rate_limit_delay(&self, attempt: u32, hint: Option<Duration>) -> Duration {
        hint.map_or_else(|| self.backoff(attempt), |d| d.min(self.max_backoff))
    }

    /// Whether another attempt follows the given zero-based attempt.
    pub fn has_remaining(&self, attempt: u32) -> bool {
        attempt + 1 < self.max_attempts
    }
}

/// Executes requests through an [`HttpTransport`] under a [`RetryPolicy`].
pub struct RequestExecutor<T: HttpTransport> {
    transport: T,
    policy: RetryPolicy,
}

impl<T: HttpTransport> RequestExecutor<T> {
    pub fn new(transport: T, policy: RetryPolicy) -> Self {
        Self { transport, policy }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Run `request` until it succeeds, fails terminally, or attempts run out.
    ///
    /// Returns the parsed JSON body of the first 2xx response.
    pub async fn execute(&self, request: &ApiRequest) -> Result<Value, MemuError> {
        let mut last_error: Option<TransportError> = None;

        for attempt in 0..self.policy.max_attempts {
            debug!(
                method = %request.method,
                path = %request.path,
                attempt,
                "Sending request"
            );

            let response = match self.transport.send(request).await {
                Ok(response) => response,
                Err(err) => {
                    if self.policy.has_remaining(attempt) {
                        let delay = self.policy.backoff(attempt);
                        warn!(
                            path = %request.path,
                            attempt,
                            error = %err,
                            delay_secs = delay.as_secs_f64(),
                            "Request failed, retrying"
                        );
                        last_error = Some(err);
                        tokio::time::sleep(delay).await;
                        continue;
                    }
                    last_error = Some(err);
                    break;
                }
            };

            let status = response.status;
            match StatusClass::of(status) {
                StatusClass::Success => return Ok(success_body(&response.body)),
                StatusClass::RateLimited => {
                    let hint = parse_retry_after(response.retry_after.as_deref());
                    if self.policy.has_remaining(attempt) {
                        let delay = self.policy.rate_limit_delay(attempt, hint);
                        warn!(
                            path = %request.path,
                            attempt,
                            delay_secs = delay.as_secs_f64(),
                            "Rate limited, retrying"
                        );
                        tokio::time::sleep(delay).await;
                        continue;
                    }
                    return Err(error_for_status(
                        status,
                        &request.path,
                        parse_body(&response.body),
                        hint,
                    ));
                }
                StatusClass::ServerError => {
                    if self.policy.has_remaining(attempt) {
                        let delay = self.policy.backoff(attempt);
                        warn!(
                            path = %request.path,
                            attempt,
                            status,
                            delay_secs = delay.as_secs_f64(),
                            "Server error, retrying"
                        );
                        tokio::time::sleep(delay).await;
                        continue;
                    }
                    return Err(error_for_status(
                        status,
                        &request.path,
                        parse_body(&response.body),
                        None,
                    ));
                }
                StatusClass::ClientError => {
                    return Err(error_for_status(
                        status,
                        &request.path,
                        parse_body(&response.body),
                        None,
                    ));
                }
            }
        }

        Err(MemuError::RequestFailed {
            attempts: self.policy.max_attempts,
            source: last_error
                .unwrap_or_else(|| TransportError::Other("no attempt was made".to_string())),
        })
    }
}
