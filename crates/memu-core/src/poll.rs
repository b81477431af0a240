//! Task polling state machine for memorize-and-wait.
//!
//! ```text
//! SUBMITTED -> {PENDING, PROCESSING} -> {COMPLETED, SUCCESS} | FAILED
//!                        \-> TIMED_OUT (client-side only)
//! ```
//!
//! [`decide`] is the pure transition function over a single status snapshot;
//! [`poll_until_done`] drives it with a fetch closure and a wall-clock bound.

use std::future::Future;
use std::time::Duration;

use serde_json::Value;
use tokio::time::Instant;
use tracing::debug;

use memu_types::config::{DEFAULT_POLL_INTERVAL, DEFAULT_WAIT_TIMEOUT};
use memu_types::error::MemuError;
use memu_types::result::MemorizeResult;
use memu_types::task::{Task, TaskStatus};

use crate::mapper;

/// Interval and overall bound for one polling session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollConfig {
    pub interval: Duration,
    pub timeout: Duration,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            interval: DEFAULT_POLL_INTERVAL,
            timeout: DEFAULT_WAIT_TIMEOUT,
        }
    }
}

impl PollConfig {
    pub fn new(interval: Duration, timeout: Duration) -> Self {
        Self { interval, timeout }
    }
}

/// What to do after observing one task snapshot.
#[derive(Debug, Clone, PartialEq)]
pub enum PollDecision {
    /// Terminal success.
    Complete(MemorizeResult),
    /// Still running; sleep one interval and poll again.
    Wait,
}

/// Transition for one snapshot.
///
/// Terminal failure (FAILED) and the client-side timeout are returned as
/// errors; the timeout is only checked while the task is still running.
pub fn decide(
    task: &Task,
    task_id: &str,
    elapsed: Duration,
    timeout: Duration,
) -> Result<PollDecision, MemuError> {
    match task.status {
        status if status.is_success() => {
            let result = match mapper::non_empty_result(task) {
                Some(payload) => {
                    mapper::memorize_result(&Value::Object(payload.clone()), Some(task_id))?
                }
                None => MemorizeResult::for_task(task_id),
            };
            Ok(PollDecision::Complete(result))
        }
        TaskStatus::Failed => Err(MemuError::TaskFailed {
            task_id: task_id.to_string(),
            message: task
                .message
                .clone()
                .unwrap_or_else(|| "no reason given".to_string()),
        }),
        _ if elapsed > timeout => Err(MemuError::Timeout {
            task_id: task_id.to_string(),
            timeout,
        }),
        _ => Ok(PollDecision::Wait),
    }
}

/// Poll `fetch` until the task reaches a terminal state or `config.timeout`
/// elapses.
///
/// Each call to `fetch` is expected to be a full (retried) status request.
/// There is no cap on the number of polls other than the timeout.
pub async fn poll_until_done<F, Fut>(
    task_id: &str,
    config: PollConfig,
    mut fetch: F,
) -> Result<MemorizeResult, MemuError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<Task, MemuError>>,
{
    let start = Instant::now();
    let mut polls: u32 = 0;

    loop {
        let task = fetch().await?;
        polls += 1;
        debug!(
            task_id,
            polls,
            status = %task.status,
            progress = ?task.progress,
            "Polled memorize task"
        );

        match decide(&task, task_id, start.elapsed(), config.timeout)? {
            PollDecision::Complete(result) => return Ok(result),
            PollDecision::Wait => tokio::time::sleep(config.interval).await,
        }
    }
}
