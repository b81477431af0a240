use std::time::Duration;

use serde_json::Value;
use thiserror::Error;

/// Low-level failure of a single HTTP exchange (no response was received).
#[derive(Debug, Clone, Error)]
pub enum TransportError {
    #[error("request timed out: {0}")]
    Timeout(String),

    #[error("connection failed: {0}")]
    Connect(String),

    #[error("transport error: {0}")]
    Other(String),
}

/// Errors returned by every MemU client operation.
///
/// Each kind is its own variant so callers can branch on it without string
/// matching. HTTP-derived variants carry the status code and the best-effort
/// parsed response body.
#[derive(Debug, Error)]
pub enum MemuError {
    /// Rejected locally, before any request was sent.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("{message}")]
    Authentication {
        message: String,
        status: u16,
        body: Option<Value>,
    },

    #[error("not found: {path}")]
    NotFound {
        path: String,
        status: u16,
        body: Option<Value>,
    },

    #[error("{message}")]
    Validation {
        message: String,
        status: u16,
        body: Option<Value>,
    },

    #[error("rate limited{}", retry_hint(.retry_after))]
    RateLimited {
        retry_after: Option<Duration>,
        status: u16,
        body: Option<Value>,
    },

    #[error("API error: {message}")]
    Api {
        message: String,
        status: u16,
        body: Option<Value>,
    },

    /// A memorize-and-wait session exceeded its wait bound.
    #[error("memorization task {task_id} timed out after {}s", .timeout.as_secs_f64())]
    Timeout { task_id: String, timeout: Duration },

    /// Transient transport failures persisted through every attempt.
    #[error("request failed after {attempts} attempts")]
    RequestFailed {
        attempts: u32,
        #[source]
        source: TransportError,
    },

    #[error("memorization task {task_id} failed: {message}")]
    TaskFailed { task_id: String, message: String },

    /// The HTTP client could not be set up; no request was attempted.
    #[error("failed to set up HTTP client")]
    ClientSetup(#[source] TransportError),

    /// A successful response whose payload does not fit the expected shape.
    #[error("failed to decode response: {0}")]
    Decode(String),

    #[error("blocking client called from within an async runtime; use MemuClient instead")]
    BlockingInAsyncContext,

    #[error("failed to start runtime: {0}")]
    Runtime(#[from] std::io::Error),
}

fn retry_hint(retry_after: &Option<Duration>) -> String {
    match retry_after {
        Some(wait) => format!(" (retry after {}s)", wait.as_secs_f64()),
        None => String::new(),
    }
}

impl MemuError {
    /// HTTP status code associated with this error, if any.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            MemuError::Authentication { status, .. }
            | MemuError::NotFound { status, .. }
            | MemuError::Validation { status, .. }
            | MemuError::RateLimited { status, .. }
            | MemuError::Api { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Parsed response body associated with this error, if any.
    pub fn response_body(&self) -> Option<&Value> {
        match self {
            MemuError::Authentication { body, .. }
            | MemuError::NotFound { body, .. }
            | MemuError::Validation { body, .. }
            | MemuError::RateLimited { body, .. }
            | MemuError::Api { body, .. } => body.as_ref(),
            _ => None,
        }
    }
}
