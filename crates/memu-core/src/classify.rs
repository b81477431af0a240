//! HTTP status classification and error construction.
//!
//! [`StatusClass`] tells the retry engine what to do with a response;
//! [`error_for_status`] turns a final non-success response into the matching
//! [`MemuError`] variant.

use std::time::Duration;

use serde_json::{Map, Value};

use memu_types::error::MemuError;

const AUTHENTICATION_MESSAGE: &str = "Authentication failed. Please check your API key.";
const VALIDATION_MESSAGE: &str = "Request validation failed. Please check your request parameters.";

/// How the retry engine should treat a response status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusClass {
    Success,
    /// 429: retryable, honours `Retry-After`.
    RateLimited,
    /// >= 500: retryable with exponential backoff.
    ServerError,
    /// 400-499 except 429: terminal.
    ClientError,
}

impl StatusClass {
    pub fn of(status: u16) -> Self {
        match status {
            429 => StatusClass::RateLimited,
            500.. => StatusClass::ServerError,
            400..=499 => StatusClass::ClientError,
            _ => StatusClass::Success,
        }
    }
}

/// Best-effort JSON parse of a response body. Empty or invalid bodies yield `None`.
pub fn parse_body(body: &[u8]) -> Option<Value> {
    if body.is_empty() {
        return None;
    }
    serde_json::from_slice(body).ok()
}

/// Parse a successful response body.
///
/// The service occasionally answers with an empty body; anything that is not
/// valid JSON (or is `null`) becomes an empty object.
pub fn success_body(body: &[u8]) -> Value {
    match parse_body(body) {
        Some(Value::Null) | None => Value::Object(Map::new()),
        Some(value) => value,
    }
}

/// Parse a `Retry-After` header given in (possibly fractional) seconds.
pub fn parse_retry_after(raw: Option<&str>) -> Option<Duration> {
    let secs: f64 = raw?.trim().parse().ok()?;
    if !secs.is_finite() || secs < 0.0 {
        return None;
    }
    Some(Duration::from_secs_f64(secs))
}

/// Human-readable message the server put in an error body, if any.
fn server_message(body: Option<&Value>) -> Option<String> {
    let obj = body?.as_object()?;
    ["message", "detail", "error"]
        .iter()
        .find_map(|key| obj.get(*key)?.as_str())
        .filter(|msg| !msg.trim().is_empty())
        .map(str::to_string)
}

/// Build the error for a final non-success response.
///
/// The mapping is total over statuses >= 400:
/// 401 -> Authentication, 404 -> NotFound, 422 -> Validation,
/// 429 -> RateLimited, anything else -> Api.
pub fn error_for_status(
    status: u16,
    path: &str,
    body: Option<Value>,
    retry_after: Option<Duration>,
) -> MemuError {
    match status {
        401 => MemuError::Authentication {
            message: server_message(body.as_ref())
                .unwrap_or_else(|| AUTHENTICATION_MESSAGE.to_string()),
            status,
            body,
        },
        404 => MemuError::NotFound {
            path: path.to_string(),
            status,
            body,
        },
        422 => MemuError::Validation {
            message: server_message(body.as_ref())
                .unwrap_or_else(|| VALIDATION_MESSAGE.to_string()),
            status,
            body,
        },
        429 => MemuError::RateLimited {
            retry_after,
            status,
            body,
        },
        _ => MemuError::Api {
            message: format!("{status}: {path}"),
            status,
            body,
        },
    }
}
