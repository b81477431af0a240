//! ReqwestTransport -- concrete [`HttpTransport`] over a pooled reqwest client.
//!
//! The underlying [`reqwest::Client`] is created lazily on first use (or by an
//! explicit [`ReqwestTransport::open`]) and dropped by [`ReqwestTransport::close`].
//! reqwest pools connections internally, so one transport can serve any number
//! of concurrent requests without extra locking.

use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use reqwest::Method;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderValue, RETRY_AFTER, USER_AGENT};

use memu_core::transport::{ApiRequest, ApiResponse, HttpMethod, HttpTransport};
use memu_types::config::ClientConfig;
use memu_types::error::{MemuError, TransportError};

/// HTTP transport for the MemU API.
///
/// The API key only lives inside the prepared default headers, where it is
/// marked sensitive so reqwest never prints it.
pub struct ReqwestTransport {
    base_url: String,
    timeout: Duration,
    headers: HeaderMap,
    client: Mutex<Option<reqwest::Client>>,
}

impl ReqwestTransport {
    /// Prepare a transport for `config`. No connection is made yet.
    pub fn new(config: &ClientConfig) -> Result<Self, MemuError> {
        let mut auth = HeaderValue::from_str(&format!("Bearer {}", config.api_key().expose()))
            .map_err(|_| {
                MemuError::InvalidArgument("API key contains characters not allowed in a header".to_string())
            })?;
        auth.set_sensitive(true);

        let agent = HeaderValue::from_str(config.user_agent())
            .map_err(|_| MemuError::InvalidArgument("invalid User-Agent".to_string()))?;

        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, auth);
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(USER_AGENT, agent);

        Ok(Self {
            base_url: config.base_url().to_string(),
            timeout: config.timeout(),
            headers,
            client: Mutex::new(None),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Build the pooled client if it does not exist yet. Idempotent.
    pub fn open(&self) -> Result<(), TransportError> {
        self.client().map(|_| ())
    }

    /// Drop the pooled client and its idle connections. Idempotent.
    ///
    /// A later request transparently opens a fresh client.
    pub fn close(&self) {
        let closed = self.slot().take();
        if closed.is_some() {
            tracing::debug!(base_url = %self.base_url, "Closed MemU transport");
        }
    }

    pub fn is_open(&self) -> bool {
        self.slot().is_some()
    }

    /// The live client, opening one if needed.
    fn client(&self) -> Result<reqwest::Client, TransportError> {
        let mut slot = self.slot();
        if let Some(client) = slot.as_ref() {
            return Ok(client.clone());
        }

        let client = reqwest::Client::builder()
            .timeout(self.timeout)
            .default_headers(self.headers.clone())
            .build()
            .map_err(|e| TransportError::Other(format!("failed to build HTTP client: {e}")))?;
        tracing::debug!(
            base_url = %self.base_url,
            timeout_secs = self.timeout.as_secs_f64(),
            "Opened MemU transport"
        );
        *slot = Some(client.clone());
        Ok(client)
    }

    // The slot holds no invariant a panicking holder could break.
    fn slot(&self) -> MutexGuard<'_, Option<reqwest::Client>> {
        self.client.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

// ReqwestTransport does not derive Debug; the header map holds the API key.

impl HttpTransport for ReqwestTransport {
    async fn send(&self, request: &ApiRequest) -> Result<ApiResponse, TransportError> {
        let client = self.client()?;

        let method = match request.method {
            HttpMethod::Get => Method::GET,
            HttpMethod::Post => Method::POST,
        };
        let mut builder = client.request(method, self.url(&request.path));
        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let response = builder.send().await.map_err(classify_reqwest_error)?;

        let status = response.status().as_u16();
        let retry_after = response
            .headers()
            .get(RETRY_AFTER)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string);
        let body = response.bytes().await.map_err(classify_reqwest_error)?;

        Ok(ApiResponse {
            status,
            retry_after,
            body: body.to_vec(),
        })
    }
}

fn classify_reqwest_error(err: reqwest::Error) -> TransportError {
    if err.is_timeout() {
        TransportError::Timeout(err.to_string())
    } else if err.is_connect() {
        TransportError::Connect(err.to_string())
    } else {
        TransportError::Other(err.to_string())
    }
}
