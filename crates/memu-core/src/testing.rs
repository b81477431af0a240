//! Scripted transport used by the unit tests in this crate.

use std::collections::VecDeque;
use std::future::Future;
use std::sync::Mutex;

use serde_json::Value;

use memu_types::error::TransportError;

use crate::transport::{ApiRequest, ApiResponse, HttpTransport};

/// Replays a fixed sequence of outcomes and records every request it sees.
pub(crate) struct ScriptedTransport {
    script: Mutex<VecDeque<Result<ApiResponse, TransportError>>>,
    requests: Mutex<Vec<ApiRequest>>,
}

impl ScriptedTransport {
    pub(crate) fn new(script: Vec<Result<ApiResponse, TransportError>>) -> Self {
        Self {
            script: Mutex::new(script.into()),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Shorthand for a script of JSON responses.
    pub(crate) fn json(responses: Vec<(u16, Value)>) -> Self {
        Self::new(
            responses
                .into_iter()
                .map(|(status, body)| Ok(ApiResponse::json(status, &body)))
                .collect(),
        )
    }

    pub(crate) fn calls(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub(crate) fn requests(&self) -> Vec<ApiRequest> {
        self.requests.lock().unwrap().clone()
    }
}

impl HttpTransport for ScriptedTransport {
    fn send(
        &self,
        request: &ApiRequest,
    ) -> impl Future<Output = Result<ApiResponse, TransportError>> + Send {
        self.requests.lock().unwrap().push(request.clone());
        let next = self
            .script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(TransportError::Other("script exhausted".to_string())));
        async move { next }
    }
}
