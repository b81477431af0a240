//! MemuClient -- the async, caller-facing MemU client.

use memu_core::poll::PollConfig;
use memu_core::retry::RetryPolicy;
use memu_core::service::MemoryService;
use memu_types::config::ClientConfig;
use memu_types::error::MemuError;
use memu_types::memory::MemoryCategory;
use memu_types::request::{ListCategoriesRequest, MemorizeRequest, RetrieveRequest};
use memu_types::result::{MemorizeResult, RetrieveResult};
use memu_types::task::Task;

use crate::config::{ConfigOverrides, load_client_config};
use crate::http::ReqwestTransport;

/// Async MemU client.
///
/// Cheap to share behind an `Arc`: every operation takes `&self` and the
/// underlying connection pool is safe for concurrent use.
///
/// ```no_run
/// # async fn demo() -> Result<(), memu_types::error::MemuError> {
/// use memu_infra::MemuClient;
/// use memu_types::config::ClientConfig;
/// use memu_types::request::RetrieveRequest;
///
/// let client = MemuClient::new(ClientConfig::new("mu_...")?)?;
/// let found = client
///     .retrieve(&RetrieveRequest::new("favourite food", "user_1", "agent_1"))
///     .await?;
/// println!("{} items", found.items.len());
/// client.close();
/// # Ok(())
/// # }
/// ```
pub struct MemuClient {
    config: ClientConfig,
    service: MemoryService<ReqwestTransport>,
}

impl MemuClient {
    pub fn new(config: ClientConfig) -> Result<Self, MemuError> {
        let transport = ReqwestTransport::new(&config)?;
        let policy = RetryPolicy::new(config.max_retries());
        Ok(Self {
            service: MemoryService::new(transport, policy),
            config,
        })
    }

    /// Build a client from the config file and `MEMU_*` environment variables.
    pub async fn from_env() -> Result<Self, MemuError> {
        let config = load_client_config(&ConfigOverrides::default()).await?;
        Self::new(config)
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Open the connection pool ahead of the first request.
    pub fn open(&self) -> Result<(), MemuError> {
        self.service
            .transport()
            .open()
            .map_err(MemuError::ClientSetup)
    }

    /// Release the connection pool. The client stays usable; the next
    /// request opens a new pool.
    pub fn close(&self) {
        self.service.transport().close();
    }

    pub fn is_open(&self) -> bool {
        self.service.transport().is_open()
    }

    pub async fn memorize(&self, request: &MemorizeRequest) -> Result<MemorizeResult, MemuError> {
        self.service.memorize(request).await
    }

    /// Submit and poll until the task completes, fails, or `poll.timeout` elapses.
    pub async fn memorize_and_wait(
        &self,
        request: &MemorizeRequest,
        poll: PollConfig,
    ) -> Result<MemorizeResult, MemuError> {
        self.service.memorize_and_wait(request, poll).await
    }

    pub async fn get_task_status(&self, task_id: &str) -> Result<Task, MemuError> {
        self.service.get_task_status(task_id).await
    }

    pub async fn retrieve(&self, request: &RetrieveRequest) -> Result<RetrieveResult, MemuError> {
        self.service.retrieve(request).await
    }

    pub async fn list_categories(
        &self,
        request: &ListCategoriesRequest,
    ) -> Result<Vec<MemoryCategory>, MemuError> {
        self.service.list_categories(request).await
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::{Duration, Instant};

    use serde_json::json;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use memu_types::task::TaskStatus;

    use super::*;

    fn client_for(server: &MockServer, max_retries: u32) -> MemuClient {
        let config = ClientConfig::new("test-key")
            .unwrap()
            .with_base_url(format!("{}/", server.uri()))
            .with_max_retries(max_retries)
            .unwrap();
        MemuClient::new(config).unwrap()
    }

    #[tokio::test]
    async fn test_retry_after_is_honoured_end_to_end() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/v3/memory/retrieve"))
            .respond_with(ResponseTemplate::new(429).insert_header("retry-after", "0.2"))
            .up_to_n_times(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/api/v3/memory/retrieve"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"items": [{"summary": "Plays chess"}]})),
            )
            .mount(&server)
            .await;

        let client = client_for(&server, 3);
        let start = Instant::now();
        let result = client
            .retrieve(&RetrieveRequest::new("hobbies", "u1", "a1"))
            .await
            .unwrap();

        assert!(start.elapsed() >= Duration::from_millis(200));
        assert_eq!(result.items[0].summary.as_deref(), Some("Plays chess"));
        assert_eq!(server.received_requests().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_authentication_error_is_not_retried() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(401).set_body_json(json!({"detail": "bad key"})))
            .mount(&server)
            .await;

        let client = client_for(&server, 3);
        let err = client
            .list_categories(&ListCategoriesRequest::new("u1"))
            .await
            .unwrap_err();

        assert!(matches!(err, MemuError::Authentication { status: 401, .. }));
        assert_eq!(err.status_code(), Some(401));
        assert_eq!(server.received_requests().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_single_attempt_rate_limit_surfaces_hint() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(429).insert_header("retry-after", "30"))
            .mount(&server)
            .await;

        let client = client_for(&server, 1);
        let err = client.get_task_status("t1").await.unwrap_err();
        match err {
            MemuError::RateLimited { retry_after, .. } => {
                assert_eq!(retry_after, Some(Duration::from_secs(30)));
            }
            other => panic!("expected RateLimited, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_memorize_and_wait_full_pipeline() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/v3/memory/memorize"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"task_id": "task_42"})))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/api/v3/memory/memorize/status/task_42"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"task_id": "task_42", "status": "PROCESSING"})),
            )
            .up_to_n_times(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/api/v3/memory/memorize/status/task_42"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "task_id": "task_42",
                "status": "SUCCESS",
                "result": {"categories": [{"name": "travel", "item_count": 2}]}
            })))
            .mount(&server)
            .await;

        let client = client_for(&server, 3);
        let request = MemorizeRequest::new("u1", "a1").with_conversation_text("Going to Kyoto in May.");
        let poll = PollConfig::new(Duration::from_millis(20), Duration::from_secs(5));
        let result = client.memorize_and_wait(&request, poll).await.unwrap();

        assert_eq!(result.task_id.as_deref(), Some("task_42"));
        assert_eq!(result.categories[0].item_count, Some(2));
    }

    #[tokio::test]
    async fn test_concurrent_calls_share_one_client() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({"task_id": "t", "status": "PENDING"})),
            )
            .expect(8)
            .mount(&server)
            .await;

        let client = Arc::new(client_for(&server, 3));
        let mut handles = Vec::new();
        for _ in 0..8 {
            let client = Arc::clone(&client);
            handles.push(tokio::spawn(async move { client.get_task_status("t").await }));
        }
        for handle in handles {
            let task = handle.await.unwrap().unwrap();
            assert_eq!(task.status, TaskStatus::Pending);
        }
        assert!(client.is_open());
    }

    #[tokio::test]
    async fn test_close_then_reuse_reopens() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
            .mount(&server)
            .await;

        let client = client_for(&server, 3);
        client.open().unwrap();
        client.close();
        assert!(!client.is_open());

        let categories = client
            .list_categories(&ListCategoriesRequest::new("u1"))
            .await
            .unwrap();
        assert!(categories.is_empty());
        assert!(client.is_open());
    }
}
