//! MemoryService: the four MemU operations over any [`HttpTransport`].
//!
//! Every operation validates its input locally, sends one logical request
//! through the [`RequestExecutor`], and maps the JSON payload into domain
//! records. Invalid input never reaches the network.

use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info};

use memu_types::error::MemuError;
use memu_types::memory::MemoryCategory;
use memu_types::request::{ListCategoriesRequest, MemorizeRequest, RetrieveRequest};
use memu_types::result::{MemorizeResult, RetrieveResult};
use memu_types::task::Task;

use crate::mapper;
use crate::poll::{self, PollConfig};
use crate::retry::{RequestExecutor, RetryPolicy};
use crate::transport::{ApiRequest, HttpTransport};

pub const MEMORIZE_PATH: &str = "/api/v3/memory/memorize";
pub const TASK_STATUS_PATH: &str = "/api/v3/memory/memorize/status";
pub const RETRIEVE_PATH: &str = "/api/v3/memory/retrieve";
pub const CATEGORIES_PATH: &str = "/api/v3/memory/categories";

/// High-level MemU operations.
pub struct MemoryService<T: HttpTransport> {
    executor: RequestExecutor<T>,
}

impl<T: HttpTransport> MemoryService<T> {
    pub fn new(transport: T, policy: RetryPolicy) -> Self {
        Self {
            executor: RequestExecutor::new(transport, policy),
        }
    }

    pub fn transport(&self) -> &T {
        self.executor.transport()
    }

    pub fn policy(&self) -> &RetryPolicy {
        self.executor.policy()
    }

    /// Submit a conversation for asynchronous memory extraction.
    ///
    /// Returns as soon as the server accepts the task; the result usually
    /// carries only the task id.
    #[tracing::instrument(
        name = "memu.memorize",
        skip(self, request),
        fields(user_id = %request.user_id, agent_id = %request.agent_id)
    )]
    pub async fn memorize(&self, request: &MemorizeRequest) -> Result<MemorizeResult, MemuError> {
        request.validate()?;
        let payload = self.post(MEMORIZE_PATH, request).await?;
        let result = mapper::memorize_result(&payload, None)?;
        info!(task_id = ?result.task_id, "Memorize task submitted");
        Ok(result)
    }

    /// Submit a conversation and poll the task until it finishes.
    ///
    /// If the server does not hand back a task id, the immediate response is
    /// returned without polling.
    #[tracing::instrument(
        name = "memu.memorize_and_wait",
        skip(self, request, config),
        fields(
            user_id = %request.user_id,
            interval_secs = config.interval.as_secs_f64(),
            timeout_secs = config.timeout.as_secs_f64()
        )
    )]
    pub async fn memorize_and_wait(
        &self,
        request: &MemorizeRequest,
        config: PollConfig,
    ) -> Result<MemorizeResult, MemuError> {
        request.validate()?;
        let payload = self.post(MEMORIZE_PATH, request).await?;

        let Some(task_id) = mapper::task_id(&payload) else {
            debug!("Memorize response carried no task id, skipping poll");
            return mapper::memorize_result(&payload, None);
        };

        info!(task_id = %task_id, "Waiting for memorize task");
        let id = task_id.as_str();
        poll::poll_until_done(id, config, move || self.get_task_status(id)).await
    }

    /// Fetch one snapshot of a memorize task.
    #[tracing::instrument(name = "memu.task_status", skip(self))]
    pub async fn get_task_status(&self, task_id: &str) -> Result<Task, MemuError> {
        let task_id = task_id.trim();
        if task_id.is_empty() {
            return Err(MemuError::InvalidArgument("task_id is required".to_string()));
        }
        let request = ApiRequest::get(format!("{TASK_STATUS_PATH}/{task_id}"));
        let payload = self.executor.execute(&request).await?;
        mapper::task(payload)
    }

    /// Retrieve memories relevant to a text query or conversation context.
    #[tracing::instrument(
        name = "memu.retrieve",
        skip(self, request),
        fields(user_id = %request.user_id, agent_id = %request.agent_id)
    )]
    pub async fn retrieve(&self, request: &RetrieveRequest) -> Result<RetrieveResult, MemuError> {
        request.validate()?;
        let payload = self.post(RETRIEVE_PATH, request).await?;
        let result = mapper::retrieve_result(&payload)?;
        debug!(
            items = result.items.len(),
            categories = result.categories.len(),
            resources = result.resources.len(),
            "Retrieved memories"
        );
        Ok(result)
    }

    /// List the memory categories of a user, optionally scoped to one agent.
    #[tracing::instrument(
        name = "memu.list_categories",
        skip(self, request),
        fields(user_id = %request.user_id)
    )]
    pub async fn list_categories(
        &self,
        request: &ListCategoriesRequest,
    ) -> Result<Vec<MemoryCategory>, MemuError> {
        request.validate()?;
        let payload = self.post(CATEGORIES_PATH, request).await?;
        mapper::category_list(&payload)
    }

    async fn post<B: Serialize>(&self, path: &str, body: &B) -> Result<Value, MemuError> {
        let body = serde_json::to_value(body)
            .map_err(|e| MemuError::InvalidArgument(format!("request body is not serializable: {e}")))?;
        self.executor.execute(&ApiRequest::post(path, body)).await
    }
}
