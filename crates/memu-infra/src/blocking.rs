//! BlockingMemuClient -- synchronous facade over [`MemuClient`].
//!
//! Each call builds a private current-thread runtime and a private
//! [`MemuClient`], drives one operation to completion, and tears both down.
//! Pooled connections belong to the runtime that opened them, so no pool is
//! ever shared between calls, even when several threads call at once.
//!
//! Calling any method from inside a running tokio runtime is a programmer
//! error and returns [`MemuError::BlockingInAsyncContext`] instead of
//! deadlocking.

use std::future::Future;

use memu_core::poll::PollConfig;
use memu_types::config::ClientConfig;
use memu_types::error::MemuError;
use memu_types::memory::MemoryCategory;
use memu_types::request::{ListCategoriesRequest, MemorizeRequest, RetrieveRequest};
use memu_types::result::{MemorizeResult, RetrieveResult};
use memu_types::task::Task;

use crate::client::MemuClient;

pub struct BlockingMemuClient {
    config: ClientConfig,
}

impl BlockingMemuClient {
    /// Fails early on settings the HTTP layer cannot use (e.g. a key that is
    /// not a valid header value).
    pub fn new(config: ClientConfig) -> Result<Self, MemuError> {
        MemuClient::new(config.clone())?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn memorize(&self, request: &MemorizeRequest) -> Result<MemorizeResult, MemuError> {
        let client = self.call_client()?;
        block_on(client.memorize(request))
    }

    pub fn memorize_and_wait(
        &self,
        request: &MemorizeRequest,
        poll: PollConfig,
    ) -> Result<MemorizeResult, MemuError> {
        let client = self.call_client()?;
        block_on(client.memorize_and_wait(request, poll))
    }

    pub fn get_task_status(&self, task_id: &str) -> Result<Task, MemuError> {
        let client = self.call_client()?;
        block_on(client.get_task_status(task_id))
    }

    pub fn retrieve(&self, request: &RetrieveRequest) -> Result<RetrieveResult, MemuError> {
        let client = self.call_client()?;
        block_on(client.retrieve(request))
    }

    pub fn list_categories(
        &self,
        request: &ListCategoriesRequest,
    ) -> Result<Vec<MemoryCategory>, MemuError> {
        let client = self.call_client()?;
        block_on(client.list_categories(request))
    }

    /// Check that an HTTP client can be built for this configuration.
    /// Nothing stays open; every call still builds its own.
    pub fn open(&self) -> Result<(), MemuError> {
        self.call_client()?.open()
    }

    /// Nothing is pooled between calls, so there is nothing to release.
    pub fn close(&self) {}

    fn call_client(&self) -> Result<MemuClient, MemuError> {
        MemuClient::new(self.config.clone())
    }
}

fn block_on<R>(operation: impl Future<Output = Result<R, MemuError>>) -> Result<R, MemuError> {
    if tokio::runtime::Handle::try_current().is_ok() {
        return Err(MemuError::BlockingInAsyncContext);
    }

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;
    runtime.block_on(operation)
}
