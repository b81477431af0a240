//! Aggregate results returned by a single client operation.

use serde::{Deserialize, Serialize};

use crate::memory::{MemoryCategory, MemoryItem, MemoryResource};

/// Outcome of a memorize call.
///
/// Without waiting, only `task_id` is usually set; after a successful wait,
/// the extracted resource, items and categories are filled in.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MemorizeResult {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub task_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource: Option<MemoryResource>,
    #[serde(default)]
    pub items: Vec<MemoryItem>,
    #[serde(default)]
    pub categories: Vec<MemoryCategory>,
}

impl MemorizeResult {
    /// A result that only identifies the task.
    pub fn for_task(task_id: impl Into<String>) -> Self {
        Self {
            task_id: Some(task_id.into()),
            ..Default::default()
        }
    }
}

/// Outcome of a retrieve call.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RetrieveResult {
    #[serde(default)]
    pub categories: Vec<MemoryCategory>,
    #[serde(default)]
    pub items: Vec<MemoryItem>,
    #[serde(default)]
    pub resources: Vec<MemoryResource>,
    /// Server-rewritten query the caller may use for a follow-up retrieve.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_step_query: Option<String>,
}

impl RetrieveResult {
    pub fn is_empty(&self) -> bool {
        self.categories.is_empty() && self.items.is_empty() && self.resources.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_for_task_sets_only_id() {
        let result = MemorizeResult::for_task("task_1");
        assert_eq!(result.task_id.as_deref(), Some("task_1"));
        assert!(result.resource.is_none());
        assert!(result.items.is_empty());
        assert!(result.categories.is_empty());
    }

    #[test]
    fn test_retrieve_result_is_empty() {
        let mut result = RetrieveResult::default();
        assert!(result.is_empty());
        result.items.push(MemoryItem::default());
        assert!(!result.is_empty());
    }
}
