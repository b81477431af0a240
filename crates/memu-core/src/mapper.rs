//! Response model mapping.
//!
//! Turns loosely-typed JSON payloads into domain records. Every list element
//! goes through [`normalize_record`], whether it was produced from a typed
//! record or arrived as a bare map; unknown keys end up in the record's
//! `extra` map instead of being dropped.

use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use memu_types::error::MemuError;
use memu_types::memory::{MemoryCategory, MemoryItem, MemoryResource};
use memu_types::result::{MemorizeResult, RetrieveResult};
use memu_types::task::Task;

/// Parse one record from a JSON object.
pub fn normalize_record<T: DeserializeOwned>(field: &str, value: Value) -> Result<T, MemuError> {
    if !value.is_object() {
        return Err(MemuError::Decode(format!(
            "expected an object in '{field}', got {}",
            json_kind(&value)
        )));
    }
    serde_json::from_value(value).map_err(|e| MemuError::Decode(format!("invalid '{field}' entry: {e}")))
}

/// Parse a list-shaped field. A missing or null field is an empty list.
pub fn record_list<T: DeserializeOwned>(field: &str, value: Option<&Value>) -> Result<Vec<T>, MemuError> {
    match value {
        None | Some(Value::Null) => Ok(Vec::new()),
        Some(Value::Array(elements)) => elements
            .iter()
            .cloned()
            .map(|element| normalize_record(field, element))
            .collect(),
        Some(other) => Err(MemuError::Decode(format!(
            "expected a list in '{field}', got {}",
            json_kind(other)
        ))),
    }
}

fn optional_record<T: DeserializeOwned>(field: &str, value: Option<&Value>) -> Result<Option<T>, MemuError> {
    match value {
        None | Some(Value::Null) => Ok(None),
        Some(v) => normalize_record(field, v.clone()).map(Some),
    }
}

fn optional_string(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Task id from a memorize submit response, if the server returned one.
pub fn task_id(payload: &Value) -> Option<String> {
    optional_string(payload.get("task_id"))
}

/// Map a memorize submit response, or a completed task's `result` payload.
///
/// `task_id` overrides whatever id the payload carries.
pub fn memorize_result(payload: &Value, task_id: Option<&str>) -> Result<MemorizeResult, MemuError> {
    Ok(MemorizeResult {
        task_id: task_id
            .map(str::to_string)
            .or_else(|| self::task_id(payload)),
        resource: optional_record::<MemoryResource>("resource", payload.get("resource"))?,
        items: record_list::<MemoryItem>("items", payload.get("items"))?,
        categories: record_list::<MemoryCategory>("categories", payload.get("categories"))?,
    })
}

/// Map a retrieve response. `next_step_query` is passed through untouched.
pub fn retrieve_result(payload: &Value) -> Result<RetrieveResult, MemuError> {
    Ok(RetrieveResult {
        categories: record_list("categories", payload.get("categories"))?,
        items: record_list("items", payload.get("items"))?,
        resources: record_list("resources", payload.get("resources"))?,
        next_step_query: payload
            .get("next_step_query")
            .and_then(Value::as_str)
            .map(str::to_string),
    })
}

/// Map a categories response: a bare list or `{"categories": [...]}`.
///
/// Any other shape yields an empty list.
pub fn category_list(payload: &Value) -> Result<Vec<MemoryCategory>, MemuError> {
    let list = match payload {
        Value::Array(_) => payload,
        Value::Object(obj) => match obj.get("categories") {
            Some(inner @ Value::Array(_)) => inner,
            _ => return Ok(Vec::new()),
        },
        _ => return Ok(Vec::new()),
    };
    record_list("categories", Some(list))
}

/// Map a task status response into a [`Task`] snapshot.
pub fn task(payload: Value) -> Result<Task, MemuError> {
    let task: Task = normalize_record("task", payload)?;
    if let Some(progress) = task.progress {
        if !(0.0..=100.0).contains(&progress) {
            return Err(MemuError::Decode(format!(
                "task progress {progress} is outside 0..=100"
            )));
        }
    }
    Ok(task)
}

/// The completed task's result payload, if it carries anything.
pub fn non_empty_result(task: &Task) -> Option<&Map<String, Value>> {
    task.result.as_ref().filter(|result| !result.is_empty())
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "a list",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use memu_types::task::TaskStatus;
    use serde_json::json;

    #[test]
    fn test_structured_and_loose_records_normalize_alike() {
        let structured = MemoryItem {
            id: Some("item_1".to_string()),
            summary: Some("Likes hiking".to_string()),
            memory_type: Some("habit".to_string()),
            extra: Map::from_iter([("confidence".to_string(), json!(0.8))]),
            ..Default::default()
        };
        let loose = json!({
            "id": "item_1",
            "summary": "Likes hiking",
            "memory_type": "habit",
            "confidence": 0.8
        });

        let from_structured: MemoryItem =
            normalize_record("items", serde_json::to_value(&structured).unwrap()).unwrap();
        let from_loose: MemoryItem = normalize_record("items", loose).unwrap();

        assert_eq!(from_structured, structured);
        assert_eq!(from_loose, structured);
        assert_eq!(from_loose.extra["confidence"], json!(0.8));
    }

    #[test]
    fn test_record_list_missing_and_null_are_empty() {
        assert!(record_list::<MemoryItem>("items", None).unwrap().is_empty());
        assert!(record_list::<MemoryItem>("items", Some(&Value::Null)).unwrap().is_empty());
    }

    #[test]
    fn test_record_list_rejects_non_object_elements() {
        let value = json!(["just a string"]);
        let err = record_list::<MemoryItem>("items", Some(&value)).unwrap_err();
        assert!(matches!(err, MemuError::Decode(_)));
        assert!(err.to_string().contains("items"));
    }

    #[test]
    fn test_memorize_result_from_submit_response() {
        let payload = json!({
            "task_id": "task_abc",
            "resource": {"id": "res_1", "modality": "conversation", "bucket": "b1"},
            "items": [{"id": "i1", "summary": "Prefers tea"}],
            "categories": [{"name": "preferences"}]
        });
        let result = memorize_result(&payload, None).unwrap();
        assert_eq!(result.task_id.as_deref(), Some("task_abc"));
        let resource = result.resource.unwrap();
        assert_eq!(resource.modality.as_deref(), Some("conversation"));
        assert_eq!(resource.extra["bucket"], json!("b1"));
        assert_eq!(result.items.len(), 1);
        assert_eq!(result.categories[0].name.as_deref(), Some("preferences"));
    }

    #[test]
    fn test_memorize_result_task_id_override() {
        let payload = json!({"items": []});
        let result = memorize_result(&payload, Some("task_9")).unwrap();
        assert_eq!(result.task_id.as_deref(), Some("task_9"));
        assert!(result.resource.is_none());
    }

    #[test]
    fn test_retrieve_result_mapping() {
        let payload = json!({
            "categories": [{"name": "food", "score": 0.9}],
            "items": [{"summary": "Loves pasta", "score": 0.87, "rank": 1}],
            "resources": [{"url": "https://example.com/chat.json"}],
            "next_step_query": "pasta preferences"
        });
        let result = retrieve_result(&payload).unwrap();
        assert_eq!(result.items[0].score, Some(0.87));
        assert_eq!(result.items[0].extra["rank"], json!(1));
        assert_eq!(result.resources.len(), 1);
        assert_eq!(result.next_step_query.as_deref(), Some("pasta preferences"));
    }

    #[test]
    fn test_retrieve_result_empty_payload() {
        let result = retrieve_result(&json!({})).unwrap();
        assert!(result.is_empty());
        assert!(result.next_step_query.is_none());
    }

    #[test]
    fn test_category_list_shapes() {
        let bare = json!([{"name": "a"}, {"name": "b"}]);
        assert_eq!(category_list(&bare).unwrap().len(), 2);

        let wrapped = json!({"categories": [{"name": "a"}], "total": 1});
        assert_eq!(category_list(&wrapped).unwrap().len(), 1);

        assert!(category_list(&json!({"data": []})).unwrap().is_empty());
        assert!(category_list(&json!({"categories": "nope"})).unwrap().is_empty());
        assert!(category_list(&json!("categories")).unwrap().is_empty());
        assert!(category_list(&json!(42)).unwrap().is_empty());
    }

    #[test]
    fn test_task_mapping_and_progress_bounds() {
        let snapshot = task(json!({"task_id": "t", "status": "PENDING", "progress": 0})).unwrap();
        assert_eq!(snapshot.status, TaskStatus::Pending);

        let err = task(json!({"task_id": "t", "status": "PROCESSING", "progress": 140})).unwrap_err();
        assert!(matches!(err, MemuError::Decode(_)));

        let err = task(json!({"status": "PENDING"})).unwrap_err();
        assert!(matches!(err, MemuError::Decode(_)));
    }

    #[test]
    fn test_non_empty_result() {
        let mut snapshot =
            task(json!({"task_id": "t", "status": "COMPLETED", "result": {}})).unwrap();
        assert!(non_empty_result(&snapshot).is_none());
        snapshot.result = Some(Map::from_iter([("items".to_string(), json!([]))]));
        assert!(non_empty_result(&snapshot).is_some());
    }
}
