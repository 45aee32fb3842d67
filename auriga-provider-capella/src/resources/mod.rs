//! Resource handlers mapping desired state onto Capella API calls.
//!
//! Each submodule owns one resource type: unpack the configured attributes,
//! issue the mutating request, hand a status-fetch closure to the waiter for
//! asynchronous operations, and re-fetch the full remote representation into
//! provider state.

pub(crate) mod app_endpoint;
pub(crate) mod app_service;
pub(crate) mod audit_log_export;
pub(crate) mod cluster;
pub(crate) mod cluster_onoff;
pub(crate) mod free_tier_cluster;
pub(crate) mod project;

use std::collections::HashMap;

use auriga_core::provider::{ProviderError, ProviderResult};
use auriga_core::resource::{ResourceId, Value};
use serde::Serialize;

use crate::api::CouchbaseAuditData;

/// Appended to timeout diagnostics: a polling timeout does not imply the
/// remote operation failed.
pub(crate) const REFRESH_GUIDANCE: &str = "Re-run plan after 4-5 minutes to know the current \
     status, and refresh to update local state from remote; the remote operation may still \
     complete.";

/// Split a slash-joined identifier into its expected remote IDs.
pub(crate) fn split_identifier<'a>(
    identifier: &'a str,
    expected: usize,
    id: &ResourceId,
) -> ProviderResult<Vec<&'a str>> {
    let parts: Vec<&str> = identifier.split('/').collect();
    if parts.len() != expected || parts.iter().any(|p| p.is_empty()) {
        return Err(ProviderError::new(format!(
            "identifier '{}' is malformed: expected {} slash-separated IDs, \
             please check provider documentation for syntax",
            identifier, expected
        ))
        .for_resource(id.clone()));
    }
    Ok(parts)
}

pub(crate) fn require_str<'a>(
    attrs: &'a HashMap<String, Value>,
    key: &str,
    id: &ResourceId,
) -> ProviderResult<&'a str> {
    attrs.get(key).and_then(Value::as_str).ok_or_else(|| {
        ProviderError::new(format!("attribute '{}' is required and must be a string", key))
            .for_resource(id.clone())
    })
}

pub(crate) fn optional_str<'a>(attrs: &'a HashMap<String, Value>, key: &str) -> Option<&'a str> {
    attrs.get(key).and_then(Value::as_str)
}

pub(crate) fn require_int(
    attrs: &HashMap<String, Value>,
    key: &str,
    id: &ResourceId,
) -> ProviderResult<i64> {
    attrs.get(key).and_then(Value::as_int).ok_or_else(|| {
        ProviderError::new(format!(
            "attribute '{}' is required and must be an integer",
            key
        ))
        .for_resource(id.clone())
    })
}

pub(crate) fn optional_int(attrs: &HashMap<String, Value>, key: &str) -> Option<i64> {
    attrs.get(key).and_then(Value::as_int)
}

pub(crate) fn optional_bool(attrs: &HashMap<String, Value>, key: &str) -> Option<bool> {
    attrs.get(key).and_then(Value::as_bool)
}

pub(crate) fn require_map<'a>(
    attrs: &'a HashMap<String, Value>,
    key: &str,
    id: &ResourceId,
) -> ProviderResult<&'a HashMap<String, Value>> {
    match attrs.get(key) {
        Some(Value::Map(map)) => Ok(map),
        _ => Err(ProviderError::new(format!(
            "attribute '{}' is required and must be an object",
            key
        ))
        .for_resource(id.clone())),
    }
}

pub(crate) fn require_list<'a>(
    attrs: &'a HashMap<String, Value>,
    key: &str,
    id: &ResourceId,
) -> ProviderResult<&'a [Value]> {
    match attrs.get(key) {
        Some(Value::List(items)) => Ok(items),
        _ => Err(ProviderError::new(format!(
            "attribute '{}' is required and must be a list",
            key
        ))
        .for_resource(id.clone())),
    }
}

/// Error for a wait cycle that ran out its budget: the operation was
/// initiated remotely and may still complete.
pub(crate) fn timeout_error(operation: &str, id: &ResourceId) -> ProviderError {
    ProviderError::new(format!(
        "{} is initiated, but checking the current state timed out. {}",
        operation, REFRESH_GUIDANCE
    ))
    .for_resource(id.clone())
}

/// Marshal a request payload, attributing failures to the resource.
pub(crate) fn marshal<T: Serialize>(payload: &T, id: &ResourceId) -> ProviderResult<serde_json::Value> {
    serde_json::to_value(payload).map_err(|e| {
        ProviderError::new("failed to marshal payload")
            .with_cause(e)
            .for_resource(id.clone())
    })
}

/// Audit trail as a nested attribute map.
pub(crate) fn audit_value(audit: &CouchbaseAuditData) -> Value {
    let mut map = HashMap::new();
    map.insert(
        "created_at".to_string(),
        Value::String(audit.created_at.clone()),
    );
    map.insert(
        "created_by".to_string(),
        Value::String(audit.created_by.clone()),
    );
    map.insert(
        "modified_at".to_string(),
        Value::String(audit.modified_at.clone()),
    );
    map.insert(
        "modified_by".to_string(),
        Value::String(audit.modified_by.clone()),
    );
    map.insert("version".to_string(), Value::Int(audit.version));
    Value::Map(map)
}
