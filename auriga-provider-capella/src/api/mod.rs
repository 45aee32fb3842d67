//! Request/response payloads for the Capella v4 management API.
//!
//! Wire names are camelCase; timestamps are passed through as RFC 3339
//! strings. Lifecycle-state enums live next to the resource they describe.

pub mod app_endpoint;
pub mod app_service;
pub mod audit_log_export;
pub mod cluster;
pub mod free_tier_cluster;
pub mod project;

use serde::{Deserialize, Serialize};

/// Audit trail attached to full resource representations.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CouchbaseAuditData {
    #[serde(default)]
    pub created_at: String,
    #[serde(default)]
    pub created_by: String,
    #[serde(default)]
    pub modified_at: String,
    #[serde(default)]
    pub modified_by: String,
    #[serde(default)]
    pub version: i64,
}
