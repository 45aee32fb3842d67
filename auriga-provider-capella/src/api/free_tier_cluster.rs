//! Free-tier cluster payloads. Free-tier deployments reuse the cluster
//! lifecycle states but accept a much smaller configuration surface.

use serde::{Deserialize, Serialize};

use super::CouchbaseAuditData;
use super::cluster::{CloudProvider, ClusterState, CouchbaseServer};

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateFreeTierClusterRequest {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub cloud_provider: CloudProvider,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateFreeTierClusterResponse {
    pub id: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct UpdateFreeTierClusterRequest {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GetFreeTierClusterResponse {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub current_state: ClusterState,
    pub cloud_provider: CloudProvider,
    #[serde(default)]
    pub couchbase_server: Option<CouchbaseServer>,
    #[serde(default)]
    pub audit: Option<CouchbaseAuditData>,
}
