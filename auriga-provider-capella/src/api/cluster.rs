//! Cluster payloads and lifecycle states.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::CouchbaseAuditData;

/// Lifecycle state of a cluster as reported by the management API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ClusterState {
    Degraded,
    Deploying,
    DeploymentFailed,
    DestroyFailed,
    Destroying,
    Draft,
    Healthy,
    Offline,
    Peering,
    PeeringFailed,
    RebalanceFailed,
    Rebalancing,
    ScaleFailed,
    Scaling,
    TurnedOff,
    TurningOff,
    TurningOffFailed,
    TurningOn,
    TurningOnFailed,
    UpgradeFailed,
    Upgrading,
    /// States introduced server-side after this provider was released.
    #[serde(other)]
    Unknown,
}

impl ClusterState {
    pub fn as_str(&self) -> &'static str {
        match self {
            ClusterState::Degraded => "degraded",
            ClusterState::Deploying => "deploying",
            ClusterState::DeploymentFailed => "deploymentFailed",
            ClusterState::DestroyFailed => "destroyFailed",
            ClusterState::Destroying => "destroying",
            ClusterState::Draft => "draft",
            ClusterState::Healthy => "healthy",
            ClusterState::Offline => "offline",
            ClusterState::Peering => "peering",
            ClusterState::PeeringFailed => "peeringFailed",
            ClusterState::RebalanceFailed => "rebalanceFailed",
            ClusterState::Rebalancing => "rebalancing",
            ClusterState::ScaleFailed => "scaleFailed",
            ClusterState::Scaling => "scaling",
            ClusterState::TurnedOff => "turnedOff",
            ClusterState::TurningOff => "turningOff",
            ClusterState::TurningOffFailed => "turningOffFailed",
            ClusterState::TurningOn => "turningOn",
            ClusterState::TurningOnFailed => "turningOnFailed",
            ClusterState::UpgradeFailed => "upgradeFailed",
            ClusterState::Upgrading => "upgrading",
            ClusterState::Unknown => "unknown",
        }
    }

    /// Whether this state ends a provisioning/update/destroy wait. Reaching
    /// any final state ends the wait, including the failure states; the
    /// caller decides how to report it.
    pub fn is_final(&self) -> bool {
        matches!(
            self,
            ClusterState::Healthy
                | ClusterState::Degraded
                | ClusterState::DeploymentFailed
                | ClusterState::DestroyFailed
                | ClusterState::PeeringFailed
                | ClusterState::RebalanceFailed
                | ClusterState::ScaleFailed
                | ClusterState::UpgradeFailed
        )
    }

    pub fn is_failure(&self) -> bool {
        matches!(
            self,
            ClusterState::DeploymentFailed
                | ClusterState::DestroyFailed
                | ClusterState::PeeringFailed
                | ClusterState::RebalanceFailed
                | ClusterState::ScaleFailed
                | ClusterState::UpgradeFailed
        )
    }

    /// Case-insensitive comparison against a desired state name, used by
    /// activation toggles ("healthy", "turnedOff").
    pub fn matches(&self, desired: &str) -> bool {
        self.as_str().eq_ignore_ascii_case(desired)
    }
}

impl fmt::Display for ClusterState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CloudProvider {
    #[serde(rename = "type")]
    pub kind: String,
    pub region: String,
    pub cidr: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Availability {
    #[serde(rename = "type")]
    pub kind: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Support {
    pub plan: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timezone: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Compute {
    pub cpu: i64,
    pub ram: i64,
}

/// Disk configuration; the storage/iops/autoexpansion fields apply only to
/// some cloud providers and are omitted from the wire format when unset.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Disk {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub storage: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub iops: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub autoexpansion: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Node {
    pub compute: Compute,
    pub disk: Disk,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceGroup {
    pub node: Node,
    pub num_of_nodes: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CouchbaseServer {
    #[serde(default)]
    pub version: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateClusterRequest {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub cloud_provider: CloudProvider,
    pub availability: Availability,
    pub support: Support,
    pub service_groups: Vec<ServiceGroup>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateClusterResponse {
    pub id: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateClusterRequest {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub support: Support,
    pub service_groups: Vec<ServiceGroup>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GetClusterResponse {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub current_state: ClusterState,
    #[serde(default)]
    pub couchbase_server: Option<CouchbaseServer>,
    pub cloud_provider: CloudProvider,
    pub availability: Availability,
    pub support: Support,
    #[serde(default)]
    pub service_groups: Vec<ServiceGroup>,
    #[serde(default)]
    pub app_service_id: Option<String>,
    #[serde(default)]
    pub audit: Option<CouchbaseAuditData>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn state_round_trips_camel_case() {
        let state: ClusterState = serde_json::from_str(r#""deploymentFailed""#).unwrap();
        assert_eq!(state, ClusterState::DeploymentFailed);
        assert_eq!(state.as_str(), "deploymentFailed");
    }

    #[test]
    fn unknown_state_does_not_fail_deserialization() {
        let state: ClusterState = serde_json::from_str(r#""hibernating""#).unwrap();
        assert_eq!(state, ClusterState::Unknown);
        assert!(!state.is_final());
    }

    #[test]
    fn final_states_cover_success_and_failure() {
        assert!(ClusterState::Healthy.is_final());
        assert!(ClusterState::Degraded.is_final());
        assert!(ClusterState::DestroyFailed.is_final());
        assert!(!ClusterState::Deploying.is_final());
        assert!(!ClusterState::Destroying.is_final());

        assert!(ClusterState::DestroyFailed.is_failure());
        assert!(!ClusterState::Healthy.is_failure());
        assert!(!ClusterState::Degraded.is_failure());
    }

    #[test]
    fn desired_state_matching_is_case_insensitive() {
        assert!(ClusterState::TurnedOff.matches("turnedoff"));
        assert!(ClusterState::Healthy.matches("Healthy"));
        assert!(!ClusterState::Healthy.matches("healthyish"));
        assert!(!ClusterState::TurnedOff.matches("off"));
    }

    #[test]
    fn get_cluster_response_deserializes() {
        let body = r#"{
            "id": "f1b8a2d4-3c5e-4b6f-8a9d-0e1f2a3b4c5d",
            "name": "production",
            "description": "primary cluster",
            "currentState": "healthy",
            "couchbaseServer": {"version": "7.6"},
            "cloudProvider": {"type": "aws", "region": "us-east-1", "cidr": "10.0.8.0/23"},
            "availability": {"type": "multi"},
            "support": {"plan": "enterprise", "timezone": "PT"},
            "serviceGroups": [{
                "node": {
                    "compute": {"cpu": 4, "ram": 16},
                    "disk": {"type": "gp3", "storage": 50, "iops": 3000}
                },
                "numOfNodes": 3
            }],
            "audit": {"createdAt": "2024-04-01T12:00:00Z", "version": 1}
        }"#;
        let cluster: GetClusterResponse = serde_json::from_str(body).unwrap();
        assert_eq!(cluster.current_state, ClusterState::Healthy);
        assert_eq!(cluster.service_groups.len(), 1);
        assert_eq!(cluster.service_groups[0].num_of_nodes, 3);
        assert_eq!(cluster.service_groups[0].node.disk.kind, "gp3");
        assert_eq!(
            cluster.couchbase_server.unwrap().version.as_deref(),
            Some("7.6")
        );
    }

    #[test]
    fn create_request_omits_empty_optionals() {
        let request = CreateClusterRequest {
            name: "db".to_string(),
            description: None,
            cloud_provider: CloudProvider {
                kind: "gcp".to_string(),
                region: "us-east1".to_string(),
                cidr: "10.0.8.0/23".to_string(),
            },
            availability: Availability {
                kind: "single".to_string(),
            },
            support: Support {
                plan: "basic".to_string(),
                timezone: None,
            },
            service_groups: vec![],
        };
        let body = serde_json::to_value(&request).unwrap();
        assert!(body.get("description").is_none());
        assert!(body["support"].get("timezone").is_none());
        assert_eq!(body["cloudProvider"]["type"], "gcp");
    }
}
