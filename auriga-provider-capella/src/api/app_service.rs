//! App Service payloads and lifecycle states.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::CouchbaseAuditData;
use super::cluster::Compute;

/// Lifecycle state of an App Service (sync gateway) deployment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum AppServiceState {
    Pending,
    Deploying,
    DeploymentFailed,
    Destroying,
    DestroyFailed,
    Healthy,
    Degraded,
    Scaling,
    ScaleFailed,
    Upgrading,
    UpgradeFailed,
    TurnedOff,
    TurningOff,
    TurnOffFailed,
    TurningOn,
    TurnOnFailed,
    #[serde(other)]
    Unknown,
}

impl AppServiceState {
    pub fn as_str(&self) -> &'static str {
        match self {
            AppServiceState::Pending => "pending",
            AppServiceState::Deploying => "deploying",
            AppServiceState::DeploymentFailed => "deploymentFailed",
            AppServiceState::Destroying => "destroying",
            AppServiceState::DestroyFailed => "destroyFailed",
            AppServiceState::Healthy => "healthy",
            AppServiceState::Degraded => "degraded",
            AppServiceState::Scaling => "scaling",
            AppServiceState::ScaleFailed => "scaleFailed",
            AppServiceState::Upgrading => "upgrading",
            AppServiceState::UpgradeFailed => "upgradeFailed",
            AppServiceState::TurnedOff => "turnedOff",
            AppServiceState::TurningOff => "turningOff",
            AppServiceState::TurnOffFailed => "turnOffFailed",
            AppServiceState::TurningOn => "turningOn",
            AppServiceState::TurnOnFailed => "turnOnFailed",
            AppServiceState::Unknown => "unknown",
        }
    }

    /// Whether this state ends a provisioning/update/destroy wait.
    pub fn is_final(&self) -> bool {
        matches!(
            self,
            AppServiceState::Healthy
                | AppServiceState::Degraded
                | AppServiceState::DeploymentFailed
                | AppServiceState::DestroyFailed
                | AppServiceState::TurnedOff
                | AppServiceState::TurnOffFailed
                | AppServiceState::TurnOnFailed
                | AppServiceState::ScaleFailed
                | AppServiceState::UpgradeFailed
        )
    }

    pub fn is_failure(&self) -> bool {
        matches!(
            self,
            AppServiceState::DeploymentFailed
                | AppServiceState::DestroyFailed
                | AppServiceState::TurnOffFailed
                | AppServiceState::TurnOnFailed
                | AppServiceState::ScaleFailed
                | AppServiceState::UpgradeFailed
        )
    }
}

impl fmt::Display for AppServiceState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateAppServiceRequest {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nodes: Option<i64>,
    pub compute: Compute,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateAppServiceResponse {
    pub id: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateAppServiceRequest {
    pub nodes: i64,
    pub compute: Compute,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GetAppServiceResponse {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub cloud_provider: String,
    pub current_state: AppServiceState,
    #[serde(default)]
    pub version: String,
    #[serde(default)]
    pub nodes: i64,
    pub compute: Compute,
    #[serde(default)]
    pub audit: Option<CouchbaseAuditData>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn final_state_set_includes_turned_off() {
        assert!(AppServiceState::TurnedOff.is_final());
        assert!(AppServiceState::TurnOnFailed.is_final());
        assert!(!AppServiceState::Pending.is_final());
        assert!(!AppServiceState::TurningOn.is_final());
    }

    #[test]
    fn state_parses_camel_case() {
        let state: AppServiceState = serde_json::from_str(r#""turnOffFailed""#).unwrap();
        assert_eq!(state, AppServiceState::TurnOffFailed);
        assert!(state.is_failure());
    }

    #[test]
    fn get_response_deserializes() {
        let body = r#"{
            "id": "9f8e7d6c-5b4a-3210-fedc-ba9876543210",
            "name": "sync",
            "currentState": "healthy",
            "nodes": 2,
            "compute": {"cpu": 2, "ram": 4}
        }"#;
        let svc: GetAppServiceResponse = serde_json::from_str(body).unwrap();
        assert_eq!(svc.current_state, AppServiceState::Healthy);
        assert_eq!(svc.nodes, 2);
    }
}
