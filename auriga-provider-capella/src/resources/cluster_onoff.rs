//! Cluster on/off resource - toggle a cluster's activation state.
//!
//! The management API only exposes POST (on) and DELETE (off) against the
//! activationState endpoint; there is no GET for the toggle itself, so both
//! the wait cycle and read verify against the cluster's own state field.
//! Desired "on" is observed as "healthy", desired "off" as "turnedOff".

use std::collections::HashMap;
use std::time::Duration;

use auriga_core::provider::{ProviderError, ProviderResult};
use auriga_core::resource::{Resource, ResourceId, State, Value};
use auriga_core::wait::{WaitConfig, WaitOutcome, Waiter};
use reqwest::{Method, StatusCode};

use crate::api::cluster::ClusterState;
use crate::client::EndpointCfg;
use crate::provider::CapellaProvider;
use crate::resources::{
    cluster, optional_bool, require_str, split_identifier, timeout_error,
};

/// Toggles settle much faster than provisioning.
const WAIT_ACTIVATION: WaitConfig = WaitConfig::new(
    Duration::from_secs(10),
    Duration::from_secs(3),
    Duration::from_secs(30 * 60),
);

pub(crate) async fn create(
    provider: &CapellaProvider,
    resource: &Resource,
) -> ProviderResult<State> {
    let id = &resource.id;
    let project_id = require_str(&resource.attributes, "project_id", id)?;
    let cluster_id = require_str(&resource.attributes, "cluster_id", id)?;
    let desired = require_str(&resource.attributes, "state", id)?;
    let turn_on_linked_app_service =
        optional_bool(&resource.attributes, "turn_on_linked_app_service").unwrap_or(false);

    switch_activation(
        provider,
        id,
        project_id,
        cluster_id,
        desired,
        turn_on_linked_app_service,
    )
    .await?;

    read_by_ids(provider, id, project_id, cluster_id, desired).await
}

pub(crate) async fn read(
    provider: &CapellaProvider,
    id: &ResourceId,
    identifier: &str,
) -> ProviderResult<State> {
    let parts = split_identifier(identifier, 2, id)?;
    let (project_id, cluster_id) = (parts[0], parts[1]);

    match cluster::fetch_state(provider, project_id, cluster_id).await {
        Ok(state) => {
            let observed = observed_toggle(state);
            Ok(build_state(id, project_id, cluster_id, observed))
        }
        Err(err) if err.is_not_found() => Ok(State::not_found(id.clone())),
        Err(err) => Err(err.for_resource(id.clone())),
    }
}

pub(crate) async fn update(
    provider: &CapellaProvider,
    id: &ResourceId,
    identifier: &str,
    to: &Resource,
) -> ProviderResult<State> {
    let parts = split_identifier(identifier, 2, id)?;
    let (project_id, cluster_id) = (parts[0], parts[1]);
    let desired = require_str(&to.attributes, "state", id)?;
    let turn_on_linked_app_service =
        optional_bool(&to.attributes, "turn_on_linked_app_service").unwrap_or(false);

    switch_activation(
        provider,
        id,
        project_id,
        cluster_id,
        desired,
        turn_on_linked_app_service,
    )
    .await?;

    read_by_ids(provider, id, project_id, cluster_id, desired).await
}

/// Removing the toggle from configuration leaves the cluster in whatever
/// activation state it currently has; there is nothing to delete remotely.
pub(crate) async fn delete(
    _provider: &CapellaProvider,
    _id: &ResourceId,
    _identifier: &str,
) -> ProviderResult<()> {
    Ok(())
}

async fn switch_activation(
    provider: &CapellaProvider,
    id: &ResourceId,
    project_id: &str,
    cluster_id: &str,
    desired: &str,
    turn_on_linked_app_service: bool,
) -> ProviderResult<()> {
    let (method, operation, payload) = match desired {
        "on" => (
            Method::POST,
            "cluster on",
            Some(serde_json::json!({
                "turnOnLinkedAppService": turn_on_linked_app_service
            })),
        ),
        "off" => (Method::DELETE, "cluster off", None),
        other => {
            return Err(ProviderError::new(format!(
                "invalid state value '{}': state must be either 'on' or 'off'",
                other
            ))
            .for_resource(id.clone()));
        }
    };

    let cfg = EndpointCfg::new(
        format!(
            "{}/projects/{}/clusters/{}/activationState",
            provider.org_url(),
            project_id,
            cluster_id
        ),
        method,
        StatusCode::ACCEPTED,
    );
    provider
        .client()
        .execute_with_retry(&cfg, payload.as_ref())
        .await
        .map_err(|e| ProviderError::from(e).for_resource(id.clone()))?;

    // Equality against the one state the toggle aims for, never the wider
    // final-state set: a cluster settling in "degraded" does not mean "on".
    let target = desired_cluster_state(desired);
    let waiter = Waiter::new(operation, provider.wait_config(WAIT_ACTIVATION));
    let outcome = waiter
        .run(
            || cluster::fetch_state(provider, project_id, cluster_id),
            |state: &ClusterState| state.matches(target),
        )
        .await;

    match outcome {
        WaitOutcome::Reached(_) => Ok(()),
        WaitOutcome::TimedOut { .. } => Err(timeout_error(operation, id)),
        WaitOutcome::Failed(err) => Err(err.for_resource(id.clone())),
    }
}

fn desired_cluster_state(desired: &str) -> &'static str {
    if desired == "on" { "healthy" } else { "turnedOff" }
}

fn observed_toggle(state: ClusterState) -> &'static str {
    match state {
        ClusterState::TurnedOff | ClusterState::TurningOff => "off",
        _ => "on",
    }
}

async fn read_by_ids(
    provider: &CapellaProvider,
    id: &ResourceId,
    project_id: &str,
    cluster_id: &str,
    desired: &str,
) -> ProviderResult<State> {
    let state = cluster::fetch_state(provider, project_id, cluster_id)
        .await
        .map_err(|e| e.for_resource(id.clone()))?;
    // The cluster has just been confirmed in the desired state; fall back to
    // the observed mapping if it has already drifted.
    let observed = if state.matches(desired_cluster_state(desired)) {
        desired
    } else {
        observed_toggle(state)
    };
    Ok(build_state(id, project_id, cluster_id, observed))
}

fn build_state(id: &ResourceId, project_id: &str, cluster_id: &str, toggle: &str) -> State {
    let mut attributes = HashMap::new();
    attributes.insert(
        "project_id".to_string(),
        Value::String(project_id.to_string()),
    );
    attributes.insert(
        "cluster_id".to_string(),
        Value::String(cluster_id.to_string()),
    );
    attributes.insert("state".to_string(), Value::String(toggle.to_string()));

    State::existing(id.clone(), attributes)
        .with_identifier(format!("{}/{}", project_id, cluster_id))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn desired_state_mapping() {
        assert_eq!(desired_cluster_state("on"), "healthy");
        assert_eq!(desired_cluster_state("off"), "turnedOff");
    }

    #[test]
    fn observed_toggle_mapping() {
        assert_eq!(observed_toggle(ClusterState::TurnedOff), "off");
        assert_eq!(observed_toggle(ClusterState::TurningOff), "off");
        assert_eq!(observed_toggle(ClusterState::Healthy), "on");
        assert_eq!(observed_toggle(ClusterState::Degraded), "on");
    }
}
