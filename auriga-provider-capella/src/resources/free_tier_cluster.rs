//! Free-tier cluster resource.
//!
//! Same lifecycle as a paid cluster, but provisioning feedback arrives much
//! sooner, so the first status check happens a few seconds after initiation
//! instead of minutes.

use std::collections::HashMap;
use std::time::Duration;

use auriga_core::provider::{ProviderError, ProviderResult};
use auriga_core::resource::{Resource, ResourceId, State, Value};
use auriga_core::wait::{WaitConfig, WaitOutcome, Waiter};
use reqwest::{Method, StatusCode};

use crate::api::cluster::{CloudProvider, ClusterState};
use crate::api::free_tier_cluster::{
    CreateFreeTierClusterRequest, CreateFreeTierClusterResponse, GetFreeTierClusterResponse,
    UpdateFreeTierClusterRequest,
};
use crate::client::EndpointCfg;
use crate::provider::CapellaProvider;
use crate::resources::{
    audit_value, cluster::cloud_provider_value, marshal, optional_str, require_map, require_str,
    split_identifier, timeout_error,
};

const WAIT_PROVISIONING: WaitConfig = WaitConfig::new(
    Duration::from_secs(3),
    Duration::from_secs(3),
    Duration::from_secs(60 * 60),
);

pub(crate) async fn create(
    provider: &CapellaProvider,
    resource: &Resource,
) -> ProviderResult<State> {
    let id = &resource.id;
    let attrs = &resource.attributes;
    let project_id = require_str(attrs, "project_id", id)?;

    let cloud_provider = require_map(attrs, "cloud_provider", id)?;
    let request = CreateFreeTierClusterRequest {
        name: require_str(attrs, "name", id)?.to_string(),
        description: optional_str(attrs, "description").map(str::to_string),
        cloud_provider: CloudProvider {
            kind: require_str(cloud_provider, "type", id)?.to_string(),
            region: require_str(cloud_provider, "region", id)?.to_string(),
            cidr: require_str(cloud_provider, "cidr", id)?.to_string(),
        },
    };

    let cfg = EndpointCfg::new(
        format!(
            "{}/projects/{}/clusters/freeTier",
            provider.org_url(),
            project_id
        ),
        Method::POST,
        StatusCode::ACCEPTED,
    );
    let payload = marshal(&request, id)?;
    let response = provider
        .client()
        .execute_with_retry(&cfg, Some(&payload))
        .await
        .map_err(|e| ProviderError::from(e).for_resource(id.clone()))?;
    let created: CreateFreeTierClusterResponse = response
        .json()
        .map_err(|e| ProviderError::from(e).for_resource(id.clone()))?;

    wait_for_final_state(
        provider,
        id,
        "free-tier cluster creation",
        project_id,
        &created.id,
    )
    .await?;

    read_by_ids(provider, id, project_id, &created.id).await
}

pub(crate) async fn read(
    provider: &CapellaProvider,
    id: &ResourceId,
    identifier: &str,
) -> ProviderResult<State> {
    let parts = split_identifier(identifier, 2, id)?;
    let (project_id, cluster_id) = (parts[0], parts[1]);

    match get_cluster(provider, project_id, cluster_id).await {
        Ok(cluster) => Ok(into_state(id, project_id, &cluster)),
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

    // Only name and description can change on the free tier.
    let request = UpdateFreeTierClusterRequest {
        name: require_str(&to.attributes, "name", id)?.to_string(),
        description: optional_str(&to.attributes, "description").map(str::to_string),
    };

    let cfg = EndpointCfg::new(
        cluster_url(provider, project_id, cluster_id),
        Method::PUT,
        StatusCode::NO_CONTENT,
    );
    let payload = marshal(&request, id)?;
    provider
        .client()
        .execute_with_retry(&cfg, Some(&payload))
        .await
        .map_err(|e| ProviderError::from(e).for_resource(id.clone()))?;

    wait_for_final_state(
        provider,
        id,
        "free-tier cluster update",
        project_id,
        cluster_id,
    )
    .await?;

    read_by_ids(provider, id, project_id, cluster_id).await
}

pub(crate) async fn delete(
    provider: &CapellaProvider,
    id: &ResourceId,
    identifier: &str,
) -> ProviderResult<()> {
    let parts = split_identifier(identifier, 2, id)?;
    let (project_id, cluster_id) = (parts[0], parts[1]);

    let cfg = EndpointCfg::new(
        cluster_url(provider, project_id, cluster_id),
        Method::DELETE,
        StatusCode::ACCEPTED,
    );
    match provider.client().execute_with_retry(&cfg, None).await {
        Ok(_) => {}
        Err(err) if err.is_not_found() => return Ok(()),
        Err(err) => return Err(ProviderError::from(err).for_resource(id.clone())),
    }

    let waiter = Waiter::new(
        "free-tier cluster deletion",
        provider.wait_config(WAIT_PROVISIONING),
    )
    .for_deletion();
    let outcome = waiter
        .run(
            || fetch_state(provider, project_id, cluster_id),
            ClusterState::is_final,
        )
        .await;

    match outcome {
        WaitOutcome::Reached(None) => Ok(()),
        WaitOutcome::Reached(Some(state)) => Err(ProviderError::new(format!(
            "could not delete free-tier cluster, as current cluster state: {}",
            state
        ))
        .for_resource(id.clone())),
        WaitOutcome::TimedOut { .. } => Err(timeout_error("free-tier cluster deletion", id)),
        WaitOutcome::Failed(err) => Err(err.for_resource(id.clone())),
    }
}

async fn wait_for_final_state(
    provider: &CapellaProvider,
    id: &ResourceId,
    operation: &str,
    project_id: &str,
    cluster_id: &str,
) -> ProviderResult<()> {
    let waiter = Waiter::new(operation, provider.wait_config(WAIT_PROVISIONING));
    let outcome = waiter
        .run(
            || fetch_state(provider, project_id, cluster_id),
            ClusterState::is_final,
        )
        .await;

    match outcome {
        WaitOutcome::Reached(Some(state)) if state.is_failure() => {
            Err(ProviderError::new(format!("{} ended in state '{}'", operation, state))
                .for_resource(id.clone()))
        }
        WaitOutcome::Reached(_) => Ok(()),
        WaitOutcome::TimedOut { .. } => Err(timeout_error(operation, id)),
        WaitOutcome::Failed(err) => Err(err.for_resource(id.clone())),
    }
}

fn cluster_url(provider: &CapellaProvider, project_id: &str, cluster_id: &str) -> String {
    format!(
        "{}/projects/{}/clusters/freeTier/{}",
        provider.org_url(),
        project_id,
        cluster_id
    )
}

async fn fetch_state(
    provider: &CapellaProvider,
    project_id: &str,
    cluster_id: &str,
) -> ProviderResult<ClusterState> {
    let cluster = get_cluster(provider, project_id, cluster_id).await?;
    Ok(cluster.current_state)
}

async fn get_cluster(
    provider: &CapellaProvider,
    project_id: &str,
    cluster_id: &str,
) -> ProviderResult<GetFreeTierClusterResponse> {
    let cfg = EndpointCfg::new(
        cluster_url(provider, project_id, cluster_id),
        Method::GET,
        StatusCode::OK,
    );
    let response = provider
        .client()
        .execute_with_retry(&cfg, None)
        .await
        .map_err(ProviderError::from)?;
    response.json().map_err(ProviderError::from)
}

async fn read_by_ids(
    provider: &CapellaProvider,
    id: &ResourceId,
    project_id: &str,
    cluster_id: &str,
) -> ProviderResult<State> {
    let cluster = get_cluster(provider, project_id, cluster_id)
        .await
        .map_err(|e| e.for_resource(id.clone()))?;
    Ok(into_state(id, project_id, &cluster))
}

fn into_state(id: &ResourceId, project_id: &str, cluster: &GetFreeTierClusterResponse) -> State {
    let mut attributes = HashMap::new();
    attributes.insert("id".to_string(), Value::String(cluster.id.clone()));
    attributes.insert(
        "project_id".to_string(),
        Value::String(project_id.to_string()),
    );
    attributes.insert("name".to_string(), Value::String(cluster.name.clone()));
    if !cluster.description.is_empty() {
        attributes.insert(
            "description".to_string(),
            Value::String(cluster.description.clone()),
        );
    }
    attributes.insert(
        "current_state".to_string(),
        Value::String(cluster.current_state.to_string()),
    );
    attributes.insert(
        "cloud_provider".to_string(),
        cloud_provider_value(&cluster.cloud_provider),
    );
    if let Some(server) = &cluster.couchbase_server
        && let Some(version) = &server.version
    {
        attributes.insert(
            "couchbase_server_version".to_string(),
            Value::String(version.clone()),
        );
    }
    if let Some(audit) = &cluster.audit {
        attributes.insert("audit".to_string(), audit_value(audit));
    }

    State::existing(id.clone(), attributes)
        .with_identifier(format!("{}/{}", project_id, cluster.id))
}
