//! Cluster resource - provision and manage Capella operational clusters.
//!
//! Cluster mutations are asynchronous server-side: the API accepts the
//! request and the cluster transitions through deploying/scaling/destroying
//! before settling in a final state, so every mutation here ends in a wait
//! cycle against the cluster's GET endpoint.

use std::collections::HashMap;
use std::time::Duration;

use auriga_core::provider::{ProviderError, ProviderResult};
use auriga_core::resource::{Resource, ResourceId, State, Value};
use auriga_core::wait::{WaitConfig, WaitOutcome, Waiter};
use reqwest::{Method, StatusCode};

use crate::api::cluster::{
    Availability, CloudProvider, ClusterState, Compute, CreateClusterRequest,
    CreateClusterResponse, Disk, GetClusterResponse, Node, ServiceGroup, Support,
    UpdateClusterRequest,
};
use crate::client::EndpointCfg;
use crate::provider::CapellaProvider;
use crate::resources::{
    audit_value, marshal, optional_bool, optional_int, optional_str, require_int, require_list,
    require_map, require_str, split_identifier, timeout_error,
};

/// Deployment takes up to an hour; the first status check is only useful a
/// couple of minutes after initiation.
pub(crate) const WAIT_PROVISIONING: WaitConfig = WaitConfig::new(
    Duration::from_secs(2 * 60),
    Duration::from_secs(3),
    Duration::from_secs(60 * 60),
);

pub(crate) async fn create(
    provider: &CapellaProvider,
    resource: &Resource,
) -> ProviderResult<State> {
    let id = &resource.id;
    let project_id = require_str(&resource.attributes, "project_id", id)?;
    let request = build_create_request(resource)?;

    let cfg = EndpointCfg::new(
        format!("{}/projects/{}/clusters", provider.org_url(), project_id),
        Method::POST,
        StatusCode::ACCEPTED,
    );
    let payload = marshal(&request, id)?;
    let response = provider
        .client()
        .execute_with_retry(&cfg, Some(&payload))
        .await
        .map_err(|e| ProviderError::from(e).for_resource(id.clone()))?;
    let created: CreateClusterResponse = response
        .json()
        .map_err(|e| ProviderError::from(e).for_resource(id.clone()))?;

    wait_for_final_state(provider, id, "cluster creation", project_id, &created.id).await?;

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
        Err(err) if err.is_not_found() => {
            tracing::info!(
                cluster_id,
                "resource doesn't exist in remote server, removing it from state"
            );
            Ok(State::not_found(id.clone()))
        }
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
    let request = build_update_request(to)?;

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

    wait_for_final_state(provider, id, "cluster update", project_id, cluster_id).await?;

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
        // Already gone remotely; nothing left to wait for.
        Err(err) if err.is_not_found() => {
            tracing::info!(cluster_id, "resource doesn't exist in remote server");
            return Ok(());
        }
        Err(err) => return Err(ProviderError::from(err).for_resource(id.clone())),
    }

    let waiter = Waiter::new(
        "cluster deletion",
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
        // The cluster record still exists in a final state, so deletion
        // did not finish cleanly.
        WaitOutcome::Reached(Some(state)) => Err(ProviderError::new(format!(
            "could not delete cluster, as current cluster state: {}",
            state
        ))
        .for_resource(id.clone())),
        WaitOutcome::TimedOut { .. } => Err(timeout_error("cluster deletion", id)),
        WaitOutcome::Failed(err) => Err(err.for_resource(id.clone())),
    }
}

/// Wait for the cluster to settle, classifying failure-final states.
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
        WaitOutcome::Reached(Some(state)) if state.is_failure() => Err(ProviderError::new(
            format!(
                "{} ended in state '{}'; check Capella to see if any hanging resources were created",
                operation, state
            ),
        )
        .for_resource(id.clone())),
        WaitOutcome::Reached(_) => Ok(()),
        WaitOutcome::TimedOut { .. } => Err(timeout_error(operation, id)),
        WaitOutcome::Failed(err) => Err(err.for_resource(id.clone())),
    }
}

fn cluster_url(provider: &CapellaProvider, project_id: &str, cluster_id: &str) -> String {
    format!(
        "{}/projects/{}/clusters/{}",
        provider.org_url(),
        project_id,
        cluster_id
    )
}

/// One status lookup, shared with the activation-toggle resource.
pub(crate) async fn fetch_state(
    provider: &CapellaProvider,
    project_id: &str,
    cluster_id: &str,
) -> ProviderResult<ClusterState> {
    let cluster = get_cluster(provider, project_id, cluster_id).await?;
    Ok(cluster.current_state)
}

pub(crate) async fn get_cluster(
    provider: &CapellaProvider,
    project_id: &str,
    cluster_id: &str,
) -> ProviderResult<GetClusterResponse> {
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

fn build_create_request(resource: &Resource) -> ProviderResult<CreateClusterRequest> {
    let id = &resource.id;
    let attrs = &resource.attributes;
    Ok(CreateClusterRequest {
        name: require_str(attrs, "name", id)?.to_string(),
        description: optional_str(attrs, "description").map(str::to_string),
        cloud_provider: parse_cloud_provider(attrs, id)?,
        availability: parse_availability(attrs, id)?,
        support: parse_support(attrs, id)?,
        service_groups: parse_service_groups(attrs, id)?,
    })
}

fn build_update_request(resource: &Resource) -> ProviderResult<UpdateClusterRequest> {
    let id = &resource.id;
    let attrs = &resource.attributes;
    Ok(UpdateClusterRequest {
        name: require_str(attrs, "name", id)?.to_string(),
        description: optional_str(attrs, "description").map(str::to_string),
        support: parse_support(attrs, id)?,
        service_groups: parse_service_groups(attrs, id)?,
    })
}

fn parse_cloud_provider(
    attrs: &HashMap<String, Value>,
    id: &ResourceId,
) -> ProviderResult<CloudProvider> {
    let map = require_map(attrs, "cloud_provider", id)?;
    Ok(CloudProvider {
        kind: require_str(map, "type", id)?.to_string(),
        region: require_str(map, "region", id)?.to_string(),
        cidr: require_str(map, "cidr", id)?.to_string(),
    })
}

fn parse_availability(
    attrs: &HashMap<String, Value>,
    id: &ResourceId,
) -> ProviderResult<Availability> {
    let map = require_map(attrs, "availability", id)?;
    Ok(Availability {
        kind: require_str(map, "type", id)?.to_string(),
    })
}

fn parse_support(attrs: &HashMap<String, Value>, id: &ResourceId) -> ProviderResult<Support> {
    let map = require_map(attrs, "support", id)?;
    Ok(Support {
        plan: require_str(map, "plan", id)?.to_string(),
        timezone: optional_str(map, "timezone").map(str::to_string),
    })
}

fn parse_service_groups(
    attrs: &HashMap<String, Value>,
    id: &ResourceId,
) -> ProviderResult<Vec<ServiceGroup>> {
    let items = require_list(attrs, "service_groups", id)?;
    let mut groups = Vec::with_capacity(items.len());
    for item in items {
        let Value::Map(group) = item else {
            return Err(
                ProviderError::new("service_groups entries must be objects")
                    .for_resource(id.clone()),
            );
        };
        let compute = require_map(group, "compute", id)?;
        let disk = require_map(group, "disk", id)?;
        groups.push(ServiceGroup {
            node: Node {
                compute: Compute {
                    cpu: require_int(compute, "cpu", id)?,
                    ram: require_int(compute, "ram", id)?,
                },
                disk: Disk {
                    kind: require_str(disk, "type", id)?.to_string(),
                    storage: optional_int(disk, "storage"),
                    iops: optional_int(disk, "iops"),
                    autoexpansion: optional_bool(disk, "autoexpansion"),
                },
            },
            num_of_nodes: require_int(group, "num_of_nodes", id)?,
        });
    }
    Ok(groups)
}

fn into_state(id: &ResourceId, project_id: &str, cluster: &GetClusterResponse) -> State {
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
    if let Some(server) = &cluster.couchbase_server
        && let Some(version) = &server.version
    {
        attributes.insert(
            "couchbase_server_version".to_string(),
            Value::String(version.clone()),
        );
    }
    attributes.insert(
        "cloud_provider".to_string(),
        cloud_provider_value(&cluster.cloud_provider),
    );
    let mut availability = HashMap::new();
    availability.insert(
        "type".to_string(),
        Value::String(cluster.availability.kind.clone()),
    );
    attributes.insert("availability".to_string(), Value::Map(availability));
    let mut support = HashMap::new();
    support.insert(
        "plan".to_string(),
        Value::String(cluster.support.plan.clone()),
    );
    if let Some(timezone) = &cluster.support.timezone {
        support.insert("timezone".to_string(), Value::String(timezone.clone()));
    }
    attributes.insert("support".to_string(), Value::Map(support));
    attributes.insert(
        "service_groups".to_string(),
        Value::List(
            cluster
                .service_groups
                .iter()
                .map(service_group_value)
                .collect(),
        ),
    );
    if let Some(app_service_id) = &cluster.app_service_id {
        attributes.insert(
            "app_service_id".to_string(),
            Value::String(app_service_id.clone()),
        );
    }
    if let Some(audit) = &cluster.audit {
        attributes.insert("audit".to_string(), audit_value(audit));
    }

    State::existing(id.clone(), attributes)
        .with_identifier(format!("{}/{}", project_id, cluster.id))
}

pub(crate) fn cloud_provider_value(cloud_provider: &CloudProvider) -> Value {
    let mut map = HashMap::new();
    map.insert(
        "type".to_string(),
        Value::String(cloud_provider.kind.clone()),
    );
    map.insert(
        "region".to_string(),
        Value::String(cloud_provider.region.clone()),
    );
    map.insert(
        "cidr".to_string(),
        Value::String(cloud_provider.cidr.clone()),
    );
    Value::Map(map)
}

fn service_group_value(group: &ServiceGroup) -> Value {
    let mut compute = HashMap::new();
    compute.insert("cpu".to_string(), Value::Int(group.node.compute.cpu));
    compute.insert("ram".to_string(), Value::Int(group.node.compute.ram));

    let mut disk = HashMap::new();
    disk.insert(
        "type".to_string(),
        Value::String(group.node.disk.kind.clone()),
    );
    if let Some(storage) = group.node.disk.storage {
        disk.insert("storage".to_string(), Value::Int(storage));
    }
    if let Some(iops) = group.node.disk.iops {
        disk.insert("iops".to_string(), Value::Int(iops));
    }
    if let Some(autoexpansion) = group.node.disk.autoexpansion {
        disk.insert("autoexpansion".to_string(), Value::Bool(autoexpansion));
    }

    let mut map = HashMap::new();
    map.insert("compute".to_string(), Value::Map(compute));
    map.insert("disk".to_string(), Value::Map(disk));
    map.insert("num_of_nodes".to_string(), Value::Int(group.num_of_nodes));
    Value::Map(map)
}
