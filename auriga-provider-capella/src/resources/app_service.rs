//! App Service resource - manage the sync-gateway deployment of a cluster.

use std::collections::HashMap;
use std::time::Duration;

use auriga_core::provider::{ProviderError, ProviderResult};
use auriga_core::resource::{Resource, ResourceId, State, Value};
use auriga_core::wait::{WaitConfig, WaitOutcome, Waiter};
use reqwest::{Method, StatusCode};

use crate::api::app_service::{
    AppServiceState, CreateAppServiceRequest, CreateAppServiceResponse, GetAppServiceResponse,
    UpdateAppServiceRequest,
};
use crate::api::cluster::Compute;
use crate::client::EndpointCfg;
use crate::provider::CapellaProvider;
use crate::resources::{
    audit_value, marshal, optional_int, optional_str, require_int, require_map, require_str,
    split_identifier, timeout_error,
};

/// App service deployment runs on the same weight class as clusters.
const WAIT_PROVISIONING: WaitConfig = WaitConfig::new(
    Duration::from_secs(2 * 60),
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
    let cluster_id = require_str(attrs, "cluster_id", id)?;

    let compute = require_map(attrs, "compute", id)?;
    let request = CreateAppServiceRequest {
        name: require_str(attrs, "name", id)?.to_string(),
        description: optional_str(attrs, "description").map(str::to_string),
        nodes: optional_int(attrs, "nodes"),
        compute: Compute {
            cpu: require_int(compute, "cpu", id)?,
            ram: require_int(compute, "ram", id)?,
        },
        version: optional_str(attrs, "version").map(str::to_string),
    };

    let cfg = EndpointCfg::new(
        format!(
            "{}/projects/{}/clusters/{}/appservices",
            provider.org_url(),
            project_id,
            cluster_id
        ),
        Method::POST,
        StatusCode::CREATED,
    );
    let payload = marshal(&request, id)?;
    let response = provider
        .client()
        .execute_with_retry(&cfg, Some(&payload))
        .await
        .map_err(|e| ProviderError::from(e).for_resource(id.clone()))?;
    let created: CreateAppServiceResponse = response
        .json()
        .map_err(|e| ProviderError::from(e).for_resource(id.clone()))?;

    wait_for_final_state(
        provider,
        id,
        "app service creation",
        project_id,
        cluster_id,
        &created.id,
    )
    .await?;

    read_by_ids(provider, id, project_id, cluster_id, &created.id).await
}

pub(crate) async fn read(
    provider: &CapellaProvider,
    id: &ResourceId,
    identifier: &str,
) -> ProviderResult<State> {
    let parts = split_identifier(identifier, 3, id)?;
    let (project_id, cluster_id, app_service_id) = (parts[0], parts[1], parts[2]);

    match get_app_service(provider, project_id, cluster_id, app_service_id).await {
        Ok(app_service) => Ok(into_state(id, project_id, cluster_id, &app_service)),
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
    let parts = split_identifier(identifier, 3, id)?;
    let (project_id, cluster_id, app_service_id) = (parts[0], parts[1], parts[2]);

    let compute = require_map(&to.attributes, "compute", id)?;
    let request = UpdateAppServiceRequest {
        nodes: require_int(&to.attributes, "nodes", id)?,
        compute: Compute {
            cpu: require_int(compute, "cpu", id)?,
            ram: require_int(compute, "ram", id)?,
        },
    };

    let cfg = EndpointCfg::new(
        app_service_url(provider, project_id, cluster_id, app_service_id),
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
        "app service update",
        project_id,
        cluster_id,
        app_service_id,
    )
    .await?;

    read_by_ids(provider, id, project_id, cluster_id, app_service_id).await
}

pub(crate) async fn delete(
    provider: &CapellaProvider,
    id: &ResourceId,
    identifier: &str,
) -> ProviderResult<()> {
    let parts = split_identifier(identifier, 3, id)?;
    let (project_id, cluster_id, app_service_id) = (parts[0], parts[1], parts[2]);

    let cfg = EndpointCfg::new(
        app_service_url(provider, project_id, cluster_id, app_service_id),
        Method::DELETE,
        StatusCode::ACCEPTED,
    );
    match provider.client().execute_with_retry(&cfg, None).await {
        Ok(_) => {}
        Err(err) if err.is_not_found() => return Ok(()),
        Err(err) => return Err(ProviderError::from(err).for_resource(id.clone())),
    }

    let waiter = Waiter::new(
        "app service deletion",
        provider.wait_config(WAIT_PROVISIONING),
    )
    .for_deletion();
    let outcome = waiter
        .run(
            || fetch_state(provider, project_id, cluster_id, app_service_id),
            AppServiceState::is_final,
        )
        .await;

    match outcome {
        WaitOutcome::Reached(None) => Ok(()),
        WaitOutcome::Reached(Some(state)) => Err(ProviderError::new(format!(
            "could not delete app service, as current app service state: {}",
            state
        ))
        .for_resource(id.clone())),
        WaitOutcome::TimedOut { .. } => Err(timeout_error("app service deletion", id)),
        WaitOutcome::Failed(err) => Err(err.for_resource(id.clone())),
    }
}

async fn wait_for_final_state(
    provider: &CapellaProvider,
    id: &ResourceId,
    operation: &str,
    project_id: &str,
    cluster_id: &str,
    app_service_id: &str,
) -> ProviderResult<()> {
    let waiter = Waiter::new(operation, provider.wait_config(WAIT_PROVISIONING));
    let outcome = waiter
        .run(
            || fetch_state(provider, project_id, cluster_id, app_service_id),
            AppServiceState::is_final,
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

fn app_service_url(
    provider: &CapellaProvider,
    project_id: &str,
    cluster_id: &str,
    app_service_id: &str,
) -> String {
    format!(
        "{}/projects/{}/clusters/{}/appservices/{}",
        provider.org_url(),
        project_id,
        cluster_id,
        app_service_id
    )
}

async fn fetch_state(
    provider: &CapellaProvider,
    project_id: &str,
    cluster_id: &str,
    app_service_id: &str,
) -> ProviderResult<AppServiceState> {
    let app_service = get_app_service(provider, project_id, cluster_id, app_service_id).await?;
    Ok(app_service.current_state)
}

async fn get_app_service(
    provider: &CapellaProvider,
    project_id: &str,
    cluster_id: &str,
    app_service_id: &str,
) -> ProviderResult<GetAppServiceResponse> {
    let cfg = EndpointCfg::new(
        app_service_url(provider, project_id, cluster_id, app_service_id),
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
    app_service_id: &str,
) -> ProviderResult<State> {
    let app_service = get_app_service(provider, project_id, cluster_id, app_service_id)
        .await
        .map_err(|e| e.for_resource(id.clone()))?;
    Ok(into_state(id, project_id, cluster_id, &app_service))
}

fn into_state(
    id: &ResourceId,
    project_id: &str,
    cluster_id: &str,
    app_service: &GetAppServiceResponse,
) -> State {
    let mut attributes = HashMap::new();
    attributes.insert("id".to_string(), Value::String(app_service.id.clone()));
    attributes.insert(
        "project_id".to_string(),
        Value::String(project_id.to_string()),
    );
    attributes.insert(
        "cluster_id".to_string(),
        Value::String(cluster_id.to_string()),
    );
    attributes.insert("name".to_string(), Value::String(app_service.name.clone()));
    if !app_service.description.is_empty() {
        attributes.insert(
            "description".to_string(),
            Value::String(app_service.description.clone()),
        );
    }
    attributes.insert(
        "current_state".to_string(),
        Value::String(app_service.current_state.to_string()),
    );
    if !app_service.version.is_empty() {
        attributes.insert(
            "version".to_string(),
            Value::String(app_service.version.clone()),
        );
    }
    attributes.insert("nodes".to_string(), Value::Int(app_service.nodes));
    let mut compute = HashMap::new();
    compute.insert("cpu".to_string(), Value::Int(app_service.compute.cpu));
    compute.insert("ram".to_string(), Value::Int(app_service.compute.ram));
    attributes.insert("compute".to_string(), Value::Map(compute));
    if let Some(audit) = &app_service.audit {
        attributes.insert("audit".to_string(), audit_value(audit));
    }

    State::existing(id.clone(), attributes).with_identifier(format!(
        "{}/{}/{}",
        project_id, cluster_id, app_service.id
    ))
}
