//! App Endpoint activation resource - bring an app endpoint online/offline.
//!
//! Activation is toggled with POST (online) and DELETE (offline) against the
//! activationStatus endpoint; the observed state comes from the app
//! endpoint's own GET and is compared case-insensitively against
//! "Online"/"Offline".

use std::collections::HashMap;
use std::time::Duration;

use auriga_core::provider::{ProviderError, ProviderResult};
use auriga_core::resource::{Resource, ResourceId, State, Value};
use auriga_core::wait::{WaitConfig, WaitOutcome, Waiter};
use reqwest::{Method, StatusCode};

use crate::api::app_endpoint::{GetAppEndpointResponse, STATE_OFFLINE, STATE_ONLINE};
use crate::client::EndpointCfg;
use crate::provider::CapellaProvider;
use crate::resources::{optional_bool, require_str, split_identifier, timeout_error};

const WAIT_ACTIVATION: WaitConfig = WaitConfig::new(
    Duration::from_secs(5),
    Duration::from_secs(3),
    Duration::from_secs(20 * 60),
);

pub(crate) async fn create(
    provider: &CapellaProvider,
    resource: &Resource,
) -> ProviderResult<State> {
    let id = &resource.id;
    let attrs = &resource.attributes;
    let project_id = require_str(attrs, "project_id", id)?;
    let cluster_id = require_str(attrs, "cluster_id", id)?;
    let app_service_id = require_str(attrs, "app_service_id", id)?;
    let endpoint_name = require_str(attrs, "app_endpoint_name", id)?;
    let online = optional_bool(attrs, "online").unwrap_or(true);

    switch_activation(
        provider,
        id,
        project_id,
        cluster_id,
        app_service_id,
        endpoint_name,
        online,
    )
    .await?;

    Ok(build_state(
        id,
        project_id,
        cluster_id,
        app_service_id,
        endpoint_name,
        online,
    ))
}

pub(crate) async fn read(
    provider: &CapellaProvider,
    id: &ResourceId,
    identifier: &str,
) -> ProviderResult<State> {
    let parts = split_identifier(identifier, 4, id)?;
    let (project_id, cluster_id, app_service_id, endpoint_name) =
        (parts[0], parts[1], parts[2], parts[3]);

    match get_app_endpoint(provider, project_id, cluster_id, app_service_id, endpoint_name).await {
        Ok(endpoint) => {
            let online = endpoint
                .activation_state()
                .map(|state| state.eq_ignore_ascii_case(STATE_ONLINE))
                .unwrap_or(false);
            Ok(build_state(
                id,
                project_id,
                cluster_id,
                app_service_id,
                endpoint_name,
                online,
            ))
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
    let parts = split_identifier(identifier, 4, id)?;
    let (project_id, cluster_id, app_service_id, endpoint_name) =
        (parts[0], parts[1], parts[2], parts[3]);
    let online = optional_bool(&to.attributes, "online").unwrap_or(true);

    switch_activation(
        provider,
        id,
        project_id,
        cluster_id,
        app_service_id,
        endpoint_name,
        online,
    )
    .await?;

    Ok(build_state(
        id,
        project_id,
        cluster_id,
        app_service_id,
        endpoint_name,
        online,
    ))
}

/// Removing the activation resource takes the endpoint offline.
pub(crate) async fn delete(
    provider: &CapellaProvider,
    id: &ResourceId,
    identifier: &str,
) -> ProviderResult<()> {
    let parts = split_identifier(identifier, 4, id)?;
    let (project_id, cluster_id, app_service_id, endpoint_name) =
        (parts[0], parts[1], parts[2], parts[3]);

    switch_activation(
        provider,
        id,
        project_id,
        cluster_id,
        app_service_id,
        endpoint_name,
        false,
    )
    .await
}

async fn switch_activation(
    provider: &CapellaProvider,
    id: &ResourceId,
    project_id: &str,
    cluster_id: &str,
    app_service_id: &str,
    endpoint_name: &str,
    online: bool,
) -> ProviderResult<()> {
    let (method, operation, desired) = if online {
        (Method::POST, "app endpoint online", STATE_ONLINE)
    } else {
        (Method::DELETE, "app endpoint offline", STATE_OFFLINE)
    };

    let cfg = EndpointCfg::new(
        format!(
            "{}/activationStatus",
            endpoint_url(provider, project_id, cluster_id, app_service_id, endpoint_name)
        ),
        method,
        StatusCode::ACCEPTED,
    );
    provider
        .client()
        .execute_with_retry(&cfg, None)
        .await
        .map_err(|e| ProviderError::from(e).for_resource(id.clone()))?;

    let waiter = Waiter::new(operation, provider.wait_config(WAIT_ACTIVATION));
    let outcome = waiter
        .run(
            || fetch_activation_state(provider, project_id, cluster_id, app_service_id, endpoint_name),
            |state: &String| state.eq_ignore_ascii_case(desired),
        )
        .await;

    match outcome {
        WaitOutcome::Reached(_) => Ok(()),
        WaitOutcome::TimedOut { .. } => Err(timeout_error(operation, id)),
        WaitOutcome::Failed(err) => Err(err.for_resource(id.clone())),
    }
}

fn endpoint_url(
    provider: &CapellaProvider,
    project_id: &str,
    cluster_id: &str,
    app_service_id: &str,
    endpoint_name: &str,
) -> String {
    format!(
        "{}/projects/{}/clusters/{}/appservices/{}/appEndpoints/{}",
        provider.org_url(),
        project_id,
        cluster_id,
        app_service_id,
        endpoint_name
    )
}

async fn fetch_activation_state(
    provider: &CapellaProvider,
    project_id: &str,
    cluster_id: &str,
    app_service_id: &str,
    endpoint_name: &str,
) -> ProviderResult<String> {
    let endpoint =
        get_app_endpoint(provider, project_id, cluster_id, app_service_id, endpoint_name).await?;
    Ok(endpoint.activation_state().unwrap_or_default().to_string())
}

async fn get_app_endpoint(
    provider: &CapellaProvider,
    project_id: &str,
    cluster_id: &str,
    app_service_id: &str,
    endpoint_name: &str,
) -> ProviderResult<GetAppEndpointResponse> {
    let cfg = EndpointCfg::new(
        endpoint_url(provider, project_id, cluster_id, app_service_id, endpoint_name),
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

fn build_state(
    id: &ResourceId,
    project_id: &str,
    cluster_id: &str,
    app_service_id: &str,
    endpoint_name: &str,
    online: bool,
) -> State {
    let mut attributes = HashMap::new();
    attributes.insert(
        "project_id".to_string(),
        Value::String(project_id.to_string()),
    );
    attributes.insert(
        "cluster_id".to_string(),
        Value::String(cluster_id.to_string()),
    );
    attributes.insert(
        "app_service_id".to_string(),
        Value::String(app_service_id.to_string()),
    );
    attributes.insert(
        "app_endpoint_name".to_string(),
        Value::String(endpoint_name.to_string()),
    );
    attributes.insert("online".to_string(), Value::Bool(online));

    State::existing(id.clone(), attributes).with_identifier(format!(
        "{}/{}/{}/{}",
        project_id, cluster_id, app_service_id, endpoint_name
    ))
}
