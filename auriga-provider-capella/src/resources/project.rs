//! Project resource - plain synchronous CRUD, no wait cycle.

use std::collections::HashMap;

use auriga_core::provider::{ProviderError, ProviderResult};
use auriga_core::resource::{Resource, ResourceId, State, Value};
use reqwest::{Method, StatusCode};

use crate::api::project::{
    CreateProjectRequest, CreateProjectResponse, GetProjectResponse, UpdateProjectRequest,
};
use crate::client::EndpointCfg;
use crate::provider::CapellaProvider;
use crate::resources::{audit_value, marshal, optional_str, require_str};

pub(crate) async fn create(
    provider: &CapellaProvider,
    resource: &Resource,
) -> ProviderResult<State> {
    let id = &resource.id;
    let request = CreateProjectRequest {
        name: require_str(&resource.attributes, "name", id)?.to_string(),
        description: optional_str(&resource.attributes, "description").map(str::to_string),
    };

    let cfg = EndpointCfg::new(
        format!("{}/projects", provider.org_url()),
        Method::POST,
        StatusCode::CREATED,
    );
    let payload = marshal(&request, id)?;
    let response = provider
        .client()
        .execute_with_retry(&cfg, Some(&payload))
        .await
        .map_err(|e| ProviderError::from(e).for_resource(id.clone()))?;
    let created: CreateProjectResponse = response
        .json()
        .map_err(|e| ProviderError::from(e).for_resource(id.clone()))?;

    read(provider, id, &created.id).await
}

pub(crate) async fn read(
    provider: &CapellaProvider,
    id: &ResourceId,
    identifier: &str,
) -> ProviderResult<State> {
    let cfg = EndpointCfg::new(
        project_url(provider, identifier),
        Method::GET,
        StatusCode::OK,
    );
    let response = match provider.client().execute_with_retry(&cfg, None).await {
        Ok(response) => response,
        Err(err) if err.is_not_found() => return Ok(State::not_found(id.clone())),
        Err(err) => return Err(ProviderError::from(err).for_resource(id.clone())),
    };
    let project: GetProjectResponse = response
        .json()
        .map_err(|e| ProviderError::from(e).for_resource(id.clone()))?;

    Ok(into_state(id, &project))
}

pub(crate) async fn update(
    provider: &CapellaProvider,
    id: &ResourceId,
    identifier: &str,
    to: &Resource,
) -> ProviderResult<State> {
    let request = UpdateProjectRequest {
        name: require_str(&to.attributes, "name", id)?.to_string(),
        description: optional_str(&to.attributes, "description").map(str::to_string),
    };

    let cfg = EndpointCfg::new(
        project_url(provider, identifier),
        Method::PUT,
        StatusCode::NO_CONTENT,
    );
    let payload = marshal(&request, id)?;
    provider
        .client()
        .execute_with_retry(&cfg, Some(&payload))
        .await
        .map_err(|e| ProviderError::from(e).for_resource(id.clone()))?;

    read(provider, id, identifier).await
}

pub(crate) async fn delete(
    provider: &CapellaProvider,
    id: &ResourceId,
    identifier: &str,
) -> ProviderResult<()> {
    let cfg = EndpointCfg::new(
        project_url(provider, identifier),
        Method::DELETE,
        StatusCode::NO_CONTENT,
    );
    match provider.client().execute_with_retry(&cfg, None).await {
        Ok(_) => Ok(()),
        // Already gone remotely; deletion converges.
        Err(err) if err.is_not_found() => Ok(()),
        Err(err) => Err(ProviderError::from(err).for_resource(id.clone())),
    }
}

fn project_url(provider: &CapellaProvider, project_id: &str) -> String {
    format!("{}/projects/{}", provider.org_url(), project_id)
}

fn into_state(id: &ResourceId, project: &GetProjectResponse) -> State {
    let mut attributes = HashMap::new();
    attributes.insert("id".to_string(), Value::String(project.id.clone()));
    attributes.insert("name".to_string(), Value::String(project.name.clone()));
    if !project.description.is_empty() {
        attributes.insert(
            "description".to_string(),
            Value::String(project.description.clone()),
        );
    }
    if let Some(audit) = &project.audit {
        attributes.insert("audit".to_string(), audit_value(audit));
    }

    State::existing(id.clone(), attributes).with_identifier(project.id.clone())
}
