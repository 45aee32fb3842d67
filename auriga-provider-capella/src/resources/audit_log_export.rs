//! Audit-log export resource - request an export job and wait for it to
//! settle.
//!
//! Export jobs are create-only: the API offers no update or delete, and the
//! compressed archive expires server-side. Removing the resource only drops
//! it from local state.

use std::collections::HashMap;
use std::time::Duration;

use auriga_core::provider::{ProviderError, ProviderResult};
use auriga_core::resource::{Resource, ResourceId, State, Value};
use auriga_core::wait::{WaitConfig, WaitOutcome, Waiter};
use reqwest::{Method, StatusCode};

use crate::api::audit_log_export::{
    CreateAuditLogExportRequest, CreateAuditLogExportResponse, ExportStatus,
    GetAuditLogExportResponse,
};
use crate::client::EndpointCfg;
use crate::provider::CapellaProvider;
use crate::resources::{marshal, require_str, split_identifier, timeout_error};

const WAIT_EXPORT: WaitConfig = WaitConfig::new(
    Duration::from_secs(10),
    Duration::from_secs(3),
    Duration::from_secs(30 * 60),
);

pub(crate) async fn create(
    provider: &CapellaProvider,
    resource: &Resource,
) -> ProviderResult<State> {
    let id = &resource.id;
    let attrs = &resource.attributes;
    let project_id = require_str(attrs, "project_id", id)?;
    let cluster_id = require_str(attrs, "cluster_id", id)?;
    let request = CreateAuditLogExportRequest {
        start: require_str(attrs, "start", id)?.to_string(),
        end: require_str(attrs, "end", id)?.to_string(),
    };

    let cfg = EndpointCfg::new(
        format!(
            "{}/projects/{}/clusters/{}/auditLogExports",
            provider.org_url(),
            project_id,
            cluster_id
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
    let created: CreateAuditLogExportResponse = response
        .json()
        .map_err(|e| ProviderError::from(e).for_resource(id.clone()))?;

    let waiter = Waiter::new("audit log export", provider.wait_config(WAIT_EXPORT));
    let outcome = waiter
        .run(
            || fetch_status(provider, project_id, cluster_id, &created.export_id),
            ExportStatus::is_final,
        )
        .await;

    match outcome {
        WaitOutcome::Reached(Some(ExportStatus::Failed)) => {
            return Err(
                ProviderError::new("audit log export job ended in state 'failed'")
                    .for_resource(id.clone()),
            );
        }
        WaitOutcome::Reached(_) => {}
        WaitOutcome::TimedOut { .. } => return Err(timeout_error("audit log export", id)),
        WaitOutcome::Failed(err) => return Err(err.for_resource(id.clone())),
    }

    read_by_ids(provider, id, project_id, cluster_id, &created.export_id).await
}

pub(crate) async fn read(
    provider: &CapellaProvider,
    id: &ResourceId,
    identifier: &str,
) -> ProviderResult<State> {
    let parts = split_identifier(identifier, 3, id)?;
    let (project_id, cluster_id, export_id) = (parts[0], parts[1], parts[2]);

    match get_export(provider, project_id, cluster_id, export_id).await {
        Ok(job) => Ok(into_state(id, project_id, cluster_id, &job)),
        Err(err) if err.is_not_found() => Ok(State::not_found(id.clone())),
        Err(err) => Err(err.for_resource(id.clone())),
    }
}

pub(crate) async fn update(
    _provider: &CapellaProvider,
    id: &ResourceId,
    _identifier: &str,
    _to: &Resource,
) -> ProviderResult<State> {
    Err(
        ProviderError::new("audit log export jobs cannot be updated, delete and recreate")
            .for_resource(id.clone()),
    )
}

/// The remote job cannot be cancelled or removed; only local state is
/// dropped.
pub(crate) async fn delete(
    _provider: &CapellaProvider,
    _id: &ResourceId,
    _identifier: &str,
) -> ProviderResult<()> {
    Ok(())
}

fn export_url(
    provider: &CapellaProvider,
    project_id: &str,
    cluster_id: &str,
    export_id: &str,
) -> String {
    format!(
        "{}/projects/{}/clusters/{}/auditLogExports/{}",
        provider.org_url(),
        project_id,
        cluster_id,
        export_id
    )
}

async fn fetch_status(
    provider: &CapellaProvider,
    project_id: &str,
    cluster_id: &str,
    export_id: &str,
) -> ProviderResult<ExportStatus> {
    let job = get_export(provider, project_id, cluster_id, export_id).await?;
    Ok(job.status)
}

async fn get_export(
    provider: &CapellaProvider,
    project_id: &str,
    cluster_id: &str,
    export_id: &str,
) -> ProviderResult<GetAuditLogExportResponse> {
    let cfg = EndpointCfg::new(
        export_url(provider, project_id, cluster_id, export_id),
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
    export_id: &str,
) -> ProviderResult<State> {
    let job = get_export(provider, project_id, cluster_id, export_id)
        .await
        .map_err(|e| e.for_resource(id.clone()))?;
    Ok(into_state(id, project_id, cluster_id, &job))
}

fn into_state(
    id: &ResourceId,
    project_id: &str,
    cluster_id: &str,
    job: &GetAuditLogExportResponse,
) -> State {
    let mut attributes = HashMap::new();
    attributes.insert(
        "export_id".to_string(),
        Value::String(job.audit_log_export_id.clone()),
    );
    attributes.insert(
        "project_id".to_string(),
        Value::String(project_id.to_string()),
    );
    attributes.insert(
        "cluster_id".to_string(),
        Value::String(cluster_id.to_string()),
    );
    attributes.insert("status".to_string(), Value::String(job.status.to_string()));
    attributes.insert("start".to_string(), Value::String(job.start.clone()));
    attributes.insert("end".to_string(), Value::String(job.end.clone()));
    if !job.created_at.is_empty() {
        attributes.insert(
            "created_at".to_string(),
            Value::String(job.created_at.clone()),
        );
    }
    if let Some(url) = &job.audit_log_download_url {
        attributes.insert(
            "audit_log_download_url".to_string(),
            Value::String(url.clone()),
        );
    }
    if let Some(expiration) = &job.expiration {
        attributes.insert("expiration".to_string(), Value::String(expiration.clone()));
    }

    State::existing(id.clone(), attributes).with_identifier(format!(
        "{}/{}/{}",
        project_id, cluster_id, job.audit_log_export_id
    ))
}
