//! Capella provider - configuration and operation dispatch.

use std::time::Duration;

use auriga_core::provider::{ProviderError, ProviderResult};
use auriga_core::resource::{Resource, ResourceId, State};
use auriga_core::wait::WaitConfig;

use crate::client::CapellaClient;
use crate::resources;
use crate::schemas;

/// Capella management API endpoint used unless overridden.
pub const DEFAULT_HOST: &str = "https://cloudapi.cloud.couchbase.com";

const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

/// Explicit provider configuration. Handlers receive everything through the
/// provider they are called on; there is no global state.
#[derive(Clone)]
pub struct CapellaConfig {
    pub host: String,
    pub token: String,
    pub organization_id: String,
    pub request_timeout: Duration,
}

impl CapellaConfig {
    pub fn new(token: impl Into<String>, organization_id: impl Into<String>) -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            token: token.into(),
            organization_id: organization_id.into(),
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }

    /// Point the provider at a different endpoint (self-hosted gateways,
    /// mock servers in tests).
    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.host = host.into();
        self
    }
}

impl std::fmt::Debug for CapellaConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CapellaConfig")
            .field("host", &self.host)
            .field("token", &"[REDACTED]")
            .field("organization_id", &self.organization_id)
            .field("request_timeout", &self.request_timeout)
            .finish()
    }
}

/// Couchbase Capella provider
pub struct CapellaProvider {
    client: CapellaClient,
    host: String,
    organization_id: String,
    wait_override: Option<WaitConfig>,
}

impl CapellaProvider {
    pub fn new(config: CapellaConfig) -> ProviderResult<Self> {
        let client = CapellaClient::new(&config.token, config.request_timeout)
            .map_err(ProviderError::from)?;
        Ok(Self {
            client,
            host: config.host.trim_end_matches('/').to_string(),
            organization_id: config.organization_id,
            wait_override: None,
        })
    }

    /// Override every wait cycle's timing (for testing against mock servers).
    pub fn with_wait_config(mut self, config: WaitConfig) -> Self {
        self.wait_override = Some(config);
        self
    }

    pub fn organization_id(&self) -> &str {
        &self.organization_id
    }

    pub(crate) fn client(&self) -> &CapellaClient {
        &self.client
    }

    pub(crate) fn org_url(&self) -> String {
        format!("{}/v4/organizations/{}", self.host, self.organization_id)
    }

    pub(crate) fn wait_config(&self, default: WaitConfig) -> WaitConfig {
        self.wait_override.unwrap_or(default)
    }

    // =========================================================================
    // Resource Operations
    // =========================================================================

    pub async fn read_resource(
        &self,
        id: &ResourceId,
        identifier: Option<&str>,
    ) -> ProviderResult<State> {
        let Some(identifier) = identifier else {
            return Ok(State::not_found(id.clone()));
        };

        match id.resource_type.as_str() {
            "project" => resources::project::read(self, id, identifier).await,
            "cluster" => resources::cluster::read(self, id, identifier).await,
            "cluster_onoff" => resources::cluster_onoff::read(self, id, identifier).await,
            "app_service" => resources::app_service::read(self, id, identifier).await,
            "app_endpoint_activation" => resources::app_endpoint::read(self, id, identifier).await,
            "free_tier_cluster" => resources::free_tier_cluster::read(self, id, identifier).await,
            "audit_log_export" => resources::audit_log_export::read(self, id, identifier).await,
            other => Err(unknown_resource_type(other, id)),
        }
    }

    pub async fn create_resource(&self, resource: &Resource) -> ProviderResult<State> {
        self.validate(resource)?;

        let id = &resource.id;
        match id.resource_type.as_str() {
            "project" => resources::project::create(self, resource).await,
            "cluster" => resources::cluster::create(self, resource).await,
            "cluster_onoff" => resources::cluster_onoff::create(self, resource).await,
            "app_service" => resources::app_service::create(self, resource).await,
            "app_endpoint_activation" => resources::app_endpoint::create(self, resource).await,
            "free_tier_cluster" => resources::free_tier_cluster::create(self, resource).await,
            "audit_log_export" => resources::audit_log_export::create(self, resource).await,
            other => Err(unknown_resource_type(other, id)),
        }
    }

    pub async fn update_resource(
        &self,
        id: &ResourceId,
        identifier: &str,
        to: &Resource,
    ) -> ProviderResult<State> {
        self.validate(to)?;

        match id.resource_type.as_str() {
            "project" => resources::project::update(self, id, identifier, to).await,
            "cluster" => resources::cluster::update(self, id, identifier, to).await,
            "cluster_onoff" => resources::cluster_onoff::update(self, id, identifier, to).await,
            "app_service" => resources::app_service::update(self, id, identifier, to).await,
            "app_endpoint_activation" => {
                resources::app_endpoint::update(self, id, identifier, to).await
            }
            "free_tier_cluster" => {
                resources::free_tier_cluster::update(self, id, identifier, to).await
            }
            "audit_log_export" => {
                resources::audit_log_export::update(self, id, identifier, to).await
            }
            other => Err(unknown_resource_type(other, id)),
        }
    }

    pub async fn delete_resource(&self, id: &ResourceId, identifier: &str) -> ProviderResult<()> {
        match id.resource_type.as_str() {
            "project" => resources::project::delete(self, id, identifier).await,
            "cluster" => resources::cluster::delete(self, id, identifier).await,
            "cluster_onoff" => resources::cluster_onoff::delete(self, id, identifier).await,
            "app_service" => resources::app_service::delete(self, id, identifier).await,
            "app_endpoint_activation" => {
                resources::app_endpoint::delete(self, id, identifier).await
            }
            "free_tier_cluster" => {
                resources::free_tier_cluster::delete(self, id, identifier).await
            }
            "audit_log_export" => {
                resources::audit_log_export::delete(self, id, identifier).await
            }
            other => Err(unknown_resource_type(other, id)),
        }
    }

    /// Validate desired attributes against the declared schema before any
    /// API call is issued.
    fn validate(&self, resource: &Resource) -> ProviderResult<()> {
        let Some(schema) = schemas::schema_for(&resource.id.resource_type) else {
            return Ok(());
        };
        if let Err(errors) = schema.validate(&resource.attributes) {
            let details = errors
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join("; ");
            return Err(ProviderError::new(details).for_resource(resource.id.clone()));
        }
        Ok(())
    }
}

impl std::fmt::Debug for CapellaProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CapellaProvider")
            .field("host", &self.host)
            .field("organization_id", &self.organization_id)
            .finish()
    }
}

fn unknown_resource_type(resource_type: &str, id: &ResourceId) -> ProviderError {
    ProviderError::new(format!("Unknown resource type: {}", resource_type))
        .for_resource(id.clone())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_debug_does_not_expose_token() {
        let config = CapellaConfig::new("super-secret", "org-1");
        let debug_output = format!("{:?}", config);
        assert!(debug_output.contains("[REDACTED]"));
        assert!(!debug_output.contains("super-secret"));
    }

    #[test]
    fn org_url_normalizes_trailing_slash() {
        let provider = CapellaProvider::new(
            CapellaConfig::new("token", "org-1").with_host("https://api.example.com/"),
        )
        .unwrap();
        assert_eq!(
            provider.org_url(),
            "https://api.example.com/v4/organizations/org-1"
        );
    }

    #[tokio::test]
    async fn read_without_identifier_is_not_found() {
        let provider = CapellaProvider::new(CapellaConfig::new("token", "org-1")).unwrap();
        let id = ResourceId::new("cluster", "main");
        let state = provider.read_resource(&id, None).await.unwrap();
        assert!(!state.exists);
    }

    #[tokio::test]
    async fn unknown_resource_type_is_rejected() {
        let provider = CapellaProvider::new(CapellaConfig::new("token", "org-1")).unwrap();
        let id = ResourceId::new("bucket", "main");
        let err = provider.delete_resource(&id, "p/c").await.unwrap_err();
        assert!(err.to_string().contains("Unknown resource type"));
    }
}
