//! Auriga Couchbase Capella Provider
//!
//! Maps Auriga resource operations onto the Capella v4 management REST API.
//!
//! ## Module Structure
//!
//! - `client` - HTTP execution with auth, status validation, and retry
//! - `error` - Capella API error envelope and client error taxonomy
//! - `api` - request/response payloads and lifecycle-state enums
//! - `provider` - CapellaProvider configuration and dispatch
//! - `resources` - per-resource Create/Read/Update/Delete handlers
//! - `schemas` - declared resource schemas

pub mod api;
pub mod client;
pub mod error;
pub mod provider;
pub(crate) mod resources;
pub mod schemas;

// Re-export main types
pub use client::{ApiResponse, CapellaClient, EndpointCfg};
pub use error::{ApiError, ClientError};
pub use provider::{CapellaConfig, CapellaProvider, DEFAULT_HOST};

use auriga_core::provider::{BoxFuture, Provider, ProviderResult, ResourceType};
use auriga_core::resource::{Resource, ResourceId, State};

// =============================================================================
// Provider Trait Implementation
// =============================================================================

impl Provider for CapellaProvider {
    fn name(&self) -> &'static str {
        "capella"
    }

    fn resource_types(&self) -> Vec<Box<dyn ResourceType>> {
        schemas::resource_types()
    }

    fn read(
        &self,
        id: &ResourceId,
        identifier: Option<&str>,
    ) -> BoxFuture<'_, ProviderResult<State>> {
        let id = id.clone();
        let identifier = identifier.map(|s| s.to_string());
        Box::pin(async move { self.read_resource(&id, identifier.as_deref()).await })
    }

    fn create(&self, resource: &Resource) -> BoxFuture<'_, ProviderResult<State>> {
        let resource = resource.clone();
        Box::pin(async move { self.create_resource(&resource).await })
    }

    fn update(
        &self,
        id: &ResourceId,
        identifier: &str,
        _from: &State,
        to: &Resource,
    ) -> BoxFuture<'_, ProviderResult<State>> {
        let id = id.clone();
        let identifier = identifier.to_string();
        let to = to.clone();
        Box::pin(async move { self.update_resource(&id, &identifier, &to).await })
    }

    fn delete(&self, id: &ResourceId, identifier: &str) -> BoxFuture<'_, ProviderResult<()>> {
        let id = id.clone();
        let identifier = identifier.to_string();
        Box::pin(async move { self.delete_resource(&id, &identifier).await })
    }
}
