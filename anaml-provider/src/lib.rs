//! Anaml Provider
//!
//! Maps resource blocks onto the Anaml feature-engineering REST API.
//!
//! ## Module Structure
//!
//! - `wire` - Backend JSON records, one module per object family
//! - `mapper` - Variant composer/flattener and the per-resource mapper traits
//! - `codec` - List, set and map field conversions
//! - `vocab` - Fixed bidirectional token tables (roles, restriction targets)
//! - `resources` - One mapper per resource type and the type registry
//! - `client` - `AnamlApi` seam and its `reqwest` implementation
//! - `provider` - AnamlProvider lifecycle operations
//! - `config` - Provider block settings

pub mod client;
pub mod codec;
pub mod config;
pub mod error;
pub mod mapper;
pub mod provider;
pub mod resources;
pub mod vocab;
pub mod wire;

// Re-export main types
pub use client::{AnamlApi, HttpClient};
pub use config::ProviderConfig;
pub use error::{ClientError, ConfigError, MapError};
pub use provider::AnamlProvider;

use anaml_core::provider::{BoxFuture, Provider, ProviderResult, ResourceType};
use anaml_core::resource::{Resource, ResourceId, State};

impl AnamlProvider<HttpClient> {
    /// Build a provider from the provider block, talking HTTP to the backend
    pub fn from_config(config: ProviderConfig) -> Result<Self, ConfigError> {
        Ok(Self::new(HttpClient::new(config)?))
    }
}

// =============================================================================
// Provider Trait Implementation
// =============================================================================

impl<C: AnamlApi> Provider for AnamlProvider<C> {
    fn name(&self) -> &'static str {
        "anaml"
    }

    fn resource_types(&self) -> Vec<Box<dyn ResourceType>> {
        resources::resource_types()
    }

    fn data_source_types(&self) -> Vec<Box<dyn ResourceType>> {
        resources::data_source_types()
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
        Box::pin(async move { self.create_resource(resource).await })
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
        Box::pin(async move { self.update_resource(id, &identifier, to).await })
    }

    fn delete(&self, id: &ResourceId, identifier: &str) -> BoxFuture<'_, ProviderResult<()>> {
        let id = id.clone();
        let identifier = identifier.to_string();
        Box::pin(async move { self.delete_resource(&id, &identifier).await })
    }

    fn import(&self, id: &ResourceId, identifier: &str) -> BoxFuture<'_, ProviderResult<State>> {
        let id = id.clone();
        let identifier = identifier.to_string();
        Box::pin(async move { self.import_resource(&id, &identifier).await })
    }

    fn read_data_source(&self, resource: &Resource) -> BoxFuture<'_, ProviderResult<State>> {
        let resource = resource.clone();
        Box::pin(async move { AnamlProvider::read_data_source(self, &resource).await })
    }
}
