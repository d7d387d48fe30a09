//! Anaml Provider implementation
//!
//! Drives the lifecycle of one resource instance at a time: compose the
//! configured attributes into a backend record, call the REST API, and
//! flatten what the backend returns back into state.

use anaml_core::provider::{ProviderError, ProviderResult};
use anaml_core::resource::{Resource, ResourceId, State};
use log::{debug, info};

use crate::client::AnamlApi;
use crate::codec::{get_str, parse_identifier};
use crate::error::ClientError;
use crate::mapper::{DataSourceMapper, DynamicMapper};
use crate::resources::{data_sources, mappers};

/// Anaml Provider
pub struct AnamlProvider<C> {
    client: C,
    mappers: Vec<Box<dyn DynamicMapper>>,
    data_sources: Vec<Box<dyn DataSourceMapper>>,
}

impl<C: AnamlApi> AnamlProvider<C> {
    /// Create a provider talking to the backend through `client`
    pub fn new(client: C) -> Self {
        Self {
            client,
            mappers: mappers(),
            data_sources: data_sources(),
        }
    }

    pub fn client(&self) -> &C {
        &self.client
    }

    fn mapper(&self, id: &ResourceId) -> ProviderResult<&dyn DynamicMapper> {
        self.mappers
            .iter()
            .find(|m| m.type_name() == id.resource_type)
            .map(|m| m.as_ref())
            .ok_or_else(|| {
                ProviderError::configuration(format!(
                    "Unknown resource type: {}",
                    id.resource_type
                ))
                .for_resource(id.clone())
            })
    }

    fn data_source(&self, id: &ResourceId) -> ProviderResult<&dyn DataSourceMapper> {
        self.data_sources
            .iter()
            .find(|d| d.type_name() == id.resource_type)
            .map(|d| d.as_ref())
            .ok_or_else(|| {
                ProviderError::configuration(format!(
                    "Unknown data source type: {}",
                    id.resource_type
                ))
                .for_resource(id.clone())
            })
    }

    // =========================================================================
    // Resource Operations
    // =========================================================================

    /// Read a resource by its backend identifier
    pub async fn read_resource(
        &self,
        id: &ResourceId,
        identifier: Option<&str>,
    ) -> ProviderResult<State> {
        let mapper = self.mapper(id)?;

        let Some(identifier) = identifier.filter(|s| !s.is_empty()) else {
            return Ok(State::not_found(id.clone()));
        };
        let object_id = parse_identifier("id", identifier)
            .map_err(|e| ProviderError::from(e).for_resource(id.clone()))?;

        let json = match self.client.get(mapper.collection(), object_id).await {
            Ok(Some(json)) => json,
            Ok(None) => {
                info!("{} ({}) no longer exists", id, object_id);
                return Ok(State::not_found(id.clone()));
            }
            Err(e) => return Err(ProviderError::from(e).for_resource(id.clone())),
        };

        let attributes = mapper
            .flatten_json(json)
            .map_err(|e| ProviderError::from(e).for_resource(id.clone()))?;
        debug!("Read {} ({})", id, object_id);
        Ok(State::existing(id.clone(), attributes).with_identifier(object_id.to_string()))
    }

    /// Create a resource and read back what the backend stored
    pub async fn create_resource(&self, resource: Resource) -> ProviderResult<State> {
        let id = &resource.id;
        let mapper = self.mapper(id)?;
        let body = mapper
            .compose_json(&resource.attributes)
            .map_err(|e| ProviderError::from(e).for_resource(id.clone()))?;

        let object_id = self
            .client
            .create(mapper.collection(), &body)
            .await
            .map_err(|e| ProviderError::from(e).for_resource(id.clone()))?;
        info!("Created {} ({})", id, object_id);

        self.read_resource(id, Some(&object_id.to_string())).await
    }

    /// Update a resource in place
    pub async fn update_resource(
        &self,
        id: ResourceId,
        identifier: &str,
        to: Resource,
    ) -> ProviderResult<State> {
        let mapper = self.mapper(&id)?;
        let object_id = parse_identifier("id", identifier)
            .map_err(|e| ProviderError::from(e).for_resource(id.clone()))?;
        let mut body = mapper
            .compose_json(&to.attributes)
            .map_err(|e| ProviderError::from(e).for_resource(id.clone()))?;
        if let Some(record) = body.as_object_mut() {
            record.insert("id".to_string(), serde_json::Value::from(object_id));
        }

        self.client
            .update(mapper.collection(), object_id, &body)
            .await
            .map_err(|e| ProviderError::from(e).for_resource(id.clone()))?;
        info!("Updated {} ({})", id, object_id);

        self.read_resource(&id, Some(identifier)).await
    }

    /// Delete a resource; an object that is already gone counts as deleted
    pub async fn delete_resource(&self, id: &ResourceId, identifier: &str) -> ProviderResult<()> {
        let mapper = self.mapper(id)?;
        let object_id = parse_identifier("id", identifier)
            .map_err(|e| ProviderError::from(e).for_resource(id.clone()))?;

        match self.client.delete(mapper.collection(), object_id).await {
            Ok(()) => {
                info!("Deleted {} ({})", id, object_id);
                Ok(())
            }
            Err(ClientError::NotFound(_)) => {
                info!("{} ({}) was already deleted", id, object_id);
                Ok(())
            }
            Err(e) => Err(ProviderError::from(e).for_resource(id.clone())),
        }
    }

    /// Import an existing object; unlike a plain read, absence is an error
    pub async fn import_resource(&self, id: &ResourceId, identifier: &str) -> ProviderResult<State> {
        let state = self.read_resource(id, Some(identifier)).await?;
        if !state.exists {
            return Err(ProviderError::configuration(format!(
                "Cannot import non-existent remote object with id {}",
                identifier
            ))
            .for_resource(id.clone()));
        }
        info!("Imported {} ({})", id, identifier);
        Ok(state)
    }

    /// Look a data source up by its configured `name`
    pub async fn read_data_source(&self, resource: &Resource) -> ProviderResult<State> {
        let id = &resource.id;
        let lookup = self.data_source(id)?;
        let name = get_str(&resource.attributes, "name")
            .map_err(|e| ProviderError::from(e).for_resource(id.clone()))?
            .ok_or_else(|| {
                ProviderError::configuration("Data source lookup requires 'name'")
                    .for_resource(id.clone())
            })?;

        let Some(json) = self
            .client
            .find_by_name(lookup.collection(), &name)
            .await
            .map_err(|e| ProviderError::from(e).for_resource(id.clone()))?
        else {
            debug!("No {} named '{}'", lookup.collection(), name);
            return Ok(State::not_found(id.clone()));
        };

        let identifier = json.get("id").and_then(serde_json::Value::as_i64);
        let attributes = lookup
            .flatten_json(json)
            .map_err(|e| ProviderError::from(e).for_resource(id.clone()))?;
        let state = State::existing(id.clone(), attributes);
        Ok(match identifier {
            Some(identifier) => state.with_identifier(identifier.to_string()),
            None => state,
        })
    }
}
