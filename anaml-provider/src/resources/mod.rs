//! Resource type registry
//!
//! One mapper per host resource type, plus the attributes every Anaml
//! object shares (`name`, `description`, `labels`, `attribute`).

pub mod access;
pub mod cluster;
pub mod connector;
pub mod destination;
pub mod entity;
pub mod feature;
pub mod feature_store;
pub mod source;
pub mod table;

use anaml_core::provider::ResourceType;
use anaml_core::resource::{Attributes, Value};
use anaml_core::schema::{AttributeSchema, AttributeType, ResourceSchema, types};

use crate::codec::{Block, get_str, key_values_to_set, strings_to_set};
use crate::error::MapError;
use crate::mapper::{DataSourceMapper, DynamicMapper};
use crate::wire::common::KeyValue;

/// Host-facing declaration of one resource or data source type
pub struct AnamlResourceType {
    name: &'static str,
    schema: ResourceSchema,
}

impl ResourceType for AnamlResourceType {
    fn name(&self) -> &'static str {
        self.name
    }

    fn schema(&self) -> ResourceSchema {
        self.schema.clone()
    }
}

/// Returns every managed resource mapper
pub fn mappers() -> Vec<Box<dyn DynamicMapper>> {
    vec![
        Box::new(entity::EntityMapper),
        Box::new(entity::EntityMappingMapper),
        Box::new(source::SourceMapper),
        Box::new(destination::DestinationMapper),
        Box::new(cluster::ClusterMapper),
        Box::new(table::TableMapper),
        Box::new(feature::FeatureMapper),
        Box::new(feature::FeatureSetMapper),
        Box::new(feature_store::FeatureStoreMapper),
        Box::new(access::AttributeRestrictionMapper),
        Box::new(access::LabelRestrictionMapper),
        Box::new(access::UserMapper),
        Box::new(access::UserGroupMapper),
        Box::new(access::WebhookMapper),
    ]
}

/// Returns every read-only lookup
pub fn data_sources() -> Vec<Box<dyn DataSourceMapper>> {
    vec![Box::new(cluster::ClusterLookup)]
}

/// Returns all resource types supported by this provider
pub fn resource_types() -> Vec<Box<dyn ResourceType>> {
    mappers()
        .iter()
        .map(|m| {
            Box::new(AnamlResourceType {
                name: m.type_name(),
                schema: m.resource_schema(),
            }) as Box<dyn ResourceType>
        })
        .collect()
}

pub fn data_source_types() -> Vec<Box<dyn ResourceType>> {
    data_sources()
        .iter()
        .map(|d| {
            Box::new(AnamlResourceType {
                name: d.type_name(),
                schema: d.schema(),
            }) as Box<dyn ResourceType>
        })
        .collect()
}

// =============================================================================
// Shared Attributes
// =============================================================================

/// Description as sent to the backend; unset becomes the empty string
pub(crate) fn description(attrs: &Attributes) -> Result<String, MapError> {
    Ok(get_str(attrs, "description")?.unwrap_or_default())
}

/// Description as stored in state; the empty string reads back as unset
pub(crate) fn description_value(description: &str) -> Value {
    if description.is_empty() {
        Value::Null
    } else {
        Value::string(description)
    }
}

/// Name, description, labels and attributes of a flattened object
pub(crate) fn metadata(
    name: &str,
    description: &str,
    labels: &[String],
    attributes: &[KeyValue],
) -> Block {
    Block::new()
        .string("name", name)
        .set("description", description_value(description))
        .set("labels", strings_to_set(labels))
        .set("attribute", key_values_to_set(attributes))
}

pub(crate) fn named_schema(type_name: &str) -> ResourceSchema {
    ResourceSchema::new(type_name)
        .attribute(AttributeSchema::new("name", types::anaml_name()).required())
        .attribute(AttributeSchema::new("description", AttributeType::String))
}

/// Adds `labels` and repeated `attribute` blocks
pub(crate) fn with_labels(schema: ResourceSchema) -> ResourceSchema {
    let attribute = ResourceSchema::new("attribute")
        .attribute(AttributeSchema::new("key", types::not_whitespace()).required())
        .attribute(AttributeSchema::new("value", types::not_whitespace()).required());
    schema
        .attribute(
            AttributeSchema::new("labels", AttributeType::Set(Box::new(types::not_whitespace())))
                .with_description("Labels to attach to the object"),
        )
        .attribute(
            AttributeSchema::new("attribute", AttributeType::block_list(attribute))
                .with_description("Attributes (key value pairs) to attach to the object"),
        )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn type_names_are_unique() {
        let names: Vec<&str> = mappers().iter().map(|m| m.type_name()).collect();
        let unique: HashSet<&str> = names.iter().copied().collect();
        assert_eq!(names.len(), unique.len());
        assert_eq!(names.len(), 14);
    }

    #[test]
    fn every_type_is_prefixed() {
        for m in mappers() {
            assert!(m.type_name().starts_with("anaml_"), "{}", m.type_name());
        }
        for rt in data_source_types() {
            assert!(rt.name().starts_with("anaml_"));
        }
    }

    #[test]
    fn empty_description_reads_as_unset() {
        assert_eq!(description_value(""), Value::Null);
        assert_eq!(description_value("x"), Value::string("x"));
        assert_eq!(description(&Attributes::new()).unwrap(), "");
    }
}
