//! anaml_entity and anaml_entity_mapping resources
//!
//! A base entity is keyed by `default_column`; a composite entity lists the
//! entities it is derived from. The two forms are exclusive.

use anaml_core::resource::{Attributes, Value};
use anaml_core::schema::{AttributeSchema, AttributeType, ResourceSchema, types};

use super::{description, metadata, named_schema, with_labels};
use crate::codec::{
    Block, get_bool, identifier_list, identifier_value, identifiers_to_list, key_values,
    labels, non_empty_str, required_identifier, required_str,
};
use crate::error::MapError;
use crate::mapper::ResourceMapper;
use crate::wire::entity::{Entity, EntityKind, EntityMapping};

const REQUIRED_TYPES: &[&str] = &["string", "integer", "long", "binary"];

/// State value for a required type the backend describes structurally
const COMPLEX_TYPE: &str = "Complex Type";

pub struct EntityMapper;

impl ResourceMapper for EntityMapper {
    type Wire = Entity;

    const TYPE_NAME: &'static str = "anaml_entity";
    const COLLECTION: &'static str = "entity";

    fn schema(&self) -> ResourceSchema {
        let schema = named_schema(Self::TYPE_NAME)
            .attribute(
                AttributeSchema::new("default_column", AttributeType::String)
                    .exactly_one_of(&["default_column", "entities"]),
            )
            .attribute(
                AttributeSchema::new("required_type", AttributeType::one_of(REQUIRED_TYPES))
                    .conflicts_with(&["entities"])
                    .with_description(
                        "The data type the entity is encoded as. If set, tables' entity columns must be of this type",
                    ),
            )
            .attribute(
                AttributeSchema::new("entities", types::identifier_list())
                    .exactly_one_of(&["default_column", "entities"])
                    .with_description("Entities from which this composite entity is derived"),
            );
        with_labels(schema).with_description("An item in the business domain, such as a customer")
    }

    fn compose(&self, attrs: &Attributes) -> Result<Entity, MapError> {
        let kind = match non_empty_str(attrs, "default_column")? {
            Some(default_column) => EntityKind::Base {
                default_column,
                required_type: non_empty_str(attrs, "required_type")?.map(serde_json::Value::String),
            },
            None => EntityKind::Composite {
                entities: identifier_list(attrs, "entities")?,
            },
        };
        Ok(Entity {
            id: None,
            name: required_str(attrs, "name")?,
            description: description(attrs)?,
            kind,
            labels: labels(attrs)?,
            attributes: key_values(attrs, "attribute")?,
        })
    }

    fn flatten(&self, entity: &Entity) -> Result<Attributes, MapError> {
        let block = metadata(
            &entity.name,
            &entity.description,
            &entity.labels,
            &entity.attributes,
        );
        let block = match &entity.kind {
            EntityKind::Base {
                default_column,
                required_type,
            } => {
                let required_type = match required_type {
                    None | Some(serde_json::Value::Null) => Value::Null,
                    Some(serde_json::Value::String(name)) => Value::string(name),
                    Some(_) => Value::string(COMPLEX_TYPE),
                };
                block
                    .string("default_column", default_column)
                    .set("required_type", required_type)
                    .set("entities", Value::Null)
            }
            EntityKind::Composite { entities } => block
                .set("default_column", Value::Null)
                .set("required_type", Value::Null)
                .set("entities", identifiers_to_list(entities)),
        };
        Ok(block.build())
    }
}

pub struct EntityMappingMapper;

impl ResourceMapper for EntityMappingMapper {
    type Wire = EntityMapping;

    const TYPE_NAME: &'static str = "anaml_entity_mapping";
    const COLLECTION: &'static str = "entity-mapping";

    fn schema(&self) -> ResourceSchema {
        ResourceSchema::new(Self::TYPE_NAME)
            .attribute(AttributeSchema::new("from", types::identifier()).required())
            .attribute(AttributeSchema::new("to", types::identifier()).required())
            .attribute(
                AttributeSchema::new("mapping", types::identifier())
                    .required()
                    .with_description("Feature producing the `to` entity for each `from` entity"),
            )
            .attribute(AttributeSchema::new("one_to_many", AttributeType::Bool))
    }

    fn compose(&self, attrs: &Attributes) -> Result<EntityMapping, MapError> {
        Ok(EntityMapping {
            id: None,
            from: required_identifier(attrs, "from")?,
            to: required_identifier(attrs, "to")?,
            mapping: required_identifier(attrs, "mapping")?,
            one_to_many: get_bool(attrs, "one_to_many")?,
        })
    }

    fn flatten(&self, mapping: &EntityMapping) -> Result<Attributes, MapError> {
        Ok(Block::new()
            .set("from", identifier_value(Some(mapping.from)))
            .set("to", identifier_value(Some(mapping.to)))
            .set("mapping", identifier_value(Some(mapping.mapping)))
            .set("one_to_many", Value::opt_bool(mapping.one_to_many))
            .build())
    }
}
