//! anaml_table resource
//!
//! Root tables point at a location inside a source, views are SQL over
//! other tables and pivots re-key features through an entity mapping.

use anaml_core::resource::{Attributes, Value};
use anaml_core::schema::{AttributeSchema, AttributeType, ResourceSchema, types};

use super::{description, metadata, named_schema, with_labels};
use crate::codec::{
    Block, get_str, identifier_list, identifier_value, identifiers_to_list, identifiers_to_set,
    key_values, labels, required_identifier, required_str, single_block, string_map,
    string_map_value,
};
use crate::error::MapError;
use crate::mapper::{
    ResourceMapper, Variant, flatten_variant, require_variant, undeclared_block,
};
use crate::wire::table::{EventDescription, SourceReference, Table, TableKind, TimestampInfo};

const TABLE_BLOCKS: &[&str] = &["root", "view", "pivot"];
const LOCATION_BLOCKS: &[&str] = &["folder", "table", "topic"];

pub struct TableMapper;

impl ResourceMapper for TableMapper {
    type Wire = Table;

    const TYPE_NAME: &'static str = "anaml_table";
    const COLLECTION: &'static str = "table";

    fn schema(&self) -> ResourceSchema {
        let folder = ResourceSchema::new("folder")
            .attribute(AttributeSchema::new("source", types::identifier()).required())
            .attribute(AttributeSchema::new("path", types::not_whitespace()).required());
        let table = ResourceSchema::new("table")
            .attribute(AttributeSchema::new("source", types::identifier()).required())
            .attribute(AttributeSchema::new("table_name", types::not_whitespace()).required());
        let topic = ResourceSchema::new("topic")
            .attribute(AttributeSchema::new("source", types::identifier()).required())
            .attribute(AttributeSchema::new("topic", types::not_whitespace()).required());
        let root = ResourceSchema::new("root")
            .attribute(
                AttributeSchema::new("folder", AttributeType::single_block(folder))
                    .exactly_one_of(LOCATION_BLOCKS),
            )
            .attribute(
                AttributeSchema::new("table", AttributeType::single_block(table))
                    .exactly_one_of(LOCATION_BLOCKS),
            )
            .attribute(
                AttributeSchema::new("topic", AttributeType::single_block(topic))
                    .exactly_one_of(LOCATION_BLOCKS),
            )
            .attribute(AttributeSchema::new(
                "event",
                AttributeType::single_block(event_schema()),
            ));
        let view = ResourceSchema::new("view")
            .attribute(AttributeSchema::new("expression", types::not_whitespace()).required())
            .attribute(AttributeSchema::new("sources", types::identifier_set()))
            .attribute(AttributeSchema::new(
                "event",
                AttributeType::single_block(event_schema()),
            ));
        let pivot = ResourceSchema::new("pivot")
            .attribute(AttributeSchema::new("entity_mapping", types::identifier()).required())
            .attribute(AttributeSchema::new("extra_features", types::identifier_set()));

        let schema = [("root", root), ("view", view), ("pivot", pivot)].into_iter().fold(
            named_schema(Self::TYPE_NAME),
            |schema, (block, body)| {
                schema.attribute(
                    AttributeSchema::new(block, AttributeType::single_block(body))
                        .exactly_one_of(TABLE_BLOCKS),
                )
            },
        );
        with_labels(schema).with_description("A table of events or a view over other tables")
    }

    fn compose(&self, attrs: &Attributes) -> Result<Table, MapError> {
        Ok(Table {
            id: None,
            name: required_str(attrs, "name")?,
            description: description(attrs)?,
            kind: require_variant(attrs, "table")?,
            labels: labels(attrs)?,
            attributes: key_values(attrs, "attribute")?,
        })
    }

    fn flatten(&self, table: &Table) -> Result<Attributes, MapError> {
        let mut attrs = metadata(&table.name, &table.description, &table.labels, &table.attributes)
            .build();
        flatten_variant(&table.kind, &mut attrs);
        Ok(attrs)
    }
}

impl Variant for TableKind {
    const BLOCKS: &'static [&'static str] = TABLE_BLOCKS;

    fn compose_block(block: &str, body: &Attributes) -> Result<Self, MapError> {
        match block {
            "root" => Ok(TableKind::Root {
                source: require_variant(body, "root")?,
                event_description: compose_event(body)?,
            }),
            "view" => Ok(TableKind::View {
                expression: required_str(body, "expression")?,
                sources: identifier_list(body, "sources")?,
                event_description: compose_event(body)?,
            }),
            "pivot" => Ok(TableKind::Pivot {
                entity_mapping: required_identifier(body, "entity_mapping")?,
                extra_features: identifier_list(body, "extra_features")?,
            }),
            other => Err(undeclared_block(other)),
        }
    }

    fn flatten_block(&self) -> (&'static str, Attributes) {
        match self {
            TableKind::Root {
                source,
                event_description,
            } => {
                let mut body = Block::new()
                    .set("event", flatten_event(event_description.as_ref()))
                    .build();
                flatten_variant(source, &mut body);
                ("root", body)
            }
            TableKind::View {
                expression,
                sources,
                event_description,
            } => (
                "view",
                Block::new()
                    .string("expression", expression)
                    .set("sources", identifiers_to_set(sources))
                    .set("event", flatten_event(event_description.as_ref()))
                    .build(),
            ),
            TableKind::Pivot {
                entity_mapping,
                extra_features,
            } => (
                "pivot",
                Block::new()
                    .set("entity_mapping", identifier_value(Some(*entity_mapping)))
                    .set("extra_features", identifiers_to_list(extra_features))
                    .build(),
            ),
        }
    }
}

impl Variant for SourceReference {
    const BLOCKS: &'static [&'static str] = LOCATION_BLOCKS;

    fn compose_block(block: &str, body: &Attributes) -> Result<Self, MapError> {
        let source_id = required_identifier(body, "source")?;
        match block {
            "folder" => Ok(SourceReference::Folder {
                source_id,
                folder: required_str(body, "path")?,
            }),
            "table" => Ok(SourceReference::Table {
                source_id,
                table_name: required_str(body, "table_name")?,
            }),
            "topic" => Ok(SourceReference::Topic {
                source_id,
                topic: required_str(body, "topic")?,
            }),
            other => Err(undeclared_block(other)),
        }
    }

    fn flatten_block(&self) -> (&'static str, Attributes) {
        let (block, source_id, field, value) = match self {
            SourceReference::Folder { source_id, folder } => ("folder", source_id, "path", folder),
            SourceReference::Table {
                source_id,
                table_name,
            } => ("table", source_id, "table_name", table_name),
            SourceReference::Topic { source_id, topic } => ("topic", source_id, "topic", topic),
        };
        (
            block,
            Block::new()
                .set("source", identifier_value(Some(*source_id)))
                .string(field, value)
                .build(),
        )
    }
}

fn event_schema() -> ResourceSchema {
    ResourceSchema::new("event")
        .attribute(
            AttributeSchema::new("entities", types::string_map())
                .required()
                .with_description("Map from entity id to the column holding it"),
        )
        .attribute(AttributeSchema::new("timestamp_column", types::not_whitespace()).required())
        .attribute(AttributeSchema::new("timezone", types::not_whitespace()))
}

fn compose_event(body: &Attributes) -> Result<Option<EventDescription>, MapError> {
    let Some(event) = single_block(body, "event")? else {
        return Ok(None);
    };
    Ok(Some(EventDescription {
        entities: string_map(event, "entities")?,
        timestamp_info: TimestampInfo {
            timestamp_column: required_str(event, "timestamp_column")?,
            timezone: get_str(event, "timezone")?,
        },
    }))
}

fn flatten_event(event: Option<&EventDescription>) -> Value {
    match event {
        Some(event) => Value::block(
            Block::new()
                .set("entities", string_map_value(&event.entities))
                .string("timestamp_column", &event.timestamp_info.timestamp_column)
                .opt_string("timezone", event.timestamp_info.timezone.as_ref())
                .build(),
        ),
        None => Value::empty_block(),
    }
}
