//! anaml_source resource
//!
//! A source is configured with exactly one connector block. Access rules
//! restrict which principals may read which resources of the source.

use anaml_core::resource::{Attributes, Value};
use anaml_core::schema::{AttributeSchema, AttributeType, ResourceSchema, types};

use super::connector::*;
use super::{description, metadata, named_schema, with_labels};
use crate::codec::{
    Block, block_list, get_identifier, key_values, labels, required_str,
};
use crate::error::MapError;
use crate::mapper::{ResourceMapper, Variant, flatten_variant, require_variant, undeclared_block};
use crate::wire::common::{AccessRule, MaskingRule, PrincipalId};
use crate::wire::source::{Source, SourceKind};

const SOURCE_BLOCKS: &[&str] = &[
    "s3",
    "s3a",
    "jdbc",
    "hive",
    "big_query",
    "gcs",
    "local",
    "hdfs",
    "kafka",
    "snowflake",
];

pub struct SourceMapper;

impl ResourceMapper for SourceMapper {
    type Wire = Source;

    const TYPE_NAME: &'static str = "anaml_source";
    const COLLECTION: &'static str = "source";

    fn schema(&self) -> ResourceSchema {
        let schema = SOURCE_BLOCKS.iter().fold(named_schema(Self::TYPE_NAME), |schema, block| {
            let body = match *block {
                "s3" | "gcs" => object_store_schema(block),
                "s3a" => s3a_store_schema(block),
                "jdbc" => jdbc_schema(block),
                "hive" => hive_schema(block),
                "big_query" => big_query_schema(block),
                "kafka" => kafka_schema(block),
                "snowflake" => snowflake_schema(block),
                _ => file_store_schema(block),
            };
            schema.attribute(
                AttributeSchema::new(*block, AttributeType::single_block(body))
                    .exactly_one_of(SOURCE_BLOCKS),
            )
        });
        with_labels(schema)
            .attribute(AttributeSchema::new(
                "access_rule",
                AttributeType::block_list(access_rule_schema()),
            ))
            .with_description("A location root tables are read from")
    }

    fn compose(&self, attrs: &Attributes) -> Result<Source, MapError> {
        Ok(Source {
            id: None,
            name: required_str(attrs, "name")?,
            description: description(attrs)?,
            kind: require_variant(attrs, "source")?,
            labels: labels(attrs)?,
            attributes: key_values(attrs, "attribute")?,
            access_rules: compose_access_rules(attrs)?,
        })
    }

    fn flatten(&self, source: &Source) -> Result<Attributes, MapError> {
        let mut attrs = metadata(
            &source.name,
            &source.description,
            &source.labels,
            &source.attributes,
        )
        .set("access_rule", flatten_access_rules(&source.access_rules))
        .build();
        flatten_variant(&source.kind, &mut attrs);
        Ok(attrs)
    }
}

impl Variant for SourceKind {
    const BLOCKS: &'static [&'static str] = SOURCE_BLOCKS;

    fn compose_block(block: &str, body: &Attributes) -> Result<Self, MapError> {
        match block {
            "s3" => compose_object_store(body).map(SourceKind::S3),
            "s3a" => compose_s3a_store(body).map(SourceKind::S3a),
            "jdbc" => compose_jdbc(body).map(SourceKind::Jdbc),
            "hive" => compose_hive(body).map(SourceKind::Hive),
            "big_query" => compose_big_query(body).map(SourceKind::BigQuery),
            "gcs" => compose_object_store(body).map(SourceKind::Gcs),
            "local" => compose_file_store(body).map(SourceKind::Local),
            "hdfs" => compose_file_store(body).map(SourceKind::Hdfs),
            "kafka" => compose_kafka(body).map(SourceKind::Kafka),
            "snowflake" => compose_snowflake(body).map(SourceKind::Snowflake),
            other => Err(undeclared_block(other)),
        }
    }

    fn flatten_block(&self) -> (&'static str, Attributes) {
        match self {
            SourceKind::S3(store) => ("s3", flatten_object_store(store)),
            SourceKind::S3a(store) => ("s3a", flatten_s3a_store(store)),
            SourceKind::Jdbc(jdbc) => ("jdbc", flatten_jdbc(jdbc)),
            SourceKind::Hive(hive) => ("hive", flatten_hive(hive)),
            SourceKind::BigQuery(big_query) => ("big_query", flatten_big_query(big_query)),
            SourceKind::Gcs(store) => ("gcs", flatten_object_store(store)),
            SourceKind::Local(store) => ("local", flatten_file_store(store)),
            SourceKind::Hdfs(store) => ("hdfs", flatten_file_store(store)),
            SourceKind::Kafka(kafka) => ("kafka", flatten_kafka(kafka)),
            SourceKind::Snowflake(snowflake) => ("snowflake", flatten_snowflake(snowflake)),
        }
    }
}

// =============================================================================
// Access Rules
// =============================================================================

impl Variant for MaskingRule {
    const BLOCKS: &'static [&'static str] = &["filter", "mask"];

    fn compose_block(block: &str, body: &Attributes) -> Result<Self, MapError> {
        match block {
            "filter" => Ok(MaskingRule::Filter {
                expression: required_str(body, "expression")?,
            }),
            "mask" => Ok(MaskingRule::Mask {
                column: required_str(body, "column")?,
                expression: required_str(body, "expression")?,
            }),
            other => Err(undeclared_block(other)),
        }
    }

    fn flatten_block(&self) -> (&'static str, Attributes) {
        match self {
            MaskingRule::Filter { expression } => {
                ("filter", Block::new().string("expression", expression).build())
            }
            MaskingRule::Mask { column, expression } => (
                "mask",
                Block::new()
                    .string("column", column)
                    .string("expression", expression)
                    .build(),
            ),
        }
    }
}

fn compose_principal(body: &Attributes) -> Result<PrincipalId, MapError> {
    if let Some(id) = get_identifier(body, "user_id")? {
        return Ok(PrincipalId::UserId { id });
    }
    if let Some(id) = get_identifier(body, "user_group_id")? {
        return Ok(PrincipalId::UserGroupId { id });
    }
    Err(MapError::NoVariantSelected {
        field: "principals".to_string(),
        expected: vec!["user_id".to_string(), "user_group_id".to_string()],
    })
}

fn flatten_principal(principal: &PrincipalId) -> Value {
    let (user, group) = match principal {
        PrincipalId::UserId { id } => (Some(*id), None),
        PrincipalId::UserGroupId { id } => (None, Some(*id)),
    };
    Value::Map(
        Block::new()
            .set("user_id", Value::opt_string(user.map(|id| id.to_string())))
            .set("user_group_id", Value::opt_string(group.map(|id| id.to_string())))
            .build(),
    )
}

pub(crate) fn compose_access_rules(attrs: &Attributes) -> Result<Vec<AccessRule>, MapError> {
    block_list(attrs, "access_rule")?
        .into_iter()
        .map(|rule| {
            let principals = block_list(rule, "principals")?
                .into_iter()
                .map(compose_principal)
                .collect::<Result<Vec<_>, _>>()?;
            let masking_rules = block_list(rule, "masking_rule")?
                .into_iter()
                .map(|body| require_variant(body, "masking_rule"))
                .collect::<Result<Vec<_>, _>>()?;
            Ok(AccessRule {
                resource: required_str(rule, "resource")?,
                principals,
                masking_rules,
            })
        })
        .collect()
}

pub(crate) fn flatten_access_rules(rules: &[AccessRule]) -> Value {
    Value::List(
        rules
            .iter()
            .map(|rule| {
                let masking_rules = rule
                    .masking_rules
                    .iter()
                    .map(|masking| {
                        let mut body = Attributes::new();
                        flatten_variant(masking, &mut body);
                        Value::Map(body)
                    })
                    .collect();
                Value::Map(
                    Block::new()
                        .string("resource", &rule.resource)
                        .set(
                            "principals",
                            Value::List(rule.principals.iter().map(flatten_principal).collect()),
                        )
                        .set("masking_rule", Value::List(masking_rules))
                        .build(),
                )
            })
            .collect(),
    )
}

fn access_rule_schema() -> ResourceSchema {
    let principal = ResourceSchema::new("principals")
        .attribute(
            AttributeSchema::new("user_id", types::identifier())
                .exactly_one_of(&["user_id", "user_group_id"]),
        )
        .attribute(
            AttributeSchema::new("user_group_id", types::identifier())
                .exactly_one_of(&["user_id", "user_group_id"]),
        );
    let filter = ResourceSchema::new("filter")
        .attribute(AttributeSchema::new("expression", types::not_whitespace()).required());
    let mask = ResourceSchema::new("mask")
        .attribute(AttributeSchema::new("column", types::not_whitespace()).required())
        .attribute(AttributeSchema::new("expression", types::not_whitespace()).required());
    let masking_rule = ResourceSchema::new("masking_rule")
        .attribute(
            AttributeSchema::new("filter", AttributeType::single_block(filter))
                .exactly_one_of(&["filter", "mask"]),
        )
        .attribute(
            AttributeSchema::new("mask", AttributeType::single_block(mask))
                .exactly_one_of(&["filter", "mask"]),
        );
    ResourceSchema::new("access_rule")
        .attribute(AttributeSchema::new("resource", types::not_whitespace()).required())
        .attribute(AttributeSchema::new("principals", AttributeType::block_list(principal)))
        .attribute(AttributeSchema::new(
            "masking_rule",
            AttributeType::block_list(masking_rule),
        ))
}
