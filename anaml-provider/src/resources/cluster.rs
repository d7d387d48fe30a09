//! anaml_cluster resource and data source

use anaml_core::resource::{Attributes, Value};
use anaml_core::schema::{AttributeSchema, AttributeType, ResourceSchema, types};

use super::connector::{compose_credentials, flatten_credentials, with_credentials};
use super::{description, description_value, metadata, named_schema, with_labels};
use crate::codec::{
    Block, block_list, get_bool, get_identifier, get_str, identifier_value, key_values, labels,
    required_str, single_block, string_map, string_map_value,
};
use crate::error::MapError;
use crate::mapper::{
    DataSourceMapper, ResourceMapper, Variant, flatten_variant, require_variant, undeclared_block,
};
use crate::wire::cluster::{
    Cluster, ClusterKind, LocalCluster, PropertySet, SparkConfig, SparkServerCluster,
};

const CLUSTER_BLOCKS: &[&str] = &["local", "spark_server"];

pub struct ClusterMapper;

impl ResourceMapper for ClusterMapper {
    type Wire = Cluster;

    const TYPE_NAME: &'static str = "anaml_cluster";
    const COLLECTION: &'static str = "cluster";

    fn schema(&self) -> ResourceSchema {
        let local = with_credentials(ResourceSchema::new("local"))
            .attribute(AttributeSchema::new("anaml_server_url", types::not_whitespace()).required())
            .attribute(AttributeSchema::new(
                "spark_config",
                AttributeType::single_block(spark_config_schema()),
            ));
        let spark_server = ResourceSchema::new("spark_server")
            .attribute(AttributeSchema::new("spark_server_url", types::not_whitespace()).required())
            .attribute(AttributeSchema::new(
                "spark_config",
                AttributeType::single_block(spark_config_schema()),
            ));
        let property_set = ResourceSchema::new("property_set")
            .attribute(
                AttributeSchema::new("id", types::identifier())
                    .computed()
                    .with_description("Backend id, referenced by feature store property sets"),
            )
            .attribute(AttributeSchema::new("name", types::not_whitespace()).required())
            .attribute(AttributeSchema::new(
                "additional_spark_properties",
                types::string_map(),
            ));

        let schema = named_schema(Self::TYPE_NAME)
            .attribute(AttributeSchema::new("is_preview_cluster", AttributeType::Bool).required())
            .attribute(
                AttributeSchema::new("local", AttributeType::single_block(local))
                    .exactly_one_of(CLUSTER_BLOCKS),
            )
            .attribute(
                AttributeSchema::new("spark_server", AttributeType::single_block(spark_server))
                    .exactly_one_of(CLUSTER_BLOCKS),
            )
            .attribute(AttributeSchema::new(
                "property_set",
                AttributeType::block_list(property_set),
            ));
        with_labels(schema).with_description("A Spark cluster jobs run on")
    }

    fn compose(&self, attrs: &Attributes) -> Result<Cluster, MapError> {
        let property_sets = block_list(attrs, "property_set")?
            .into_iter()
            .map(|body| {
                Ok(PropertySet {
                    id: get_identifier(body, "id")?,
                    name: required_str(body, "name")?,
                    additional_spark_properties: string_map(body, "additional_spark_properties")?,
                })
            })
            .collect::<Result<Vec<_>, MapError>>()?;
        Ok(Cluster {
            id: None,
            name: required_str(attrs, "name")?,
            description: description(attrs)?,
            kind: require_variant(attrs, "cluster")?,
            is_preview_cluster: get_bool(attrs, "is_preview_cluster")?.unwrap_or(false),
            property_sets,
            labels: labels(attrs)?,
            attributes: key_values(attrs, "attribute")?,
        })
    }

    fn flatten(&self, cluster: &Cluster) -> Result<Attributes, MapError> {
        let property_sets = cluster
            .property_sets
            .iter()
            .map(|set| {
                Value::Map(
                    Block::new()
                        .set("id", identifier_value(set.id))
                        .string("name", &set.name)
                        .set(
                            "additional_spark_properties",
                            string_map_value(&set.additional_spark_properties),
                        )
                        .build(),
                )
            })
            .collect();
        let mut attrs = metadata(
            &cluster.name,
            &cluster.description,
            &cluster.labels,
            &cluster.attributes,
        )
        .set("is_preview_cluster", Value::Bool(cluster.is_preview_cluster))
        .set("property_set", Value::List(property_sets))
        .build();
        flatten_variant(&cluster.kind, &mut attrs);
        Ok(attrs)
    }
}

impl Variant for ClusterKind {
    const BLOCKS: &'static [&'static str] = CLUSTER_BLOCKS;

    fn compose_block(block: &str, body: &Attributes) -> Result<Self, MapError> {
        match block {
            "local" => Ok(ClusterKind::Local(LocalCluster {
                anaml_server_url: required_str(body, "anaml_server_url")?,
                credentials_provider: compose_credentials(body)?,
                spark_config: compose_spark_config(body)?,
            })),
            "spark_server" => Ok(ClusterKind::Spark(SparkServerCluster {
                spark_server_url: required_str(body, "spark_server_url")?,
                spark_config: compose_spark_config(body)?,
            })),
            other => Err(undeclared_block(other)),
        }
    }

    fn flatten_block(&self) -> (&'static str, Attributes) {
        match self {
            ClusterKind::Local(local) => {
                let block = Block::new()
                    .string("anaml_server_url", &local.anaml_server_url)
                    .set("spark_config", flatten_spark_config(local.spark_config.as_ref()));
                (
                    "local",
                    flatten_credentials(local.credentials_provider.as_ref(), block).build(),
                )
            }
            ClusterKind::Spark(spark) => (
                "spark_server",
                Block::new()
                    .string("spark_server_url", &spark.spark_server_url)
                    .set("spark_config", flatten_spark_config(spark.spark_config.as_ref()))
                    .build(),
            ),
        }
    }
}

fn spark_config_schema() -> ResourceSchema {
    ResourceSchema::new("spark_config")
        .attribute(AttributeSchema::new("enable_hive_support", AttributeType::Bool))
        .attribute(AttributeSchema::new("hive_metastore_url", types::not_whitespace()))
        .attribute(AttributeSchema::new(
            "additional_spark_properties",
            types::string_map(),
        ))
}

fn compose_spark_config(body: &Attributes) -> Result<Option<SparkConfig>, MapError> {
    let Some(config) = single_block(body, "spark_config")? else {
        return Ok(None);
    };
    Ok(Some(SparkConfig {
        enable_hive_support: get_bool(config, "enable_hive_support")?.unwrap_or(false),
        hive_metastore_url: get_str(config, "hive_metastore_url")?,
        additional_spark_properties: string_map(config, "additional_spark_properties")?,
    }))
}

fn flatten_spark_config(config: Option<&SparkConfig>) -> Value {
    match config {
        Some(config) => Value::block(
            Block::new()
                .set("enable_hive_support", Value::Bool(config.enable_hive_support))
                .opt_string("hive_metastore_url", config.hive_metastore_url.as_ref())
                .set(
                    "additional_spark_properties",
                    string_map_value(&config.additional_spark_properties),
                )
                .build(),
        ),
        None => Value::empty_block(),
    }
}

/// Looks up an existing cluster by name
pub struct ClusterLookup;

impl DataSourceMapper for ClusterLookup {
    fn type_name(&self) -> &'static str {
        "anaml_cluster"
    }

    fn collection(&self) -> &'static str {
        ClusterMapper::COLLECTION
    }

    fn schema(&self) -> ResourceSchema {
        ResourceSchema::new("anaml_cluster")
            .attribute(AttributeSchema::new("name", AttributeType::String).required())
            .attribute(AttributeSchema::new("description", AttributeType::String).computed())
    }

    fn flatten_json(&self, json: serde_json::Value) -> Result<Attributes, MapError> {
        let cluster: Cluster = serde_json::from_value(json).map_err(MapError::from_wire)?;
        Ok(Block::new()
            .string("name", &cluster.name)
            .set("description", description_value(&cluster.description))
            .build())
    }
}
