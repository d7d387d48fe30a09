//! anaml_destination resource

use anaml_core::resource::Attributes;
use anaml_core::schema::{AttributeSchema, AttributeType, ResourceSchema};

use super::connector::*;
use super::{description, metadata, named_schema, with_labels};
use crate::codec::{key_values, labels, required_str};
use crate::error::MapError;
use crate::mapper::{ResourceMapper, Variant, flatten_variant, require_variant, undeclared_block};
use crate::wire::source::{Destination, DestinationKind};

const DESTINATION_BLOCKS: &[&str] = &[
    "s3",
    "s3a",
    "jdbc",
    "online",
    "hive",
    "big_query",
    "bigtable",
    "gcs",
    "local",
    "hdfs",
    "kafka",
    "snowflake",
];

pub struct DestinationMapper;

impl ResourceMapper for DestinationMapper {
    type Wire = Destination;

    const TYPE_NAME: &'static str = "anaml_destination";
    const COLLECTION: &'static str = "destination";

    fn schema(&self) -> ResourceSchema {
        let schema = DESTINATION_BLOCKS
            .iter()
            .fold(named_schema(Self::TYPE_NAME), |schema, block| {
                let body = match *block {
                    "s3" | "gcs" => object_store_schema(block),
                    "s3a" => s3a_store_schema(block),
                    "jdbc" | "online" => jdbc_schema(block),
                    "hive" => hive_schema(block),
                    "big_query" => big_query_destination_schema(block),
                    "bigtable" => bigtable_schema(block),
                    "kafka" => kafka_schema(block),
                    "snowflake" => snowflake_schema(block),
                    _ => file_store_schema(block),
                };
                schema.attribute(
                    AttributeSchema::new(*block, AttributeType::single_block(body))
                        .exactly_one_of(DESTINATION_BLOCKS),
                )
            });
        with_labels(schema).with_description("A location feature stores write to")
    }

    fn compose(&self, attrs: &Attributes) -> Result<Destination, MapError> {
        Ok(Destination {
            id: None,
            name: required_str(attrs, "name")?,
            description: description(attrs)?,
            kind: require_variant(attrs, "destination")?,
            labels: labels(attrs)?,
            attributes: key_values(attrs, "attribute")?,
        })
    }

    fn flatten(&self, destination: &Destination) -> Result<Attributes, MapError> {
        let mut attrs = metadata(
            &destination.name,
            &destination.description,
            &destination.labels,
            &destination.attributes,
        )
        .build();
        flatten_variant(&destination.kind, &mut attrs);
        Ok(attrs)
    }
}

impl Variant for DestinationKind {
    const BLOCKS: &'static [&'static str] = DESTINATION_BLOCKS;

    fn compose_block(block: &str, body: &Attributes) -> Result<Self, MapError> {
        match block {
            "s3" => compose_object_store(body).map(DestinationKind::S3),
            "s3a" => compose_s3a_store(body).map(DestinationKind::S3a),
            "jdbc" => compose_jdbc(body).map(DestinationKind::Jdbc),
            "online" => compose_jdbc(body).map(DestinationKind::Online),
            "hive" => compose_hive(body).map(DestinationKind::Hive),
            "big_query" => compose_big_query_destination(body).map(DestinationKind::BigQuery),
            "bigtable" => compose_bigtable(body).map(DestinationKind::Bigtable),
            "gcs" => compose_object_store(body).map(DestinationKind::Gcs),
            "local" => compose_file_store(body).map(DestinationKind::Local),
            "hdfs" => compose_file_store(body).map(DestinationKind::Hdfs),
            "kafka" => compose_kafka(body).map(DestinationKind::Kafka),
            "snowflake" => compose_snowflake(body).map(DestinationKind::Snowflake),
            other => Err(undeclared_block(other)),
        }
    }

    fn flatten_block(&self) -> (&'static str, Attributes) {
        match self {
            DestinationKind::S3(store) => ("s3", flatten_object_store(store)),
            DestinationKind::S3a(store) => ("s3a", flatten_s3a_store(store)),
            DestinationKind::Jdbc(jdbc) => ("jdbc", flatten_jdbc(jdbc)),
            DestinationKind::Online(jdbc) => ("online", flatten_jdbc(jdbc)),
            DestinationKind::Hive(hive) => ("hive", flatten_hive(hive)),
            DestinationKind::BigQuery(big_query) => {
                ("big_query", flatten_big_query_destination(big_query))
            }
            DestinationKind::Bigtable(bigtable) => ("bigtable", flatten_bigtable(bigtable)),
            DestinationKind::Gcs(store) => ("gcs", flatten_object_store(store)),
            DestinationKind::Local(store) => ("local", flatten_file_store(store)),
            DestinationKind::Hdfs(store) => ("hdfs", flatten_file_store(store)),
            DestinationKind::Kafka(kafka) => ("kafka", flatten_kafka(kafka)),
            DestinationKind::Snowflake(snowflake) => ("snowflake", flatten_snowflake(snowflake)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mapper::DynamicMapper;
    use crate::wire::common::{
        Credentials, CsvOptions, FileFormat, KeyValue, SecretValue, SensitiveAttribute,
    };
    use crate::wire::connector::{
        BigQueryDestination, Bigtable, FileStore, Hive, Jdbc, Kafka, ObjectStore, S3aStore,
        Snowflake, StagingArea,
    };
    use serde_json::json;

    #[test]
    fn online_destination_is_jdbc_shaped() {
        let json = json!({
            "id": 12,
            "name": "online_store",
            "description": "Serving database",
            "adt_type": "online",
            "url": "jdbc:postgresql://serving/db",
            "schema": "features",
            "credentialsProvider": {
                "adt_type": "basic",
                "username": "anaml",
                "password": "secret"
            },
            "labels": [],
            "attributes": []
        });
        let attrs = DestinationMapper.flatten_json(json.clone()).unwrap();
        assert_eq!(attrs["jdbc"], anaml_core::resource::Value::empty_block());

        let destination = DestinationMapper.compose(&attrs).unwrap();
        assert_eq!(
            destination.kind,
            DestinationKind::Online(Jdbc {
                url: "jdbc:postgresql://serving/db".to_string(),
                schema: "features".to_string(),
                credentials_provider: Some(Credentials::Basic {
                    username: "anaml".to_string(),
                    password: "secret".to_string(),
                }),
            })
        );

        let mut composed = DestinationMapper.compose_json(&attrs).unwrap();
        composed["id"] = json!(12);
        assert_eq!(composed, json);
    }

    #[test]
    fn big_query_tag_is_lowercase() {
        let attrs = DestinationMapper
            .flatten_json(json!({
                "name": "warehouse",
                "adt_type": "bigquery",
                "path": "project:dataset"
            }))
            .unwrap();
        let composed = DestinationMapper.compose_json(&attrs).unwrap();
        assert_eq!(composed["adt_type"], "bigquery");
        assert!(composed.get("stagingArea").is_none());
    }

    fn every_destination_kind() -> Vec<DestinationKind> {
        let jdbc = |credentials_provider| Jdbc {
            url: "jdbc:postgresql://serving/db".to_string(),
            schema: "features".to_string(),
            credentials_provider,
        };
        vec![
            DestinationKind::S3(ObjectStore {
                bucket: "exports".to_string(),
                path: "/features".to_string(),
                file_format: FileFormat::Parquet,
            }),
            DestinationKind::S3a(S3aStore {
                bucket: "exports".to_string(),
                path: "/features".to_string(),
                endpoint: None,
                access_key: Some("access".to_string()),
                secret_key: Some("secret".to_string()),
                file_format: FileFormat::Orc,
            }),
            DestinationKind::Jdbc(jdbc(None)),
            DestinationKind::Online(jdbc(Some(Credentials::Basic {
                username: "anaml".to_string(),
                password: "secret".to_string(),
            }))),
            DestinationKind::Hive(Hive {
                database: "features".to_string(),
            }),
            DestinationKind::BigQuery(BigQueryDestination {
                path: "project:dataset".to_string(),
                staging_area: Some(StagingArea::Gcs {
                    bucket: "staging".to_string(),
                    path: Some("/tmp".to_string()),
                }),
            }),
            DestinationKind::Bigtable(Bigtable {
                project: "project".to_string(),
                instance: "serving".to_string(),
            }),
            DestinationKind::Gcs(ObjectStore {
                bucket: "exports".to_string(),
                path: "/features".to_string(),
                file_format: FileFormat::Csv(CsvOptions {
                    sep: Some(",".to_string()),
                    ignore_leading_white_space: Some(true),
                    ..CsvOptions::default()
                }),
            }),
            DestinationKind::Local(FileStore {
                path: "/tmp/features".to_string(),
                file_format: FileFormat::Parquet,
            }),
            DestinationKind::Hdfs(FileStore {
                path: "/features".to_string(),
                file_format: FileFormat::Orc,
            }),
            DestinationKind::Kafka(Kafka {
                bootstrap_servers: "kafka:9092".to_string(),
                schema_registry_url: "http://registry:8081".to_string(),
                kafka_properties_providers: vec![SensitiveAttribute {
                    key: "ssl.key.password".to_string(),
                    value_config: SecretValue::File {
                        filepath: "/secrets/kafka".to_string(),
                    },
                }],
            }),
            DestinationKind::Snowflake(Snowflake {
                url: "https://account.snowflakecomputing.com".to_string(),
                warehouse: "compute".to_string(),
                database: "features".to_string(),
                schema: "public".to_string(),
                credentials_provider: None,
            }),
        ]
    }

    #[test]
    fn every_destination_kind_round_trips() {
        let kinds = every_destination_kind();
        assert_eq!(kinds.len(), DESTINATION_BLOCKS.len());
        for kind in kinds {
            let destination = Destination {
                id: None,
                name: "exports".to_string(),
                description: String::new(),
                kind,
                labels: vec![],
                attributes: vec![KeyValue {
                    key: "team".to_string(),
                    value: "growth".to_string(),
                }],
            };
            let config = DestinationMapper.flatten(&destination).unwrap();
            let composed = DestinationMapper.compose(&config).unwrap();
            assert_eq!(composed, destination);
            assert_eq!(DestinationMapper.flatten(&composed).unwrap(), config);
        }
    }
}
