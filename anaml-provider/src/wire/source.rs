//! Source and destination records

use serde::{Deserialize, Serialize};

use super::common::{AccessRule, KeyValue};
use super::connector::{
    BigQuery, BigQueryDestination, Bigtable, FileStore, Hive, Jdbc, Kafka, ObjectStore, S3aStore,
    Snowflake,
};

/// Physical location root tables are read from
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Source {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(flatten)]
    pub kind: SourceKind,
    #[serde(default)]
    pub labels: Vec<String>,
    #[serde(default)]
    pub attributes: Vec<KeyValue>,
    #[serde(default)]
    pub access_rules: Vec<AccessRule>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "adt_type", rename_all = "lowercase")]
pub enum SourceKind {
    S3(ObjectStore),
    S3a(S3aStore),
    Jdbc(Jdbc),
    Hive(Hive),
    BigQuery(BigQuery),
    Gcs(ObjectStore),
    Local(FileStore),
    Hdfs(FileStore),
    Kafka(Kafka),
    Snowflake(Snowflake),
}

/// Location feature store output is written to
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Destination {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(flatten)]
    pub kind: DestinationKind,
    #[serde(default)]
    pub labels: Vec<String>,
    #[serde(default)]
    pub attributes: Vec<KeyValue>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "adt_type", rename_all = "lowercase")]
pub enum DestinationKind {
    S3(ObjectStore),
    S3a(S3aStore),
    Jdbc(Jdbc),
    Online(Jdbc),
    Hive(Hive),
    BigQuery(BigQueryDestination),
    Bigtable(Bigtable),
    Gcs(ObjectStore),
    Local(FileStore),
    Hdfs(FileStore),
    Kafka(Kafka),
    Snowflake(Snowflake),
}
