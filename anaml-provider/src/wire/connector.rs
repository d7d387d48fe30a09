//! Storage connector records shared by sources and destinations

use serde::{Deserialize, Serialize};

use super::common::{Credentials, FileFormat, SensitiveAttribute};

/// Bucket-based object store (S3, GCS)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ObjectStore {
    pub bucket: String,
    pub path: String,
    pub file_format: FileFormat,
}

/// S3 through the Hadoop S3A connector with explicit endpoint and keys
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct S3aStore {
    pub bucket: String,
    pub path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub access_key: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub secret_key: Option<String>,
    pub file_format: FileFormat,
}

/// Path-based file system (local, HDFS)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileStore {
    pub path: String,
    pub file_format: FileFormat,
}

/// JDBC database, also used for online feature stores
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Jdbc {
    pub url: String,
    pub schema: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub credentials_provider: Option<Credentials>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Hive {
    pub database: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BigQuery {
    pub path: String,
}

/// GCS area BigQuery loads are staged in
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "adt_type", rename_all = "lowercase")]
pub enum StagingArea {
    #[serde(rename = "gcsstaging")]
    Gcs {
        bucket: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        path: Option<String>,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BigQueryDestination {
    pub path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub staging_area: Option<StagingArea>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Kafka {
    pub bootstrap_servers: String,
    pub schema_registry_url: String,
    #[serde(default)]
    pub kafka_properties_providers: Vec<SensitiveAttribute>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snowflake {
    pub url: String,
    pub warehouse: String,
    pub database: String,
    pub schema: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub credentials_provider: Option<Credentials>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bigtable {
    pub project: String,
    pub instance: String,
}
