//! Compute cluster records

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::common::{Credentials, KeyValue};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Cluster {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(flatten)]
    pub kind: ClusterKind,
    #[serde(default)]
    pub is_preview_cluster: bool,
    #[serde(default)]
    pub property_sets: Vec<PropertySet>,
    #[serde(default)]
    pub labels: Vec<String>,
    #[serde(default)]
    pub attributes: Vec<KeyValue>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "adt_type", rename_all = "lowercase")]
pub enum ClusterKind {
    /// Spark embedded in an Anaml server
    Local(LocalCluster),
    /// Remote Spark server
    Spark(SparkServerCluster),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocalCluster {
    pub anaml_server_url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub credentials_provider: Option<Credentials>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub spark_config: Option<SparkConfig>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SparkServerCluster {
    pub spark_server_url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub spark_config: Option<SparkConfig>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SparkConfig {
    #[serde(default)]
    pub enable_hive_support: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hive_metastore_url: Option<String>,
    #[serde(default)]
    pub additional_spark_properties: BTreeMap<String, String>,
}

/// Named set of Spark properties jobs may select
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PropertySet {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    pub name: String,
    #[serde(default)]
    pub additional_spark_properties: BTreeMap<String, String>,
}
