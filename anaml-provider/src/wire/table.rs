//! Table records

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::common::KeyValue;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Table {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(flatten)]
    pub kind: TableKind,
    #[serde(default)]
    pub labels: Vec<String>,
    #[serde(default)]
    pub attributes: Vec<KeyValue>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "adt_type", rename_all = "lowercase")]
pub enum TableKind {
    /// Table read directly from a source
    Root {
        source: SourceReference,
        #[serde(
            rename = "eventDescription",
            default,
            skip_serializing_if = "Option::is_none"
        )]
        event_description: Option<EventDescription>,
    },
    /// SQL over other tables
    View {
        expression: String,
        #[serde(default)]
        sources: Vec<i64>,
        #[serde(
            rename = "eventDescription",
            default,
            skip_serializing_if = "Option::is_none"
        )]
        event_description: Option<EventDescription>,
    },
    /// Features re-keyed through an entity mapping
    Pivot {
        #[serde(rename = "entityMapping")]
        entity_mapping: i64,
        #[serde(rename = "extraFeatures", default)]
        extra_features: Vec<i64>,
    },
}

/// Location of a root table inside its source
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "adt_type", rename_all = "lowercase")]
pub enum SourceReference {
    Folder {
        #[serde(rename = "sourceId")]
        source_id: i64,
        folder: String,
    },
    Table {
        #[serde(rename = "sourceId")]
        source_id: i64,
        #[serde(rename = "tableName")]
        table_name: String,
    },
    Topic {
        #[serde(rename = "sourceId")]
        source_id: i64,
        topic: String,
    },
}

/// Entity columns and event time of an event table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventDescription {
    /// Entity id to column name
    #[serde(default)]
    pub entities: BTreeMap<String, String>,
    pub timestamp_info: TimestampInfo,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimestampInfo {
    #[serde(rename = "timestampColumn")]
    pub timestamp_column: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timezone: Option<String>,
}
