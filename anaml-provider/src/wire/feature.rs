//! Feature and feature set records

use serde::{Deserialize, Serialize};

use super::common::{KeyValue, SqlExpression};
use crate::vocab::Aggregate;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Feature {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(flatten)]
    pub kind: FeatureKind,
    pub select: SqlExpression,
    /// Sent as `null` when absent
    #[serde(default)]
    pub filter: Option<SqlExpression>,
    #[serde(
        rename = "postAggregateExpr",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub post_aggregate_expr: Option<SqlExpression>,
    #[serde(default)]
    pub labels: Vec<String>,
    #[serde(default)]
    pub attributes: Vec<KeyValue>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "adt_type", rename_all = "lowercase")]
pub enum FeatureKind {
    /// Aggregation over a window of an event table
    Event {
        table: i64,
        window: EventWindow,
        aggregate: Aggregate,
        #[serde(
            rename = "entityRestrictions",
            default,
            skip_serializing_if = "Option::is_none"
        )]
        entity_restrictions: Option<Vec<i64>>,
    },
    /// Row-level expression over other features
    Row {
        #[serde(default)]
        over: Vec<i64>,
        #[serde(rename = "entityId")]
        entity_id: i64,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "adt_type", rename_all = "lowercase")]
pub enum EventWindow {
    OpenWindow,
    DailyWindow { days: i64 },
    HourWindow { hours: i64 },
    MonthWindow { months: i64 },
    RowWindow { rows: i64 },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureSet {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub entity: i64,
    #[serde(default)]
    pub features: Vec<i64>,
    #[serde(default)]
    pub labels: Vec<String>,
    #[serde(default)]
    pub attributes: Vec<KeyValue>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn windows_use_lowercase_tags() {
        assert_eq!(
            serde_json::to_value(EventWindow::DailyWindow { days: 7 }).unwrap(),
            json!({"adt_type": "dailywindow", "days": 7})
        );
        assert_eq!(
            serde_json::to_value(EventWindow::OpenWindow).unwrap(),
            json!({"adt_type": "openwindow"})
        );
    }

    #[test]
    fn absent_filter_is_sent_as_null() {
        let feature = Feature {
            id: None,
            name: "visits".to_string(),
            description: String::new(),
            kind: FeatureKind::Row {
                over: vec![3],
                entity_id: 1,
            },
            select: SqlExpression {
                sql: "f3 + 1".to_string(),
            },
            filter: None,
            post_aggregate_expr: None,
            labels: vec![],
            attributes: vec![],
        };
        let encoded = serde_json::to_value(&feature).unwrap();
        assert_eq!(encoded["filter"], serde_json::Value::Null);
        assert!(encoded.get("postAggregateExpr").is_none());
        assert_eq!(encoded["entityId"], 1);
    }
}
