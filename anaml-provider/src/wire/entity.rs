//! Entity and entity mapping records

use serde::{Deserialize, Serialize};

use super::common::KeyValue;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(flatten)]
    pub kind: EntityKind,
    #[serde(default)]
    pub labels: Vec<String>,
    #[serde(default)]
    pub attributes: Vec<KeyValue>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "adt_type", rename_all = "lowercase")]
pub enum EntityKind {
    /// Entity identified by a single column
    Base {
        #[serde(rename = "defaultColumn")]
        default_column: String,
        /// Plain type name, or a structured type the backend describes as an object
        #[serde(
            rename = "requiredType",
            default,
            skip_serializing_if = "Option::is_none"
        )]
        required_type: Option<serde_json::Value>,
    },
    /// Entity derived from a combination of other entities
    Composite {
        #[serde(default)]
        entities: Vec<i64>,
    },
}

/// Feature-backed relation between two entities
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntityMapping {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    pub from: i64,
    pub to: i64,
    pub mapping: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub one_to_many: Option<bool>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn structured_required_type_decodes() {
        let decoded: Entity = serde_json::from_value(json!({
            "id": 1,
            "name": "customer",
            "description": "",
            "adt_type": "base",
            "defaultColumn": "customer_id",
            "requiredType": {"adt_type": "struct", "fields": []}
        }))
        .unwrap();
        match decoded.kind {
            EntityKind::Base { required_type, .. } => {
                assert!(required_type.is_some_and(|t| t.is_object()));
            }
            other => panic!("Expected base entity, got {:?}", other),
        }
    }

    #[test]
    fn composite_entity_encodes_ids() {
        let entity = Entity {
            id: None,
            name: "pair".to_string(),
            description: String::new(),
            kind: EntityKind::Composite {
                entities: vec![1, 2],
            },
            labels: vec![],
            attributes: vec![],
        };
        let encoded = serde_json::to_value(&entity).unwrap();
        assert_eq!(encoded["adt_type"], "composite");
        assert_eq!(encoded["entities"], json!([1, 2]));
        assert!(encoded.get("defaultColumn").is_none());
    }
}
