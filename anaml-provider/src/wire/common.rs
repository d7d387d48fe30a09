//! Records shared by several backend objects

use serde::{Deserialize, Serialize};

/// Key/value attribute attached to an object
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyValue {
    pub key: String,
    pub value: String,
}

/// File encoding of a folder-based connector
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "adt_type", rename_all = "lowercase")]
pub enum FileFormat {
    Csv(CsvOptions),
    Orc,
    Parquet,
}

impl FileFormat {
    pub fn token(&self) -> &'static str {
        match self {
            FileFormat::Csv(_) => "csv",
            FileFormat::Orc => "orc",
            FileFormat::Parquet => "parquet",
        }
    }
}

/// CSV options; every field is sent, `null` when unset
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CsvOptions {
    pub sep: Option<String>,
    pub quote_all: Option<bool>,
    pub include_header: Option<bool>,
    pub empty_value: Option<String>,
    pub compression: Option<String>,
    pub date_format: Option<String>,
    pub timestamp_format: Option<String>,
    pub ignore_leading_white_space: Option<bool>,
    pub ignore_trailing_white_space: Option<bool>,
    pub line_sep: Option<String>,
}

/// Login credentials of a database connector
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "adt_type", rename_all = "lowercase")]
pub enum Credentials {
    Basic {
        username: String,
        password: String,
    },
    File {
        username: String,
        filepath: String,
    },
    Gcpsm {
        username: String,
        #[serde(rename = "passwordSecretProject")]
        password_secret_project: String,
        #[serde(rename = "passwordSecretId")]
        password_secret_id: String,
    },
}

/// Source of a secret property value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "adt_type", rename_all = "lowercase")]
pub enum SecretValue {
    Basic {
        secret: String,
    },
    File {
        filepath: String,
    },
    Gcpsm {
        #[serde(rename = "secretProject")]
        secret_project: String,
        #[serde(rename = "secretId")]
        secret_id: String,
    },
}

/// Kafka client property whose value is resolved from a secret
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SensitiveAttribute {
    pub key: String,
    #[serde(rename = "valueConfig")]
    pub value_config: SecretValue,
}

/// Principal a rule applies to
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "adt_type", rename_all = "lowercase")]
pub enum PrincipalId {
    UserId { id: i64 },
    UserGroupId { id: i64 },
}

/// Row filter or column mask applied to principals of an access rule
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "adt_type", rename_all = "lowercase")]
pub enum MaskingRule {
    Filter { expression: String },
    Mask { column: String, expression: String },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccessRule {
    pub resource: String,
    #[serde(default)]
    pub principals: Vec<PrincipalId>,
    #[serde(default)]
    pub masking_rules: Vec<MaskingRule>,
}

/// SQL fragment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SqlExpression {
    pub sql: String,
}

/// Marker object; present means subscribed
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subscribed {}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn csv_writes_every_option() {
        let format = FileFormat::Csv(CsvOptions {
            sep: Some(",".to_string()),
            ..Default::default()
        });
        assert_eq!(
            serde_json::to_value(&format).unwrap(),
            json!({
                "adt_type": "csv",
                "sep": ",",
                "quoteAll": null,
                "includeHeader": null,
                "emptyValue": null,
                "compression": null,
                "dateFormat": null,
                "timestampFormat": null,
                "ignoreLeadingWhiteSpace": null,
                "ignoreTrailingWhiteSpace": null,
                "lineSep": null
            })
        );
    }

    #[test]
    fn parquet_has_no_options() {
        assert_eq!(
            serde_json::to_value(FileFormat::Parquet).unwrap(),
            json!({"adt_type": "parquet"})
        );
    }

    #[test]
    fn principal_tags() {
        let decoded: Vec<PrincipalId> =
            serde_json::from_value(json!([{"adt_type": "userid", "id": 3}, {"adt_type": "usergroupid", "id": 4}]))
                .unwrap();
        assert_eq!(decoded, vec![PrincipalId::UserId { id: 3 }, PrincipalId::UserGroupId { id: 4 }]);
    }

    #[test]
    fn subscription_marker_is_an_empty_object() {
        assert_eq!(serde_json::to_value(Subscribed {}).unwrap(), json!({}));
    }
}
