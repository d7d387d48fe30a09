//! Field codecs between attribute values and wire fields
//!
//! Readers take the attribute map of a block and a field name. Absent
//! and `Null` attributes read as `None`.

use std::collections::{BTreeMap, HashMap};

use anaml_core::resource::{Attributes, Value};

use crate::error::MapError;
use crate::wire::common::KeyValue;

/// The populated body of a single-item block, `None` when the block is absent
pub fn single_block<'a>(attrs: &'a Attributes, field: &str) -> Result<Option<&'a Attributes>, MapError> {
    match attrs.get(field) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::List(items)) | Some(Value::Set(items)) => match items.first() {
            None => Ok(None),
            Some(Value::Map(body)) => Ok(Some(body)),
            Some(other) => Err(MapError::invalid_type(field, "block", other.type_name())),
        },
        Some(Value::Map(body)) => Ok(Some(body)),
        Some(other) => Err(MapError::invalid_type(field, "block", other.type_name())),
    }
}

/// Every body of a repeated block
pub fn block_list<'a>(attrs: &'a Attributes, field: &str) -> Result<Vec<&'a Attributes>, MapError> {
    match attrs.get(field) {
        None | Some(Value::Null) => Ok(Vec::new()),
        Some(Value::List(items)) | Some(Value::Set(items)) => items
            .iter()
            .map(|item| match item {
                Value::Map(body) => Ok(body),
                other => Err(MapError::invalid_type(field, "block", other.type_name())),
            })
            .collect(),
        Some(other) => Err(MapError::invalid_type(field, "block list", other.type_name())),
    }
}

pub fn get_str(attrs: &Attributes, field: &str) -> Result<Option<String>, MapError> {
    match attrs.get(field) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.clone())),
        Some(other) => Err(MapError::invalid_type(field, "string", other.type_name())),
    }
}

pub fn required_str(attrs: &Attributes, field: &str) -> Result<String, MapError> {
    get_str(attrs, field)?.ok_or_else(|| MapError::MissingAttribute(field.to_string()))
}

/// Optional string where the empty string counts as unset
pub fn non_empty_str(attrs: &Attributes, field: &str) -> Result<Option<String>, MapError> {
    Ok(get_str(attrs, field)?.filter(|s| !s.is_empty()))
}

pub fn get_bool(attrs: &Attributes, field: &str) -> Result<Option<bool>, MapError> {
    match attrs.get(field) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Bool(b)) => Ok(Some(*b)),
        Some(other) => Err(MapError::invalid_type(field, "bool", other.type_name())),
    }
}

pub fn get_int(attrs: &Attributes, field: &str) -> Result<Option<i64>, MapError> {
    match attrs.get(field) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Int(i)) => Ok(Some(*i)),
        Some(other) => Err(MapError::invalid_type(field, "int", other.type_name())),
    }
}

/// Parse a decimal identifier string
pub fn parse_identifier(field: &str, value: &str) -> Result<i64, MapError> {
    if value.is_empty() || !value.bytes().all(|b| b.is_ascii_digit()) {
        return Err(MapError::InvalidIdentifierFormat {
            field: field.to_string(),
            value: value.to_string(),
        });
    }
    value.parse().map_err(|_| MapError::InvalidIdentifierFormat {
        field: field.to_string(),
        value: value.to_string(),
    })
}

pub fn get_identifier(attrs: &Attributes, field: &str) -> Result<Option<i64>, MapError> {
    match non_empty_str(attrs, field)? {
        Some(s) => parse_identifier(field, &s).map(Some),
        None => Ok(None),
    }
}

pub fn required_identifier(attrs: &Attributes, field: &str) -> Result<i64, MapError> {
    get_identifier(attrs, field)?.ok_or_else(|| MapError::MissingAttribute(field.to_string()))
}

/// Decode a list or set of identifier strings; empty strings are skipped
pub fn identifier_list(attrs: &Attributes, field: &str) -> Result<Vec<i64>, MapError> {
    let items = match attrs.get(field) {
        None | Some(Value::Null) => return Ok(Vec::new()),
        Some(Value::List(items)) | Some(Value::Set(items)) => items,
        Some(other) => return Err(MapError::invalid_type(field, "list", other.type_name())),
    };
    let mut ids = Vec::with_capacity(items.len());
    for item in items {
        match item {
            Value::String(s) if s.is_empty() => {}
            Value::String(s) => ids.push(parse_identifier(field, s)?),
            Value::Null => {}
            other => return Err(MapError::invalid_type(field, "identifier", other.type_name())),
        }
    }
    Ok(ids)
}

/// Encode identifiers as an ordered list of decimal strings
pub fn identifiers_to_list(ids: &[i64]) -> Value {
    Value::List(ids.iter().map(|id| Value::String(id.to_string())).collect())
}

/// Encode identifiers as a set of decimal strings
pub fn identifiers_to_set(ids: &[i64]) -> Value {
    Value::Set(ids.iter().map(|id| Value::String(id.to_string())).collect())
}

pub fn identifier_value(id: Option<i64>) -> Value {
    Value::opt_string(id.map(|id| id.to_string()))
}

/// Decode a list or set of strings, skipping empty entries
pub fn string_list(attrs: &Attributes, field: &str) -> Result<Vec<String>, MapError> {
    let items = match attrs.get(field) {
        None | Some(Value::Null) => return Ok(Vec::new()),
        Some(Value::List(items)) | Some(Value::Set(items)) => items,
        Some(other) => return Err(MapError::invalid_type(field, "list", other.type_name())),
    };
    let mut out = Vec::with_capacity(items.len());
    for item in items {
        match item {
            Value::String(s) if s.is_empty() => {}
            Value::String(s) => out.push(s.clone()),
            Value::Null => {}
            other => return Err(MapError::invalid_type(field, "string", other.type_name())),
        }
    }
    Ok(out)
}

pub fn strings_to_set(items: &[String]) -> Value {
    Value::Set(items.iter().cloned().map(Value::String).collect())
}

/// Labels attached to an object
pub fn labels(attrs: &Attributes) -> Result<Vec<String>, MapError> {
    string_list(attrs, "labels")
}

/// Key/value attributes attached to an object, configured as `attribute` blocks
pub fn key_values(attrs: &Attributes, field: &str) -> Result<Vec<KeyValue>, MapError> {
    block_list(attrs, field)?
        .into_iter()
        .map(|body| {
            Ok(KeyValue {
                key: required_str(body, "key")?,
                value: get_str(body, "value")?.unwrap_or_default(),
            })
        })
        .collect()
}

pub fn key_values_to_set(items: &[KeyValue]) -> Value {
    Value::Set(
        items
            .iter()
            .map(|kv| {
                let mut body = HashMap::new();
                body.insert("key".to_string(), Value::string(&kv.key));
                body.insert("value".to_string(), Value::string(&kv.value));
                Value::Map(body)
            })
            .collect(),
    )
}

/// Decode a map of strings
pub fn string_map(attrs: &Attributes, field: &str) -> Result<BTreeMap<String, String>, MapError> {
    let entries = match attrs.get(field) {
        None | Some(Value::Null) => return Ok(BTreeMap::new()),
        Some(Value::Map(entries)) => entries,
        Some(other) => return Err(MapError::invalid_type(field, "map", other.type_name())),
    };
    entries
        .iter()
        .map(|(key, value)| match value {
            Value::String(s) => Ok((key.clone(), s.clone())),
            other => Err(MapError::invalid_type(
                format!("{}.{}", field, key),
                "string",
                other.type_name(),
            )),
        })
        .collect()
}

pub fn string_map_value(entries: &BTreeMap<String, String>) -> Value {
    Value::Map(
        entries
            .iter()
            .map(|(k, v)| (k.clone(), Value::string(v)))
            .collect(),
    )
}

/// Attribute map builder for flattened blocks
#[derive(Debug, Default)]
pub struct Block {
    attributes: Attributes,
}

impl Block {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(mut self, key: &str, value: Value) -> Self {
        self.attributes.insert(key.to_string(), value);
        self
    }

    pub fn string(self, key: &str, value: impl Into<String>) -> Self {
        self.set(key, Value::String(value.into()))
    }

    pub fn opt_string(self, key: &str, value: Option<&String>) -> Self {
        self.set(key, Value::opt_string(value.cloned()))
    }

    pub fn build(self) -> Attributes {
        self.attributes
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn attrs(pairs: Vec<(&str, Value)>) -> Attributes {
        pairs
            .into_iter()
            .map(|(k, v)| (k.to_string(), v))
            .collect()
    }

    #[test]
    fn absent_block_reads_as_none() {
        let a = attrs(vec![("s3", Value::empty_block())]);
        assert!(single_block(&a, "s3").unwrap().is_none());
        assert!(single_block(&a, "gcs").unwrap().is_none());
    }

    #[test]
    fn block_of_wrong_shape_is_rejected() {
        let a = attrs(vec![("s3", Value::List(vec![Value::string("x")]))]);
        assert!(matches!(
            single_block(&a, "s3"),
            Err(MapError::InvalidFieldType { .. })
        ));
    }

    #[test]
    fn identifier_list_skips_empty_strings() {
        let a = attrs(vec![(
            "entities",
            Value::List(vec![Value::string("1"), Value::string(""), Value::string("3")]),
        )]);
        assert_eq!(identifier_list(&a, "entities").unwrap(), vec![1, 3]);
    }

    #[test]
    fn identifier_list_rejects_non_numeric() {
        let a = attrs(vec![(
            "entities",
            Value::List(vec![Value::string("1"), Value::string("abc")]),
        )]);
        match identifier_list(&a, "entities") {
            Err(MapError::InvalidIdentifierFormat { field, value }) => {
                assert_eq!(field, "entities");
                assert_eq!(value, "abc");
            }
            other => panic!("Expected InvalidIdentifierFormat, got {:?}", other),
        }
    }

    #[test]
    fn negative_identifiers_are_rejected() {
        assert!(parse_identifier("table", "-4").is_err());
        assert!(parse_identifier("table", "+4").is_err());
    }

    #[test]
    fn wrong_scalar_type_is_reported() {
        let a = attrs(vec![("quote_all", Value::string("yes"))]);
        match get_bool(&a, "quote_all") {
            Err(MapError::InvalidFieldType { expected, got, .. }) => {
                assert_eq!(expected, "bool");
                assert_eq!(got, "String");
            }
            other => panic!("Expected InvalidFieldType, got {:?}", other),
        }
    }

    #[test]
    fn key_values_read_attribute_blocks() {
        let mut body = HashMap::new();
        body.insert("key".to_string(), Value::string("team"));
        body.insert("value".to_string(), Value::string("risk"));
        let a = attrs(vec![("attribute", Value::Set(vec![Value::Map(body)]))]);

        let kvs = key_values(&a, "attribute").unwrap();
        assert_eq!(kvs.len(), 1);
        assert_eq!(kvs[0].key, "team");
        assert_eq!(key_values_to_set(&kvs), a["attribute"]);
    }

    #[test]
    fn string_map_rejects_non_string_values() {
        let mut entries = HashMap::new();
        entries.insert("spark.executor.cores".to_string(), Value::Int(4));
        let a = attrs(vec![("additional_spark_properties", Value::Map(entries))]);
        assert!(string_map(&a, "additional_spark_properties").is_err());
    }

    proptest! {
        #[test]
        fn identifier_lists_preserve_order(ids in proptest::collection::vec(0i64..i64::MAX, 0..16)) {
            let a = attrs(vec![("features", identifiers_to_list(&ids))]);
            prop_assert_eq!(identifier_list(&a, "features").unwrap(), ids);
        }

        #[test]
        fn identifier_sets_keep_every_member(ids in proptest::collection::vec(0i64..10_000, 0..16)) {
            let a = attrs(vec![("features", identifiers_to_set(&ids))]);
            let mut decoded = identifier_list(&a, "features").unwrap();
            let mut expected = ids.clone();
            decoded.sort_unstable();
            expected.sort_unstable();
            prop_assert_eq!(decoded, expected);
        }

        #[test]
        fn non_digit_strings_never_parse(s in "[0-9]*[a-zA-Z_ -][0-9a-zA-Z]*") {
            prop_assert!(parse_identifier("id", &s).is_err());
        }
    }
}
