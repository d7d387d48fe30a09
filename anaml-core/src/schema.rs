//! Schema - Declare attribute schemas for resource blocks
//!
//! Providers publish a schema for each resource type. The host validates
//! configuration against it before any lifecycle call, which is where
//! mutually exclusive variant blocks are enforced.

use std::collections::{BTreeSet, HashMap};
use std::fmt;

use crate::resource::{Attributes, Value};

/// Attribute type
#[derive(Debug, Clone)]
pub enum AttributeType {
    /// String
    String,
    /// Integer
    Int,
    /// Boolean
    Bool,
    /// Enum (list of allowed values)
    Enum(Vec<String>),
    /// Custom type (with validation function)
    Custom {
        name: String,
        base: Box<AttributeType>,
        validate: fn(&Value) -> Result<(), String>,
    },
    /// Ordered list
    List(Box<AttributeType>),
    /// Unordered set
    Set(Box<AttributeType>),
    /// Map with string keys
    Map(Box<AttributeType>),
    /// Nested block, repeated up to `max_items` times
    Block {
        schema: Box<ResourceSchema>,
        max_items: Option<usize>,
    },
}

impl AttributeType {
    /// Build an enum type from string slices
    pub fn one_of(values: &[&str]) -> Self {
        AttributeType::Enum(values.iter().map(|v| v.to_string()).collect())
    }

    /// A nested block that may appear at most once
    pub fn single_block(schema: ResourceSchema) -> Self {
        AttributeType::Block {
            schema: Box::new(schema),
            max_items: Some(1),
        }
    }

    /// A nested block that may be repeated
    pub fn block_list(schema: ResourceSchema) -> Self {
        AttributeType::Block {
            schema: Box::new(schema),
            max_items: None,
        }
    }

    /// Check if a value conforms to this type. `Null` is accepted for
    /// every type; presence is checked separately.
    pub fn validate(&self, value: &Value) -> Result<(), TypeError> {
        match (self, value) {
            (_, Value::Null) => Ok(()),
            (AttributeType::String, Value::String(_)) => Ok(()),
            (AttributeType::Int, Value::Int(_)) => Ok(()),
            (AttributeType::Bool, Value::Bool(_)) => Ok(()),

            (AttributeType::Enum(variants), Value::String(s)) => {
                if variants.iter().any(|v| v == s) {
                    Ok(())
                } else {
                    Err(TypeError::InvalidEnumVariant {
                        value: s.clone(),
                        expected: variants.clone(),
                    })
                }
            }

            (AttributeType::Custom { validate, base, .. }, v) => {
                base.validate(v)?;
                validate(v).map_err(|msg| TypeError::ValidationFailed { message: msg })
            }

            (AttributeType::List(inner), Value::List(items))
            | (AttributeType::Set(inner), Value::Set(items))
            | (AttributeType::Set(inner), Value::List(items)) => {
                for (i, item) in items.iter().enumerate() {
                    inner.validate(item).map_err(|e| TypeError::ListItemError {
                        index: i,
                        inner: Box::new(e),
                    })?;
                }
                Ok(())
            }

            (AttributeType::Map(inner), Value::Map(map)) => {
                for (k, v) in map {
                    inner.validate(v).map_err(|e| TypeError::MapValueError {
                        key: k.clone(),
                        inner: Box::new(e),
                    })?;
                }
                Ok(())
            }

            (AttributeType::Block { schema, max_items }, Value::List(items))
            | (AttributeType::Block { schema, max_items }, Value::Set(items)) => {
                if let Some(max) = max_items
                    && items.len() > *max
                {
                    return Err(TypeError::TooManyBlocks {
                        max: *max,
                        got: items.len(),
                    });
                }
                for (i, item) in items.iter().enumerate() {
                    let Value::Map(attrs) = item else {
                        return Err(TypeError::TypeMismatch {
                            expected: "Block".to_string(),
                            got: item.type_name().to_string(),
                        });
                    };
                    schema
                        .validate(attrs)
                        .map_err(|errors| TypeError::BlockErrors {
                            index: i,
                            errors,
                        })?;
                }
                Ok(())
            }

            _ => Err(TypeError::TypeMismatch {
                expected: self.type_name(),
                got: value.type_name().to_string(),
            }),
        }
    }

    fn type_name(&self) -> String {
        match self {
            AttributeType::String => "String".to_string(),
            AttributeType::Int => "Int".to_string(),
            AttributeType::Bool => "Bool".to_string(),
            AttributeType::Enum(variants) => format!("Enum({})", variants.join(" | ")),
            AttributeType::Custom { name, .. } => name.clone(),
            AttributeType::List(inner) => format!("List<{}>", inner.type_name()),
            AttributeType::Set(inner) => format!("Set<{}>", inner.type_name()),
            AttributeType::Map(inner) => format!("Map<{}>", inner.type_name()),
            AttributeType::Block { schema, .. } => format!("Block({})", schema.resource_type),
        }
    }
}

impl fmt::Display for AttributeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.type_name())
    }
}

/// Type error
#[derive(Debug, Clone, thiserror::Error)]
pub enum TypeError {
    #[error("Type mismatch: expected {expected}, got {got}")]
    TypeMismatch { expected: String, got: String },

    #[error("Invalid enum variant '{value}', expected one of: {}", expected.join(", "))]
    InvalidEnumVariant {
        value: String,
        expected: Vec<String>,
    },

    #[error("Validation failed: {message}")]
    ValidationFailed { message: String },

    #[error("Required attribute '{name}' is missing")]
    MissingRequired { name: String },

    #[error("Unknown attribute '{name}'")]
    UnknownAttribute { name: String },

    #[error("Exactly one of {} must be set", names.join(", "))]
    ExactlyOneOf { names: Vec<String> },

    #[error("'{name}' conflicts with {}", with.join(", "))]
    Conflict { name: String, with: Vec<String> },

    #[error("At most {max} block(s) allowed, got {got}")]
    TooManyBlocks { max: usize, got: usize },

    #[error("List item at index {index}: {inner}")]
    ListItemError { index: usize, inner: Box<TypeError> },

    #[error("Map value for key '{key}': {inner}")]
    MapValueError { key: String, inner: Box<TypeError> },

    #[error("Block at index {index}: {}", errors.iter().map(|e| e.to_string()).collect::<Vec<_>>().join("; "))]
    BlockErrors { index: usize, errors: Vec<TypeError> },

    #[error("Attribute '{name}': {inner}")]
    AttributeError { name: String, inner: Box<TypeError> },
}

/// Attribute schema
#[derive(Debug, Clone)]
pub struct AttributeSchema {
    pub name: String,
    pub attr_type: AttributeType,
    pub required: bool,
    /// Set by the backend rather than by configuration
    pub computed: bool,
    /// Hidden from plan output
    pub sensitive: bool,
    pub description: Option<String>,
    /// Group of attributes (including this one) of which exactly one must be set
    pub exactly_one_of: Vec<String>,
    /// Attributes that may not be set together with this one
    pub conflicts_with: Vec<String>,
}

impl AttributeSchema {
    pub fn new(name: impl Into<String>, attr_type: AttributeType) -> Self {
        Self {
            name: name.into(),
            attr_type,
            required: false,
            computed: false,
            sensitive: false,
            description: None,
            exactly_one_of: Vec::new(),
            conflicts_with: Vec::new(),
        }
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn computed(mut self) -> Self {
        self.computed = true;
        self
    }

    pub fn sensitive(mut self) -> Self {
        self.sensitive = true;
        self
    }

    pub fn with_description(mut self, desc: impl Into<String>) -> Self {
        self.description = Some(desc.into());
        self
    }

    pub fn exactly_one_of(mut self, names: &[&str]) -> Self {
        self.exactly_one_of = names.iter().map(|n| n.to_string()).collect();
        self
    }

    pub fn conflicts_with(mut self, names: &[&str]) -> Self {
        self.conflicts_with = names.iter().map(|n| n.to_string()).collect();
        self
    }
}

/// Resource schema; also used for the body of nested blocks
#[derive(Debug, Clone)]
pub struct ResourceSchema {
    pub resource_type: String,
    pub attributes: HashMap<String, AttributeSchema>,
    pub description: Option<String>,
}

impl ResourceSchema {
    pub fn new(resource_type: impl Into<String>) -> Self {
        Self {
            resource_type: resource_type.into(),
            attributes: HashMap::new(),
            description: None,
        }
    }

    pub fn attribute(mut self, schema: AttributeSchema) -> Self {
        self.attributes.insert(schema.name.clone(), schema);
        self
    }

    pub fn with_description(mut self, desc: impl Into<String>) -> Self {
        self.description = Some(desc.into());
        self
    }

    /// Validate resource attributes
    pub fn validate(&self, attributes: &Attributes) -> Result<(), Vec<TypeError>> {
        let mut errors = Vec::new();
        let is_set = |name: &str| attributes.get(name).is_some_and(|v| !v.is_unset());

        // Check required attributes
        for (name, schema) in &self.attributes {
            if schema.required && !schema.computed && !is_set(name) {
                errors.push(TypeError::MissingRequired { name: name.clone() });
            }
        }

        // Type check each attribute
        for (name, value) in attributes {
            match self.attributes.get(name) {
                Some(schema) => {
                    if let Err(e) = schema.attr_type.validate(value) {
                        errors.push(TypeError::AttributeError {
                            name: name.clone(),
                            inner: Box::new(e),
                        });
                    }
                }
                None => errors.push(TypeError::UnknownAttribute { name: name.clone() }),
            }
        }

        // Mutual exclusion groups, each reported once
        let mut seen_groups = BTreeSet::new();
        for schema in self.attributes.values() {
            if schema.exactly_one_of.is_empty() {
                continue;
            }
            let mut group = schema.exactly_one_of.clone();
            group.sort();
            if !seen_groups.insert(group.clone()) {
                continue;
            }
            let populated: Vec<&String> = group.iter().filter(|n| is_set(n)).collect();
            if populated.len() != 1 {
                errors.push(TypeError::ExactlyOneOf {
                    names: schema.exactly_one_of.clone(),
                });
            }
        }

        for (name, schema) in &self.attributes {
            if schema.conflicts_with.is_empty() || !is_set(name) {
                continue;
            }
            let clashing: Vec<String> = schema
                .conflicts_with
                .iter()
                .filter(|other| is_set(other))
                .cloned()
                .collect();
            if !clashing.is_empty() {
                errors.push(TypeError::Conflict {
                    name: name.clone(),
                    with: clashing,
                });
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

/// Helper functions for common types
pub mod types {
    use std::sync::LazyLock;

    use regex::Regex;

    use super::*;

    static IDENTIFIER: LazyLock<Regex> = LazyLock::new(|| {
        Regex::new(r"^[0-9]+$").expect("identifier pattern is valid")
    });

    static ANAML_NAME: LazyLock<Regex> = LazyLock::new(|| {
        Regex::new(r"^[a-z][a-z0-9_]*$").expect("name pattern is valid")
    });

    /// Backend object id in decimal form (e.g., "42")
    pub fn identifier() -> AttributeType {
        AttributeType::Custom {
            name: "Identifier".to_string(),
            base: Box::new(AttributeType::String),
            validate: |value| match value {
                Value::String(s) if IDENTIFIER.is_match(s) => Ok(()),
                Value::String(s) => Err(format!("'{}' must be parsable as an integer", s)),
                _ => Err("Expected string".to_string()),
            },
        }
    }

    /// Name of an Anaml object: lowercase letters, digits and underscores
    pub fn anaml_name() -> AttributeType {
        AttributeType::Custom {
            name: "AnamlName".to_string(),
            base: Box::new(AttributeType::String),
            validate: |value| match value {
                Value::String(s) if ANAML_NAME.is_match(s) => Ok(()),
                Value::String(s) => Err(format!(
                    "'{}' must start with a lowercase letter and contain only lowercase letters, digits and underscores",
                    s
                )),
                _ => Err("Expected string".to_string()),
            },
        }
    }

    /// String with at least one non-whitespace character
    pub fn not_whitespace() -> AttributeType {
        AttributeType::Custom {
            name: "NonBlankString".to_string(),
            base: Box::new(AttributeType::String),
            validate: |value| match value {
                Value::String(s) if !s.trim().is_empty() => Ok(()),
                Value::String(_) => Err("Value must not be empty or whitespace".to_string()),
                _ => Err("Expected string".to_string()),
            },
        }
    }

    /// Positive integer type
    pub fn positive_int() -> AttributeType {
        AttributeType::Custom {
            name: "PositiveInt".to_string(),
            base: Box::new(AttributeType::Int),
            validate: |value| {
                if let Value::Int(n) = value {
                    if *n > 0 {
                        Ok(())
                    } else {
                        Err("Value must be positive".to_string())
                    }
                } else {
                    Err("Expected integer".to_string())
                }
            },
        }
    }

    /// List of identifiers
    pub fn identifier_list() -> AttributeType {
        AttributeType::List(Box::new(identifier()))
    }

    /// Set of identifiers
    pub fn identifier_set() -> AttributeType {
        AttributeType::Set(Box::new(identifier()))
    }

    /// Map from string keys to string values
    pub fn string_map() -> AttributeType {
        AttributeType::Map(Box::new(AttributeType::String))
    }
}
