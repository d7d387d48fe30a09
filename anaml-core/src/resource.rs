//! Resource - Representing resources and their state

use std::collections::HashMap;

/// Attribute tree of a resource block, keyed by attribute name
pub type Attributes = HashMap<String, Value>;

/// Unique identifier for a resource
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ResourceId {
    /// Resource type (e.g., "anaml_source", "anaml_entity")
    pub resource_type: String,
    /// Resource name (label of the resource block)
    pub name: String,
}

impl ResourceId {
    pub fn new(resource_type: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            resource_type: resource_type.into(),
            name: name.into(),
        }
    }
}

impl std::fmt::Display for ResourceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}", self.resource_type, self.name)
    }
}

/// Attribute value of a resource
///
/// Single-item nested blocks are represented as a `List` holding one `Map`;
/// an absent block is an empty `List`.
#[derive(Debug, Clone)]
pub enum Value {
    /// Unset optional attribute
    Null,
    String(String),
    Int(i64),
    Bool(bool),
    /// Ordered collection
    List(Vec<Value>),
    /// Unordered collection; equality ignores element order
    Set(Vec<Value>),
    Map(HashMap<String, Value>),
}

impl Value {
    /// Shorthand for `Value::String`
    pub fn string(s: impl Into<String>) -> Self {
        Value::String(s.into())
    }

    /// Wrap a map as a populated single-item block
    pub fn block(attributes: Attributes) -> Self {
        Value::List(vec![Value::Map(attributes)])
    }

    /// An absent block
    pub fn empty_block() -> Self {
        Value::List(Vec::new())
    }

    /// Optional string, `Null` when absent
    pub fn opt_string(s: Option<impl Into<String>>) -> Self {
        s.map_or(Value::Null, |s| Value::String(s.into()))
    }

    /// Optional boolean, `Null` when absent
    pub fn opt_bool(b: Option<bool>) -> Self {
        b.map_or(Value::Null, Value::Bool)
    }

    /// Optional integer, `Null` when absent
    pub fn opt_int(i: Option<i64>) -> Self {
        i.map_or(Value::Null, Value::Int)
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Returns true for values the host treats as "not set":
    /// null, and empty lists, sets and maps.
    pub fn is_unset(&self) -> bool {
        match self {
            Value::Null => true,
            Value::List(items) | Value::Set(items) => items.is_empty(),
            Value::Map(map) => map.is_empty(),
            _ => false,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "Null",
            Value::String(_) => "String",
            Value::Int(_) => "Int",
            Value::Bool(_) => "Bool",
            Value::List(_) => "List",
            Value::Set(_) => "Set",
            Value::Map(_) => "Map",
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::List(a), Value::List(b)) => a == b,
            (Value::Set(a), Value::Set(b)) => same_elements(a, b),
            (Value::Map(a), Value::Map(b)) => a == b,
            _ => false,
        }
    }
}

/// Multiset comparison for set values
fn same_elements(a: &[Value], b: &[Value]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    let mut used = vec![false; b.len()];
    'outer: for item in a {
        for (i, candidate) in b.iter().enumerate() {
            if !used[i] && item == candidate {
                used[i] = true;
                continue 'outer;
            }
        }
        return false;
    }
    true
}

/// Desired state declared in configuration
#[derive(Debug, Clone, PartialEq)]
pub struct Resource {
    pub id: ResourceId,
    pub attributes: Attributes,
    /// If true, this is a data source (read-only) that won't be modified
    pub read_only: bool,
}

impl Resource {
    pub fn new(resource_type: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: ResourceId::new(resource_type, name),
            attributes: HashMap::new(),
            read_only: false,
        }
    }

    pub fn with_attribute(mut self, key: impl Into<String>, value: Value) -> Self {
        self.attributes.insert(key.into(), value);
        self
    }

    pub fn with_attributes(mut self, attributes: Attributes) -> Self {
        self.attributes = attributes;
        self
    }

    pub fn with_read_only(mut self, read_only: bool) -> Self {
        self.read_only = read_only;
        self
    }

    /// Returns true if this resource is a data source (read-only)
    pub fn is_data_source(&self) -> bool {
        self.read_only
    }
}

/// Current state fetched from the backend
#[derive(Debug, Clone, PartialEq)]
pub struct State {
    pub id: ResourceId,
    /// Backend identifier in decimal form (e.g., "42")
    pub identifier: Option<String>,
    pub attributes: Attributes,
    /// Whether this state exists
    pub exists: bool,
}

impl State {
    /// State of an object the backend does not know about; the host
    /// clears its stored identifier when it sees this.
    pub fn not_found(id: ResourceId) -> Self {
        Self {
            id,
            identifier: None,
            attributes: HashMap::new(),
            exists: false,
        }
    }

    pub fn existing(id: ResourceId, attributes: Attributes) -> Self {
        Self {
            id,
            identifier: None,
            attributes,
            exists: true,
        }
    }

    pub fn with_identifier(mut self, identifier: impl Into<String>) -> Self {
        self.identifier = Some(identifier.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_equality_ignores_order() {
        let a = Value::Set(vec![Value::string("x"), Value::string("y")]);
        let b = Value::Set(vec![Value::string("y"), Value::string("x")]);
        assert_eq!(a, b);
    }

    #[test]
    fn set_equality_counts_duplicates() {
        let a = Value::Set(vec![Value::string("x"), Value::string("x")]);
        let b = Value::Set(vec![Value::string("x"), Value::string("y")]);
        assert_ne!(a, b);
    }

    #[test]
    fn list_equality_is_ordered() {
        let a = Value::List(vec![Value::Int(1), Value::Int(2)]);
        let b = Value::List(vec![Value::Int(2), Value::Int(1)]);
        assert_ne!(a, b);
    }

    #[test]
    fn unset_values() {
        assert!(Value::Null.is_unset());
        assert!(Value::empty_block().is_unset());
        assert!(Value::Set(vec![]).is_unset());
        assert!(!Value::string("").is_unset());
        assert!(!Value::block(Attributes::new()).is_unset());
    }

    #[test]
    fn not_found_state_has_no_identifier() {
        let state = State::not_found(ResourceId::new("anaml_entity", "customer"));
        assert!(!state.exists);
        assert!(state.identifier.is_none());
    }

    #[test]
    fn resource_id_display() {
        let id = ResourceId::new("anaml_source", "lake");
        assert_eq!(id.to_string(), "anaml_source.lake");
    }
}
