//! Mapper - Translating between configuration blocks and backend records
//!
//! A polymorphic object is configured as a parent block with mutually
//! exclusive single-item child blocks, one per variant. `compose_variant`
//! picks the first populated child in declaration order; `flatten_variant`
//! writes the selected child and an empty list for every sibling so stale
//! blocks are cleared from state.

use anaml_core::resource::{Attributes, Value};
use anaml_core::schema::ResourceSchema;
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::codec::single_block;
use crate::error::MapError;

/// A closed set of variants, each configured as its own block
pub trait Variant: Sized {
    /// Variant block names in declaration order
    const BLOCKS: &'static [&'static str];

    /// Build the variant configured under `block`
    fn compose_block(block: &str, body: &Attributes) -> Result<Self, MapError>;

    /// Block name and body of this variant
    fn flatten_block(&self) -> (&'static str, Attributes);
}

/// Compose the first populated variant block, `None` when none is populated
pub fn compose_variant<V: Variant>(attrs: &Attributes) -> Result<Option<V>, MapError> {
    for block in V::BLOCKS {
        if let Some(body) = single_block(attrs, block)? {
            return V::compose_block(block, body).map(Some);
        }
    }
    Ok(None)
}

/// Compose a variant that must be present
pub fn require_variant<V: Variant>(attrs: &Attributes, field: &str) -> Result<V, MapError> {
    compose_variant(attrs)?.ok_or_else(|| MapError::NoVariantSelected {
        field: field.to_string(),
        expected: V::BLOCKS.iter().map(|b| b.to_string()).collect(),
    })
}

/// Write the selected variant block and clear its siblings
pub fn flatten_variant<V: Variant>(variant: &V, attrs: &mut Attributes) {
    let (selected, body) = variant.flatten_block();
    for block in V::BLOCKS {
        attrs.insert(block.to_string(), Value::empty_block());
    }
    attrs.insert(selected.to_string(), Value::block(body));
}

/// Write an optional variant; `None` clears every block
pub fn flatten_optional_variant<V: Variant>(variant: Option<&V>, attrs: &mut Attributes) {
    match variant {
        Some(v) => flatten_variant(v, attrs),
        None => {
            for block in V::BLOCKS {
                attrs.insert(block.to_string(), Value::empty_block());
            }
        }
    }
}

/// Error for a block name the variant does not declare
pub fn undeclared_block(block: &str) -> MapError {
    MapError::UnknownVariantTag {
        tag: block.to_string(),
    }
}

/// Bidirectional mapping for one resource type
pub trait ResourceMapper: Send + Sync {
    /// Backend record
    type Wire: Serialize + DeserializeOwned;

    /// Host resource type name (e.g., "anaml_source")
    const TYPE_NAME: &'static str;

    /// REST collection the record lives in (e.g., "source")
    const COLLECTION: &'static str;

    fn schema(&self) -> ResourceSchema;

    /// Configuration to wire record; pure
    fn compose(&self, attrs: &Attributes) -> Result<Self::Wire, MapError>;

    /// Wire record to configuration; pure
    fn flatten(&self, wire: &Self::Wire) -> Result<Attributes, MapError>;
}

/// Object-safe view of a `ResourceMapper` working on raw JSON
pub trait DynamicMapper: Send + Sync {
    fn type_name(&self) -> &'static str;
    fn collection(&self) -> &'static str;
    fn resource_schema(&self) -> ResourceSchema;
    fn compose_json(&self, attrs: &Attributes) -> Result<serde_json::Value, MapError>;
    fn flatten_json(&self, json: serde_json::Value) -> Result<Attributes, MapError>;
}

impl<M: ResourceMapper> DynamicMapper for M {
    fn type_name(&self) -> &'static str {
        M::TYPE_NAME
    }

    fn collection(&self) -> &'static str {
        M::COLLECTION
    }

    fn resource_schema(&self) -> ResourceSchema {
        self.schema()
    }

    fn compose_json(&self, attrs: &Attributes) -> Result<serde_json::Value, MapError> {
        let wire = self.compose(attrs)?;
        serde_json::to_value(&wire).map_err(MapError::Wire)
    }

    fn flatten_json(&self, json: serde_json::Value) -> Result<Attributes, MapError> {
        let wire: M::Wire = serde_json::from_value(json).map_err(MapError::from_wire)?;
        self.flatten(&wire)
    }
}

/// Read-only lookup of an existing object by name
pub trait DataSourceMapper: Send + Sync {
    fn type_name(&self) -> &'static str;
    fn collection(&self) -> &'static str;
    fn schema(&self) -> ResourceSchema;
    fn flatten_json(&self, json: serde_json::Value) -> Result<Attributes, MapError>;
}
