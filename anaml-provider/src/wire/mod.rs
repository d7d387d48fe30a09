//! Backend JSON records
//!
//! Every polymorphic record is a closed enum tagged by `adt_type`; variant
//! fields sit next to the tag in the parent object.

pub mod access;
pub mod cluster;
pub mod common;
pub mod connector;
pub mod entity;
pub mod feature;
pub mod feature_store;
pub mod source;
pub mod table;
