//! Anaml Core
//!
//! Attribute model, schema declarations and the provider lifecycle shared by
//! the Anaml resource mapper

pub mod differ;
pub mod provider;
pub mod resource;
pub mod schema;
