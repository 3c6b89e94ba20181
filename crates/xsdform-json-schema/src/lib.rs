//! JSON Schema model for xsdform
//!
//! [`Schema`] is the node type produced by the XSD compiler and consumed by
//! the instance-model generator. Nodes are assembled with [`SchemaBuilder`]
//! and not mutated afterwards. Named types live in a [`Definitions`] table
//! and are addressed with `#/definitions/<name>` references.

pub mod builder;
pub mod definitions;
pub mod schema;

pub use builder::{SchemaBuilder, compare_numbers, parse_number};
pub use definitions::{
    DEFINITIONS_PREFIX, DefinitionError, Definitions, definition_name, definition_ref,
};
pub use schema::{Schema, SchemaType, XsdType};

/// Meta-schema URI placed in `$schema` of compiled documents.
pub const META_SCHEMA: &str = "http://json-schema.org/schema#";
