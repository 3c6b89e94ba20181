//! Instance models for form designers
//!
//! An instance model flattens a JSON Schema into one [`ElementDescriptor`]
//! per bindable path (`Order.Lines[*].Price`), carrying cardinality, value
//! type and restrictions. [`InstanceModelGenerator`] builds the model and
//! edits it in place with [`expand_path`](InstanceModelGenerator::expand_path)
//! and [`remove_path`](InstanceModelGenerator::remove_path).

mod descriptor;
mod editor;
mod error;
mod generator;
mod value_type;

pub use descriptor::{
    ElementDescriptor, ElementKind, InstanceModel, REPEATING_MARKER, UNBOUNDED_MAX_OCCURS,
    cardinality, is_descendant, sanitize_name,
};
pub use error::{EditError, GenerateError, StructuralError};
pub use generator::{ExpansionPolicy, GenerateOptions, InstanceModelGenerator, UnknownPolicy};
pub use value_type::{Restriction, ValueType, restrictions, value_type};
