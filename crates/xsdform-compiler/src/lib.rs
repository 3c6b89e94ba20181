//! XSD to JSON Schema compilation
//!
//! [`compile`] turns a parsed [`xsdform_xsd::XsdSchema`] into a single JSON
//! Schema document whose `definitions` hold every complex type and every named
//! simple type. Names for anonymous types come from the [`NameRegistry`].

mod builtins;
mod compiler;
mod error;
pub mod names;

pub use builtins::builtin_schema;
pub use compiler::{CompileOptions, compile};
pub use error::CompileError;
pub use names::NameRegistry;
