//! Built-in XSD datatypes with a JSON Schema counterpart.

use serde_json::Number;
use xsdform_json_schema::{Schema, SchemaBuilder, SchemaType};

/// JSON Schema for a type in the XML Schema namespace, or `None` when the
/// type has no mapping.
pub fn builtin_schema(local_name: &str) -> Option<Schema> {
    let builder = match local_name {
        "string" | "normalizedString" | "token" | "language" | "Name" | "NCName" | "NMTOKEN"
        | "ID" | "IDREF" | "ENTITY" | "anyURI" => SchemaBuilder::of_type(SchemaType::String),
        "boolean" => SchemaBuilder::of_type(SchemaType::Boolean),
        "integer" => SchemaBuilder::of_type(SchemaType::Integer),
        "positiveInteger" | "nonNegativeInteger" => {
            SchemaBuilder::of_type(SchemaType::Integer).minimum(Number::from(0))
        }
        "short" => SchemaBuilder::of_type(SchemaType::Integer)
            .minimum(Number::from(i16::MIN))
            .maximum(Number::from(i16::MAX)),
        "long" => SchemaBuilder::of_type(SchemaType::Integer)
            .minimum(Number::from(i64::MIN))
            .maximum(Number::from(i64::MAX)),
        "double" | "decimal" => SchemaBuilder::of_type(SchemaType::Number),
        "date" => SchemaBuilder::of_type(SchemaType::String).format("date"),
        "time" => SchemaBuilder::of_type(SchemaType::String).format("time"),
        "dateTime" => SchemaBuilder::of_type(SchemaType::String).format("date-time"),
        "gYear" => SchemaBuilder::of_type(SchemaType::String).format("year"),
        "gYearMonth" => SchemaBuilder::of_type(SchemaType::String).format("year-month"),
        "base64Binary" => SchemaBuilder::of_type(SchemaType::String).content_encoding("base64"),
        _ => return None,
    };
    Some(builder.build())
}
