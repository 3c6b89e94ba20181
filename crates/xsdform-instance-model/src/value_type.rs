//! Scalar value types and their restrictions.
//!
//! The value type of a node is read from the first schema along its `$ref`
//! chain that carries a `type`. Arrays are typed by their item schema.

use std::fmt;

use ahash::AHashSet;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use xsdform_json_schema::{Definitions, Schema, SchemaType};

/// Value types a form field can bind to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ValueType {
    String,
    Boolean,
    Decimal,
    Integer,
    PositiveInteger,
    Date,
    DateTime,
    Duration,
    GDay,
    GMonth,
    GMonthDay,
    GYear,
    GYearMonth,
    Time,
    AnyUri,
    Unknown,
}

impl ValueType {
    /// Value type of a string schema carrying `format`.
    pub fn from_format(format: &str) -> Self {
        match format {
            "date" => ValueType::Date,
            "date-time" => ValueType::DateTime,
            "duration" => ValueType::Duration,
            "day" => ValueType::GDay,
            "month" => ValueType::GMonth,
            "month-day" => ValueType::GMonthDay,
            "year" => ValueType::GYear,
            "year-month" => ValueType::GYearMonth,
            "time" => ValueType::Time,
            "email" => ValueType::String,
            "uri" => ValueType::AnyUri,
            _ => ValueType::Unknown,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ValueType::String => "string",
            ValueType::Boolean => "boolean",
            ValueType::Decimal => "decimal",
            ValueType::Integer => "integer",
            ValueType::PositiveInteger => "positiveInteger",
            ValueType::Date => "date",
            ValueType::DateTime => "dateTime",
            ValueType::Duration => "duration",
            ValueType::GDay => "gDay",
            ValueType::GMonth => "gMonth",
            ValueType::GMonthDay => "gMonthDay",
            ValueType::GYear => "gYear",
            ValueType::GYearMonth => "gYearMonth",
            ValueType::Time => "time",
            ValueType::AnyUri => "anyUri",
            ValueType::Unknown => "unknown",
        }
    }

    fn is_string(&self) -> bool {
        matches!(self, ValueType::String)
    }

    fn is_numeric(&self) -> bool {
        matches!(self, ValueType::Decimal | ValueType::PositiveInteger)
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single restriction entry, serialized as `{"value": ...}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Restriction {
    pub value: Value,
}

/// The schemas from `schema` down its `$ref` chain, ending at the first one
/// that carries a `type`. Arrays continue with their item schema.
///
/// Unresolvable and cyclic references end the chain.
pub(crate) fn value_chain<'a>(schema: &'a Schema, definitions: &'a Definitions) -> Vec<&'a Schema> {
    let mut chain = Vec::new();
    let mut seen = AHashSet::new();
    let mut current = Some(schema);
    while let Some(schema) = current {
        chain.push(schema);
        current = match schema.schema_type {
            Some(SchemaType::Array) => schema.item(),
            Some(_) => None,
            None => schema
                .definition_name()
                .filter(|name| seen.insert(*name))
                .and_then(|name| definitions.get(name)),
        };
    }
    chain
}

/// The value type of `schema`, or `None` when it is not a scalar.
pub fn value_type(schema: &Schema, definitions: &Definitions) -> Option<ValueType> {
    let typed = value_chain(schema, definitions).pop()?;
    match typed.schema_type? {
        SchemaType::String => Some(
            typed
                .format
                .as_deref()
                .filter(|format| !format.is_empty())
                .map_or(ValueType::String, ValueType::from_format),
        ),
        SchemaType::Boolean => Some(ValueType::Boolean),
        SchemaType::Number => Some(ValueType::Decimal),
        SchemaType::Integer => Some(match &typed.minimum {
            Some(minimum) if minimum.as_f64() == Some(0.0) => ValueType::PositiveInteger,
            _ => ValueType::Integer,
        }),
        SchemaType::Object | SchemaType::Array | SchemaType::Null => None,
    }
}

/// Restrictions that apply to a node of the given value type. A facet set on
/// the node itself wins over one inherited through `$ref`.
pub fn restrictions(
    value_type: Option<ValueType>,
    schema: &Schema,
    definitions: &Definitions,
) -> IndexMap<String, Restriction> {
    let mut restrictions = IndexMap::new();
    let Some(value_type) = value_type else {
        return restrictions;
    };

    for schema in value_chain(schema, definitions) {
        let mut add = |name: &str, value: Option<Value>| {
            if let Some(value) = value {
                restrictions
                    .entry(name.to_string())
                    .or_insert(Restriction { value });
            }
        };
        if value_type.is_string() {
            add("minLength", schema.min_length.map(Value::from));
            add("maxLength", schema.max_length.map(Value::from));
            add("pattern", schema.pattern.clone().map(Value::String));
        } else if value_type.is_numeric() {
            add("minimum", schema.minimum.clone().map(Value::Number));
            add("maximum", schema.maximum.clone().map(Value::Number));
            add("exclusiveMinimum", schema.exclusive_minimum.clone().map(Value::Number));
            add("exclusiveMaximum", schema.exclusive_maximum.clone().map(Value::Number));
        }
    }
    restrictions
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn schema(value: Value) -> Schema {
        serde_json::from_value(value).unwrap()
    }

    fn definitions(value: Value) -> Definitions {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_primitive_types() {
        let defs = Definitions::new();
        let cases = [
            (json!({"type": "string"}), Some(ValueType::String)),
            (json!({"type": "boolean"}), Some(ValueType::Boolean)),
            (json!({"type": "number"}), Some(ValueType::Decimal)),
            (json!({"type": "integer"}), Some(ValueType::Integer)),
            (json!({"type": "integer", "minimum": 0}), Some(ValueType::PositiveInteger)),
            (json!({"type": "integer", "minimum": 1}), Some(ValueType::Integer)),
            (json!({"type": "object"}), None),
            (json!({}), None),
        ];
        for (input, expected) in cases {
            assert_eq!(value_type(&schema(input.clone()), &defs), expected, "{input}");
        }
    }

    #[test]
    fn test_formats() {
        let defs = Definitions::new();
        let of = |format: &str| value_type(&schema(json!({"type": "string", "format": format})), &defs);
        assert_eq!(of("date-time"), Some(ValueType::DateTime));
        assert_eq!(of("year-month"), Some(ValueType::GYearMonth));
        assert_eq!(of("email"), Some(ValueType::String));
        assert_eq!(of("uri"), Some(ValueType::AnyUri));
        assert_eq!(of("ipv4"), Some(ValueType::Unknown));
    }

    #[test]
    fn test_follows_reference_chain_and_arrays() {
        let defs = definitions(json!({
            "Code": {"$ref": "#/definitions/Text", "maxLength": 3},
            "Text": {"type": "string", "maxLength": 50, "minLength": 1}
        }));
        let array = schema(json!({"type": "array", "items": [{"$ref": "#/definitions/Code"}]}));
        assert_eq!(value_type(&array, &defs), Some(ValueType::String));

        let restrictions = restrictions(Some(ValueType::String), &array, &defs);
        assert_eq!(
            serde_json::to_value(restrictions).unwrap(),
            json!({"maxLength": {"value": 3}, "minLength": {"value": 1}})
        );
    }

    #[test]
    fn test_reference_cycle_has_no_value_type() {
        let defs = definitions(json!({
            "A": {"$ref": "#/definitions/B"},
            "B": {"$ref": "#/definitions/A"}
        }));
        assert_eq!(value_type(&schema(json!({"$ref": "#/definitions/A"})), &defs), None);
    }

    #[test]
    fn test_numeric_restrictions_only_for_numeric_types() {
        let defs = Definitions::new();
        let node = schema(json!({"type": "integer", "minimum": 5, "maximum": 10}));
        assert!(restrictions(Some(ValueType::Integer), &node, &defs).is_empty());

        let node = schema(json!({"type": "number", "minimum": 5, "exclusiveMaximum": 10.5}));
        assert_eq!(
            serde_json::to_value(restrictions(Some(ValueType::Decimal), &node, &defs)).unwrap(),
            json!({"minimum": {"value": 5}, "exclusiveMaximum": {"value": 10.5}})
        );
    }

    #[test]
    fn test_serialized_names() {
        assert_eq!(serde_json::to_value(ValueType::GMonthDay).unwrap(), json!("gMonthDay"));
        assert_eq!(serde_json::to_value(ValueType::AnyUri).unwrap(), json!("anyUri"));
        assert_eq!(ValueType::PositiveInteger.to_string(), "positiveInteger");
    }
}
