//! Builder pattern for constructing schema nodes

use std::cmp::Ordering;

use serde_json::{Number, Value};

use crate::definitions::{Definitions, definition_ref};
use crate::schema::{Schema, SchemaType, XsdType};

/// Parse a numeric literal, keeping integers integral.
pub fn parse_number(text: &str) -> Option<Number> {
    let text = text.trim();
    if let Ok(value) = text.parse::<i64>() {
        return Some(Number::from(value));
    }
    if let Ok(value) = text.parse::<u64>() {
        return Some(Number::from(value));
    }
    text.parse::<f64>().ok().and_then(Number::from_f64)
}

/// Numeric ordering across integer and floating point representations.
pub fn compare_numbers(a: &Number, b: &Number) -> Ordering {
    if let (Some(a), Some(b)) = (a.as_i64(), b.as_i64()) {
        return a.cmp(&b);
    }
    if let (Some(a), Some(b)) = (a.as_u64(), b.as_u64()) {
        return a.cmp(&b);
    }
    let a = a.as_f64().unwrap_or(f64::NAN);
    let b = b.as_f64().unwrap_or(f64::NAN);
    a.partial_cmp(&b).unwrap_or(Ordering::Equal)
}

/// Builder for creating [`Schema`] instances
#[derive(Debug, Clone, Default)]
pub struct SchemaBuilder {
    schema: Schema,
}

impl From<Schema> for SchemaBuilder {
    fn from(schema: Schema) -> Self {
        Self { schema }
    }
}

impl SchemaBuilder {
    /// Create a new builder
    pub fn new() -> Self {
        Self::default()
    }

    pub fn of_type(schema_type: SchemaType) -> Self {
        Self::new().schema_type(schema_type)
    }

    /// A `$ref` to a local definition.
    pub fn reference_to(name: &str) -> Self {
        Self::new().reference(definition_ref(name))
    }

    pub fn meta_schema(mut self, uri: impl Into<String>) -> Self {
        self.schema.meta_schema = Some(uri.into());
        self
    }

    pub fn id(mut self, id: impl Into<String>) -> Self {
        self.schema.id = Some(id.into());
        self
    }

    pub fn reference(mut self, reference: impl Into<String>) -> Self {
        self.schema.reference = Some(reference.into());
        self
    }

    pub fn schema_type(mut self, schema_type: SchemaType) -> Self {
        self.schema.schema_type = Some(schema_type);
        self
    }

    /// Set the type unless one is already present.
    pub fn default_type(mut self, schema_type: SchemaType) -> Self {
        self.schema.schema_type.get_or_insert(schema_type);
        self
    }

    pub fn xsd_type(mut self, xsd_type: XsdType) -> Self {
        self.schema.xsd_type = Some(xsd_type);
        self
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.schema.title = Some(title.into());
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.schema.description = Some(description.into());
        self
    }

    pub fn text(
        mut self,
        kind: impl Into<String>,
        lang: impl Into<String>,
        text: impl Into<String>,
    ) -> Self {
        self.schema
            .texts
            .entry(kind.into())
            .or_default()
            .insert(lang.into(), text.into());
        self
    }

    pub fn info(mut self, name: impl Into<String>, fixed: impl Into<String>) -> Self {
        self.schema.info.insert(name.into(), fixed.into());
        self
    }

    pub fn format(mut self, format: impl Into<String>) -> Self {
        self.schema.format = Some(format.into());
        self
    }

    pub fn content_encoding(mut self, encoding: impl Into<String>) -> Self {
        self.schema.content_encoding = Some(encoding.into());
        self
    }

    pub fn enum_values(mut self, values: Vec<Value>) -> Self {
        self.schema.enum_values = Some(values);
        self
    }

    pub fn const_value(mut self, value: Value) -> Self {
        self.schema.const_value = Some(value);
        self
    }

    /// Set the inclusive lower bound, keeping the larger of an existing one.
    pub fn minimum(mut self, value: Number) -> Self {
        self.schema.minimum = Some(match self.schema.minimum.take() {
            Some(existing) if compare_numbers(&existing, &value) == Ordering::Greater => existing,
            _ => value,
        });
        self
    }

    /// Set the inclusive upper bound, keeping the smaller of an existing one.
    pub fn maximum(mut self, value: Number) -> Self {
        self.schema.maximum = Some(match self.schema.maximum.take() {
            Some(existing) if compare_numbers(&existing, &value) == Ordering::Less => existing,
            _ => value,
        });
        self
    }

    pub fn exclusive_minimum(mut self, value: Number) -> Self {
        self.schema.exclusive_minimum = Some(value);
        self
    }

    pub fn exclusive_maximum(mut self, value: Number) -> Self {
        self.schema.exclusive_maximum = Some(value);
        self
    }

    pub fn min_length(mut self, length: u64) -> Self {
        self.schema.min_length = Some(length);
        self
    }

    pub fn max_length(mut self, length: u64) -> Self {
        self.schema.max_length = Some(length);
        self
    }

    pub fn pattern(mut self, pattern: impl Into<String>) -> Self {
        self.schema.pattern = Some(pattern.into());
        self
    }

    pub fn min_items(mut self, min: u64) -> Self {
        self.schema.min_items = Some(min);
        self
    }

    pub fn max_items(mut self, max: u64) -> Self {
        self.schema.max_items = Some(max);
        self
    }

    /// Set the single item schema of an array.
    pub fn items(mut self, item: Schema) -> Self {
        self.schema.items = vec![item];
        self
    }

    pub fn has_property(&self, name: &str) -> bool {
        self.schema
            .properties
            .as_ref()
            .is_some_and(|properties| properties.contains_key(name))
    }

    /// Add (or replace) a property.
    pub fn property(mut self, name: impl Into<String>, schema: Schema) -> Self {
        self.schema
            .properties
            .get_or_insert_with(Default::default)
            .insert(name.into(), schema);
        self
    }

    /// Ensure `properties` is present even when empty.
    pub fn empty_properties(mut self) -> Self {
        self.schema.properties.get_or_insert_with(Default::default);
        self
    }

    /// Mark a property as required. Repeated names are kept once.
    pub fn require(mut self, name: impl Into<String>) -> Self {
        let name = name.into();
        if !self.schema.is_required(&name) {
            self.schema.required.push(name);
        }
        self
    }

    /// Attach a choice. A second choice is wrapped into `allOf`.
    pub fn one_of(mut self, branches: Vec<Schema>) -> Self {
        if self.schema.one_of.is_empty() {
            self.schema.one_of = branches;
        } else {
            self.schema.all_of.push(Schema {
                one_of: branches,
                ..Default::default()
            });
        }
        self
    }

    pub fn all_of(mut self, schema: Schema) -> Self {
        self.schema.all_of.push(schema);
        self
    }

    pub fn definitions(mut self, definitions: Definitions) -> Self {
        self.schema.definitions = Some(definitions);
        self
    }

    /// Build the Schema
    pub fn build(self) -> Schema {
        self.schema
    }
}
