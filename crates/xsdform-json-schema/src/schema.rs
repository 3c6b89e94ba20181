//! JSON Schema node representation
//!
//! A single record of optional keywords rather than a tagged union: XSD
//! translation routinely combines keywords JSON Schema treats as belonging to
//! different schema kinds (`$ref` next to facets, `oneOf` next to
//! `properties`), and the instance-model generator reads whatever is present.

use indexmap::IndexMap;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Number, Value};

use crate::definitions::{Definitions, definition_name};

/// JSON Schema primitive type names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SchemaType {
    String,
    Number,
    Integer,
    Boolean,
    Object,
    Array,
    Null,
}

/// XML semantics that JSON Schema has no keyword for, carried in `@xsdType`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum XsdType {
    XmlAttribute,
    XmlAny,
    XmlList,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Schema {
    #[serde(rename = "$schema", skip_serializing_if = "Option::is_none")]
    pub meta_schema: Option<String>,

    #[serde(rename = "$id", skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    #[serde(rename = "$ref", skip_serializing_if = "Option::is_none")]
    pub reference: Option<String>,

    #[serde(rename = "@xsdType", skip_serializing_if = "Option::is_none")]
    pub xsd_type: Option<XsdType>,

    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub schema_type: Option<SchemaType>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Display texts by text kind, then language.
    #[serde(rename = "@xsdTexts", skip_serializing_if = "IndexMap::is_empty")]
    pub texts: IndexMap<String, IndexMap<String, String>>,

    /// Fixed attribute values named in the documentation.
    #[serde(rename = "@xsdInfo", skip_serializing_if = "IndexMap::is_empty")]
    pub info: IndexMap<String, String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,

    #[serde(rename = "contentEncoding", skip_serializing_if = "Option::is_none")]
    pub content_encoding: Option<String>,

    #[serde(rename = "enum", skip_serializing_if = "Option::is_none")]
    pub enum_values: Option<Vec<Value>>,

    #[serde(rename = "const", skip_serializing_if = "Option::is_none")]
    pub const_value: Option<Value>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub minimum: Option<Number>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub maximum: Option<Number>,

    #[serde(rename = "exclusiveMinimum", skip_serializing_if = "Option::is_none")]
    pub exclusive_minimum: Option<Number>,

    #[serde(rename = "exclusiveMaximum", skip_serializing_if = "Option::is_none")]
    pub exclusive_maximum: Option<Number>,

    #[serde(rename = "minLength", skip_serializing_if = "Option::is_none")]
    pub min_length: Option<u64>,

    #[serde(rename = "maxLength", skip_serializing_if = "Option::is_none")]
    pub max_length: Option<u64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,

    #[serde(rename = "minItems", skip_serializing_if = "Option::is_none")]
    pub min_items: Option<u64>,

    #[serde(rename = "maxItems", skip_serializing_if = "Option::is_none")]
    pub max_items: Option<u64>,

    /// Item schemas; the first entry describes array members.
    #[serde(
        skip_serializing_if = "Vec::is_empty",
        deserialize_with = "one_or_many"
    )]
    pub items: Vec<Schema>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub properties: Option<IndexMap<String, Schema>>,

    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub required: Vec<String>,

    #[serde(rename = "oneOf", skip_serializing_if = "Vec::is_empty")]
    pub one_of: Vec<Schema>,

    #[serde(rename = "allOf", skip_serializing_if = "Vec::is_empty")]
    pub all_of: Vec<Schema>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub definitions: Option<Definitions>,
}

impl Schema {
    pub fn is_array(&self) -> bool {
        self.schema_type == Some(SchemaType::Array)
    }

    pub fn is_required(&self, property: &str) -> bool {
        self.required.iter().any(|name| name == property)
    }

    /// The schema describing array members, if any.
    pub fn item(&self) -> Option<&Schema> {
        self.items.first()
    }

    /// Name of the definition this node references, if it is a local reference.
    pub fn definition_name(&self) -> Option<&str> {
        self.reference.as_deref().and_then(definition_name)
    }

    /// Every `$ref` in this schema and its subschemas, in document order.
    pub fn references(&self) -> Vec<&str> {
        let mut refs = Vec::new();
        self.collect_references(&mut refs);
        refs
    }

    fn collect_references<'a>(&'a self, refs: &mut Vec<&'a str>) {
        if let Some(reference) = &self.reference {
            refs.push(reference);
        }
        let children = self
            .items
            .iter()
            .chain(self.properties.iter().flat_map(|p| p.values()))
            .chain(&self.one_of)
            .chain(&self.all_of)
            .chain(self.definitions.iter().flat_map(|d| d.values()));
        for child in children {
            child.collect_references(refs);
        }
    }
}

/// Accept both `"items": {..}` and `"items": [..]`.
fn one_or_many<'de, D>(deserializer: D) -> Result<Vec<Schema>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum OneOrMany {
        Many(Vec<Schema>),
        One(Box<Schema>),
    }

    Ok(match OneOrMany::deserialize(deserializer)? {
        OneOrMany::Many(schemas) => schemas,
        OneOrMany::One(schema) => vec![*schema],
    })
}
