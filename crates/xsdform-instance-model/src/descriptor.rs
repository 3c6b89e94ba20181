use std::sync::LazyLock;

use indexmap::IndexMap;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::value_type::{Restriction, ValueType};

/// Sentinel `maxOccurs` for unbounded repetition.
pub const UNBOUNDED_MAX_OCCURS: u64 = 99999;

/// Repetition marker appended to the path of an array property.
pub const REPEATING_MARKER: &str = "[*]";

static NAME_FILTER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^\p{Alphabetic}\p{Nd}_]").expect("invalid name filter regex"));

/// Remove every character that is not alphanumeric or `_`.
pub fn sanitize_name(name: &str) -> String {
    NAME_FILTER.replace_all(name, "").into_owned()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ElementKind {
    Field,
    Attribute,
    Group,
}

/// One addressable path of an instance model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ElementDescriptor {
    pub id: String,
    pub parent_path: Option<String>,
    pub name: String,
    /// The property name as written in the schema.
    pub x_name: String,
    pub type_name: Option<String>,
    pub kind: ElementKind,
    pub xsd_value_type: Option<ValueType>,
    pub min_occurs: u64,
    pub max_occurs: u64,
    pub restrictions: IndexMap<String, Restriction>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fixed_value: Option<String>,
    pub data_binding_path: Option<String>,
    pub x_path: String,
    pub display_path: String,
    pub schema_pointer: String,
}

impl ElementDescriptor {
    pub fn is_unbounded(&self) -> bool {
        self.max_occurs == UNBOUNDED_MAX_OCCURS
    }

    pub fn cardinality(&self) -> String {
        cardinality(self.min_occurs, self.max_occurs)
    }
}

/// Cardinality as shown to users, e.g. `[0..*]`.
pub fn cardinality(min_occurs: u64, max_occurs: u64) -> String {
    if max_occurs == UNBOUNDED_MAX_OCCURS {
        format!("[{min_occurs}..*]")
    } else {
        format!("[{min_occurs}..{max_occurs}]")
    }
}

/// Whether `key` lies strictly below `path`: it continues `path` with a `.`
/// or a repetition marker.
pub fn is_descendant(key: &str, path: &str) -> bool {
    key.strip_prefix(path)
        .is_some_and(|rest| rest.starts_with('.') || rest.starts_with('['))
}

/// Flattened, path-keyed model of everything a form can bind to.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InstanceModel {
    pub org: String,
    pub service: String,
    /// Descriptors keyed by path; ancestors precede their descendants.
    pub elements: IndexMap<String, ElementDescriptor>,
}

impl InstanceModel {
    pub fn new(org: impl Into<String>, service: impl Into<String>) -> Self {
        Self {
            org: org.into(),
            service: service.into(),
            elements: IndexMap::new(),
        }
    }

    pub fn get(&self, path: &str) -> Option<&ElementDescriptor> {
        self.elements.get(path)
    }

    pub fn contains(&self, path: &str) -> bool {
        self.elements.contains_key(path)
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    pub fn paths(&self) -> impl Iterator<Item = &str> {
        self.elements.keys().map(String::as_str)
    }

    /// Paths strictly below `path`, in model order.
    pub fn descendants<'a>(&'a self, path: &'a str) -> impl Iterator<Item = &'a str> {
        self.paths().filter(move |key| is_descendant(key, path))
    }

    /// Direct children of `path`.
    pub fn children<'a>(&'a self, path: &'a str) -> impl Iterator<Item = &'a ElementDescriptor> {
        self.elements
            .values()
            .filter(move |descriptor| descriptor.parent_path.as_deref() == Some(path))
    }
}
