//! Definition table and `#/definitions/...` reference resolution.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::schema::Schema;

/// Prefix of local definition references.
pub const DEFINITIONS_PREFIX: &str = "#/definitions/";

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DefinitionError {
    #[error("duplicate definition `{0}`")]
    Duplicate(String),
}

/// Extract the definition name from a `#/definitions/<name>` reference.
pub fn definition_name(reference: &str) -> Option<&str> {
    reference
        .strip_prefix(DEFINITIONS_PREFIX)
        .filter(|name| !name.is_empty())
}

/// Build a `#/definitions/<name>` reference.
pub fn definition_ref(name: &str) -> String {
    format!("{DEFINITIONS_PREFIX}{name}")
}

/// Ordered map of definition name to schema. Names are unique.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Definitions(IndexMap<String, Schema>);

impl Definitions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a definition, refusing to replace an existing one.
    pub fn insert(
        &mut self,
        name: impl Into<String>,
        schema: Schema,
    ) -> Result<(), DefinitionError> {
        let name = name.into();
        if self.0.contains_key(&name) {
            return Err(DefinitionError::Duplicate(name));
        }
        self.0.insert(name, schema);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&Schema> {
        self.0.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.contains_key(name)
    }

    /// Resolve a `#/definitions/<name>` reference.
    pub fn resolve(&self, reference: &str) -> Option<&Schema> {
        definition_name(reference).and_then(|name| self.get(name))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn values(&self) -> impl Iterator<Item = &Schema> {
        self.0.values()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Schema)> {
        self.0.iter().map(|(name, schema)| (name.as_str(), schema))
    }
}
