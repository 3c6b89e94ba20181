//! Instance-model generation from a compiled JSON Schema.
//!
//! Root properties seed the model. Each property yields one descriptor, and a
//! property referencing a definition has that definition's members traversed
//! beneath its path. How often a definition is expanded is governed by the
//! [`ExpansionPolicy`].

use std::fmt;
use std::str::FromStr;

use ahash::AHashSet;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info, trace};
use xsdform_json_schema::{Definitions, Schema, SchemaType, XsdType};

use crate::descriptor::{
    ElementDescriptor, ElementKind, InstanceModel, REPEATING_MARKER, UNBOUNDED_MAX_OCCURS,
    cardinality, sanitize_name,
};
use crate::error::{GenerateError, StructuralError};
use crate::value_type::{restrictions, value_type};

/// When a referenced definition is expanded beneath a path.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ExpansionPolicy {
    /// Expand each definition only at the first path that reaches it during
    /// the generator's lifetime.
    #[default]
    FirstOccurrence,
    /// Expand a definition wherever it appears, except beneath itself.
    PerBranch,
}

impl ExpansionPolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExpansionPolicy::FirstOccurrence => "first-occurrence",
            ExpansionPolicy::PerBranch => "per-branch",
        }
    }
}

impl fmt::Display for ExpansionPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown expansion policy `{0}`, expected `first-occurrence` or `per-branch`")]
pub struct UnknownPolicy(pub String);

impl FromStr for ExpansionPolicy {
    type Err = UnknownPolicy;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "first-occurrence" => Ok(ExpansionPolicy::FirstOccurrence),
            "per-branch" => Ok(ExpansionPolicy::PerBranch),
            other => Err(UnknownPolicy(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GenerateOptions {
    pub policy: ExpansionPolicy,
}

/// Owns an instance model together with the state needed to edit it.
#[derive(Debug, Clone)]
pub struct InstanceModelGenerator {
    pub(crate) definitions: Definitions,
    pub(crate) policy: ExpansionPolicy,
    /// Definitions already expanded somewhere in the model.
    pub(crate) visited: AHashSet<String>,
    pub(crate) model: InstanceModel,
}

impl InstanceModelGenerator {
    /// Generate the instance model for `schema`.
    pub fn new(
        schema: &Schema,
        org: impl Into<String>,
        service: impl Into<String>,
        options: GenerateOptions,
    ) -> Result<Self, GenerateError> {
        let definitions = schema.definitions.clone().unwrap_or_default();
        let properties = schema
            .properties
            .as_ref()
            .filter(|properties| !properties.is_empty())
            .ok_or(StructuralError::MissingProperties)?;

        let mut traversal = Traversal::new(&definitions, options.policy, AHashSet::new());
        for (name, property) in properties {
            traversal.property(None, "#", name, property, schema.is_required(name))?;
        }
        let (elements, visited) = traversal.finish();

        let mut model = InstanceModel::new(org, service);
        model.elements = elements;
        info!(
            org = %model.org,
            service = %model.service,
            elements = model.elements.len(),
            policy = %options.policy,
            "generated instance model"
        );

        Ok(Self {
            definitions,
            policy: options.policy,
            visited,
            model,
        })
    }

    pub fn model(&self) -> &InstanceModel {
        &self.model
    }

    pub fn into_model(self) -> InstanceModel {
        self.model
    }

    pub fn definitions(&self) -> &Definitions {
        &self.definitions
    }

    pub fn policy(&self) -> ExpansionPolicy {
        self.policy
    }
}

/// Whether a schema has members to traverse beneath a path.
pub(crate) fn has_members(schema: &Schema) -> bool {
    schema.properties.is_some() || !schema.all_of.is_empty() || !schema.one_of.is_empty()
}

/// One traversal run. Descriptors are collected here and handed to the model
/// only when the run succeeds.
pub(crate) struct Traversal<'a> {
    definitions: &'a Definitions,
    policy: ExpansionPolicy,
    visited: AHashSet<String>,
    /// Definitions being expanded on the current path.
    expanding: Vec<String>,
    /// Open choices as `(first index of the choice, first index of the
    /// current branch)` into `elements`.
    choices: Vec<(usize, usize)>,
    elements: IndexMap<String, ElementDescriptor>,
}

impl<'a> Traversal<'a> {
    pub(crate) fn new(
        definitions: &'a Definitions,
        policy: ExpansionPolicy,
        visited: AHashSet<String>,
    ) -> Self {
        Self {
            definitions,
            policy,
            visited,
            expanding: Vec::new(),
            choices: Vec::new(),
            elements: IndexMap::new(),
        }
    }

    pub(crate) fn finish(self) -> (IndexMap<String, ElementDescriptor>, AHashSet<String>) {
        (self.elements, self.visited)
    }

    /// Expand definition `name` beneath `path` on request. The policy is not
    /// consulted for the definition itself nor for the bases it extends, so
    /// inherited members appear even when their base was expanded elsewhere.
    pub(crate) fn expand(
        &mut self,
        path: &str,
        name: &str,
        definition: &Schema,
        optional: bool,
    ) -> Result<(), GenerateError> {
        self.visited.insert(name.to_string());
        self.expanding.push(name.to_string());
        let result = self.members_with(path, &definition_pointer(name), definition, optional, true);
        self.leave();
        result
    }

    /// Traverse the members of `schema` beneath `path`. `container` is the
    /// JSON pointer of `schema`. Members of an `optional` schema are never
    /// required.
    pub(crate) fn members(
        &mut self,
        path: &str,
        container: &str,
        schema: &Schema,
        optional: bool,
    ) -> Result<(), GenerateError> {
        self.members_with(path, container, schema, optional, false)
    }

    fn members_with(
        &mut self,
        path: &str,
        container: &str,
        schema: &Schema,
        optional: bool,
        force_bases: bool,
    ) -> Result<(), GenerateError> {
        if let Some(properties) = &schema.properties {
            for (name, property) in properties {
                let required = !optional && schema.is_required(name);
                self.property(Some(path), container, name, property, required)?;
            }
        }
        for (index, member) in schema.all_of.iter().enumerate() {
            match member.definition_name() {
                Some(base) if force_bases => self.follow_base(path, base, optional)?,
                Some(_) => self.follow_ref(path, member)?,
                None => {
                    let container = format!("{container}/allOf/{index}");
                    self.members_with(path, &container, member, optional, force_bases)?;
                }
            }
        }
        if schema.one_of.is_empty() {
            return Ok(());
        }
        // only one branch of a choice is present in an instance
        let start = self.elements.len();
        self.choices.push((start, start));
        let mut result = Ok(());
        for (index, branch) in schema.one_of.iter().enumerate() {
            if let Some(choice) = self.choices.last_mut() {
                choice.1 = self.elements.len();
            }
            let container = format!("{container}/oneOf/{index}");
            result = self.members_with(path, &container, branch, true, force_bases);
            if result.is_err() {
                break;
            }
        }
        self.choices.pop();
        result
    }

    /// Whether the element at `index` came from an earlier branch of a choice
    /// that is still being traversed.
    fn in_earlier_branch(&self, index: usize) -> bool {
        self.choices
            .iter()
            .any(|&(choice, branch)| (choice..branch).contains(&index))
    }

    fn property(
        &mut self,
        parent_path: Option<&str>,
        container: &str,
        property_name: &str,
        schema: &Schema,
        required: bool,
    ) -> Result<(), GenerateError> {
        let name = sanitize_name(property_name);
        let pointer = format!("{container}/properties/{}", escape_pointer(property_name));
        if name.is_empty() {
            return Err(StructuralError::EmptyName {
                name: property_name.to_string(),
                pointer,
            }
            .into());
        }

        let mut path = match parent_path {
            Some(parent) => format!("{parent}.{name}"),
            None => name.clone(),
        };
        let (min_occurs, max_occurs, content, content_pointer) = if schema.is_array() {
            path.push_str(REPEATING_MARKER);
            let max = schema.max_items.unwrap_or(UNBOUNDED_MAX_OCCURS);
            let items = format!("{pointer}/items/0");
            (schema.min_items.unwrap_or(0), max, schema.item(), items)
        } else {
            (u64::from(required), 1, Some(schema), pointer.clone())
        };

        if let Some(index) = self.elements.get_index_of(&path) {
            if self.in_earlier_branch(index) {
                trace!(%path, "path shared between choice branches");
                return Ok(());
            }
            return Err(StructuralError::DuplicatePath { path }.into());
        }

        let value_type = value_type(schema, self.definitions);
        let type_name = definition_type_name(schema)
            .map(sanitize_name)
            .filter(|name| !name.is_empty());
        let kind = if schema.xsd_type == Some(XsdType::XmlAttribute) {
            ElementKind::Attribute
        } else if value_type.is_none() {
            ElementKind::Group
        } else {
            ElementKind::Field
        };
        let fixed_value = schema.const_value.as_ref().map(|value| match value {
            Value::String(text) => text.clone(),
            other => other.to_string(),
        });
        let data_binding_path = (kind != ElementKind::Group && fixed_value.is_none())
            .then(|| path.clone());

        let display_type = value_type
            .map(|value_type| value_type.to_string())
            .or_else(|| type_name.clone())
            .unwrap_or_default();
        let bare_path = path.strip_suffix(REPEATING_MARKER).unwrap_or(&path);
        let display_path = format!(
            "{bare_path} : {} {display_type}",
            cardinality(min_occurs, max_occurs)
        )
        .trim_end()
        .to_string();

        trace!(%path, ?kind, "traversed property");
        let descriptor = ElementDescriptor {
            id: path.clone(),
            parent_path: parent_path.map(str::to_string),
            name,
            x_name: property_name.to_string(),
            type_name: if value_type.is_none() { type_name } else { None },
            kind,
            xsd_value_type: value_type,
            min_occurs,
            max_occurs,
            restrictions: restrictions(value_type, schema, self.definitions),
            fixed_value,
            data_binding_path,
            x_path: format!("/{}", path.replace('.', "/")),
            display_path,
            schema_pointer: pointer,
        };
        self.elements.insert(path.clone(), descriptor);

        if let Some(content) = content {
            self.follow_ref(&path, content)?;
            self.members(&path, &content_pointer, content, false)?;
        }
        Ok(())
    }

    /// Expand the definition `schema` references beneath `path`, as far as
    /// the expansion policy allows.
    fn follow_ref(&mut self, path: &str, schema: &Schema) -> Result<(), GenerateError> {
        let definitions = self.definitions;
        let Some((name, definition)) = schema
            .definition_name()
            .and_then(|name| definitions.get(name).map(|definition| (name, definition)))
        else {
            return Ok(());
        };
        if !has_members(definition) || !self.enter(name) {
            return Ok(());
        }
        debug!(%path, definition = name, "expanding definition");
        let result = self.members(path, &definition_pointer(name), definition, false);
        self.leave();
        result
    }

    /// Expand the base `name` of a requested expansion, skipping the policy
    /// but never nesting a definition inside itself.
    fn follow_base(&mut self, path: &str, name: &str, optional: bool) -> Result<(), GenerateError> {
        let definitions = self.definitions;
        let Some(definition) = definitions.get(name) else {
            return Ok(());
        };
        if self.expanding.iter().any(|expanding| expanding == name) {
            return Ok(());
        }
        debug!(%path, base = name, "expanding base definition");
        self.expand(path, name, definition, optional)
    }

    fn enter(&mut self, name: &str) -> bool {
        if self.expanding.iter().any(|expanding| expanding == name) {
            return false;
        }
        if self.policy == ExpansionPolicy::FirstOccurrence
            && !self.visited.insert(name.to_string())
        {
            return false;
        }
        self.expanding.push(name.to_string());
        true
    }

    fn leave(&mut self) {
        self.expanding.pop();
    }
}

/// The type name a property is displayed with: the referenced definition
/// (through array items) or the title of an inline object.
fn definition_type_name(schema: &Schema) -> Option<&str> {
    if let Some(name) = schema.definition_name() {
        return Some(name);
    }
    match schema.schema_type {
        Some(SchemaType::Array) => schema.item().and_then(definition_type_name),
        Some(SchemaType::Object) => schema.title.as_deref(),
        _ => None,
    }
}

fn definition_pointer(name: &str) -> String {
    format!("#/definitions/{}", escape_pointer(name))
}

/// Escape a JSON pointer reference token.
fn escape_pointer(token: &str) -> String {
    token.replace('~', "~0").replace('/', "~1")
}
