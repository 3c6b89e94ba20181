//! Qualified names for XSD nodes.
//!
//! Names are memoized per node, so asking twice for the same node always
//! yields the same name even when that name was invented for an anonymous
//! type.

use ahash::{AHashMap, AHashSet};
use tracing::trace;
use xsdform_json_schema::Definitions;
use xsdform_xsd::{NodeId, QName, XsdNodeKind, XsdSchema};

use crate::error::CompileError;

#[derive(Debug, Default)]
pub struct NameRegistry {
    names: AHashMap<NodeId, QName>,
    /// Local names already given to type definitions.
    type_names: AHashSet<String>,
}

impl NameRegistry {
    /// Create a registry with every named top-level type already registered,
    /// so an anonymous type can never take a name a named type needs.
    pub fn new(schema: &XsdSchema) -> Self {
        let mut registry = Self::default();
        for &id in &schema.items {
            let name = match schema.kind(id) {
                XsdNodeKind::ComplexType(t) => t.name.as_deref(),
                XsdNodeKind::SimpleType(t) => t.name.as_deref(),
                _ => None,
            };
            if let Some(name) = name {
                registry.type_names.insert(name.to_string());
                registry.names.insert(id, schema.qualify(name));
            }
        }
        registry
    }

    /// The canonical name of `id`.
    ///
    /// `definitions` is consulted when inventing a name for an anonymous type
    /// so the result never collides with an existing definition.
    pub fn name_of(
        &mut self,
        schema: &XsdSchema,
        id: NodeId,
        definitions: &Definitions,
    ) -> Result<QName, CompileError> {
        if let Some(name) = self.names.get(&id) {
            return Ok(name.clone());
        }

        let name = match schema.kind(id) {
            XsdNodeKind::Element(element) => match (&element.name, &element.reference) {
                (Some(name), _) => schema.qualify(name),
                (None, Some(reference)) => reference.clone(),
                (None, None) => self.inherited(schema, id, definitions)?,
            },
            XsdNodeKind::Attribute(attribute) => match (&attribute.name, &attribute.reference) {
                (Some(name), _) => schema.qualify(name),
                (None, Some(reference)) => reference.clone(),
                (None, None) => self.inherited(schema, id, definitions)?,
            },
            XsdNodeKind::ComplexType(t) => match &t.name {
                Some(name) => schema.qualify(name),
                None => self.anonymous_type(schema, id, definitions)?,
            },
            XsdNodeKind::SimpleType(t) => match &t.name {
                Some(name) => schema.qualify(name),
                None => self.anonymous_type(schema, id, definitions)?,
            },
            XsdNodeKind::Group(group) => schema.qualify(&group.name),
            XsdNodeKind::AttributeGroup(group) => schema.qualify(&group.name),
            XsdNodeKind::Sequence(_)
            | XsdNodeKind::Choice(_)
            | XsdNodeKind::All(_)
            | XsdNodeKind::GroupRef(_)
            | XsdNodeKind::AttributeGroupRef(_)
            | XsdNodeKind::Any(_)
            | XsdNodeKind::Annotation(_) => self.inherited(schema, id, definitions)?,
        };

        trace!(?id, %name, "named node");
        self.names.insert(id, name.clone());
        Ok(name)
    }

    fn inherited(
        &mut self,
        schema: &XsdSchema,
        id: NodeId,
        definitions: &Definitions,
    ) -> Result<QName, CompileError> {
        let parent = schema.parent(id).ok_or(CompileError::Naming {
            tag: schema.kind(id).tag(),
            node: id,
        })?;
        self.name_of(schema, parent, definitions)
    }

    /// Take the parent's name, appending 2, 3, ... until the name is free.
    fn anonymous_type(
        &mut self,
        schema: &XsdSchema,
        id: NodeId,
        definitions: &Definitions,
    ) -> Result<QName, CompileError> {
        let base = self.inherited(schema, id, definitions)?;
        let mut candidate = base.local_name.clone();
        let mut suffix = 2;
        while self.type_names.contains(&candidate) || definitions.contains(&candidate) {
            candidate = format!("{}{suffix}", base.local_name);
            suffix += 1;
        }
        self.type_names.insert(candidate.clone());
        Ok(QName::new(base.namespace, candidate))
    }
}
