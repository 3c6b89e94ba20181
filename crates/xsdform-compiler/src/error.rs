use std::ops::Range;

use xsdform_xsd::{NodeId, XsdSchema};

/// Errors that can occur during XSD to JSON Schema compilation
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CompileError {
    /// A node has no name and no named ancestor to inherit one from
    #[error("cannot derive a name for xs:{tag}")]
    Naming { tag: &'static str, node: NodeId },

    /// Two definitions ended up with the same name
    #[error("duplicate definition `{name}`")]
    DuplicateDefinition { name: String, node: NodeId },

    /// An XSD construct with no JSON Schema mapping
    #[error("unsupported XSD construct: {construct}")]
    UnsupportedConstruct { construct: String, node: NodeId },

    /// A reference to a type, element, attribute or group that does not exist
    #[error("unresolved {kind} reference `{name}`")]
    UnresolvedReference {
        kind: &'static str,
        name: String,
        node: Option<NodeId>,
    },

    /// A facet value that cannot be read as the facet requires
    #[error("invalid value `{value}` for facet xs:{facet}")]
    InvalidFacet {
        facet: &'static str,
        value: String,
        node: NodeId,
        span: Range<usize>,
    },
}

impl CompileError {
    /// The XSD node the error is attributed to.
    pub fn node(&self) -> Option<NodeId> {
        match self {
            CompileError::Naming { node, .. }
            | CompileError::DuplicateDefinition { node, .. }
            | CompileError::UnsupportedConstruct { node, .. }
            | CompileError::InvalidFacet { node, .. } => Some(*node),
            CompileError::UnresolvedReference { node, .. } => *node,
        }
    }

    /// Byte range in the XSD source the error points at.
    pub fn span(&self, schema: &XsdSchema) -> Option<Range<usize>> {
        match self {
            CompileError::InvalidFacet { span, .. } => Some(span.clone()),
            _ => self
                .node()
                .filter(|node| node.0 < schema.nodes.len())
                .map(|node| schema.node(node).span.clone()),
        }
    }

    pub(crate) fn unsupported(construct: impl Into<String>, node: NodeId) -> Self {
        CompileError::UnsupportedConstruct {
            construct: construct.into(),
            node,
        }
    }
}
