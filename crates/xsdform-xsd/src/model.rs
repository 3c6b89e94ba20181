//! Arena representation of an XSD document.
//!
//! Every schema component that can be named or referenced is a node in
//! [`XsdSchema::nodes`], addressed by [`NodeId`]. Nodes keep a link to their
//! parent so that anonymous components can borrow a name from the nearest
//! named ancestor.

use std::fmt;
use std::ops::Range;

/// The XML Schema namespace.
pub const XS_NAMESPACE: &str = "http://www.w3.org/2001/XMLSchema";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub usize);

/// A namespace-qualified name.
///
/// The empty name (both parts empty) stands for an anonymous component that
/// has not been named yet.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct QName {
    pub namespace: String,
    pub local_name: String,
}

impl QName {
    pub fn new(namespace: impl Into<String>, local_name: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            local_name: local_name.into(),
        }
    }

    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn is_anonymous(&self) -> bool {
        self.namespace.is_empty() && self.local_name.is_empty()
    }

    /// Whether this name lives in the XML Schema namespace (a built-in type).
    pub fn is_builtin(&self) -> bool {
        self.namespace == XS_NAMESPACE
    }
}

impl fmt::Display for QName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.namespace.is_empty() {
            write!(f, "{}", self.local_name)
        } else if self.is_builtin() {
            write!(f, "xs:{}", self.local_name)
        } else {
            write!(f, "{{{}}}{}", self.namespace, self.local_name)
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MaxOccurs {
    Bounded(u64),
    Unbounded,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Occurs {
    pub min: u64,
    pub max: MaxOccurs,
}

impl Default for Occurs {
    fn default() -> Self {
        Self {
            min: 1,
            max: MaxOccurs::Bounded(1),
        }
    }
}

impl Occurs {
    /// More than one occurrence is allowed.
    pub fn is_repeating(&self) -> bool {
        match self.max {
            MaxOccurs::Bounded(max) => max > 1,
            MaxOccurs::Unbounded => true,
        }
    }

    pub fn is_optional(&self) -> bool {
        self.min == 0
    }
}

/// Reference to a type, either by name or to an inline (anonymous) definition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeRef {
    Named(QName),
    Inline(NodeId),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttributeUse {
    Optional,
    Required,
    Prohibited,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FacetKind {
    Enumeration,
    MinInclusive,
    MaxInclusive,
    MinExclusive,
    MaxExclusive,
    MinLength,
    MaxLength,
    Length,
    TotalDigits,
    FractionDigits,
    Pattern,
    WhiteSpace,
}

impl FacetKind {
    pub fn from_tag(tag: &str) -> Option<Self> {
        Some(match tag {
            "enumeration" => Self::Enumeration,
            "minInclusive" => Self::MinInclusive,
            "maxInclusive" => Self::MaxInclusive,
            "minExclusive" => Self::MinExclusive,
            "maxExclusive" => Self::MaxExclusive,
            "minLength" => Self::MinLength,
            "maxLength" => Self::MaxLength,
            "length" => Self::Length,
            "totalDigits" => Self::TotalDigits,
            "fractionDigits" => Self::FractionDigits,
            "pattern" => Self::Pattern,
            "whiteSpace" => Self::WhiteSpace,
            _ => return None,
        })
    }

    pub fn tag(&self) -> &'static str {
        match self {
            Self::Enumeration => "enumeration",
            Self::MinInclusive => "minInclusive",
            Self::MaxInclusive => "maxInclusive",
            Self::MinExclusive => "minExclusive",
            Self::MaxExclusive => "maxExclusive",
            Self::MinLength => "minLength",
            Self::MaxLength => "maxLength",
            Self::Length => "length",
            Self::TotalDigits => "totalDigits",
            Self::FractionDigits => "fractionDigits",
            Self::Pattern => "pattern",
            Self::WhiteSpace => "whiteSpace",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Facet {
    pub kind: FacetKind,
    pub value: String,
    pub span: Range<usize>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    pub name: Option<String>,
    pub reference: Option<QName>,
    pub type_ref: Option<TypeRef>,
    pub occurs: Occurs,
    pub nillable: bool,
    pub default: Option<String>,
    pub fixed: Option<String>,
    pub is_abstract: bool,
    pub substitution_group: Option<QName>,
    /// `xs:key`, `xs:keyref` or `xs:unique` children are present.
    pub identity_constraints: bool,
    pub annotation: Option<NodeId>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    pub name: Option<String>,
    pub reference: Option<QName>,
    pub type_ref: Option<TypeRef>,
    pub usage: AttributeUse,
    pub fixed: Option<String>,
    pub default: Option<String>,
    pub annotation: Option<NodeId>,
}

/// Content model of a complex type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ComplexContent {
    Empty,
    /// A sequence, choice, all or group reference directly inside the type.
    Particle(NodeId),
    SimpleExtension {
        base: QName,
    },
    SimpleRestriction {
        base: QName,
        facets: Vec<Facet>,
    },
    ComplexExtension {
        base: QName,
        particle: Option<NodeId>,
    },
    ComplexRestriction {
        base: QName,
        particle: Option<NodeId>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComplexType {
    pub name: Option<String>,
    pub content: ComplexContent,
    /// Attributes and attribute-group references, including those declared
    /// inside a simple or complex content derivation.
    pub attributes: Vec<NodeId>,
    pub any_attribute: bool,
    pub mixed: bool,
    pub annotation: Option<NodeId>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SimpleContent {
    Restriction { base: TypeRef, facets: Vec<Facet> },
    List { item: TypeRef },
    Union { members: Vec<TypeRef> },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SimpleType {
    pub name: Option<String>,
    pub content: SimpleContent,
    pub annotation: Option<NodeId>,
}

/// A top-level `xs:group` definition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Group {
    pub name: String,
    pub particle: Option<NodeId>,
}

/// A top-level `xs:attributeGroup` definition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttributeGroup {
    pub name: String,
    pub attributes: Vec<NodeId>,
    pub any_attribute: bool,
}

/// Body of `xs:sequence`, `xs:choice` and `xs:all`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ModelGroup {
    pub occurs: Occurs,
    pub particles: Vec<NodeId>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupRef {
    pub reference: QName,
    pub occurs: Occurs,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Any {
    pub occurs: Occurs,
    pub namespace: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Annotation {
    pub documentation: Vec<String>,
    /// Display texts given as `or:tekst` markup.
    pub texts: Vec<AnnotationText>,
    /// Fixed attribute values given as `xs:attribute` markup.
    pub info: Vec<AttributeInfo>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnnotationText {
    pub kind: String,
    pub lang: String,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttributeInfo {
    pub name: String,
    pub fixed: String,
}

impl Annotation {
    pub fn is_empty(&self) -> bool {
        self.documentation.is_empty() && self.texts.is_empty() && self.info.is_empty()
    }

    /// All documentation entries joined by blank lines, if any.
    pub fn text(&self) -> Option<String> {
        if self.documentation.is_empty() {
            None
        } else {
            Some(self.documentation.join("\n\n"))
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum XsdNodeKind {
    Element(Element),
    Attribute(Attribute),
    ComplexType(ComplexType),
    SimpleType(SimpleType),
    Group(Group),
    AttributeGroup(AttributeGroup),
    Sequence(ModelGroup),
    Choice(ModelGroup),
    All(ModelGroup),
    GroupRef(GroupRef),
    AttributeGroupRef(QName),
    Any(Any),
    Annotation(Annotation),
}

impl XsdNodeKind {
    /// The XSD tag this node was read from.
    pub fn tag(&self) -> &'static str {
        match self {
            Self::Element(_) => "element",
            Self::Attribute(_) => "attribute",
            Self::ComplexType(_) => "complexType",
            Self::SimpleType(_) => "simpleType",
            Self::Group(_) | Self::GroupRef(_) => "group",
            Self::AttributeGroup(_) | Self::AttributeGroupRef(_) => "attributeGroup",
            Self::Sequence(_) => "sequence",
            Self::Choice(_) => "choice",
            Self::All(_) => "all",
            Self::Any(_) => "any",
            Self::Annotation(_) => "annotation",
        }
    }

    /// The name this node declares itself, if any.
    pub fn declared_name(&self) -> Option<&str> {
        match self {
            Self::Element(e) => e.name.as_deref(),
            Self::Attribute(a) => a.name.as_deref(),
            Self::ComplexType(t) => t.name.as_deref(),
            Self::SimpleType(t) => t.name.as_deref(),
            Self::Group(g) => Some(&g.name),
            Self::AttributeGroup(g) => Some(&g.name),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XsdNode {
    pub parent: Option<NodeId>,
    /// Byte range of the originating XML element in the source text.
    pub span: Range<usize>,
    pub kind: XsdNodeKind,
}

/// Kinds of top-level components that can be looked up by name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GlobalKind {
    Element,
    Attribute,
    Type,
    Group,
    AttributeGroup,
}

impl GlobalKind {
    fn matches(&self, kind: &XsdNodeKind) -> bool {
        matches!(
            (self, kind),
            (GlobalKind::Element, XsdNodeKind::Element(_))
                | (GlobalKind::Attribute, XsdNodeKind::Attribute(_))
                | (GlobalKind::Type, XsdNodeKind::ComplexType(_))
                | (GlobalKind::Type, XsdNodeKind::SimpleType(_))
                | (GlobalKind::Group, XsdNodeKind::Group(_))
                | (GlobalKind::AttributeGroup, XsdNodeKind::AttributeGroup(_))
        )
    }
}

/// A parsed XSD document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct XsdSchema {
    pub target_namespace: Option<String>,
    pub nodes: Vec<XsdNode>,
    /// Top-level items in document order.
    pub items: Vec<NodeId>,
}

impl XsdSchema {
    pub fn new(target_namespace: Option<String>) -> Self {
        Self {
            target_namespace,
            nodes: Vec::new(),
            items: Vec::new(),
        }
    }

    /// Insert a new node and return its ID
    pub fn create_node(
        &mut self,
        parent: Option<NodeId>,
        span: Range<usize>,
        kind: XsdNodeKind,
    ) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(XsdNode { parent, span, kind });
        id
    }

    pub fn node(&self, id: NodeId) -> &XsdNode {
        &self.nodes[id.0]
    }

    pub fn node_mut(&mut self, id: NodeId) -> &mut XsdNode {
        &mut self.nodes[id.0]
    }

    pub fn kind(&self, id: NodeId) -> &XsdNodeKind {
        &self.nodes[id.0].kind
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes[id.0].parent
    }

    /// Namespace that top-level declarations of this schema live in.
    pub fn namespace(&self) -> &str {
        self.target_namespace.as_deref().unwrap_or("")
    }

    /// Qualified name for a declaration with the given local name.
    pub fn qualify(&self, local_name: &str) -> QName {
        QName::new(self.namespace(), local_name)
    }

    /// Look up a top-level component by qualified name.
    pub fn global(&self, kind: GlobalKind, name: &QName) -> Option<NodeId> {
        if name.namespace != self.namespace() {
            return None;
        }
        self.items.iter().copied().find(|&id| {
            let node_kind = self.kind(id);
            kind.matches(node_kind) && node_kind.declared_name() == Some(name.local_name.as_str())
        })
    }

    pub fn annotation(&self, id: Option<NodeId>) -> Option<&Annotation> {
        match id.map(|id| self.kind(id)) {
            Some(XsdNodeKind::Annotation(annotation)) => Some(annotation),
            _ => None,
        }
    }
}
