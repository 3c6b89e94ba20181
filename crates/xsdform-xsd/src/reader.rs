//! Reads XSD text into an [`XsdSchema`] arena.

use roxmltree::{Document, Node, ParsingOptions};
use tracing::{debug, trace};

use crate::error::ReadError;
use crate::model::*;

/// Upper bound on accepted input size.
pub const MAX_XSD_SIZE: usize = 16 * 1024 * 1024;

const XML_NAMESPACE: &str = "http://www.w3.org/XML/1998/namespace";
const OR_NAMESPACE: &str = "http://www.brreg.no/or";

/// Parse XSD text into an [`XsdSchema`].
///
/// ```
/// use xsdform_xsd::{read_xsd, XsdNodeKind};
///
/// let schema = read_xsd(r#"
///     <xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema">
///         <xs:element name="book" type="xs:string"/>
///     </xs:schema>
/// "#).unwrap();
/// assert!(matches!(schema.kind(schema.items[0]), XsdNodeKind::Element(_)));
/// ```
pub fn read_xsd(text: &str) -> Result<XsdSchema, ReadError> {
    if text.len() > MAX_XSD_SIZE {
        return Err(ReadError::TooLarge {
            size: text.len(),
            max: MAX_XSD_SIZE,
        });
    }

    let options = ParsingOptions {
        allow_dtd: true,
        ..Default::default()
    };
    let doc = Document::parse_with_options(text, options)?;
    let root = doc.root_element();
    if xs_tag(root) != Some("schema") {
        return Err(ReadError::NotASchema);
    }

    let mut reader = XsdReader {
        schema: XsdSchema::new(root.attribute("targetNamespace").map(str::to_string)),
    };
    for child in element_children(root) {
        let id = reader.read_top_level(child, root)?;
        reader.schema.items.push(id);
    }

    debug!(
        nodes = reader.schema.nodes.len(),
        items = reader.schema.items.len(),
        "read XSD document"
    );
    Ok(reader.schema)
}

struct XsdReader {
    schema: XsdSchema,
}

impl XsdReader {
    fn read_top_level(
        &mut self,
        node: Node<'_, '_>,
        root: Node<'_, '_>,
    ) -> Result<NodeId, ReadError> {
        match xs_tag(node) {
            Some("element") => self.read_element(node, None),
            Some("attribute") => self.read_attribute(node, None),
            Some("complexType") => self.read_complex_type(node, None),
            Some("simpleType") => self.read_simple_type(node, None),
            Some("group") => self.read_group(node),
            Some("attributeGroup") => self.read_attribute_group(node),
            Some("annotation") => self.read_annotation(node, None),
            Some(tag @ ("import" | "include" | "redefine" | "override" | "notation")) => {
                Err(ReadError::Unsupported {
                    construct: format!("xs:{tag}"),
                    span: node.range(),
                })
            }
            _ => Err(unexpected(node, root)),
        }
    }

    /// Allocate a node whose kind is filled in once its children are read.
    fn reserve(&mut self, parent: Option<NodeId>, node: Node<'_, '_>) -> NodeId {
        self.schema.create_node(
            parent,
            node.range(),
            XsdNodeKind::Annotation(Annotation::default()),
        )
    }

    fn fill(&mut self, id: NodeId, kind: XsdNodeKind) -> NodeId {
        trace!(?id, tag = kind.tag(), "read node");
        self.schema.node_mut(id).kind = kind;
        id
    }

    fn read_element(
        &mut self,
        node: Node<'_, '_>,
        parent: Option<NodeId>,
    ) -> Result<NodeId, ReadError> {
        let id = self.reserve(parent, node);
        let name = node.attribute("name").map(str::to_string);
        let reference = self.qname_attribute(node, "ref")?;
        if name.is_none() && reference.is_none() {
            return Err(missing_attribute(node, "name"));
        }

        if node.has_attribute("final") {
            return Err(ReadError::Unsupported {
                construct: "final on xs:element".to_string(),
                span: node.range(),
            });
        }

        let mut type_ref = self.qname_attribute(node, "type")?.map(TypeRef::Named);
        let occurs = match parent {
            Some(_) => read_occurs(node)?,
            None => Occurs::default(),
        };
        let mut annotation = None;
        let mut identity_constraints = false;
        for child in element_children(node) {
            match xs_tag(child) {
                Some("annotation") => annotation = Some(self.read_annotation(child, Some(id))?),
                Some("complexType") => {
                    type_ref = Some(TypeRef::Inline(self.read_complex_type(child, Some(id))?))
                }
                Some("simpleType") => {
                    type_ref = Some(TypeRef::Inline(self.read_simple_type(child, Some(id))?))
                }
                Some("key" | "keyref" | "unique") => identity_constraints = true,
                _ => return Err(unexpected(child, node)),
            }
        }

        Ok(self.fill(
            id,
            XsdNodeKind::Element(Element {
                name,
                reference,
                type_ref,
                occurs,
                nillable: bool_attribute(node, "nillable")?,
                default: node.attribute("default").map(str::to_string),
                fixed: node.attribute("fixed").map(str::to_string),
                is_abstract: bool_attribute(node, "abstract")?,
                substitution_group: self.qname_attribute(node, "substitutionGroup")?,
                identity_constraints,
                annotation,
            }),
        ))
    }

    fn read_attribute(
        &mut self,
        node: Node<'_, '_>,
        parent: Option<NodeId>,
    ) -> Result<NodeId, ReadError> {
        let id = self.reserve(parent, node);
        let name = node.attribute("name").map(str::to_string);
        let reference = self.qname_attribute(node, "ref")?;
        if name.is_none() && reference.is_none() {
            return Err(missing_attribute(node, "name"));
        }

        let usage = match node.attribute("use") {
            None | Some("optional") => AttributeUse::Optional,
            Some("required") => AttributeUse::Required,
            Some("prohibited") => AttributeUse::Prohibited,
            Some(other) => return Err(invalid_attribute(node, "use", other)),
        };

        let mut type_ref = self.qname_attribute(node, "type")?.map(TypeRef::Named);
        let mut annotation = None;
        for child in element_children(node) {
            match xs_tag(child) {
                Some("annotation") => annotation = Some(self.read_annotation(child, Some(id))?),
                Some("simpleType") => {
                    type_ref = Some(TypeRef::Inline(self.read_simple_type(child, Some(id))?))
                }
                _ => return Err(unexpected(child, node)),
            }
        }

        Ok(self.fill(
            id,
            XsdNodeKind::Attribute(Attribute {
                name,
                reference,
                type_ref,
                usage,
                fixed: node.attribute("fixed").map(str::to_string),
                default: node.attribute("default").map(str::to_string),
                annotation,
            }),
        ))
    }

    fn read_complex_type(
        &mut self,
        node: Node<'_, '_>,
        parent: Option<NodeId>,
    ) -> Result<NodeId, ReadError> {
        let id = self.reserve(parent, node);
        let mut complex = ComplexType {
            name: node.attribute("name").map(str::to_string),
            content: ComplexContent::Empty,
            attributes: Vec::new(),
            any_attribute: false,
            mixed: bool_attribute(node, "mixed")?,
            annotation: None,
        };

        for child in element_children(node) {
            match xs_tag(child) {
                Some("annotation") => {
                    complex.annotation = Some(self.read_annotation(child, Some(id))?)
                }
                Some("sequence" | "choice" | "all" | "group") => {
                    complex.content = ComplexContent::Particle(self.read_particle(child, id)?)
                }
                Some("simpleContent") => {
                    complex.content = self.read_simple_content(child, id, &mut complex)?
                }
                Some("complexContent") => {
                    complex.mixed |= bool_attribute(child, "mixed")?;
                    complex.content = self.read_complex_content(child, id, &mut complex)?
                }
                Some(tag @ ("openContent" | "assert")) => {
                    return Err(ReadError::Unsupported {
                        construct: format!("xs:{tag}"),
                        span: child.range(),
                    });
                }
                _ => {
                    if !self.read_attribute_decl(
                        child,
                        id,
                        &mut complex.attributes,
                        &mut complex.any_attribute,
                    )? {
                        return Err(unexpected(child, node));
                    }
                }
            }
        }

        Ok(self.fill(id, XsdNodeKind::ComplexType(complex)))
    }

    /// Read an attribute-like child. Returns `false` when `node` is not one.
    fn read_attribute_decl(
        &mut self,
        node: Node<'_, '_>,
        parent: NodeId,
        attributes: &mut Vec<NodeId>,
        any_attribute: &mut bool,
    ) -> Result<bool, ReadError> {
        match xs_tag(node) {
            Some("attribute") => attributes.push(self.read_attribute(node, Some(parent))?),
            Some("attributeGroup") => {
                let reference = self
                    .qname_attribute(node, "ref")?
                    .ok_or_else(|| missing_attribute(node, "ref"))?;
                let id = self.schema.create_node(
                    Some(parent),
                    node.range(),
                    XsdNodeKind::AttributeGroupRef(reference),
                );
                attributes.push(id);
            }
            Some("anyAttribute") => *any_attribute = true,
            _ => return Ok(false),
        }
        Ok(true)
    }

    fn read_simple_content(
        &mut self,
        node: Node<'_, '_>,
        id: NodeId,
        complex: &mut ComplexType,
    ) -> Result<ComplexContent, ReadError> {
        for derivation in element_children(node) {
            let tag = xs_tag(derivation);
            if tag == Some("annotation") {
                continue;
            }
            if !matches!(tag, Some("extension" | "restriction")) {
                return Err(unexpected(derivation, node));
            }

            let base = self
                .qname_attribute(derivation, "base")?
                .ok_or_else(|| missing_attribute(derivation, "base"))?;
            let mut facets = Vec::new();
            for child in element_children(derivation) {
                if xs_tag(child) == Some("annotation") {
                    continue;
                }
                if tag == Some("restriction") {
                    if let Some(facet) = read_facet(child)? {
                        facets.push(facet);
                        continue;
                    }
                    if xs_tag(child) == Some("simpleType") {
                        return Err(ReadError::Unsupported {
                            construct: "inline xs:simpleType in a simple content restriction".to_string(),
                            span: child.range(),
                        });
                    }
                }
                if !self.read_attribute_decl(
                    child,
                    id,
                    &mut complex.attributes,
                    &mut complex.any_attribute,
                )? {
                    return Err(unexpected(child, derivation));
                }
            }

            return Ok(match tag {
                Some("extension") => ComplexContent::SimpleExtension { base },
                _ => ComplexContent::SimpleRestriction { base, facets },
            });
        }
        Err(missing_child(node, "extension"))
    }

    fn read_complex_content(
        &mut self,
        node: Node<'_, '_>,
        id: NodeId,
        complex: &mut ComplexType,
    ) -> Result<ComplexContent, ReadError> {
        for derivation in element_children(node) {
            let tag = xs_tag(derivation);
            if tag == Some("annotation") {
                continue;
            }
            if !matches!(tag, Some("extension" | "restriction")) {
                return Err(unexpected(derivation, node));
            }

            let base = self
                .qname_attribute(derivation, "base")?
                .ok_or_else(|| missing_attribute(derivation, "base"))?;
            let mut particle = None;
            for child in element_children(derivation) {
                match xs_tag(child) {
                    Some("annotation") => {}
                    Some("sequence" | "choice" | "all" | "group") => {
                        particle = Some(self.read_particle(child, id)?)
                    }
                    _ => {
                        if !self.read_attribute_decl(
                            child,
                            id,
                            &mut complex.attributes,
                            &mut complex.any_attribute,
                        )? {
                            return Err(unexpected(child, derivation));
                        }
                    }
                }
            }

            return Ok(match tag {
                Some("extension") => ComplexContent::ComplexExtension { base, particle },
                _ => ComplexContent::ComplexRestriction { base, particle },
            });
        }
        Err(missing_child(node, "extension"))
    }

    fn read_particle(&mut self, node: Node<'_, '_>, parent: NodeId) -> Result<NodeId, ReadError> {
        match xs_tag(node) {
            Some("element") => self.read_element(node, Some(parent)),
            Some(tag @ ("sequence" | "choice" | "all")) => {
                let id = self.reserve(Some(parent), node);
                let mut group = ModelGroup {
                    occurs: read_occurs(node)?,
                    particles: Vec::new(),
                };
                for child in element_children(node) {
                    if xs_tag(child) == Some("annotation") {
                        continue;
                    }
                    group.particles.push(self.read_particle(child, id)?);
                }
                let kind = match tag {
                    "sequence" => XsdNodeKind::Sequence(group),
                    "choice" => XsdNodeKind::Choice(group),
                    _ => XsdNodeKind::All(group),
                };
                Ok(self.fill(id, kind))
            }
            Some("group") => {
                let reference = self
                    .qname_attribute(node, "ref")?
                    .ok_or_else(|| missing_attribute(node, "ref"))?;
                let kind = XsdNodeKind::GroupRef(GroupRef {
                    reference,
                    occurs: read_occurs(node)?,
                });
                Ok(self.schema.create_node(Some(parent), node.range(), kind))
            }
            Some("any") => {
                let kind = XsdNodeKind::Any(Any {
                    occurs: read_occurs(node)?,
                    namespace: node.attribute("namespace").map(str::to_string),
                });
                Ok(self.schema.create_node(Some(parent), node.range(), kind))
            }
            _ => {
                let parent_tag = self.schema.kind(parent).tag();
                Err(ReadError::UnexpectedChild {
                    child: node.tag_name().name().to_string(),
                    parent: parent_tag.to_string(),
                    span: node.range(),
                })
            }
        }
    }

    fn read_group(&mut self, node: Node<'_, '_>) -> Result<NodeId, ReadError> {
        let id = self.reserve(None, node);
        let name = node
            .attribute("name")
            .ok_or_else(|| missing_attribute(node, "name"))?
            .to_string();
        let mut particle = None;
        for child in element_children(node) {
            match xs_tag(child) {
                Some("annotation") => {}
                Some("sequence" | "choice" | "all") => {
                    particle = Some(self.read_particle(child, id)?)
                }
                _ => return Err(unexpected(child, node)),
            }
        }
        Ok(self.fill(id, XsdNodeKind::Group(Group { name, particle })))
    }

    fn read_attribute_group(&mut self, node: Node<'_, '_>) -> Result<NodeId, ReadError> {
        let id = self.reserve(None, node);
        let mut group = AttributeGroup {
            name: node
                .attribute("name")
                .ok_or_else(|| missing_attribute(node, "name"))?
                .to_string(),
            attributes: Vec::new(),
            any_attribute: false,
        };
        for child in element_children(node) {
            if xs_tag(child) == Some("annotation") {
                continue;
            }
            if !self.read_attribute_decl(
                child,
                id,
                &mut group.attributes,
                &mut group.any_attribute,
            )? {
                return Err(unexpected(child, node));
            }
        }
        Ok(self.fill(id, XsdNodeKind::AttributeGroup(group)))
    }

    fn read_simple_type(
        &mut self,
        node: Node<'_, '_>,
        parent: Option<NodeId>,
    ) -> Result<NodeId, ReadError> {
        let id = self.reserve(parent, node);
        let name = node.attribute("name").map(str::to_string);
        let mut annotation = None;
        let mut content = None;

        for child in element_children(node) {
            match xs_tag(child) {
                Some("annotation") => annotation = Some(self.read_annotation(child, Some(id))?),
                Some("restriction") => {
                    let mut base = self.qname_attribute(child, "base")?.map(TypeRef::Named);
                    let mut facets = Vec::new();
                    for grandchild in element_children(child) {
                        match xs_tag(grandchild) {
                            Some("annotation") => {}
                            Some("simpleType") => {
                                base = Some(TypeRef::Inline(
                                    self.read_simple_type(grandchild, Some(id))?,
                                ))
                            }
                            _ => match read_facet(grandchild)? {
                                Some(facet) => facets.push(facet),
                                None => return Err(unexpected(grandchild, child)),
                            },
                        }
                    }
                    let base = base.ok_or_else(|| missing_attribute(child, "base"))?;
                    content = Some(SimpleContent::Restriction { base, facets });
                }
                Some("list") => {
                    let mut item = self.qname_attribute(child, "itemType")?.map(TypeRef::Named);
                    for grandchild in element_children(child) {
                        match xs_tag(grandchild) {
                            Some("annotation") => {}
                            Some("simpleType") => {
                                item = Some(TypeRef::Inline(
                                    self.read_simple_type(grandchild, Some(id))?,
                                ))
                            }
                            _ => return Err(unexpected(grandchild, child)),
                        }
                    }
                    let item = item.ok_or_else(|| missing_attribute(child, "itemType"))?;
                    content = Some(SimpleContent::List { item });
                }
                Some("union") => {
                    let mut members = Vec::new();
                    let member_types = child.attribute("memberTypes").unwrap_or_default();
                    for member in member_types.split_whitespace() {
                        members.push(TypeRef::Named(self.qname(member, child)?));
                    }
                    for grandchild in element_children(child) {
                        match xs_tag(grandchild) {
                            Some("annotation") => {}
                            Some("simpleType") => members.push(TypeRef::Inline(
                                self.read_simple_type(grandchild, Some(id))?,
                            )),
                            _ => return Err(unexpected(grandchild, child)),
                        }
                    }
                    content = Some(SimpleContent::Union { members });
                }
                _ => return Err(unexpected(child, node)),
            }
        }

        let content = content.ok_or_else(|| missing_child(node, "restriction"))?;
        Ok(self.fill(
            id,
            XsdNodeKind::SimpleType(SimpleType {
                name,
                content,
                annotation,
            }),
        ))
    }

    fn read_annotation(
        &mut self,
        node: Node<'_, '_>,
        parent: Option<NodeId>,
    ) -> Result<NodeId, ReadError> {
        let mut annotation = Annotation::default();
        for child in element_children(node) {
            match xs_tag(child) {
                Some("documentation") => read_documentation(child, &mut annotation)?,
                Some("appinfo") => {}
                _ => return Err(unexpected(child, node)),
            }
        }
        Ok(self
            .schema
            .create_node(parent, node.range(), XsdNodeKind::Annotation(annotation)))
    }

    fn qname_attribute(
        &self,
        node: Node<'_, '_>,
        attribute: &str,
    ) -> Result<Option<QName>, ReadError> {
        node.attribute(attribute)
            .map(|value| self.qname(value, node))
            .transpose()
    }

    /// Resolve a QName-valued attribute against the namespaces in scope at `node`.
    fn qname(&self, value: &str, node: Node<'_, '_>) -> Result<QName, ReadError> {
        let value = value.trim();
        if let Some((prefix, local)) = value.split_once(':') {
            if prefix == "xml" {
                return Ok(QName::new(XML_NAMESPACE, local));
            }
            let namespace = node
                .namespaces()
                .find(|ns| ns.name() == Some(prefix))
                .map(|ns| ns.uri())
                .ok_or_else(|| ReadError::UnknownPrefix {
                    prefix: prefix.to_string(),
                    value: value.to_string(),
                    span: node.range(),
                })?;
            Ok(QName::new(namespace, local))
        } else {
            let namespace = node
                .namespaces()
                .find(|ns| ns.name().is_none())
                .map(|ns| ns.uri())
                .unwrap_or_default();
            Ok(QName::new(namespace, value))
        }
    }
}

fn element_children<'a, 'input>(node: Node<'a, 'input>) -> impl Iterator<Item = Node<'a, 'input>> {
    node.children().filter(|child| child.is_element())
}

/// Local name of an element in the XML Schema namespace.
fn xs_tag<'a>(node: Node<'a, '_>) -> Option<&'a str> {
    let tag = node.tag_name();
    (tag.namespace() == Some(XS_NAMESPACE)).then(|| tag.name())
}

fn read_facet(node: Node<'_, '_>) -> Result<Option<Facet>, ReadError> {
    let Some(kind) = xs_tag(node).and_then(FacetKind::from_tag) else {
        return Ok(None);
    };
    let value = node
        .attribute("value")
        .ok_or_else(|| missing_attribute(node, "value"))?;
    Ok(Some(Facet {
        kind,
        value: value.to_string(),
        span: node.range(),
    }))
}

/// Split documentation markup into plain text, `or:tekst` texts and
/// `xs:attribute` info. Unknown markup contributes its text.
fn read_documentation(node: Node<'_, '_>, annotation: &mut Annotation) -> Result<(), ReadError> {
    let mut text = String::new();
    for markup in node.children() {
        if markup.is_text() {
            text.push_str(markup.text().unwrap_or_default());
            continue;
        }
        if !markup.is_element() {
            continue;
        }
        let tag = markup.tag_name();
        match (tag.namespace(), tag.name()) {
            (Some(XS_NAMESPACE), "attribute") => {
                let name = local_attribute(markup, "name")
                    .ok_or_else(|| missing_attribute(markup, "name"))?;
                let fixed = local_attribute(markup, "fixed")
                    .ok_or_else(|| missing_attribute(markup, "fixed"))?;
                annotation.info.push(AttributeInfo {
                    name: name.to_string(),
                    fixed: fixed.to_string(),
                });
            }
            (Some(OR_NAMESPACE), "tekst") => {
                let kind = local_attribute(markup, "teksttype")
                    .ok_or_else(|| missing_attribute(markup, "teksttype"))?;
                let lang = local_attribute(markup, "lang")
                    .ok_or_else(|| missing_attribute(markup, "lang"))?;
                annotation.texts.push(AnnotationText {
                    kind: kind.to_string(),
                    lang: lang.to_string(),
                    text: inner_text(markup).trim().to_string(),
                });
            }
            (Some(OR_NAMESPACE), "info") => {}
            _ => text.push_str(&inner_text(markup)),
        }
    }
    let text = text.trim();
    if !text.is_empty() {
        annotation.documentation.push(text.to_string());
    }
    Ok(())
}

fn inner_text(node: Node<'_, '_>) -> String {
    node.descendants()
        .filter(|n| n.is_text())
        .filter_map(|n| n.text())
        .collect()
}

/// An attribute by local name, in any namespace.
fn local_attribute<'a>(node: Node<'a, '_>, name: &str) -> Option<&'a str> {
    node.attributes()
        .find(|attribute| attribute.name() == name)
        .map(|attribute| attribute.value())
}

fn read_occurs(node: Node<'_, '_>) -> Result<Occurs, ReadError> {
    let min = match node.attribute("minOccurs") {
        Some(s) => s
            .trim()
            .parse()
            .map_err(|_| invalid_attribute(node, "minOccurs", s))?,
        None => 1,
    };
    let max = match node.attribute("maxOccurs") {
        Some("unbounded") => MaxOccurs::Unbounded,
        Some(s) => s
            .trim()
            .parse()
            .map(MaxOccurs::Bounded)
            .map_err(|_| invalid_attribute(node, "maxOccurs", s))?,
        None => MaxOccurs::Bounded(1),
    };
    if max == MaxOccurs::Bounded(0) {
        return Err(ReadError::Unsupported {
            construct: "maxOccurs=\"0\"".to_string(),
            span: node.range(),
        });
    }
    if let MaxOccurs::Bounded(max) = max
        && min > max
    {
        return Err(invalid_attribute(node, "minOccurs", &min.to_string()));
    }
    Ok(Occurs { min, max })
}

fn bool_attribute(node: Node<'_, '_>, attribute: &'static str) -> Result<bool, ReadError> {
    match node.attribute(attribute) {
        None | Some("false" | "0") => Ok(false),
        Some("true" | "1") => Ok(true),
        Some(other) => Err(invalid_attribute(node, attribute, other)),
    }
}

fn invalid_attribute(node: Node<'_, '_>, attribute: &'static str, value: &str) -> ReadError {
    ReadError::InvalidAttribute {
        attribute,
        value: value.to_string(),
        span: node.range(),
    }
}

fn missing_attribute(node: Node<'_, '_>, attribute: &'static str) -> ReadError {
    ReadError::MissingAttribute {
        element: node.tag_name().name().to_string(),
        attribute,
        span: node.range(),
    }
}

fn missing_child(node: Node<'_, '_>, child: &'static str) -> ReadError {
    ReadError::MissingChild {
        element: node.tag_name().name().to_string(),
        child,
        span: node.range(),
    }
}

fn unexpected(child: Node<'_, '_>, parent: Node<'_, '_>) -> ReadError {
    ReadError::UnexpectedChild {
        child: child.tag_name().name().to_string(),
        parent: parent.tag_name().name().to_string(),
        span: child.range(),
    }
}
