//! Compilation from an XSD arena to a JSON Schema document.
//!
//! Top-level elements become root properties; complex types (named or
//! anonymous) and named simple types become definitions referenced through
//! `#/definitions/<name>`. Anonymous simple types are inlined at their point
//! of use. Groups and attribute groups are expanded in place.

use ahash::AHashSet;
use serde_json::Value;
use tracing::{debug, info, warn};
use xsdform_json_schema::{
    DefinitionError, Definitions, META_SCHEMA, Schema, SchemaBuilder, SchemaType, XsdType,
    parse_number,
};
use xsdform_xsd::{
    Any, Attribute, AttributeGroup, AttributeUse, ComplexContent, ComplexType, Element, Facet,
    FacetKind, GlobalKind, Group, MaxOccurs, NodeId, Occurs, QName, SimpleContent, SimpleType,
    TypeRef, XsdNodeKind, XsdSchema,
};

use crate::builtins::builtin_schema;
use crate::error::CompileError;
use crate::names::NameRegistry;

/// Options for [`compile`].
#[derive(Debug, Clone, Default)]
pub struct CompileOptions {
    /// Value for the root `$id`.
    pub schema_id: Option<String>,
}

/// Compile an XSD document to a JSON Schema document.
pub fn compile(xsd: &XsdSchema, options: &CompileOptions) -> Result<Schema, CompileError> {
    let mut compiler = Compiler::new(xsd);
    compiler.compile_document(options)
}

/// A property produced by a declaration: its name, schema and required-ness.
struct Property {
    name: String,
    schema: Schema,
    required: bool,
}

/// Compilation state for one document.
struct Compiler<'a> {
    xsd: &'a XsdSchema,
    names: NameRegistry,
    definitions: Definitions,
    /// Type nodes that have been (or are being) emitted as definitions.
    defined: AHashSet<NodeId>,
    /// Groups and attribute groups being expanded, to detect reference cycles.
    expanding: Vec<NodeId>,
}

impl<'a> Compiler<'a> {
    fn new(xsd: &'a XsdSchema) -> Self {
        Self {
            xsd,
            names: NameRegistry::new(xsd),
            definitions: Definitions::new(),
            defined: AHashSet::new(),
            expanding: Vec::new(),
        }
    }

    fn compile_document(&mut self, options: &CompileOptions) -> Result<Schema, CompileError> {
        let xsd = self.xsd;
        let mut root = SchemaBuilder::of_type(SchemaType::Object)
            .meta_schema(META_SCHEMA)
            .empty_properties();
        if let Some(id) = &options.schema_id {
            root = root.id(id.clone());
        }

        // First pass: top-level elements become root properties.
        for &id in &xsd.items {
            if let XsdNodeKind::Element(element) = xsd.kind(id) {
                let property = self.element_property(id, element)?;
                root = root.property(property.name, property.schema);
            }
        }

        // Second pass: everything else.
        let mut documentation = Vec::new();
        for &id in &xsd.items {
            match xsd.kind(id) {
                XsdNodeKind::ComplexType(_) | XsdNodeKind::SimpleType(_) => {
                    self.define_type(id)?;
                }
                XsdNodeKind::Annotation(annotation) => {
                    documentation.extend(annotation.documentation.iter().cloned());
                    for text in &annotation.texts {
                        root = root.text(&text.kind, &text.lang, &text.text);
                    }
                    for info in &annotation.info {
                        root = root.info(&info.name, &info.fixed);
                    }
                }
                XsdNodeKind::Element(_)
                | XsdNodeKind::Attribute(_)
                | XsdNodeKind::Group(_)
                | XsdNodeKind::AttributeGroup(_) => {}
                other @ (XsdNodeKind::Sequence(_)
                | XsdNodeKind::Choice(_)
                | XsdNodeKind::All(_)
                | XsdNodeKind::GroupRef(_)
                | XsdNodeKind::AttributeGroupRef(_)
                | XsdNodeKind::Any(_)) => {
                    return Err(CompileError::unsupported(
                        format!("top-level xs:{}", other.tag()),
                        id,
                    ));
                }
            }
        }
        if !documentation.is_empty() {
            root = root.description(documentation.join("\n\n"));
        }

        let definition_count = self.definitions.len();
        let document = root
            .definitions(std::mem::take(&mut self.definitions))
            .build();
        verify_references(&document)?;

        info!(
            definitions = definition_count,
            properties = document.properties.as_ref().map_or(0, |p| p.len()),
            "compiled XSD to JSON Schema"
        );
        Ok(document)
    }

    fn local_name(&mut self, id: NodeId) -> Result<String, CompileError> {
        Ok(self
            .names
            .name_of(self.xsd, id, &self.definitions)?
            .local_name)
    }

    /// Copy the first non-empty annotation onto `builder`.
    fn annotate(
        &self,
        mut builder: SchemaBuilder,
        annotations: &[Option<NodeId>],
    ) -> SchemaBuilder {
        let Some(annotation) = annotations
            .iter()
            .filter_map(|&id| self.xsd.annotation(id))
            .find(|annotation| !annotation.is_empty())
        else {
            return builder;
        };
        if let Some(description) = annotation.text() {
            builder = builder.description(description);
        }
        for text in &annotation.texts {
            builder = builder.text(&text.kind, &text.lang, &text.text);
        }
        for info in &annotation.info {
            builder = builder.info(&info.name, &info.fixed);
        }
        builder
    }

    /// Emit a complex or simple type as a definition (once) and return its name.
    fn define_type(&mut self, id: NodeId) -> Result<String, CompileError> {
        let name = self.local_name(id)?;
        if !self.defined.insert(id) {
            return Ok(name);
        }

        let schema = match self.xsd.kind(id) {
            XsdNodeKind::ComplexType(complex) => self.complex_type_schema(id, complex)?,
            XsdNodeKind::SimpleType(simple) => self.simple_type_schema(id, simple)?,
            other => {
                return Err(CompileError::unsupported(
                    format!("xs:{} used as a type", other.tag()),
                    id,
                ));
            }
        };

        debug!(%name, "defined type");
        self.definitions
            .insert(name.clone(), schema)
            .map_err(|DefinitionError::Duplicate(name)| CompileError::DuplicateDefinition {
                name,
                node: id,
            })?;
        Ok(name)
    }

    /// Schema for a reference to a named type.
    fn type_reference(&mut self, name: &QName, at: NodeId) -> Result<Schema, CompileError> {
        if name.is_builtin() {
            return builtin_schema(&name.local_name)
                .ok_or_else(|| CompileError::unsupported(format!("built-in type {name}"), at));
        }
        let type_id = self
            .xsd
            .global(GlobalKind::Type, name)
            .ok_or_else(|| CompileError::UnresolvedReference {
                kind: "type",
                name: name.to_string(),
                node: Some(at),
            })?;
        let definition = self.local_name(type_id)?;
        Ok(SchemaBuilder::reference_to(&definition).build())
    }

    fn inline_simple_type(&mut self, id: NodeId) -> Result<Schema, CompileError> {
        match self.xsd.kind(id) {
            XsdNodeKind::SimpleType(simple) => self.simple_type_schema(id, simple),
            other => Err(CompileError::unsupported(
                format!("xs:{} where a simple type is expected", other.tag()),
                id,
            )),
        }
    }

    fn element_property(
        &mut self,
        id: NodeId,
        element: &'a Element,
    ) -> Result<Property, CompileError> {
        let (declaration_id, declaration) = match &element.reference {
            Some(reference) => self.global_element(reference, id)?,
            None => (id, element),
        };
        reject_element_features(declaration_id, declaration)?;
        if declaration.nillable {
            warn!(node = ?declaration_id, "ignoring nillable on element");
        }

        let name = self.local_name(id)?;
        let type_schema = match &declaration.type_ref {
            None => Schema::default(),
            Some(TypeRef::Named(type_name)) => self.type_reference(type_name, declaration_id)?,
            Some(TypeRef::Inline(type_id)) => match self.xsd.kind(*type_id) {
                XsdNodeKind::ComplexType(_) => {
                    let definition = self.define_type(*type_id)?;
                    SchemaBuilder::reference_to(&definition).build()
                }
                _ => self.inline_simple_type(*type_id)?,
            },
        };

        let builder = with_occurs(type_schema, element.occurs);
        let builder = self.annotate(builder, &[element.annotation, declaration.annotation]);

        Ok(Property {
            name,
            schema: builder.build(),
            required: element.occurs.min >= 1,
        })
    }

    fn any_property(&mut self, id: NodeId, any: &Any) -> Result<Property, CompileError> {
        let name = self.local_name(id)?;
        let value = SchemaBuilder::of_type(SchemaType::String).build();
        Ok(Property {
            name,
            schema: with_occurs(value, any.occurs).xsd_type(XsdType::XmlAny).build(),
            required: any.occurs.min >= 1,
        })
    }

    fn attribute_property(
        &mut self,
        id: NodeId,
        attribute: &'a Attribute,
    ) -> Result<Option<Property>, CompileError> {
        if attribute.usage == AttributeUse::Prohibited {
            return Ok(None);
        }
        let (declaration_id, declaration) = match &attribute.reference {
            Some(reference) => self.global_attribute(reference, id)?,
            None => (id, attribute),
        };
        if attribute.default.is_some() || declaration.default.is_some() {
            debug!(node = ?id, "ignoring attribute default value");
        }

        let name = self.local_name(id)?;
        let mut builder = match &declaration.type_ref {
            None => SchemaBuilder::new(),
            Some(TypeRef::Named(type_name)) => {
                SchemaBuilder::from(self.type_reference(type_name, declaration_id)?)
            }
            Some(TypeRef::Inline(type_id)) => {
                SchemaBuilder::from(self.inline_simple_type(*type_id)?)
            }
        };
        builder = builder.xsd_type(XsdType::XmlAttribute);
        if let Some(fixed) = attribute.fixed.as_ref().or(declaration.fixed.as_ref()) {
            builder = builder.const_value(Value::String(fixed.clone()));
        }
        builder = self.annotate(builder, &[attribute.annotation, declaration.annotation]);

        Ok(Some(Property {
            name,
            schema: builder.build(),
            required: attribute.usage == AttributeUse::Required,
        }))
    }

    fn complex_type_schema(
        &mut self,
        id: NodeId,
        complex: &'a ComplexType,
    ) -> Result<Schema, CompileError> {
        if complex.mixed {
            warn!(node = ?id, "ignoring mixed content");
        }
        if complex.any_attribute {
            warn!(node = ?id, "ignoring xs:anyAttribute");
        }

        let mut builder = match &complex.content {
            ComplexContent::Empty => {
                let builder = SchemaBuilder::of_type(SchemaType::Object);
                self.merge_attributes(builder, &complex.attributes)?
            }
            ComplexContent::Particle(particle) => {
                let builder = SchemaBuilder::of_type(SchemaType::Object);
                let builder = self.merge_attributes(builder, &complex.attributes)?;
                self.merge_particle(builder, *particle, false)?
            }
            ComplexContent::SimpleExtension { base } => {
                let value = self.type_reference(base, id)?;
                self.simple_content(value, &complex.attributes)?
            }
            ComplexContent::SimpleRestriction { base, facets } => {
                let value = SchemaBuilder::from(self.type_reference(base, id)?);
                let value = self.apply_facets(value, id, facets)?.build();
                self.simple_content(value, &complex.attributes)?
            }
            ComplexContent::ComplexExtension { base, particle } => {
                let base = self.type_reference(base, id)?;
                let mut builder = SchemaBuilder::of_type(SchemaType::Object).all_of(base);
                if let Some(particle) = particle {
                    let extension = self.merge_particle(SchemaBuilder::new(), *particle, false)?;
                    builder = builder.all_of(extension.build());
                }
                self.merge_attributes(builder, &complex.attributes)?
            }
            ComplexContent::ComplexRestriction { particle, .. } => {
                let builder = SchemaBuilder::of_type(SchemaType::Object);
                let builder = self.merge_attributes(builder, &complex.attributes)?;
                match particle {
                    Some(particle) => self.merge_particle(builder, *particle, false)?,
                    None => builder,
                }
            }
        };

        builder = self.annotate(builder, &[complex.annotation]);
        Ok(builder.build())
    }

    /// Simple content: the value schema itself, or a required `value`
    /// property next to the attributes.
    fn simple_content(
        &mut self,
        value: Schema,
        attributes: &[NodeId],
    ) -> Result<SchemaBuilder, CompileError> {
        if attributes.is_empty() {
            return Ok(SchemaBuilder::from(value));
        }
        let builder = SchemaBuilder::of_type(SchemaType::Object);
        let builder = self.merge_attributes(builder, attributes)?;
        Ok(builder.property("value", value).require("value"))
    }

    fn merge_attributes(
        &mut self,
        mut builder: SchemaBuilder,
        attributes: &[NodeId],
    ) -> Result<SchemaBuilder, CompileError> {
        let xsd = self.xsd;
        for &id in attributes {
            match xsd.kind(id) {
                XsdNodeKind::Attribute(attribute) => {
                    if let Some(property) = self.attribute_property(id, attribute)? {
                        builder = add_property(builder, property, false, id)?;
                    }
                }
                XsdNodeKind::AttributeGroupRef(reference) => {
                    let (group_id, group) = self.global_attribute_group(reference, id)?;
                    if group.any_attribute {
                        return Err(CompileError::unsupported(
                            "xs:anyAttribute in an attribute group",
                            group_id,
                        ));
                    }
                    self.enter(group_id)?;
                    builder = self.merge_attributes(builder, &group.attributes)?;
                    self.leave();
                }
                other => {
                    return Err(CompileError::unsupported(
                        format!("xs:{} among attributes", other.tag()),
                        id,
                    ));
                }
            }
        }
        Ok(builder)
    }

    /// Merge a particle into `builder` as properties. Members of an optional
    /// particle are never required.
    fn merge_particle(
        &mut self,
        builder: SchemaBuilder,
        id: NodeId,
        optional: bool,
    ) -> Result<SchemaBuilder, CompileError> {
        let xsd = self.xsd;
        match xsd.kind(id) {
            XsdNodeKind::Element(element) => {
                let property = self.element_property(id, element)?;
                add_property(builder, property, optional, id)
            }
            XsdNodeKind::Any(any) => {
                let property = self.any_property(id, any)?;
                add_property(builder, property, optional, id)
            }
            XsdNodeKind::Sequence(group) | XsdNodeKind::All(group) => {
                reject_repeating_group(id, group.occurs, xsd.kind(id).tag())?;
                let optional = optional || group.occurs.is_optional();
                let mut builder = builder;
                for &particle in &group.particles {
                    builder = self.merge_particle(builder, particle, optional)?;
                }
                Ok(builder)
            }
            XsdNodeKind::Choice(group) => {
                reject_repeating_group(id, group.occurs, "choice")?;
                let optional = optional || group.occurs.is_optional();
                let mut branches = Vec::with_capacity(group.particles.len());
                for &particle in &group.particles {
                    let branch = SchemaBuilder::of_type(SchemaType::Object);
                    branches.push(self.merge_particle(branch, particle, optional)?.build());
                }
                Ok(builder.one_of(branches))
            }
            XsdNodeKind::GroupRef(group_ref) => {
                reject_repeating_group(id, group_ref.occurs, "group")?;
                let (group_id, group) = self.global_group(&group_ref.reference, id)?;
                let optional = optional || group_ref.occurs.is_optional();
                self.enter(group_id)?;
                let builder = match group.particle {
                    Some(particle) => self.merge_particle(builder, particle, optional)?,
                    None => builder,
                };
                self.leave();
                Ok(builder)
            }
            other => Err(CompileError::unsupported(
                format!("xs:{} in a content model", other.tag()),
                id,
            )),
        }
    }

    fn simple_type_schema(
        &mut self,
        id: NodeId,
        simple: &'a SimpleType,
    ) -> Result<Schema, CompileError> {
        let mut builder = match &simple.content {
            SimpleContent::Restriction { base, facets } => {
                let base = match base {
                    TypeRef::Named(name) => self.type_reference(name, id)?,
                    TypeRef::Inline(inline) => self.inline_simple_type(*inline)?,
                };
                self.apply_facets(SchemaBuilder::from(base), id, facets)?
            }
            SimpleContent::List { item } => {
                let item = match item {
                    TypeRef::Named(name) => self.type_reference(name, id)?,
                    TypeRef::Inline(inline) => self.inline_simple_type(*inline)?,
                };
                SchemaBuilder::of_type(SchemaType::Array)
                    .xsd_type(XsdType::XmlList)
                    .items(item)
            }
            SimpleContent::Union { .. } => return Err(CompileError::unsupported("xs:union", id)),
        };

        builder = self.annotate(builder, &[simple.annotation]);
        Ok(builder.build())
    }

    fn apply_facets(
        &self,
        mut builder: SchemaBuilder,
        id: NodeId,
        facets: &[Facet],
    ) -> Result<SchemaBuilder, CompileError> {
        let mut enumeration = Vec::new();
        let mut patterns = Vec::new();
        for facet in facets {
            builder = match facet.kind {
                FacetKind::Enumeration => {
                    enumeration.push(Value::String(facet.value.clone()));
                    builder
                }
                FacetKind::MinInclusive => builder.minimum(number_facet(facet, id)?),
                FacetKind::MaxInclusive => builder.maximum(number_facet(facet, id)?),
                FacetKind::MinExclusive => builder.exclusive_minimum(number_facet(facet, id)?),
                FacetKind::MaxExclusive => builder.exclusive_maximum(number_facet(facet, id)?),
                FacetKind::MinLength => builder.min_length(length_facet(facet, id)?),
                FacetKind::MaxLength => builder.max_length(length_facet(facet, id)?),
                FacetKind::Length | FacetKind::TotalDigits => {
                    let length = length_facet(facet, id)?;
                    builder.min_length(length).max_length(length)
                }
                FacetKind::Pattern => {
                    patterns.push(facet.value.as_str());
                    builder
                }
                FacetKind::FractionDigits => {
                    warn!(node = ?id, "ignoring xs:fractionDigits");
                    builder
                }
                FacetKind::WhiteSpace => {
                    return Err(CompileError::unsupported("xs:whiteSpace facet", id));
                }
            };
        }

        if !enumeration.is_empty() {
            builder = builder.enum_values(enumeration);
        }
        match patterns.as_slice() {
            [] => {}
            [pattern] => builder = builder.pattern(*pattern),
            // patterns in one restriction step are alternatives
            many => {
                let joined: Vec<String> = many.iter().map(|p| format!("(?:{p})")).collect();
                builder = builder.pattern(joined.join("|"));
            }
        }
        Ok(builder)
    }

    fn enter(&mut self, id: NodeId) -> Result<(), CompileError> {
        if self.expanding.contains(&id) {
            let name = self.xsd.kind(id).declared_name().unwrap_or_default();
            return Err(CompileError::unsupported(
                format!("circular reference to xs:{} `{name}`", self.xsd.kind(id).tag()),
                id,
            ));
        }
        self.expanding.push(id);
        Ok(())
    }

    fn leave(&mut self) {
        self.expanding.pop();
    }

    fn global_element(
        &self,
        name: &QName,
        at: NodeId,
    ) -> Result<(NodeId, &'a Element), CompileError> {
        let xsd = self.xsd;
        match xsd.global(GlobalKind::Element, name).map(|id| (id, xsd.kind(id))) {
            Some((id, XsdNodeKind::Element(element))) => Ok((id, element)),
            _ => Err(unresolved("element", name, at)),
        }
    }

    fn global_attribute(
        &self,
        name: &QName,
        at: NodeId,
    ) -> Result<(NodeId, &'a Attribute), CompileError> {
        let xsd = self.xsd;
        match xsd.global(GlobalKind::Attribute, name).map(|id| (id, xsd.kind(id))) {
            Some((id, XsdNodeKind::Attribute(attribute))) => Ok((id, attribute)),
            _ => Err(unresolved("attribute", name, at)),
        }
    }

    fn global_group(&self, name: &QName, at: NodeId) -> Result<(NodeId, &'a Group), CompileError> {
        let xsd = self.xsd;
        match xsd.global(GlobalKind::Group, name).map(|id| (id, xsd.kind(id))) {
            Some((id, XsdNodeKind::Group(group))) => Ok((id, group)),
            _ => Err(unresolved("group", name, at)),
        }
    }

    fn global_attribute_group(
        &self,
        name: &QName,
        at: NodeId,
    ) -> Result<(NodeId, &'a AttributeGroup), CompileError> {
        let xsd = self.xsd;
        match xsd.global(GlobalKind::AttributeGroup, name).map(|id| (id, xsd.kind(id))) {
            Some((id, XsdNodeKind::AttributeGroup(group))) => Ok((id, group)),
            _ => Err(unresolved("attribute group", name, at)),
        }
    }
}

/// Wrap `schema` in an array when the declaration may occur more than once.
fn with_occurs(schema: Schema, occurs: Occurs) -> SchemaBuilder {
    if !occurs.is_repeating() {
        return SchemaBuilder::from(schema);
    }
    let mut array = SchemaBuilder::of_type(SchemaType::Array).min_items(occurs.min);
    if let MaxOccurs::Bounded(max) = occurs.max {
        array = array.max_items(max);
    }
    array.items(schema)
}

fn add_property(
    builder: SchemaBuilder,
    property: Property,
    optional: bool,
    id: NodeId,
) -> Result<SchemaBuilder, CompileError> {
    if builder.has_property(&property.name) {
        return Err(CompileError::unsupported(
            format!("repeated declaration of `{}` in one content model", property.name),
            id,
        ));
    }
    let builder = builder.property(property.name.clone(), property.schema);
    Ok(if property.required && !optional {
        builder.require(property.name)
    } else {
        builder
    })
}

fn reject_element_features(id: NodeId, element: &Element) -> Result<(), CompileError> {
    let feature = if element.default.is_some() {
        "default value on xs:element"
    } else if element.fixed.is_some() {
        "fixed value on xs:element"
    } else if element.is_abstract {
        "abstract xs:element"
    } else if element.substitution_group.is_some() {
        "substitution group"
    } else if element.identity_constraints {
        "identity constraint"
    } else {
        return Ok(());
    };
    Err(CompileError::unsupported(feature, id))
}

fn reject_repeating_group(id: NodeId, occurs: Occurs, tag: &str) -> Result<(), CompileError> {
    if occurs.is_repeating() {
        return Err(CompileError::unsupported(format!("repeating xs:{tag}"), id));
    }
    Ok(())
}

fn number_facet(facet: &Facet, id: NodeId) -> Result<serde_json::Number, CompileError> {
    parse_number(&facet.value).ok_or_else(|| invalid_facet(facet, id))
}

fn length_facet(facet: &Facet, id: NodeId) -> Result<u64, CompileError> {
    facet
        .value
        .trim()
        .parse()
        .map_err(|_| invalid_facet(facet, id))
}

fn invalid_facet(facet: &Facet, id: NodeId) -> CompileError {
    CompileError::InvalidFacet {
        facet: facet.kind.tag(),
        value: facet.value.clone(),
        node: id,
        span: facet.span.clone(),
    }
}

fn unresolved(kind: &'static str, name: &QName, at: NodeId) -> CompileError {
    CompileError::UnresolvedReference {
        kind,
        name: name.to_string(),
        node: Some(at),
    }
}

/// Every `$ref` in the document must name an existing definition.
fn verify_references(document: &Schema) -> Result<(), CompileError> {
    let empty = Definitions::new();
    let definitions = document.definitions.as_ref().unwrap_or(&empty);
    for reference in document.references() {
        if definitions.resolve(reference).is_none() {
            return Err(CompileError::UnresolvedReference {
                kind: "definition",
                name: reference.to_string(),
                node: None,
            });
        }
    }
    Ok(())
}
