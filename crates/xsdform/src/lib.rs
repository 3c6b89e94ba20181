//! xsdform: XSD to JSON Schema compilation and form instance models.
//!
//! This crate ties the pipeline together. [`compile_str`] reads and compiles
//! XSD text, [`generate_instance_model`] builds the path-keyed model a form
//! designer binds to, and [`Error`] collects every failure with an
//! [`ErrorKind`] and a rendered [`report`].

mod error;
pub mod report;

pub use error::{Error, ErrorKind};

pub use xsdform_compiler as compiler;
pub use xsdform_config as config;
pub use xsdform_instance_model as instance_model;
pub use xsdform_json_schema as json_schema;
pub use xsdform_xsd as xsd;

pub use xsdform_compiler::{CompileError, CompileOptions, NameRegistry, compile};
pub use xsdform_instance_model::{
    EditError, ElementDescriptor, ElementKind, ExpansionPolicy, GenerateError, GenerateOptions,
    InstanceModel, InstanceModelGenerator,
};
pub use xsdform_json_schema::Schema;
pub use xsdform_xsd::{ReadError, XsdSchema, read_xsd};

/// Read XSD text and compile it to a JSON Schema document.
pub fn compile_str(text: &str, options: &CompileOptions) -> Result<Schema, Error> {
    let xsd = read_xsd(text)?;
    compile(&xsd, options).map_err(|error| Error::compile(error, &xsd))
}

/// Build the instance model of a compiled schema.
///
/// The returned generator owns the model and accepts
/// [`expand_path`](InstanceModelGenerator::expand_path) and
/// [`remove_path`](InstanceModelGenerator::remove_path) edits.
pub fn generate_instance_model(
    schema: &Schema,
    org: &str,
    service: &str,
    options: GenerateOptions,
) -> Result<InstanceModelGenerator, GenerateError> {
    InstanceModelGenerator::new(schema, org, service, options)
}

#[cfg(test)]
mod tests {
    use super::*;

    const PERSON: &str = r#"<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema">
  <xs:element name="Person">
    <xs:complexType>
      <xs:sequence>
        <xs:element name="Name" type="xs:string"/>
        <xs:element name="Age" type="xs:integer" minOccurs="0"/>
      </xs:sequence>
    </xs:complexType>
  </xs:element>
</xs:schema>"#;

    #[test]
    fn test_compile_then_generate() {
        let schema = compile_str(PERSON, &CompileOptions::default()).unwrap();
        let generator =
            generate_instance_model(&schema, "org", "service", GenerateOptions::default())
                .unwrap();
        let paths: Vec<_> = generator.model().paths().collect();
        assert_eq!(paths, ["Person", "Person.Name", "Person.Age"]);
        assert_eq!(generator.model().get("Person.Name").unwrap().min_occurs, 1);
    }

    #[test]
    fn test_compile_error_carries_span() {
        let text = r#"<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema">
  <xs:element name="Weight" type="xs:float"/>
</xs:schema>"#;
        let err = compile_str(text, &CompileOptions::default()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnsupportedConstruct);
        let span = err.span().unwrap();
        assert!(text[span].starts_with("<xs:element"));
    }

    #[test]
    fn test_malformed_xml_is_read_error() {
        let err = compile_str("<xs:schema", &CompileOptions::default()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Read);
        assert_eq!(err.span(), None);
    }
}
