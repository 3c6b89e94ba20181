use serde_json::{Value, json};
use xsdform_compiler::{CompileError, CompileOptions, compile};
use xsdform_json_schema::{Definitions, Schema};
use xsdform_xsd::read_xsd;

fn schema_doc(body: &str) -> String {
    format!(r#"<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema">{body}</xs:schema>"#)
}

fn compile_doc(body: &str) -> Result<Schema, CompileError> {
    let xsd = read_xsd(&schema_doc(body)).expect("valid XSD");
    compile(&xsd, &CompileOptions::default())
}

fn compile_json(body: &str) -> Value {
    serde_json::to_value(compile_doc(body).expect("compiles")).unwrap()
}

#[test]
fn test_required_element_with_max_length() {
    let output = compile_json(
        r#"<xs:element name="Root">
             <xs:complexType>
               <xs:sequence>
                 <xs:element name="Code">
                   <xs:simpleType>
                     <xs:restriction base="xs:string"><xs:maxLength value="10"/></xs:restriction>
                   </xs:simpleType>
                 </xs:element>
               </xs:sequence>
             </xs:complexType>
           </xs:element>"#,
    );
    assert_eq!(
        output,
        json!({
            "$schema": "http://json-schema.org/schema#",
            "type": "object",
            "properties": {"Root": {"$ref": "#/definitions/Root"}},
            "definitions": {
                "Root": {
                    "type": "object",
                    "properties": {"Code": {"type": "string", "maxLength": 10}},
                    "required": ["Code"]
                }
            }
        })
    );
}

#[test]
fn test_unbounded_element_is_array_without_max_items() {
    let output = compile_json(
        r#"<xs:element name="List" type="List"/>
           <xs:complexType name="List">
             <xs:sequence>
               <xs:element name="Item" type="xs:integer" minOccurs="0" maxOccurs="unbounded"/>
             </xs:sequence>
           </xs:complexType>"#,
    );
    assert_eq!(
        output["definitions"]["List"],
        json!({
            "type": "object",
            "properties": {
                "Item": {"type": "array", "minItems": 0, "items": [{"type": "integer"}]}
            }
        })
    );
}

#[test]
fn test_bounded_repetition_sets_both_item_bounds() {
    let output = compile_json(
        r#"<xs:complexType name="Pair">
             <xs:sequence>
               <xs:element name="Side" type="xs:string" minOccurs="2" maxOccurs="2"/>
             </xs:sequence>
           </xs:complexType>"#,
    );
    assert_eq!(
        output["definitions"]["Pair"]["properties"]["Side"],
        json!({"type": "array", "minItems": 2, "maxItems": 2, "items": [{"type": "string"}]})
    );
    assert_eq!(output["definitions"]["Pair"]["required"], json!(["Side"]));
}

#[test]
fn test_named_type_is_defined_once_and_every_reference_resolves() {
    let schema = compile_doc(
        r#"<xs:element name="Home" type="Address"/>
           <xs:element name="Work" type="Address"/>
           <xs:complexType name="Address">
             <xs:sequence><xs:element name="Street" type="xs:string"/></xs:sequence>
           </xs:complexType>"#,
    )
    .unwrap();

    let definitions = schema.definitions.as_ref().unwrap();
    assert_eq!(definitions.names().collect::<Vec<_>>(), ["Address"]);
    for reference in schema.references() {
        assert!(definitions.resolve(reference).is_some(), "{reference}");
    }
}

#[test]
fn test_anonymous_type_does_not_take_a_named_type_name() {
    let output = compile_json(
        r#"<xs:element name="Address">
             <xs:complexType>
               <xs:sequence><xs:element name="Line" type="xs:string"/></xs:sequence>
             </xs:complexType>
           </xs:element>
           <xs:complexType name="Address">
             <xs:sequence><xs:element name="Street" type="xs:string"/></xs:sequence>
           </xs:complexType>"#,
    );
    assert_eq!(
        output["properties"]["Address"],
        json!({"$ref": "#/definitions/Address2"})
    );
    assert!(output["definitions"]["Address"]["properties"]["Street"].is_object());
    assert!(output["definitions"]["Address2"]["properties"]["Line"].is_object());
}

#[test]
fn test_simple_content_with_attributes_gets_value_property() {
    let output = compile_json(
        r#"<xs:complexType name="Price">
             <xs:simpleContent>
               <xs:extension base="xs:decimal">
                 <xs:attribute name="currency" type="xs:string" use="required"/>
               </xs:extension>
             </xs:simpleContent>
           </xs:complexType>"#,
    );
    assert_eq!(
        output["definitions"]["Price"],
        json!({
            "type": "object",
            "properties": {
                "currency": {"@xsdType": "XmlAttribute", "type": "string"},
                "value": {"type": "number"}
            },
            "required": ["currency", "value"]
        })
    );
}

#[test]
fn test_simple_content_without_attributes_is_the_value_schema() {
    let output = compile_json(
        r#"<xs:complexType name="Amount">
             <xs:simpleContent>
               <xs:restriction base="xs:integer"><xs:minInclusive value="5"/></xs:restriction>
             </xs:simpleContent>
           </xs:complexType>"#,
    );
    assert_eq!(
        output["definitions"]["Amount"],
        json!({"type": "integer", "minimum": 5})
    );
}

#[test]
fn test_fixed_attribute_becomes_const() {
    let output = compile_json(
        r#"<xs:complexType name="Versioned">
             <xs:attribute name="version" type="xs:string" fixed="1.0"/>
             <xs:attribute name="legacy" type="xs:string" use="prohibited"/>
           </xs:complexType>"#,
    );
    assert_eq!(
        output["definitions"]["Versioned"],
        json!({
            "type": "object",
            "properties": {
                "version": {"@xsdType": "XmlAttribute", "type": "string", "const": "1.0"}
            }
        })
    );
}

#[test]
fn test_choice_becomes_one_of() {
    let output = compile_json(
        r#"<xs:complexType name="Contact">
             <xs:choice>
               <xs:element name="Email" type="xs:string"/>
               <xs:element name="Phone" type="xs:string"/>
             </xs:choice>
           </xs:complexType>"#,
    );
    assert_eq!(
        output["definitions"]["Contact"],
        json!({
            "type": "object",
            "oneOf": [
                {"type": "object", "properties": {"Email": {"type": "string"}}, "required": ["Email"]},
                {"type": "object", "properties": {"Phone": {"type": "string"}}, "required": ["Phone"]}
            ]
        })
    );
}

#[test]
fn test_complex_extension_uses_all_of() {
    let output = compile_json(
        r#"<xs:complexType name="Base">
             <xs:sequence><xs:element name="Id" type="xs:string"/></xs:sequence>
           </xs:complexType>
           <xs:complexType name="Derived">
             <xs:complexContent>
               <xs:extension base="Base">
                 <xs:sequence><xs:element name="Extra" type="xs:boolean" minOccurs="0"/></xs:sequence>
                 <xs:attribute name="flag" type="xs:boolean"/>
               </xs:extension>
             </xs:complexContent>
           </xs:complexType>"#,
    );
    assert_eq!(
        output["definitions"]["Derived"],
        json!({
            "type": "object",
            "properties": {"flag": {"@xsdType": "XmlAttribute", "type": "boolean"}},
            "allOf": [
                {"$ref": "#/definitions/Base"},
                {"properties": {"Extra": {"type": "boolean"}}}
            ]
        })
    );
}

#[test]
fn test_groups_expand_in_place() {
    let output = compile_json(
        r#"<xs:group name="Names">
             <xs:sequence>
               <xs:element name="First" type="xs:string"/>
               <xs:element name="Last" type="xs:string"/>
             </xs:sequence>
           </xs:group>
           <xs:attributeGroup name="Audit">
             <xs:attribute name="created" type="xs:date"/>
           </xs:attributeGroup>
           <xs:complexType name="Person">
             <xs:sequence>
               <xs:group ref="Names" minOccurs="0"/>
               <xs:element name="Age" type="xs:positiveInteger"/>
             </xs:sequence>
             <xs:attributeGroup ref="Audit"/>
           </xs:complexType>"#,
    );
    assert_eq!(
        output["definitions"]["Person"],
        json!({
            "type": "object",
            "properties": {
                "created": {"@xsdType": "XmlAttribute", "type": "string", "format": "date"},
                "First": {"type": "string"},
                "Last": {"type": "string"},
                "Age": {"type": "integer", "minimum": 0}
            },
            "required": ["Age"]
        })
    );
    assert!(output["definitions"].get("Names").is_none());
}

#[test]
fn test_facets_on_named_simple_type() {
    let output = compile_json(
        r#"<xs:simpleType name="Colour">
             <xs:restriction base="xs:string">
               <xs:enumeration value="red"/>
               <xs:enumeration value="green"/>
               <xs:pattern value="[a-z]+"/>
               <xs:pattern value="[A-Z]+"/>
             </xs:restriction>
           </xs:simpleType>
           <xs:simpleType name="Code">
             <xs:restriction base="Colour"><xs:length value="3"/></xs:restriction>
           </xs:simpleType>"#,
    );
    assert_eq!(
        output["definitions"]["Colour"],
        json!({
            "type": "string",
            "enum": ["red", "green"],
            "pattern": "(?:[a-z]+)|(?:[A-Z]+)"
        })
    );
    assert_eq!(
        output["definitions"]["Code"],
        json!({"$ref": "#/definitions/Colour", "minLength": 3, "maxLength": 3})
    );
}

#[test]
fn test_inclusive_bounds_are_clamped_to_base() {
    let output = compile_json(
        r#"<xs:simpleType name="Small">
             <xs:restriction base="xs:short"><xs:maxInclusive value="100000"/></xs:restriction>
           </xs:simpleType>"#,
    );
    assert_eq!(
        output["definitions"]["Small"],
        json!({"type": "integer", "minimum": -32768, "maximum": 32767})
    );
}

#[test]
fn test_list_type() {
    let output = compile_json(
        r#"<xs:simpleType name="Numbers"><xs:list itemType="xs:integer"/></xs:simpleType>"#,
    );
    assert_eq!(
        output["definitions"]["Numbers"],
        json!({"@xsdType": "XmlList", "type": "array", "items": [{"type": "integer"}]})
    );
}

#[test]
fn test_any_takes_parent_name() {
    let output = compile_json(
        r#"<xs:complexType name="Envelope">
             <xs:sequence><xs:any minOccurs="0"/></xs:sequence>
           </xs:complexType>"#,
    );
    assert_eq!(
        output["definitions"]["Envelope"]["properties"]["Envelope"],
        json!({"@xsdType": "XmlAny", "type": "string"})
    );
}

#[test]
fn test_annotations_become_descriptions() {
    let xsd = read_xsd(&schema_doc(
        r#"<xs:annotation><xs:documentation>Orders</xs:documentation></xs:annotation>
           <xs:element name="Note" type="xs:string">
             <xs:annotation><xs:documentation>Free text</xs:documentation></xs:annotation>
           </xs:element>"#,
    ))
    .unwrap();
    let options = CompileOptions {
        schema_id: Some("urn:orders".to_string()),
    };
    let output = serde_json::to_value(compile(&xsd, &options).unwrap()).unwrap();
    assert_eq!(
        output,
        json!({
            "$schema": "http://json-schema.org/schema#",
            "$id": "urn:orders",
            "type": "object",
            "description": "Orders",
            "properties": {"Note": {"type": "string", "description": "Free text"}},
            "definitions": {}
        })
    );
}

#[test]
fn test_annotation_texts_and_info_are_kept() {
    let output = compile_json(
        r#"<xs:element name="Form" type="Form"/>
           <xs:complexType name="Form">
             <xs:annotation>
               <xs:documentation xmlns:or="http://www.brreg.no/or">
                 <xs:attribute name="dataformatid" fixed="5703"/>
               </xs:documentation>
             </xs:annotation>
             <xs:sequence>
               <xs:element name="Amount" type="xs:decimal">
                 <xs:annotation>
                   <xs:documentation xmlns:or="http://www.brreg.no/or">
                     <or:tekst teksttype="LEDE" lang="NOB">Beløp</or:tekst>
                     <or:tekst teksttype="LEDE" lang="EN">Amount</or:tekst>
                     <or:tekst teksttype="HJELP" lang="NOB">Oppgi beløp</or:tekst>
                   </xs:documentation>
                 </xs:annotation>
               </xs:element>
             </xs:sequence>
           </xs:complexType>"#,
    );
    let form = &output["definitions"]["Form"];
    assert_eq!(form["@xsdInfo"], json!({"dataformatid": "5703"}));
    assert!(form.get("description").is_none());
    assert_eq!(
        form["properties"]["Amount"]["@xsdTexts"],
        json!({
            "LEDE": {"NOB": "Beløp", "EN": "Amount"},
            "HJELP": {"NOB": "Oppgi beløp"}
        })
    );
}

#[test]
fn test_prohibited_element_is_rejected() {
    let err = read_xsd(&schema_doc(
        r#"<xs:element name="Root">
             <xs:complexType>
               <xs:sequence>
                 <xs:element name="Gone" type="xs:string" minOccurs="0" maxOccurs="0"/>
               </xs:sequence>
             </xs:complexType>
           </xs:element>"#,
    ))
    .unwrap_err();
    assert_eq!(err.to_string(), r#"unsupported XSD construct: maxOccurs="0""#);
}

#[test]
fn test_union_is_unsupported() {
    let err = compile_doc(
        r#"<xs:simpleType name="Either"><xs:union memberTypes="xs:string xs:integer"/></xs:simpleType>"#,
    )
    .unwrap_err();
    assert!(matches!(
        err,
        CompileError::UnsupportedConstruct { ref construct, .. } if construct == "xs:union"
    ));
}

#[test]
fn test_unknown_builtin_is_unsupported() {
    let err = compile_doc(r#"<xs:element name="Ratio" type="xs:float"/>"#).unwrap_err();
    assert_eq!(err.to_string(), "unsupported XSD construct: built-in type xs:float");
}

#[test]
fn test_missing_type_is_unresolved() {
    let err = compile_doc(r#"<xs:element name="Ghost" type="Nowhere"/>"#).unwrap_err();
    assert!(matches!(
        err,
        CompileError::UnresolvedReference { kind: "type", ref name, .. } if name == "Nowhere"
    ));
}

#[test]
fn test_missing_group_is_unresolved() {
    let err = compile_doc(
        r#"<xs:complexType name="T"><xs:group ref="Missing"/></xs:complexType>"#,
    )
    .unwrap_err();
    assert!(matches!(
        err,
        CompileError::UnresolvedReference { kind: "group", .. }
    ));
}

#[test]
fn test_unparsable_facet_is_invalid() {
    let err = compile_doc(
        r#"<xs:simpleType name="Short">
             <xs:restriction base="xs:string"><xs:maxLength value="ten"/></xs:restriction>
           </xs:simpleType>"#,
    )
    .unwrap_err();
    assert!(matches!(
        err,
        CompileError::InvalidFacet { facet: "maxLength", ref value, .. } if value == "ten"
    ));
}

#[test]
fn test_circular_group_is_rejected() {
    let err = compile_doc(
        r#"<xs:group name="Loop"><xs:sequence><xs:group ref="Loop"/></xs:sequence></xs:group>
           <xs:complexType name="T"><xs:group ref="Loop"/></xs:complexType>"#,
    )
    .unwrap_err();
    assert!(err.to_string().contains("circular reference"), "{err}");
}

#[test]
fn test_element_default_is_unsupported() {
    let err = compile_doc(r#"<xs:element name="Mode" type="xs:string" default="on"/>"#).unwrap_err();
    assert!(matches!(err, CompileError::UnsupportedConstruct { .. }));
}

#[test]
fn test_repeating_sequence_is_unsupported() {
    let err = compile_doc(
        r#"<xs:complexType name="Rows">
             <xs:sequence maxOccurs="unbounded"><xs:element name="Cell" type="xs:string"/></xs:sequence>
           </xs:complexType>"#,
    )
    .unwrap_err();
    assert_eq!(
        err.to_string(),
        "unsupported XSD construct: repeating xs:sequence"
    );
}

#[test]
fn test_compiled_document_round_trips_through_serde() {
    let schema = compile_doc(
        r#"<xs:element name="List" type="List"/>
           <xs:complexType name="List">
             <xs:sequence><xs:element name="Item" type="xs:string" maxOccurs="3"/></xs:sequence>
           </xs:complexType>"#,
    )
    .unwrap();
    let text = serde_json::to_string(&schema).unwrap();
    let back: Schema = serde_json::from_str(&text).unwrap();
    assert_eq!(back, schema);
    assert_eq!(
        back.definitions.as_ref().map(Definitions::len),
        Some(1)
    );
}
