use serde_json::{Value, json};
use xsdform_instance_model::{
    ElementKind, ExpansionPolicy, GenerateError, GenerateOptions, InstanceModelGenerator,
    StructuralError, UNBOUNDED_MAX_OCCURS, ValueType,
};
use xsdform_json_schema::Schema;

fn schema(value: Value) -> Schema {
    serde_json::from_value(value).unwrap()
}

fn generate(value: Value) -> InstanceModelGenerator {
    InstanceModelGenerator::new(&schema(value), "org", "service", GenerateOptions::default())
        .unwrap()
}

fn nested_schema() -> Value {
    json!({
        "type": "object",
        "properties": {"a": {"$ref": "#/definitions/A"}},
        "required": ["a"],
        "definitions": {
            "A": {
                "type": "object",
                "properties": {"b": {"$ref": "#/definitions/B"}, "e": {"type": "string"}}
            },
            "B": {
                "type": "object",
                "properties": {
                    "c": {"type": "array", "items": [{"$ref": "#/definitions/C"}]}
                }
            },
            "C": {"type": "object", "properties": {"d": {"type": "integer"}}}
        }
    })
}

#[test]
fn test_paths_in_traversal_order() {
    let generator = generate(nested_schema());
    let paths: Vec<_> = generator.model().paths().collect();
    assert_eq!(paths, ["a", "a.b", "a.b.c[*]", "a.b.c[*].d", "a.e"]);
}

#[test]
fn test_root_group_descriptor() {
    let generator = generate(nested_schema());
    let descriptor = serde_json::to_value(generator.model().get("a").unwrap()).unwrap();
    assert_eq!(
        descriptor,
        json!({
            "id": "a",
            "parentPath": null,
            "name": "a",
            "xName": "a",
            "typeName": "A",
            "kind": "Group",
            "xsdValueType": null,
            "minOccurs": 1,
            "maxOccurs": 1,
            "restrictions": {},
            "dataBindingPath": null,
            "xPath": "/a",
            "displayPath": "a : [1..1] A",
            "schemaPointer": "#/properties/a"
        })
    );
}

#[test]
fn test_nested_field_descriptor() {
    let generator = generate(nested_schema());
    let descriptor = serde_json::to_value(generator.model().get("a.b.c[*].d").unwrap()).unwrap();
    assert_eq!(
        descriptor,
        json!({
            "id": "a.b.c[*].d",
            "parentPath": "a.b.c[*]",
            "name": "d",
            "xName": "d",
            "typeName": null,
            "kind": "Field",
            "xsdValueType": "integer",
            "minOccurs": 0,
            "maxOccurs": 1,
            "restrictions": {},
            "dataBindingPath": "a.b.c[*].d",
            "xPath": "/a/b/c[*]/d",
            "displayPath": "a.b.c[*].d : [0..1] integer",
            "schemaPointer": "#/definitions/C/properties/d"
        })
    );

    let array = generator.model().get("a.b.c[*]").unwrap();
    assert_eq!(array.kind, ElementKind::Group);
    assert_eq!(array.type_name.as_deref(), Some("C"));
    assert_eq!(array.display_path, "a.b.c : [0..*] C");
}

#[test]
fn test_unbounded_integer_is_repeating_field() {
    let generator = generate(json!({
        "type": "object",
        "properties": {
            "Numbers": {"type": "array", "minItems": 0, "items": [{"type": "integer"}]}
        }
    }));
    let descriptor = generator.model().get("Numbers[*]").unwrap();
    assert_eq!(descriptor.kind, ElementKind::Field);
    assert_eq!(descriptor.xsd_value_type, Some(ValueType::Integer));
    assert_eq!(descriptor.min_occurs, 0);
    assert_eq!(descriptor.max_occurs, UNBOUNDED_MAX_OCCURS);
    assert!(descriptor.id.ends_with("[*]"));
    assert_eq!(descriptor.display_path, "Numbers : [0..*] integer");
}

#[test]
fn test_bounded_array_keeps_max_items() {
    let generator = generate(json!({
        "type": "object",
        "properties": {
            "Line": {"type": "array", "minItems": 1, "maxItems": 3, "items": [{"type": "string"}]}
        }
    }));
    let descriptor = generator.model().get("Line[*]").unwrap();
    assert_eq!((descriptor.min_occurs, descriptor.max_occurs), (1, 3));
    assert_eq!(descriptor.display_path, "Line : [1..3] string");
}

#[test]
fn test_attribute_with_fixed_value_has_no_binding() {
    let generator = generate(json!({
        "type": "object",
        "properties": {"Doc": {"$ref": "#/definitions/Doc"}},
        "definitions": {
            "Doc": {
                "type": "object",
                "properties": {
                    "version": {"@xsdType": "XmlAttribute", "type": "string", "const": "1.0"},
                    "lang": {"@xsdType": "XmlAttribute", "type": "string"}
                },
                "required": ["lang"]
            }
        }
    }));
    let version = generator.model().get("Doc.version").unwrap();
    assert_eq!(version.kind, ElementKind::Attribute);
    assert_eq!(version.fixed_value.as_deref(), Some("1.0"));
    assert_eq!(version.data_binding_path, None);

    let lang = generator.model().get("Doc.lang").unwrap();
    assert_eq!(lang.kind, ElementKind::Attribute);
    assert_eq!(lang.min_occurs, 1);
    assert_eq!(lang.data_binding_path.as_deref(), Some("Doc.lang"));
}

#[test]
fn test_restrictions_follow_references() {
    let generator = generate(json!({
        "type": "object",
        "properties": {
            "Code": {"$ref": "#/definitions/Code"},
            "Amount": {"type": "number", "minimum": 0, "maximum": 1000}
        },
        "definitions": {
            "Code": {"type": "string", "maxLength": 10, "pattern": "[A-Z]+"}
        }
    }));
    let code = generator.model().get("Code").unwrap();
    assert_eq!(code.kind, ElementKind::Field);
    assert_eq!(code.type_name, None);
    assert_eq!(
        serde_json::to_value(&code.restrictions).unwrap(),
        json!({"maxLength": {"value": 10}, "pattern": {"value": "[A-Z]+"}})
    );
    let amount = generator.model().get("Amount").unwrap();
    assert_eq!(amount.xsd_value_type, Some(ValueType::Decimal));
    assert_eq!(
        serde_json::to_value(&amount.restrictions).unwrap(),
        json!({"minimum": {"value": 0}, "maximum": {"value": 1000}})
    );
}

#[test]
fn test_names_are_sanitized_but_pointer_keeps_original() {
    let generator = generate(json!({
        "type": "object",
        "properties": {"first-name": {"type": "string"}}
    }));
    let descriptor = generator.model().get("firstname").unwrap();
    assert_eq!(descriptor.x_name, "first-name");
    assert_eq!(descriptor.schema_pointer, "#/properties/first-name");
}

fn shared_type_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "Home": {"$ref": "#/definitions/Address"},
            "Work": {"$ref": "#/definitions/Address"}
        },
        "definitions": {
            "Address": {
                "type": "object",
                "properties": {"Street": {"type": "string"}},
                "required": ["Street"]
            }
        }
    })
}

#[test]
fn test_first_occurrence_expands_shared_type_once() {
    let generator = generate(shared_type_schema());
    let paths: Vec<_> = generator.model().paths().collect();
    assert_eq!(paths, ["Home", "Home.Street", "Work"]);
    assert_eq!(generator.model().get("Home.Street").unwrap().min_occurs, 1);
}

#[test]
fn test_per_branch_expands_shared_type_everywhere() {
    let options = GenerateOptions {
        policy: ExpansionPolicy::PerBranch,
    };
    let generator =
        InstanceModelGenerator::new(&schema(shared_type_schema()), "org", "service", options)
            .unwrap();
    let paths: Vec<_> = generator.model().paths().collect();
    assert_eq!(paths, ["Home", "Home.Street", "Work", "Work.Street"]);
}

#[test]
fn test_recursive_type_terminates_under_both_policies() {
    let value = json!({
        "type": "object",
        "properties": {"Node": {"$ref": "#/definitions/Node"}},
        "definitions": {
            "Node": {
                "type": "object",
                "properties": {
                    "Child": {"$ref": "#/definitions/Node"},
                    "Label": {"type": "string"}
                }
            }
        }
    });
    for policy in [ExpansionPolicy::FirstOccurrence, ExpansionPolicy::PerBranch] {
        let generator = InstanceModelGenerator::new(
            &schema(value.clone()),
            "org",
            "service",
            GenerateOptions { policy },
        )
        .unwrap();
        let paths: Vec<_> = generator.model().paths().collect();
        assert_eq!(paths, ["Node", "Node.Child", "Node.Label"], "{policy}");
    }
}

#[test]
fn test_extension_and_choice_members_are_traversed() {
    let generator = generate(json!({
        "type": "object",
        "properties": {"Item": {"$ref": "#/definitions/Derived"}},
        "definitions": {
            "Base": {"type": "object", "properties": {"Id": {"type": "string"}}, "required": ["Id"]},
            "Derived": {
                "type": "object",
                "allOf": [
                    {"$ref": "#/definitions/Base"},
                    {"properties": {"Extra": {"type": "boolean"}}}
                ],
                "oneOf": [
                    {"type": "object", "properties": {"Email": {"type": "string"}}, "required": ["Email"]},
                    {"type": "object", "properties": {"Phone": {"type": "string"}}, "required": ["Phone"]}
                ]
            }
        }
    }));
    let paths: Vec<_> = generator.model().paths().collect();
    assert_eq!(
        paths,
        ["Item", "Item.Id", "Item.Extra", "Item.Email", "Item.Phone"]
    );
    assert_eq!(generator.model().get("Item.Id").unwrap().min_occurs, 1);
    assert_eq!(generator.model().get("Item.Email").unwrap().min_occurs, 0);
    let pointers: Vec<_> = generator
        .model()
        .elements
        .values()
        .map(|descriptor| descriptor.schema_pointer.as_str())
        .collect();
    assert_eq!(
        pointers,
        [
            "#/properties/Item",
            "#/definitions/Base/properties/Id",
            "#/definitions/Derived/allOf/1/properties/Extra",
            "#/definitions/Derived/oneOf/0/properties/Email",
            "#/definitions/Derived/oneOf/1/properties/Phone",
        ]
    );
}

#[test]
fn test_inline_object_members_point_into_their_parent() {
    let generator = generate(json!({
        "type": "object",
        "properties": {
            "Order": {
                "type": "object",
                "title": "Order",
                "properties": {
                    "Lines": {
                        "type": "array",
                        "items": [{"type": "object", "properties": {"Sku": {"type": "string"}}}]
                    }
                }
            }
        }
    }));
    assert_eq!(
        generator.model().get("Order.Lines[*]").unwrap().schema_pointer,
        "#/properties/Order/properties/Lines"
    );
    assert_eq!(
        generator.model().get("Order.Lines[*].Sku").unwrap().schema_pointer,
        "#/properties/Order/properties/Lines/items/0/properties/Sku"
    );
}

#[test]
fn test_choice_branches_may_share_an_element() {
    let generator = generate(json!({
        "type": "object",
        "properties": {"R": {"$ref": "#/definitions/R"}},
        "definitions": {
            "R": {
                "type": "object",
                "oneOf": [
                    {"type": "object", "properties": {"a": {"type": "string"}}, "required": ["a"]},
                    {
                        "type": "object",
                        "properties": {"b": {"type": "string"}, "a": {"type": "string"}},
                        "required": ["b", "a"]
                    }
                ]
            }
        }
    }));
    let paths: Vec<_> = generator.model().paths().collect();
    assert_eq!(paths, ["R", "R.a", "R.b"]);
    assert_eq!(
        generator.model().get("R.a").unwrap().schema_pointer,
        "#/definitions/R/oneOf/0/properties/a"
    );
}

#[test]
fn test_element_repeated_outside_a_choice_is_duplicate() {
    let err = InstanceModelGenerator::new(
        &schema(json!({
            "type": "object",
            "properties": {"R": {"$ref": "#/definitions/R"}},
            "definitions": {
                "R": {
                    "type": "object",
                    "properties": {"a": {"type": "string"}},
                    "oneOf": [
                        {"type": "object", "properties": {"a": {"type": "string"}}},
                        {"type": "object", "properties": {"c": {"type": "string"}}}
                    ]
                }
            }
        })),
        "org",
        "service",
        GenerateOptions::default(),
    )
    .unwrap_err();
    assert_eq!(
        err,
        GenerateError::Structural(StructuralError::DuplicatePath {
            path: "R.a".to_string()
        })
    );
}

#[test]
fn test_generation_is_idempotent() {
    let first = generate(nested_schema());
    let second = generate(nested_schema());
    assert_eq!(
        serde_json::to_string(first.model()).unwrap(),
        serde_json::to_string(second.model()).unwrap()
    );
}

#[test]
fn test_missing_root_properties() {
    let err = InstanceModelGenerator::new(
        &schema(json!({"type": "object"})),
        "org",
        "service",
        GenerateOptions::default(),
    )
    .unwrap_err();
    assert_eq!(err, GenerateError::Structural(StructuralError::MissingProperties));
}

#[test]
fn test_empty_root_properties_are_missing() {
    let err = InstanceModelGenerator::new(
        &schema(json!({
            "type": "object",
            "properties": {},
            "definitions": {"T": {"type": "object", "properties": {"x": {"type": "string"}}}}
        })),
        "org",
        "service",
        GenerateOptions::default(),
    )
    .unwrap_err();
    assert_eq!(err, GenerateError::Structural(StructuralError::MissingProperties));
}

#[test]
fn test_names_colliding_after_sanitizing_are_duplicate_paths() {
    let err = InstanceModelGenerator::new(
        &schema(json!({
            "type": "object",
            "properties": {"a-b": {"type": "string"}, "ab": {"type": "string"}}
        })),
        "org",
        "service",
        GenerateOptions::default(),
    )
    .unwrap_err();
    assert_eq!(
        err,
        GenerateError::Structural(StructuralError::DuplicatePath {
            path: "ab".to_string()
        })
    );
}

#[test]
fn test_empty_sanitized_name() {
    let err = InstanceModelGenerator::new(
        &schema(json!({"type": "object", "properties": {"--": {"type": "string"}}})),
        "org",
        "service",
        GenerateOptions::default(),
    )
    .unwrap_err();
    assert_eq!(err.location(), Some("#/properties/--"));
}

#[test]
fn test_model_serializes_org_and_service() {
    let generator = generate(json!({"type": "object", "properties": {"n": {"type": "string"}}}));
    let value = serde_json::to_value(generator.model()).unwrap();
    assert_eq!(value["org"], "org");
    assert_eq!(value["service"], "service");
    assert_eq!(value["elements"]["n"]["id"], "n");
}

#[test]
fn test_policy_parses_from_kebab_case() {
    assert_eq!(
        "per-branch".parse::<ExpansionPolicy>().unwrap(),
        ExpansionPolicy::PerBranch
    );
    assert!("everywhere".parse::<ExpansionPolicy>().is_err());
    assert_eq!(ExpansionPolicy::default().to_string(), "first-occurrence");
}
