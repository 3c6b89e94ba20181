use std::collections::BTreeSet;

use serde_json::{Value, json};
use xsdform_instance_model::{
    EditError, ExpansionPolicy, GenerateOptions, InstanceModel, InstanceModelGenerator,
};
use xsdform_json_schema::Schema;

fn address_schema() -> Schema {
    serde_json::from_value(json!({
        "type": "object",
        "properties": {
            "Home": {"$ref": "#/definitions/Address"},
            "Work": {"$ref": "#/definitions/Address"},
            "Note": {"type": "string"}
        },
        "definitions": {
            "Address": {
                "type": "object",
                "properties": {
                    "Street": {"type": "string"},
                    "Country": {"$ref": "#/definitions/Country"}
                },
                "required": ["Street"]
            },
            "Country": {
                "type": "object",
                "properties": {"Code": {"type": "string", "maxLength": 2}}
            }
        }
    }))
    .unwrap()
}

fn generator(policy: ExpansionPolicy) -> InstanceModelGenerator {
    InstanceModelGenerator::new(&address_schema(), "org", "service", GenerateOptions { policy })
        .unwrap()
}

fn descendants(model: &InstanceModel, path: &str) -> BTreeSet<String> {
    model.descendants(path).map(str::to_string).collect()
}

fn snapshot(generator: &InstanceModelGenerator) -> Value {
    serde_json::to_value(generator.model()).unwrap()
}

#[test]
fn test_expand_adds_optional_members() {
    let mut generator = generator(ExpansionPolicy::FirstOccurrence);
    assert!(!generator.model().contains("Work.Street"));

    let model = generator.expand_path("Work").unwrap();
    let street = model.get("Work.Street").unwrap();
    assert_eq!(street.min_occurs, 0);
    assert_eq!(street.schema_pointer, "#/definitions/Address/properties/Street");
    assert!(model.contains("Work.Country"));
    // Country was already expanded beneath Home
    assert!(!model.contains("Work.Country.Code"));
}

#[test]
fn test_expand_twice_is_already_expanded() {
    let mut generator = generator(ExpansionPolicy::FirstOccurrence);
    generator.expand_path("Work").unwrap();
    let before = snapshot(&generator);

    let err = generator.expand_path("Work").unwrap_err();
    assert_eq!(
        err,
        EditError::PathAlreadyExpanded {
            path: "Work".to_string()
        }
    );
    assert_eq!(snapshot(&generator), before);
}

#[test]
fn test_expand_scalar_is_not_expandable() {
    let mut generator = generator(ExpansionPolicy::FirstOccurrence);
    let before = snapshot(&generator);

    let err = generator.expand_path("Note").unwrap_err();
    assert!(matches!(err, EditError::PathNotExpandable { ref path, .. } if path == "Note"));
    assert_eq!(snapshot(&generator), before);
}

#[test]
fn test_expand_missing_path() {
    let mut generator = generator(ExpansionPolicy::FirstOccurrence);
    assert_eq!(
        generator.expand_path("Nowhere").unwrap_err(),
        EditError::PathNotFound {
            path: "Nowhere".to_string()
        }
    );
}

#[test]
fn test_remove_keeps_path_and_siblings() {
    let mut generator = generator(ExpansionPolicy::FirstOccurrence);
    let model = generator.remove_path("Home").unwrap();
    let paths: Vec<_> = model.paths().collect();
    assert_eq!(paths, ["Home", "Work", "Note"]);
}

#[test]
fn test_remove_without_descendants() {
    let mut generator = generator(ExpansionPolicy::FirstOccurrence);
    assert_eq!(
        generator.remove_path("Note").unwrap_err(),
        EditError::NothingToRemove {
            path: "Note".to_string()
        }
    );
    assert_eq!(
        generator.remove_path("Gone").unwrap_err(),
        EditError::PathNotFound {
            path: "Gone".to_string()
        }
    );
}

#[test]
fn test_remove_then_expand_restores_direct_children() {
    let mut generator = generator(ExpansionPolicy::FirstOccurrence);
    let original = descendants(generator.model(), "Home");
    assert_eq!(
        original,
        BTreeSet::from([
            "Home.Street".to_string(),
            "Home.Country".to_string(),
            "Home.Country.Code".to_string()
        ])
    );

    generator.remove_path("Home").unwrap();
    generator.expand_path("Home").unwrap();
    let restored = descendants(generator.model(), "Home");
    // nested types stay collapsed once visited
    assert_eq!(
        restored,
        BTreeSet::from(["Home.Street".to_string(), "Home.Country".to_string()])
    );
}

#[test]
fn test_remove_then_expand_restores_everything_per_branch() {
    let mut generator = generator(ExpansionPolicy::PerBranch);
    let original = descendants(generator.model(), "Home");

    generator.remove_path("Home").unwrap();
    generator.expand_path("Home").unwrap();
    assert_eq!(descendants(generator.model(), "Home"), original);
}

#[test]
fn test_remove_nested_path() {
    let mut generator = generator(ExpansionPolicy::FirstOccurrence);
    generator.remove_path("Home.Country").unwrap();
    assert!(generator.model().contains("Home.Country"));
    assert!(!generator.model().contains("Home.Country.Code"));
    assert!(generator.model().contains("Home.Street"));
}

fn inherited_schema() -> Schema {
    serde_json::from_value(json!({
        "type": "object",
        "properties": {
            "b": {"$ref": "#/definitions/Base"},
            "d": {"$ref": "#/definitions/Derived"},
            "e": {"$ref": "#/definitions/Empty"}
        },
        "definitions": {
            "Base": {"type": "object", "properties": {"x": {"type": "string"}}},
            "Derived": {"type": "object", "allOf": [{"$ref": "#/definitions/Base"}]},
            "Empty": {"type": "object", "oneOf": [{"type": "object"}]}
        }
    }))
    .unwrap()
}

#[test]
fn test_expand_includes_base_members_used_elsewhere() {
    let mut generator = InstanceModelGenerator::new(
        &inherited_schema(),
        "org",
        "service",
        GenerateOptions::default(),
    )
    .unwrap();
    let paths: Vec<_> = generator.model().paths().collect();
    assert_eq!(paths, ["b", "b.x", "d", "e"]);

    let model = generator.expand_path("d").unwrap();
    let x = model.get("d.x").unwrap();
    assert_eq!(x.min_occurs, 0);
    assert_eq!(x.schema_pointer, "#/definitions/Base/properties/x");

    let before = snapshot(&generator);
    assert_eq!(
        generator.expand_path("d").unwrap_err(),
        EditError::PathAlreadyExpanded {
            path: "d".to_string()
        }
    );
    assert_eq!(snapshot(&generator), before);
}

#[test]
fn test_expand_adding_nothing_is_not_expandable() {
    let mut generator = InstanceModelGenerator::new(
        &inherited_schema(),
        "org",
        "service",
        GenerateOptions::default(),
    )
    .unwrap();
    let before = snapshot(&generator);
    assert_eq!(
        generator.expand_path("e").unwrap_err(),
        EditError::PathNotExpandable {
            path: "e".to_string(),
            reason: "its type has no members left to expand"
        }
    );
    assert_eq!(snapshot(&generator), before);
}
