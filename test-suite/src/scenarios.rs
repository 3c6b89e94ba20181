use std::fmt;

use serde_json::Value;
use similar::{ChangeTag, TextDiff};
use xsdform::ErrorKind;

use crate::case::Case;

pub trait Scenario {
    fn name(&self) -> &'static str;
    fn run(&self) -> Result<(), ScenarioError>;
}

/// Error type for scenario execution failures.
#[derive(Debug, Clone)]
pub enum ScenarioError {
    /// An expected output file is not valid JSON
    JsonParseError { file: &'static str, message: String },
    /// The pipeline failed where it should have succeeded
    UnexpectedError { kind: ErrorKind, message: String },
    /// Compiled JSON Schema differs from the expected one
    SchemaMismatch { expected: String, actual: String },
    /// Instance model differs from the expected one
    InstanceModelMismatch { expected: String, actual: String },
    /// The pipeline succeeded but should have failed
    ExpectedError { expected: String },
    /// The pipeline failed with another kind of error
    ErrorKindMismatch {
        expected: String,
        actual: ErrorKind,
        message: String,
    },
}

impl From<xsdform::Error> for ScenarioError {
    fn from(error: xsdform::Error) -> Self {
        ScenarioError::UnexpectedError {
            kind: error.kind(),
            message: error.to_string(),
        }
    }
}

fn write_diff(f: &mut fmt::Formatter<'_>, expected: &str, actual: &str) -> fmt::Result {
    let diff = TextDiff::from_lines(expected, actual);
    for change in diff.iter_all_changes() {
        let sign = match change.tag() {
            ChangeTag::Delete => "-",
            ChangeTag::Insert => "+",
            ChangeTag::Equal => " ",
        };
        write!(f, "{sign}{change}")?;
    }
    Ok(())
}

impl fmt::Display for ScenarioError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScenarioError::JsonParseError { file, message } => {
                write!(f, "{file} is not valid JSON: {message}")
            }
            ScenarioError::UnexpectedError { kind, message } => {
                write!(f, "unexpected {kind} error: {message}")
            }
            ScenarioError::SchemaMismatch { expected, actual } => {
                writeln!(f, "JSON Schema mismatch (- expected, + actual):")?;
                write_diff(f, expected, actual)
            }
            ScenarioError::InstanceModelMismatch { expected, actual } => {
                writeln!(f, "Instance model mismatch (- expected, + actual):")?;
                write_diff(f, expected, actual)
            }
            ScenarioError::ExpectedError { expected } => {
                write!(f, "expected a {expected} error, but the pipeline succeeded")
            }
            ScenarioError::ErrorKindMismatch {
                expected,
                actual,
                message,
            } => write!(f, "expected a {expected} error, got {actual}: {message}"),
        }
    }
}

fn parse_expected(file: &'static str, text: &str) -> Result<Value, ScenarioError> {
    serde_json::from_str(text).map_err(|e| ScenarioError::JsonParseError {
        file,
        message: e.to_string(),
    })
}

fn pretty(value: &Value) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|e| format!("<unserializable: {e}>"))
}

/// The compiled schema equals `output.schema.json`.
pub struct CompileScenario<'a> {
    pub case: &'a Case,
    pub expected: &'a str,
}

impl Scenario for CompileScenario<'_> {
    fn name(&self) -> &'static str {
        "xsd -> json schema"
    }

    fn run(&self) -> Result<(), ScenarioError> {
        let expected = parse_expected(crate::case::SCHEMA_FILE, self.expected)?;
        let schema = self.case.compile()?;
        let actual = serde_json::to_value(&schema).map_err(|e| ScenarioError::JsonParseError {
            file: crate::case::SCHEMA_FILE,
            message: e.to_string(),
        })?;
        if actual != expected {
            return Err(ScenarioError::SchemaMismatch {
                expected: pretty(&expected),
                actual: pretty(&actual),
            });
        }
        Ok(())
    }
}

/// The instance model, after edits, equals `output.instance-model.json`.
pub struct InstanceModelScenario<'a> {
    pub case: &'a Case,
    pub expected: &'a str,
}

impl Scenario for InstanceModelScenario<'_> {
    fn name(&self) -> &'static str {
        "json schema -> instance model"
    }

    fn run(&self) -> Result<(), ScenarioError> {
        let expected = parse_expected(crate::case::INSTANCE_MODEL_FILE, self.expected)?;
        let schema = self.case.compile()?;
        let model = self.case.instance_model(&schema)?;
        let actual = serde_json::to_value(&model).map_err(|e| ScenarioError::JsonParseError {
            file: crate::case::INSTANCE_MODEL_FILE,
            message: e.to_string(),
        })?;
        // element order is part of the model
        let same_order = actual["elements"]
            .as_object()
            .zip(expected["elements"].as_object())
            .is_none_or(|(actual, expected)| actual.keys().eq(expected.keys()));
        if actual != expected || !same_order {
            return Err(ScenarioError::InstanceModelMismatch {
                expected: pretty(&expected),
                actual: pretty(&actual),
            });
        }
        Ok(())
    }
}

/// The pipeline fails with the kind named in `error.txt`.
pub struct ExpectedErrorScenario<'a> {
    pub case: &'a Case,
    pub expected: &'a str,
}

impl Scenario for ExpectedErrorScenario<'_> {
    fn name(&self) -> &'static str {
        "expected error"
    }

    fn run(&self) -> Result<(), ScenarioError> {
        let result = self
            .case
            .compile()
            .and_then(|schema| self.case.instance_model(&schema));
        match result {
            Ok(_) => Err(ScenarioError::ExpectedError {
                expected: self.expected.to_string(),
            }),
            Err(error) if error.kind().as_str() == self.expected => Ok(()),
            Err(error) => Err(ScenarioError::ErrorKindMismatch {
                expected: self.expected.to_string(),
                actual: error.kind(),
                message: error.to_string(),
            }),
        }
    }
}
