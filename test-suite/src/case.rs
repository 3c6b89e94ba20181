use std::fs;
use std::path::{Path, PathBuf};

use xsdform::{
    CompileOptions, Error, ExpansionPolicy, GenerateOptions, InstanceModel, Schema, compile_str,
    generate_instance_model,
};

use crate::CollectCasesError;
use crate::scenarios::{
    CompileScenario, ExpectedErrorScenario, InstanceModelScenario, Scenario, ScenarioError,
};

pub const INPUT_FILE: &str = "input.xsd";
pub const SCHEMA_FILE: &str = "output.schema.json";
pub const INSTANCE_MODEL_FILE: &str = "output.instance-model.json";
pub const EDITS_FILE: &str = "edits.txt";
pub const ERROR_FILE: &str = "error.txt";

/// Organisation and service every case generates its model for.
pub const ORG: &str = "org";
pub const SERVICE: &str = "service";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Edit {
    Policy(ExpansionPolicy),
    Expand(String),
    Remove(String),
}

/// Parse `edits.txt`. Blank lines and lines starting with `#` are skipped.
pub fn parse_edits(text: &str) -> Result<Vec<Edit>, String> {
    let mut edits = Vec::new();
    for (index, line) in text.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let (command, argument) = line
            .split_once(char::is_whitespace)
            .map(|(command, argument)| (command, argument.trim()))
            .ok_or_else(|| format!("line {}: expected `<command> <argument>`", index + 1))?;
        let edit = match command {
            "policy" => Edit::Policy(
                argument
                    .parse()
                    .map_err(|e| format!("line {}: {e}", index + 1))?,
            ),
            "expand" => Edit::Expand(argument.to_string()),
            "remove" => Edit::Remove(argument.to_string()),
            other => return Err(format!("line {}: unknown command `{other}`", index + 1)),
        };
        edits.push(edit);
    }
    Ok(edits)
}

#[derive(Debug, Clone)]
pub struct Case {
    /// Directory relative to the cases root, e.g. `compile/person`.
    pub name: String,
    pub dir: PathBuf,
    pub input: String,
    pub edits: Vec<Edit>,
    pub expected_schema: Option<String>,
    pub expected_instance_model: Option<String>,
    pub expected_error: Option<String>,
}

/// Outcome of every scenario a case ran.
#[derive(Debug)]
pub struct CaseResult {
    pub scenarios: Vec<(&'static str, Result<(), ScenarioError>)>,
}

impl CaseResult {
    pub fn is_success(&self) -> bool {
        self.scenarios.iter().all(|(_, result)| result.is_ok())
    }
}

fn read_optional(path: &Path) -> Result<Option<String>, CollectCasesError> {
    match fs::read_to_string(path) {
        Ok(text) => Ok(Some(text)),
        Err(error) if error.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(error) => Err(CollectCasesError::IoError {
            path: path.to_path_buf(),
            error,
        }),
    }
}

impl Case {
    pub fn load(base: &Path, dir: &Path) -> Result<Self, CollectCasesError> {
        let input_path = dir.join(INPUT_FILE);
        let input = fs::read_to_string(&input_path).map_err(|error| CollectCasesError::IoError {
            path: input_path,
            error,
        })?;
        let edits = match read_optional(&dir.join(EDITS_FILE))? {
            Some(text) => parse_edits(&text).map_err(|message| CollectCasesError::ParseError {
                path: dir.join(EDITS_FILE),
                message,
            })?,
            None => Vec::new(),
        };
        let case = Case {
            name: dir
                .strip_prefix(base)
                .unwrap_or(dir)
                .display()
                .to_string(),
            dir: dir.to_path_buf(),
            input,
            edits,
            expected_schema: read_optional(&dir.join(SCHEMA_FILE))?,
            expected_instance_model: read_optional(&dir.join(INSTANCE_MODEL_FILE))?,
            expected_error: read_optional(&dir.join(ERROR_FILE))?
                .map(|text| text.trim().to_string()),
        };
        if case.expected_error.is_some()
            && (case.expected_schema.is_some() || case.expected_instance_model.is_some())
        {
            return Err(CollectCasesError::ParseError {
                path: dir.to_path_buf(),
                message: format!("{ERROR_FILE} cannot be combined with expected outputs"),
            });
        }
        Ok(case)
    }

    pub fn compile(&self) -> Result<Schema, Error> {
        compile_str(&self.input, &CompileOptions::default())
    }

    /// Generate the instance model of `schema` and apply the case's edits.
    pub fn instance_model(&self, schema: &Schema) -> Result<InstanceModel, Error> {
        let policy = self
            .edits
            .iter()
            .rev()
            .find_map(|edit| match edit {
                Edit::Policy(policy) => Some(*policy),
                _ => None,
            })
            .unwrap_or_default();
        let mut generator =
            generate_instance_model(schema, ORG, SERVICE, GenerateOptions { policy })?;
        for edit in &self.edits {
            match edit {
                Edit::Policy(_) => {}
                Edit::Expand(path) => {
                    generator.expand_path(path)?;
                }
                Edit::Remove(path) => {
                    generator.remove_path(path)?;
                }
            }
        }
        Ok(generator.into_model())
    }

    pub fn run(&self) -> CaseResult {
        let mut scenarios = Vec::new();
        if let Some(expected) = &self.expected_error {
            let scenario = ExpectedErrorScenario {
                case: self,
                expected,
            };
            scenarios.push((scenario.name(), scenario.run()));
        }
        if let Some(expected) = &self.expected_schema {
            let scenario = CompileScenario {
                case: self,
                expected,
            };
            scenarios.push((scenario.name(), scenario.run()));
        }
        if let Some(expected) = &self.expected_instance_model {
            let scenario = InstanceModelScenario {
                case: self,
                expected,
            };
            scenarios.push((scenario.name(), scenario.run()));
        }
        CaseResult { scenarios }
    }
}
