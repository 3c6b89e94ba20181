//! File-based test cases for the xsdform pipeline.
//!
//! Each directory below `cases/` holding an `input.xsd` is one case. Sibling
//! files name what to check:
//!
//! - `output.schema.json`: the compiled JSON Schema
//! - `output.instance-model.json`: the instance model after `edits.txt`
//! - `edits.txt`: `policy <name>`, `expand <path>` or `remove <path>`, one per line
//! - `error.txt`: the error kind the pipeline must fail with

use std::fs;
use std::path::{Path, PathBuf};

pub mod case;
pub mod scenarios;

pub use case::{Case, CaseResult, Edit};
pub use scenarios::{Scenario, ScenarioError};

/// Directory holding the case directories.
pub fn cases_dir() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("cases")
}

#[derive(Debug, thiserror::Error)]
pub enum CollectCasesError {
    #[error("failed to read {}: {error}", path.display())]
    IoError {
        path: PathBuf,
        error: std::io::Error,
    },
    #[error("invalid case {}: {message}", path.display())]
    ParseError { path: PathBuf, message: String },
}

/// Load every case below `cases_dir()`, sorted by directory.
pub fn collect_cases() -> Vec<Result<Case, CollectCasesError>> {
    let base = cases_dir();
    let mut dirs = Vec::new();
    let mut errors = Vec::new();
    walk_directory(&base, &mut dirs, &mut errors);
    dirs.sort();
    dirs.into_iter()
        .map(|dir| Case::load(&base, &dir))
        .chain(errors.into_iter().map(Err))
        .collect()
}

fn walk_directory(dir: &Path, dirs: &mut Vec<PathBuf>, errors: &mut Vec<CollectCasesError>) {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(error) => {
            errors.push(CollectCasesError::IoError {
                path: dir.to_path_buf(),
                error,
            });
            return;
        }
    };
    if dir.join(case::INPUT_FILE).is_file() {
        dirs.push(dir.to_path_buf());
    }
    for entry in entries.flatten() {
        let path = entry.path();
        if path.is_dir() {
            walk_directory(&path, dirs, errors);
        }
    }
}

/// Summary of a whole run.
#[derive(Debug, Default)]
pub struct TestResults {
    pub total: usize,
    pub passed: usize,
    pub failures: Vec<TestFailure>,
}

impl TestResults {
    pub fn add_pass(&mut self) {
        self.total += 1;
        self.passed += 1;
    }

    pub fn add_failure(&mut self, failure: TestFailure) {
        self.total += 1;
        self.failures.push(failure);
    }

    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }
}

#[derive(Debug, Clone)]
pub struct TestFailure {
    pub test_name: String,
    pub error: String,
}

impl TestFailure {
    pub fn new(test_name: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            test_name: test_name.into(),
            error: error.into(),
        }
    }
}

/// Run every case, one result entry per scenario.
pub fn run_all() -> TestResults {
    let mut results = TestResults::default();
    for case in collect_cases() {
        match case {
            Ok(case) => {
                for (scenario, result) in case.run().scenarios {
                    match result {
                        Ok(()) => results.add_pass(),
                        Err(e) => results.add_failure(TestFailure::new(
                            format!("{} ({scenario})", case.name),
                            e.to_string(),
                        )),
                    }
                }
            }
            Err(e) => results.add_failure(TestFailure::new("<collect>", e.to_string())),
        }
    }
    results
}
