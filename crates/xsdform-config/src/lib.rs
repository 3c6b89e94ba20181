//! Configuration types for xsdform tools.
//!
//! The configuration is stored in `Xsdform.toml` files at project roots and
//! found by searching upward from the working directory.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use xsdform_instance_model::ExpansionPolicy;

/// The standard configuration filename.
pub const CONFIG_FILENAME: &str = "Xsdform.toml";

/// Error type for configuration loading.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Parse error: {0}")]
    Parse(String),
    #[error("Invalid glob `{pattern}`: {message}")]
    Glob { pattern: String, message: String },
}

impl From<toml::de::Error> for ConfigError {
    fn from(err: toml::de::Error) -> Self {
        ConfigError::Parse(err.to_string())
    }
}

/// A check target definition.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Target {
    /// Glob patterns for XSD files to include in this target.
    pub globs: Vec<String>,
}

impl Target {
    /// Files matched by this target's globs, relative to `base_dir`, sorted
    /// and without duplicates.
    pub fn files(&self, base_dir: &Path) -> Result<Vec<PathBuf>, ConfigError> {
        let mut files = Vec::new();
        for pattern in &self.globs {
            let full = base_dir.join(pattern);
            let glob_error = |message: String| ConfigError::Glob {
                pattern: pattern.clone(),
                message,
            };
            let paths = glob::glob(&full.to_string_lossy()).map_err(|e| glob_error(e.to_string()))?;
            for path in paths {
                files.push(path.map_err(|e| glob_error(e.to_string()))?);
            }
        }
        files.sort();
        files.dedup();
        Ok(files)
    }
}

/// Settings for `xsdform compile`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct CompileConfig {
    /// `$id` of compiled schemas.
    pub schema_id: Option<String>,
    /// Pretty-print JSON output.
    #[serde(default)]
    pub pretty: bool,
}

/// Settings for `xsdform instance-model`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct InstanceModelConfig {
    pub org: Option<String>,
    pub service: Option<String>,
    pub expansion_policy: Option<ExpansionPolicy>,
}

/// The main xsdform configuration.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct XsdformConfig {
    #[serde(default)]
    pub compile: CompileConfig,

    #[serde(default)]
    pub instance_model: InstanceModelConfig,

    /// Check targets (name -> target definition).
    #[serde(default)]
    pub targets: BTreeMap<String, Target>,
}

impl XsdformConfig {
    /// Load configuration from a file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::parse_str(&content)
    }

    /// Parse configuration from a string.
    pub fn parse_str(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    /// Find the configuration file by searching upward from the given directory.
    pub fn find_config_file(start_dir: &Path) -> Option<PathBuf> {
        let mut current = start_dir.to_path_buf();
        loop {
            let config_path = current.join(CONFIG_FILENAME);
            if config_path.exists() {
                return Some(config_path);
            }
            if !current.pop() {
                return None;
            }
        }
    }

    /// Load configuration by searching upward from the given directory.
    pub fn load_from_dir(start_dir: &Path) -> Result<Option<(PathBuf, Self)>, ConfigError> {
        if let Some(config_path) = Self::find_config_file(start_dir) {
            let config = Self::load(&config_path)?;
            Ok(Some((config_path, config)))
        } else {
            Ok(None)
        }
    }

    /// Get a target by name.
    pub fn get_target(&self, name: &str) -> Option<&Target> {
        self.targets.get(name)
    }

    /// Get all target names.
    pub fn target_names(&self) -> impl Iterator<Item = &str> {
        self.targets.keys().map(|s| s.as_str())
    }
}
