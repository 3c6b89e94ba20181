/// Inputs the generator cannot build a model from.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StructuralError {
    #[error("cannot read top level object: the schema has no properties")]
    MissingProperties,

    #[error("path `{path}` is produced more than once")]
    DuplicatePath { path: String },

    #[error("property name `{name}` is empty once sanitized")]
    EmptyName { name: String, pointer: String },
}

/// Errors that can occur while generating an instance model
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GenerateError {
    #[error(transparent)]
    Structural(#[from] StructuralError),
}

impl GenerateError {
    /// Path or schema pointer the error refers to.
    pub fn location(&self) -> Option<&str> {
        match self {
            GenerateError::Structural(StructuralError::MissingProperties) => Some("#/properties"),
            GenerateError::Structural(StructuralError::DuplicatePath { path }) => Some(path),
            GenerateError::Structural(StructuralError::EmptyName { pointer, .. }) => Some(pointer),
        }
    }
}

/// Errors from [`expand_path`](crate::InstanceModelGenerator::expand_path) and
/// [`remove_path`](crate::InstanceModelGenerator::remove_path).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EditError {
    #[error("path `{path}` does not exist in the instance model")]
    PathNotFound { path: String },

    #[error("path `{path}` cannot be expanded: {reason}")]
    PathNotExpandable { path: String, reason: &'static str },

    #[error("path `{path}` is already expanded")]
    PathAlreadyExpanded { path: String },

    #[error("nothing to remove: path `{path}` has no descendants")]
    NothingToRemove { path: String },

    #[error(transparent)]
    Generate(#[from] GenerateError),
}

impl EditError {
    pub fn location(&self) -> Option<&str> {
        match self {
            EditError::PathNotFound { path }
            | EditError::PathNotExpandable { path, .. }
            | EditError::PathAlreadyExpanded { path }
            | EditError::NothingToRemove { path } => Some(path),
            EditError::Generate(err) => err.location(),
        }
    }
}
