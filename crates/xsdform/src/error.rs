use std::fmt;
use std::ops::Range;

use xsdform_compiler::CompileError;
use xsdform_config::ConfigError;
use xsdform_instance_model::{EditError, GenerateError};
use xsdform_xsd::{ReadError, XsdSchema};

/// Category of an [`Error`], stable across message wording.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Read,
    Structural,
    Naming,
    DuplicateDefinition,
    UnsupportedConstruct,
    UnresolvedReference,
    InvalidFacet,
    PathNotFound,
    PathNotExpandable,
    PathAlreadyExpanded,
    NothingToRemove,
    Config,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::Read => "Read",
            ErrorKind::Structural => "Structural",
            ErrorKind::Naming => "Naming",
            ErrorKind::DuplicateDefinition => "DuplicateDefinition",
            ErrorKind::UnsupportedConstruct => "UnsupportedConstruct",
            ErrorKind::UnresolvedReference => "UnresolvedReference",
            ErrorKind::InvalidFacet => "InvalidFacet",
            ErrorKind::PathNotFound => "PathNotFound",
            ErrorKind::PathNotExpandable => "PathNotExpandable",
            ErrorKind::PathAlreadyExpanded => "PathAlreadyExpanded",
            ErrorKind::NothingToRemove => "NothingToRemove",
            ErrorKind::Config => "Config",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Any failure of the xsdform pipeline.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Read(#[from] ReadError),

    /// Compilation failed; `span` locates the offending node in the XSD text.
    #[error("{error}")]
    Compile {
        #[source]
        error: CompileError,
        span: Option<Range<usize>>,
    },

    #[error(transparent)]
    Generate(#[from] GenerateError),

    #[error(transparent)]
    Edit(#[from] EditError),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl Error {
    /// Attach the source span of `error` while the schema it refers to is at hand.
    pub fn compile(error: CompileError, xsd: &XsdSchema) -> Self {
        let span = error.span(xsd);
        Error::Compile { error, span }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Read(ReadError::Unsupported { .. }) => ErrorKind::UnsupportedConstruct,
            Error::Read(_) => ErrorKind::Read,
            Error::Compile { error, .. } => match error {
                CompileError::Naming { .. } => ErrorKind::Naming,
                CompileError::DuplicateDefinition { .. } => ErrorKind::DuplicateDefinition,
                CompileError::UnsupportedConstruct { .. } => ErrorKind::UnsupportedConstruct,
                CompileError::UnresolvedReference { .. } => ErrorKind::UnresolvedReference,
                CompileError::InvalidFacet { .. } => ErrorKind::InvalidFacet,
            },
            Error::Generate(GenerateError::Structural(_)) => ErrorKind::Structural,
            Error::Edit(error) => match error {
                EditError::PathNotFound { .. } => ErrorKind::PathNotFound,
                EditError::PathNotExpandable { .. } => ErrorKind::PathNotExpandable,
                EditError::PathAlreadyExpanded { .. } => ErrorKind::PathAlreadyExpanded,
                EditError::NothingToRemove { .. } => ErrorKind::NothingToRemove,
                EditError::Generate(GenerateError::Structural(_)) => ErrorKind::Structural,
            },
            Error::Config(_) => ErrorKind::Config,
        }
    }

    /// Byte range in the XSD text, for errors raised while reading or compiling.
    pub fn span(&self) -> Option<Range<usize>> {
        match self {
            Error::Read(error) => error.span(),
            Error::Compile { span, .. } => span.clone(),
            _ => None,
        }
    }

    /// Instance-model path or schema pointer the error refers to.
    pub fn location(&self) -> Option<&str> {
        match self {
            Error::Generate(error) => error.location(),
            Error::Edit(error) => error.location(),
            _ => None,
        }
    }
}
