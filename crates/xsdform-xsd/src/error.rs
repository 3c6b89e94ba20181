use std::ops::Range;

/// Errors raised while reading XSD text into an [`XsdSchema`](crate::XsdSchema).
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ReadError {
    #[error("XSD document too large: {size} bytes (max {max} bytes)")]
    TooLarge { size: usize, max: usize },

    #[error("malformed XML: {0}")]
    Xml(#[from] roxmltree::Error),

    #[error("root element must be xs:schema")]
    NotASchema,

    #[error("unknown namespace prefix `{prefix}` in `{value}`")]
    UnknownPrefix {
        prefix: String,
        value: String,
        span: Range<usize>,
    },

    #[error("invalid value `{value}` for attribute `{attribute}`")]
    InvalidAttribute {
        attribute: &'static str,
        value: String,
        span: Range<usize>,
    },

    #[error("xs:{element} requires attribute `{attribute}`")]
    MissingAttribute {
        element: String,
        attribute: &'static str,
        span: Range<usize>,
    },

    #[error("xs:{element} requires a child xs:{child}")]
    MissingChild {
        element: String,
        child: &'static str,
        span: Range<usize>,
    },

    #[error("unexpected xs:{child} inside xs:{parent}")]
    UnexpectedChild {
        child: String,
        parent: String,
        span: Range<usize>,
    },

    #[error("unsupported XSD construct: {construct}")]
    Unsupported {
        construct: String,
        span: Range<usize>,
    },
}

impl ReadError {
    /// Byte range in the source text the error points at, if known.
    pub fn span(&self) -> Option<Range<usize>> {
        match self {
            ReadError::TooLarge { .. } | ReadError::Xml(_) | ReadError::NotASchema => None,
            ReadError::UnknownPrefix { span, .. }
            | ReadError::InvalidAttribute { span, .. }
            | ReadError::MissingAttribute { span, .. }
            | ReadError::MissingChild { span, .. }
            | ReadError::UnexpectedChild { span, .. }
            | ReadError::Unsupported { span, .. } => Some(span.clone()),
        }
    }
}
