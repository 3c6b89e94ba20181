//! XML Schema document model for xsdform.
//!
//! [`read_xsd`] turns XSD text into an [`XsdSchema`]: an arena of schema
//! components addressed by [`NodeId`], each carrying its parent link and
//! source span. Components are a closed [`XsdNodeKind`] enum so consumers can
//! dispatch exhaustively.

mod error;
mod model;
mod reader;

pub use error::ReadError;
pub use model::*;
pub use reader::{MAX_XSD_SIZE, read_xsd};
