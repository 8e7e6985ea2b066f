use std::fmt;
use std::path::PathBuf;

use serde_json::Value;

use crate::schema::ObjectType;

/// Errors raised while loading schemas or generating code for a resource type.
///
/// Every variant aborts generation for the affected type only; nothing is
/// written for it.
#[derive(Debug)]
pub enum GeneratorError {
    /// A property (or the whole document) does not have a shape the generator
    /// understands.
    SchemaShape {
        resource: ObjectType,
        /// `None` when the document itself has no property set
        property: Option<String>,
        /// The offending JSON, dumped to the operator
        raw: Value,
    },
    /// No schema document exists for the type in the schema directory.
    SchemaNotFound { resource: ObjectType, path: PathBuf },
    /// A schema document exists but could not be parsed.
    Parse { path: PathBuf, message: String },
    /// Fetching the schema from the live API failed.
    Fetch { resource: ObjectType, message: String },
    /// The generator only overwrites existing files; the target is missing.
    OutputTargetMissing { resource: ObjectType, path: PathBuf },
    Render(askama::Error),
    Io(std::io::Error),
}

impl fmt::Display for GeneratorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GeneratorError::SchemaShape {
                resource,
                property: Some(property),
                raw,
            } => write!(
                f,
                "could not resolve type of property '{property}' on {resource}: {}",
                serde_json::to_string_pretty(raw).unwrap_or_default()
            ),
            GeneratorError::SchemaShape {
                resource,
                property: None,
                raw,
            } => write!(
                f,
                "schema for {resource} has no property set: {}",
                serde_json::to_string_pretty(raw).unwrap_or_default()
            ),
            GeneratorError::SchemaNotFound { resource, path } => {
                write!(f, "no schema document for {resource} at {}", path.display())
            }
            GeneratorError::Parse { path, message } => {
                write!(f, "failed to parse schema {}: {message}", path.display())
            }
            GeneratorError::Fetch { resource, message } => {
                write!(f, "failed to fetch schema for {resource}: {message}")
            }
            GeneratorError::OutputTargetMissing { resource, path } => write!(
                f,
                "could not find file {} for {resource} (generation only overwrites existing files)",
                path.display()
            ),
            GeneratorError::Render(e) => write!(f, "template rendering failed: {e}"),
            GeneratorError::Io(e) => write!(f, "i/o error: {e}"),
        }
    }
}

impl std::error::Error for GeneratorError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            GeneratorError::Render(e) => Some(e),
            GeneratorError::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for GeneratorError {
    fn from(e: std::io::Error) -> Self {
        GeneratorError::Io(e)
    }
}

impl From<askama::Error> for GeneratorError {
    fn from(e: askama::Error) -> Self {
        GeneratorError::Render(e)
    }
}
