//! Error types for permutation generation.

use std::path::{Path, PathBuf};

use crate::requirement::Span;

/// Failure to parse or resolve a single requirement expression.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RequirementError {
    /// The expression does not follow the requirement grammar
    #[error("{message} at {span}")]
    Syntax { message: String, span: Span },

    /// The expression names an axis the option space doesn't declare
    #[error("unknown axis `{name}` at {span}")]
    UnknownAxis { name: String, span: Span },
}

impl RequirementError {
    pub(crate) fn syntax(message: impl Into<String>, span: Span) -> Self {
        RequirementError::Syntax {
            message: message.into(),
            span,
        }
    }

    /// Source location of the offending tokens.
    pub fn span(&self) -> Span {
        match self {
            RequirementError::Syntax { span, .. } | RequirementError::UnknownAxis { span, .. } => {
                *span
            }
        }
    }
}

/// What is wrong with a template configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigErrorKind {
    /// Malformed JSON, a missing key, or a value of the wrong type
    #[error("malformed config: {0}")]
    Json(#[from] serde_json::Error),

    /// `options` is an empty object
    #[error("`options` must declare at least one axis")]
    NoAxes,

    /// Axis names are bound in requirements and spliced into `OPTION_<name>`
    #[error("axis name `{0}` must be an identifier and not a reserved word")]
    InvalidAxisName(String),

    /// Values are spliced into file names and `#define` lines
    #[error(
        "axis `{axis}` has invalid value `{value}` (values must be non-empty, without whitespace or path separators)"
    )]
    InvalidValue { axis: String, value: String },

    #[error("axis `{axis}` lists value `{value}` more than once")]
    DuplicateValue { axis: String, value: String },

    /// Two surviving permutations would be written to the same file
    #[error("permutations {first} and {second} both produce `{file}`")]
    OutputCollision {
        file: String,
        first: String,
        second: String,
    },

    /// A requirement failed to parse or references an undefined axis
    #[error("invalid requirement `{expression}`: {source}")]
    Requirement {
        expression: String,
        #[source]
        source: RequirementError,
    },
}

/// A template configuration that can't be used, attributed to its file.
#[derive(Debug, thiserror::Error)]
#[error("configuration error in {}: {kind}", path.display())]
pub struct ConfigurationError {
    pub path: PathBuf,
    pub kind: ConfigErrorKind,
}

impl ConfigurationError {
    pub fn new(path: impl Into<PathBuf>, kind: impl Into<ConfigErrorKind>) -> Self {
        Self {
            path: path.into(),
            kind: kind.into(),
        }
    }
}

/// Top-level error for a generation or check run.
#[derive(Debug, thiserror::Error)]
pub enum GenError {
    #[error(transparent)]
    Config(#[from] ConfigurationError),

    /// Filesystem failure; always fatal
    #[error("I/O error at {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Directory traversal failure
    #[error("failed to walk {}: {source}", root.display())]
    Walk {
        root: PathBuf,
        #[source]
        source: walkdir::Error,
    },
}

impl GenError {
    /// Adapter for `map_err` that attaches the path being accessed.
    pub(crate) fn io(path: &Path) -> impl FnOnce(std::io::Error) -> GenError {
        move |source| GenError::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}
