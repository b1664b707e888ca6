//! Error types for loading registry definitions.
//!
//! Covers every way a definition file can fail to become a registry: I/O,
//! syntax, field-level conversion, and structural validation.

use command_router_core::DefinitionError;
use thiserror::Error;

/// Errors that can occur while loading or reloading a registry.
#[derive(Debug, Error)]
pub enum LoadError {
    /// File I/O failure.
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// JSON parsing failure.
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// YAML parsing failure.
    #[error("YAML error: {0}")]
    YamlError(#[from] serde_yaml::Error),

    /// The file extension is neither YAML nor JSON.
    #[error("unsupported definition format: {0}")]
    UnsupportedFormat(String),

    /// An argument's `pattern` is not a valid regular expression.
    #[error("invalid pattern for '{name}' in '{command}': {source}")]
    InvalidPattern {
        command: String,
        name: String,
        #[source]
        source: regex::Error,
    },

    /// An argument's `default` cannot be converted to its kind.
    #[error("invalid default for '{name}' in '{command}': {reason}")]
    InvalidDefault {
        command: String,
        name: String,
        reason: String,
    },

    /// The command tree failed structural validation.
    #[error("invalid definition: {}", join_errors(.0))]
    InvalidDefinition(Vec<DefinitionError>),
}

impl From<Vec<DefinitionError>> for LoadError {
    fn from(errors: Vec<DefinitionError>) -> Self {
        LoadError::InvalidDefinition(errors)
    }
}

fn join_errors(errors: &[DefinitionError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Convenience alias for results with [`LoadError`].
pub type Result<T> = std::result::Result<T, LoadError>;
