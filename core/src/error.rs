//! Error types for the parsing pipeline.
//!
//! Every expected failure is a value: the tokenizer returns [`ParseError`],
//! the argument parser returns [`ArgumentError`], and the full pipeline
//! wraps both in [`CommandError`], which also covers the routing outcomes
//! that a caller usually wants to surface ("unknown command", "subcommand
//! required").

use std::fmt;

use serde::Serialize;
use thiserror::Error;

/// Which kind of quote was left open at end of input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum QuoteKind {
    Single,
    Double,
}

impl fmt::Display for QuoteKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QuoteKind::Single => f.write_str("single"),
            QuoteKind::Double => f.write_str("double"),
        }
    }
}

/// Tokenizer failures.
///
/// Each size guard has its own variant so callers can tell which limit was
/// hit.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    /// End of input reached inside a quoted span.
    #[error("unclosed {0} quote")]
    UnclosedQuote(QuoteKind),
    /// The raw command string is longer than the input limit.
    #[error("command is too long: {length} characters (maximum {max})")]
    InputTooLong { length: usize, max: usize },
    /// A single token is longer than the token limit.
    #[error("token is too long: {length} characters (maximum {max})")]
    TokenTooLong { length: usize, max: usize },
    /// The command produced more tokens than allowed.
    #[error("too many tokens (maximum {max})")]
    TooManyTokens { max: usize },
    /// Strict mode only: an unquoted shell metacharacter was found.
    #[error("shell metacharacter '{0}' is not allowed in strict mode")]
    ForbiddenCharacter(char),
}

/// A rejected argument set.
///
/// `path` names the offending field (dotted for array elements, e.g.
/// `tag.1`), and `hint` carries an actionable suggestion when a required
/// value was missing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Error)]
#[error("{}{}", path_prefix(.path), .message)]
pub struct ArgumentError {
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
}

impl ArgumentError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            path: None,
            hint: None,
        }
    }

    pub fn at(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }

    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }
}

fn path_prefix(path: &Option<String>) -> String {
    path.as_ref().map(|path| format!("{path}: ")).unwrap_or_default()
}

/// Errors produced by [`CommandRegistry::resolve`](crate::CommandRegistry::resolve).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CommandError {
    /// The command string could not be tokenized.
    #[error("parse error: {0}")]
    Parse(#[from] ParseError),
    /// The argument tokens were rejected by the command's schema.
    #[error("validation error: {0}")]
    Validation(#[from] ArgumentError),
    /// The input contained no tokens at all.
    #[error("no command given")]
    EmptyCommand { available: Vec<String> },
    /// No node matched; `name` is the full unmatched command text.
    #[error("unknown command: {name}")]
    CommandNotFound { name: String, available: Vec<String> },
    /// A group node without a handler was reached exactly.
    #[error("'{path}' requires a subcommand")]
    SubcommandRequired { path: String, available: Vec<String> },
}

impl CommandError {
    /// Stable wire code for this error.
    pub fn code(&self) -> &'static str {
        match self {
            CommandError::Parse(_) => "PARSE_ERROR",
            CommandError::Validation(_) => "VALIDATION_ERROR",
            CommandError::EmptyCommand { .. } | CommandError::CommandNotFound { .. } => {
                "COMMAND_NOT_FOUND"
            }
            CommandError::SubcommandRequired { .. } => "SUBCOMMAND_REQUIRED",
        }
    }

    /// Field path of a validation failure.
    pub fn path(&self) -> Option<&str> {
        match self {
            CommandError::Validation(err) => err.path.as_deref(),
            _ => None,
        }
    }

    /// Actionable suggestion, if one exists.
    pub fn hint(&self) -> Option<String> {
        match self {
            CommandError::Validation(err) => err.hint.clone(),
            CommandError::EmptyCommand { available }
            | CommandError::CommandNotFound { available, .. } => available_hint(available),
            CommandError::SubcommandRequired { available, .. } => available_hint(available),
            CommandError::Parse(_) => None,
        }
    }

    /// Flattens the error into a serializable record.
    pub fn to_record(&self) -> ErrorRecord {
        let message = match self {
            CommandError::Parse(err) => err.to_string(),
            CommandError::Validation(err) => err.message.clone(),
            other => other.to_string(),
        };
        ErrorRecord {
            code: self.code(),
            message,
            path: self.path().map(String::from),
            hint: self.hint(),
        }
    }
}

fn available_hint(available: &[String]) -> Option<String> {
    if available.is_empty() {
        None
    } else {
        Some(format!("available: {}", available.join(", ")))
    }
}

/// Machine-readable form of a [`CommandError`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorRecord {
    pub code: &'static str,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_argument_error_display_includes_path() {
        let err = ArgumentError::new("must be at most 10").at("limit");
        assert_eq!(err.to_string(), "limit: must be at most 10");
        assert_eq!(ArgumentError::new("boom").to_string(), "boom");
    }

    #[test]
    fn test_argument_error_is_std_error() {
        let err: Box<dyn std::error::Error> =
            Box::new(ArgumentError::new("expected a number").at("tag.1"));
        assert_eq!(err.to_string(), "tag.1: expected a number");

        let wrapped = CommandError::from(ArgumentError::new("unknown option: -x"));
        assert_eq!(wrapped.to_string(), "validation error: unknown option: -x");
    }

    #[test]
    fn test_command_error_codes() {
        let parse = CommandError::from(ParseError::UnclosedQuote(QuoteKind::Double));
        assert_eq!(parse.code(), "PARSE_ERROR");
        assert_eq!(parse.to_string(), "parse error: unclosed double quote");

        let validation = CommandError::from(ArgumentError::new("unknown option: --x"));
        assert_eq!(validation.code(), "VALIDATION_ERROR");

        let missing = CommandError::SubcommandRequired {
            path: "remote".into(),
            available: vec!["remote add".into(), "remote remove".into()],
        };
        assert_eq!(missing.code(), "SUBCOMMAND_REQUIRED");
        assert_eq!(
            missing.hint().as_deref(),
            Some("available: remote add, remote remove")
        );
    }

    #[test]
    fn test_error_record_carries_path_and_hint() {
        let err = CommandError::from(
            ArgumentError::new("required value is missing")
                .at("query")
                .with_hint("provide --query <value>"),
        );
        let record = err.to_record();
        assert_eq!(record.code, "VALIDATION_ERROR");
        assert_eq!(record.message, "required value is missing");
        assert_eq!(record.path.as_deref(), Some("query"));
        assert_eq!(record.hint.as_deref(), Some("provide --query <value>"));
    }
}
