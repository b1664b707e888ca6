//! Command tree validation.
//!
//! Catches definition defects such as duplicate sibling names, clashing
//! positional indices and short aliases, or defaults of the wrong kind
//! before a registry is built, so the parser never has to handle them.
//!
//! # Examples
//!
//! ```
//! use command_router_core::*;
//!
//! let ok = CommandNode::new("search", "Search the index")
//!     .with_arg(ArgumentSpec::new("query", ArgKind::String).at_position(0));
//! assert!(validate_commands(&[ok]).is_empty());
//!
//! let bad = CommandNode::new("search", "Search the index")
//!     .with_arg(ArgumentSpec::new("a", ArgKind::String).at_position(0))
//!     .with_arg(ArgumentSpec::new("b", ArgKind::String).at_position(0));
//! assert!(!validate_commands(&[bad]).is_empty());
//! ```

use std::collections::HashSet;

use thiserror::Error;

use crate::{ArgKind, ArgumentSpec, CommandNode};

/// Command definition errors.
///
/// `command` fields hold the space-joined path of the offending node.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DefinitionError {
    /// Command name is empty, contains whitespace, or starts with `-`.
    #[error("invalid command name: '{0}'")]
    InvalidCommandName(String),
    /// Command has no description.
    #[error("command '{0}' has no description")]
    MissingDescription(String),
    /// Two siblings share a name or alias.
    #[error("duplicate command name or alias: {0}")]
    DuplicateCommand(String),
    /// Argument name is empty or not made of letters, digits, `_` and `-`.
    #[error("invalid argument name in '{command}': '{name}'")]
    InvalidArgumentName { command: String, name: String },
    /// Two fields of one schema share a name.
    #[error("duplicate argument in '{command}': {name}")]
    DuplicateArgument { command: String, name: String },
    /// Two fields of one schema share a positional index.
    #[error("duplicate positional index {position} in '{command}'")]
    DuplicatePosition { command: String, position: usize },
    /// Short alias is not an ASCII letter or digit.
    #[error("invalid short alias in '{command}': '{alias}'")]
    InvalidShortAlias { command: String, alias: char },
    /// Two fields of one schema share a short alias.
    #[error("duplicate short alias in '{command}': -{alias}")]
    DuplicateShortAlias { command: String, alias: char },
    /// Arrays of arrays are not supported.
    #[error("nested array kind for '{name}' in '{command}'")]
    NestedArray { command: String, name: String },
    /// An array positional field must take the last position.
    #[error("variadic positional '{name}' in '{command}' must be the last positional")]
    VariadicNotLast { command: String, name: String },
    /// The default value does not have the field's kind.
    #[error("default for '{name}' in '{command}' is not a {kind}")]
    DefaultKindMismatch {
        command: String,
        name: String,
        kind: ArgKind,
    },
}

/// Validates a list of top-level commands and all of their descendants.
///
/// Returns every defect found, in depth-first order.
pub fn validate_commands(commands: &[CommandNode]) -> Vec<DefinitionError> {
    let mut errors = Vec::new();
    let mut path = Vec::new();
    validate_siblings(commands, &mut path, &mut errors);
    errors
}

fn validate_siblings(
    nodes: &[CommandNode],
    path: &mut Vec<String>,
    errors: &mut Vec<DefinitionError>,
) {
    let mut seen: HashSet<&str> = HashSet::new();

    for node in nodes {
        path.push(node.name.clone());
        let full_name = path.join(" ");

        if !is_valid_command_name(&node.name) {
            errors.push(DefinitionError::InvalidCommandName(full_name.clone()));
        }
        if node.description.trim().is_empty() {
            errors.push(DefinitionError::MissingDescription(full_name.clone()));
        }
        for name in std::iter::once(&node.name).chain(node.aliases.iter()) {
            if !seen.insert(name.as_str()) {
                errors.push(DefinitionError::DuplicateCommand(
                    path[..path.len() - 1]
                        .iter()
                        .chain(std::iter::once(name))
                        .cloned()
                        .collect::<Vec<_>>()
                        .join(" "),
                ));
            }
        }

        validate_schema(&node.args, &full_name, errors);
        validate_siblings(&node.subcommands, path, errors);
        path.pop();
    }
}

fn is_valid_command_name(name: &str) -> bool {
    !name.is_empty() && !name.starts_with('-') && !name.chars().any(char::is_whitespace)
}

fn validate_schema(args: &[ArgumentSpec], command: &str, errors: &mut Vec<DefinitionError>) {
    let mut names = HashSet::new();
    let mut positions = HashSet::new();
    let mut aliases = HashSet::new();

    for arg in args {
        let valid_name = !arg.name.is_empty()
            && arg
                .name
                .chars()
                .all(|ch| ch.is_alphanumeric() || ch == '_' || ch == '-');
        if !valid_name {
            errors.push(DefinitionError::InvalidArgumentName {
                command: command.to_string(),
                name: arg.name.clone(),
            });
        }
        if !names.insert(arg.name.replace('-', "_")) {
            errors.push(DefinitionError::DuplicateArgument {
                command: command.to_string(),
                name: arg.name.clone(),
            });
        }

        if let Some(position) = arg.position.filter(|p| !positions.insert(*p)) {
            errors.push(DefinitionError::DuplicatePosition {
                command: command.to_string(),
                position,
            });
        }

        if let Some(alias) = arg.short {
            if !alias.is_ascii_alphanumeric() {
                errors.push(DefinitionError::InvalidShortAlias {
                    command: command.to_string(),
                    alias,
                });
            } else if !aliases.insert(alias) {
                errors.push(DefinitionError::DuplicateShortAlias {
                    command: command.to_string(),
                    alias,
                });
            }
        }

        if arg.kind.is_array() && arg.kind.element().is_array() {
            errors.push(DefinitionError::NestedArray {
                command: command.to_string(),
                name: arg.name.clone(),
            });
        }

        if arg.default.as_ref().is_some_and(|d| !d.matches_kind(&arg.kind)) {
            errors.push(DefinitionError::DefaultKindMismatch {
                command: command.to_string(),
                name: arg.name.clone(),
                kind: arg.kind.clone(),
            });
        }
    }

    let last_position = args.iter().filter_map(|arg| arg.position).max();
    for arg in args {
        if arg.kind.is_array() && arg.position.is_some() && arg.position != last_position {
            errors.push(DefinitionError::VariadicNotLast {
                command: command.to_string(),
                name: arg.name.clone(),
            });
        }
    }
}
