//! The command registry and the full parsing pipeline.

use serde::Serialize;
use tracing::debug;

use crate::args::parse_arguments;
use crate::error::CommandError;
use crate::router::{extract_command_path, find_command};
use crate::tokenizer::{TokenizerMode, tokenize_with};
use crate::types::{CommandNode, HandlerRef, ParsedArgs};
use crate::validate::{DefinitionError, validate_commands};

/// Immutable tree of commands.
///
/// Built once from validated definitions and then only read, so a single
/// instance can be shared across threads (for example behind an `Arc`).
/// Replacing commands means building a new registry.
///
/// # Examples
///
/// ```
/// use command_router_core::*;
///
/// let registry = CommandRegistry::new(vec![
///     CommandNode::new("search", "Search the index")
///         .with_handler("search")
///         .with_arg(ArgumentSpec::new("query", ArgKind::String).at_position(0))
///         .with_arg(ArgumentSpec::new("limit", ArgKind::Number).with_short('l').with_default(10.0)),
/// ])
/// .unwrap();
///
/// let invocation = registry.resolve("search 'rust lang' -l 5").unwrap();
/// assert_eq!(invocation.path, vec!["search"]);
/// assert_eq!(invocation.args.get_str("query"), Some("rust lang"));
/// assert_eq!(invocation.args.get_number("limit"), Some(5.0));
///
/// let err = registry.resolve("serch rust").unwrap_err();
/// assert_eq!(err.code(), "COMMAND_NOT_FOUND");
/// ```
#[derive(Debug, Clone, Default, Serialize)]
#[serde(transparent)]
pub struct CommandRegistry {
    commands: Vec<CommandNode>,
}

/// A resolved command: which node matched, its handler, and its typed
/// arguments.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Invocation {
    pub path: Vec<String>,
    /// `None` for a leaf without a handler; running it is the caller's
    /// error to report.
    pub handler: Option<HandlerRef>,
    pub args: ParsedArgs,
}

impl CommandRegistry {
    /// Validates `commands` and builds a registry.
    ///
    /// # Errors
    ///
    /// Returns every [`DefinitionError`] found if the tree is malformed.
    pub fn new(commands: Vec<CommandNode>) -> Result<Self, Vec<DefinitionError>> {
        let errors = validate_commands(&commands);
        if !errors.is_empty() {
            return Err(errors);
        }
        Ok(Self { commands })
    }

    /// Top-level commands in insertion order.
    pub fn commands(&self) -> &[CommandNode] {
        &self.commands
    }

    /// Finds a top-level command by name or alias.
    pub fn find(&self, name: &str) -> Option<&CommandNode> {
        self.commands.iter().find(|node| node.matches(name))
    }

    pub fn command_names(&self) -> Vec<&str> {
        self.commands.iter().map(|node| node.name.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// Runs tokenize, route and parse on `input` with the literal tokenizer.
    ///
    /// # Errors
    ///
    /// See [`resolve_with`](Self::resolve_with).
    pub fn resolve(&self, input: &str) -> Result<Invocation, CommandError> {
        self.resolve_with(input, TokenizerMode::Literal)
    }

    /// Runs tokenize, route and parse on `input`.
    ///
    /// # Errors
    ///
    /// - [`CommandError::Parse`] if tokenization fails.
    /// - [`CommandError::EmptyCommand`] for blank input.
    /// - [`CommandError::CommandNotFound`] if the first token names no
    ///   command, or a group node is followed by an unknown subcommand.
    /// - [`CommandError::SubcommandRequired`] if a group node is reached
    ///   with nothing after it but options.
    /// - [`CommandError::Validation`] if the arguments are rejected.
    pub fn resolve_with(
        &self,
        input: &str,
        mode: TokenizerMode,
    ) -> Result<Invocation, CommandError> {
        let tokens = tokenize_with(input, mode)?;
        let Some(first) = tokens.first() else {
            return Err(CommandError::EmptyCommand {
                available: owned(self.command_names()),
            });
        };

        let routed = extract_command_path(self, &tokens);
        let Some(node) = find_command(self, &routed.path) else {
            return Err(CommandError::CommandNotFound {
                name: first.clone(),
                available: owned(self.command_names()),
            });
        };

        if node.is_group() {
            let full_path = routed.path.join(" ");
            let available = node
                .subcommands
                .iter()
                .map(|sub| format!("{full_path} {}", sub.name))
                .collect();
            return Err(match routed.remaining.first() {
                Some(next) if !next.starts_with('-') => CommandError::CommandNotFound {
                    name: format!("{full_path} {next}"),
                    available,
                },
                _ => CommandError::SubcommandRequired {
                    path: full_path,
                    available,
                },
            });
        }

        let args = parse_arguments(&routed.remaining, &node.args)?;
        debug!(path = %routed.path.join(" "), "resolved command");
        Ok(Invocation {
            path: routed.path,
            handler: node.handler.clone(),
            args,
        })
    }
}

fn owned(names: Vec<&str>) -> Vec<String> {
    names.into_iter().map(String::from).collect()
}
