//! Command routing over a [`CommandRegistry`].
//!
//! Routing is a longest-prefix match of leading non-option tokens against
//! the command tree. It never backtracks: the first token that starts with
//! `-` or that names no child ends the path, and every token from there on
//! is left for the argument parser.
//!
//! # Examples
//!
//! ```
//! use command_router_core::*;
//!
//! let registry = CommandRegistry::new(vec![
//!     CommandNode::new("remote", "Manage remotes").with_subcommand(
//!         CommandNode::new("add", "Add a remote").with_handler("remote_add"),
//!     ),
//! ])
//! .unwrap();
//!
//! let tokens: Vec<String> = vec!["remote".into(), "add".into(), "origin".into()];
//! let routed = extract_command_path(&registry, &tokens);
//! assert_eq!(routed.path, vec!["remote", "add"]);
//! assert_eq!(routed.remaining, vec!["origin"]);
//!
//! let node = find_command(&registry, &routed.path).unwrap();
//! assert_eq!(node.name, "add");
//! ```

use serde::Serialize;
use tracing::debug;

use crate::registry::CommandRegistry;
use crate::types::CommandNode;

/// Matched command path plus the tokens left for argument parsing.
///
/// An empty `path` means no command was recognised.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RoutingOutcome {
    pub path: Vec<String>,
    pub remaining: Vec<String>,
}

/// One entry of [`list_commands`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CommandListing {
    /// Path segments joined with single spaces.
    pub name: String,
    pub description: String,
}

/// Splits `tokens` into a command path and the remaining argument tokens.
///
/// Path segments are recorded by canonical name even when an alias
/// matched.
pub fn extract_command_path(registry: &CommandRegistry, tokens: &[String]) -> RoutingOutcome {
    let mut level = registry.commands();
    let mut path = Vec::new();
    let mut consumed = 0;

    for token in tokens {
        if token.starts_with('-') {
            break;
        }
        let Some(node) = level.iter().find(|node| node.matches(token)) else {
            break;
        };
        path.push(node.name.clone());
        level = &node.subcommands;
        consumed += 1;
    }

    debug!(path = %path.join(" "), remaining = tokens.len() - consumed, "routed command");
    RoutingOutcome {
        path,
        remaining: tokens[consumed..].to_vec(),
    }
}

/// Walks `path` from the root.
///
/// Returns the deepest node matched: a path whose later segments are
/// unknown still yields the last known ancestor. Returns `None` only when
/// `path` is empty or its first segment names no top-level command.
pub fn find_command<'a, S: AsRef<str>>(
    registry: &'a CommandRegistry,
    path: &[S],
) -> Option<&'a CommandNode> {
    let (first, rest) = path.split_first()?;
    let mut node = registry.find(first.as_ref())?;
    for segment in rest {
        match node.find_subcommand(segment.as_ref()) {
            Some(child) => node = child,
            None => break,
        }
    }
    Some(node)
}

/// Depth-first, insertion-order listing of every node in the registry.
pub fn list_commands(registry: &CommandRegistry) -> Vec<CommandListing> {
    let mut listings = Vec::new();
    let mut prefix = Vec::new();
    collect_listings(registry.commands(), &mut prefix, &mut listings);
    listings
}

fn collect_listings<'a>(
    nodes: &'a [CommandNode],
    prefix: &mut Vec<&'a str>,
    listings: &mut Vec<CommandListing>,
) {
    for node in nodes {
        prefix.push(&node.name);
        listings.push(CommandListing {
            name: prefix.join(" "),
            description: node.description.clone(),
        });
        collect_listings(&node.subcommands, prefix, listings);
        prefix.pop();
    }
}
