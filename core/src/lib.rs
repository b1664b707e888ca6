//! Command-string parsing primitives.
//!
//! This crate turns a single line of text such as
//! `remote add origin --fetch -t main` into a resolved command with typed
//! arguments:
//!
//! - [`tokenize`] splits the line into tokens with shell-like quoting but
//!   no expansion of any kind.
//! - [`CommandRegistry`] holds a validated tree of [`CommandNode`]s and
//!   [`extract_command_path`] routes tokens to the deepest matching node.
//! - [`parse_arguments`] matches the remaining tokens against the node's
//!   [`ArgumentSpec`] schema, coerces them to [`ArgKind`]s and enforces
//!   constraints, producing [`ParsedArgs`].
//!
//! [`CommandRegistry::resolve`] runs all three stages and reports failures
//! as a [`CommandError`] with a stable code.
//!
//! # Example
//!
//! ```
//! use command_router_core::*;
//!
//! let registry = CommandRegistry::new(vec![
//!     CommandNode::new("remote", "Manage remotes").with_subcommand(
//!         CommandNode::new("add", "Add a remote")
//!             .with_handler("remote_add")
//!             .with_arg(ArgumentSpec::new("name", ArgKind::String).at_position(0))
//!             .with_arg(ArgumentSpec::flag("fetch").with_short('f'))
//!             .with_arg(
//!                 ArgumentSpec::new("track", ArgKind::array(ArgKind::String)).with_short('t'),
//!             ),
//!     ),
//! ])
//! .unwrap();
//!
//! let invocation = registry.resolve("remote add origin -f -t main -t dev").unwrap();
//! assert_eq!(invocation.handler.unwrap().as_str(), "remote_add");
//! assert_eq!(invocation.args.get_str("name"), Some("origin"));
//! assert_eq!(invocation.args.get_bool("fetch"), Some(true));
//! assert_eq!(invocation.args.get_array("track").map(|t| t.len()), Some(2));
//! ```

mod args;
mod error;
mod registry;
mod router;
mod tokenizer;
mod types;
mod validate;
mod validator;

pub use args::{coerce_text, parse_arguments};
pub use error::{ArgumentError, CommandError, ErrorRecord, ParseError, QuoteKind};
pub use registry::{CommandRegistry, Invocation};
pub use router::{
    CommandListing, RoutingOutcome, extract_command_path, find_command, list_commands,
};
pub use tokenizer::{
    MAX_INPUT_LENGTH, MAX_TOKEN_COUNT, MAX_TOKEN_LENGTH, TokenizerMode, tokenize, tokenize_with,
};
pub use types::*;
pub use validate::{DefinitionError, validate_commands};
pub use validator::{Constraints, FieldValidator, FnValidator, Pattern, validator_fn};
