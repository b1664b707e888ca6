//! Command tree and argument schema types.
//!
//! A [`CommandRegistry`](crate::CommandRegistry) is a tree of
//! [`CommandNode`]s. Each node may carry an argument schema: an ordered list
//! of [`ArgumentSpec`]s whose [`ArgKind`] is fixed when the spec is built,
//! so the parser never has to inspect validators to decide whether a field
//! is a flag, takes a value, or accumulates repeated values.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::validator::{Constraints, FieldValidator, Pattern};

/// Semantic type of an argument field.
///
/// # Examples
///
/// ```
/// use command_router_core::ArgKind;
///
/// let tags = ArgKind::array(ArgKind::String);
/// assert!(tags.is_array());
/// assert_eq!(tags.to_string(), "array<string>");
/// assert!(ArgKind::Boolean.is_boolean());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArgKind {
    String,
    Number,
    Boolean,
    Date,
    #[serde(rename = "bigint")]
    BigInt,
    /// Repeatable field; every occurrence appends one element.
    Array(Box<ArgKind>),
}

impl ArgKind {
    pub fn array(element: ArgKind) -> Self {
        ArgKind::Array(Box::new(element))
    }

    pub fn is_boolean(&self) -> bool {
        matches!(self, ArgKind::Boolean)
    }

    pub fn is_array(&self) -> bool {
        matches!(self, ArgKind::Array(_))
    }

    /// Element kind for arrays, the kind itself otherwise.
    pub fn element(&self) -> &ArgKind {
        match self {
            ArgKind::Array(inner) => inner,
            other => other,
        }
    }
}

impl fmt::Display for ArgKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgKind::String => f.write_str("string"),
            ArgKind::Number => f.write_str("number"),
            ArgKind::Boolean => f.write_str("boolean"),
            ArgKind::Date => f.write_str("date"),
            ArgKind::BigInt => f.write_str("bigint"),
            ArgKind::Array(inner) => write!(f, "array<{inner}>"),
        }
    }
}

/// A typed argument value.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ArgValue {
    String(String),
    Number(f64),
    Boolean(bool),
    Date(DateTime<Utc>),
    BigInt(i128),
    Array(Vec<ArgValue>),
}

impl ArgValue {
    /// Returns `true` if this value is of `kind`.
    pub fn matches_kind(&self, kind: &ArgKind) -> bool {
        match (self, kind) {
            (ArgValue::String(_), ArgKind::String)
            | (ArgValue::Number(_), ArgKind::Number)
            | (ArgValue::Boolean(_), ArgKind::Boolean)
            | (ArgValue::Date(_), ArgKind::Date)
            | (ArgValue::BigInt(_), ArgKind::BigInt) => true,
            (ArgValue::Array(items), ArgKind::Array(inner)) => {
                items.iter().all(|item| item.matches_kind(inner))
            }
            _ => false,
        }
    }
}

impl From<&str> for ArgValue {
    fn from(value: &str) -> Self {
        ArgValue::String(value.to_string())
    }
}

impl From<String> for ArgValue {
    fn from(value: String) -> Self {
        ArgValue::String(value)
    }
}

impl From<f64> for ArgValue {
    fn from(value: f64) -> Self {
        ArgValue::Number(value)
    }
}

impl From<bool> for ArgValue {
    fn from(value: bool) -> Self {
        ArgValue::Boolean(value)
    }
}

impl From<i128> for ArgValue {
    fn from(value: i128) -> Self {
        ArgValue::BigInt(value)
    }
}

impl From<DateTime<Utc>> for ArgValue {
    fn from(value: DateTime<Utc>) -> Self {
        ArgValue::Date(value)
    }
}

/// Schema entry for one argument field.
///
/// Fields are named options by default (`--name`). A position makes the
/// field fillable from positional tokens as well; a short alias adds `-x`.
///
/// # Examples
///
/// ```
/// use command_router_core::{ArgKind, ArgumentSpec};
///
/// let limit = ArgumentSpec::new("max_results", ArgKind::Number)
///     .with_short('n')
///     .with_default(10.0)
///     .with_max(100.0);
/// assert_eq!(limit.long_name(), "--max-results");
/// assert!(limit.has_default());
/// assert!(!limit.is_required());
///
/// let query = ArgumentSpec::new("query", ArgKind::String).at_position(0);
/// assert!(query.is_required());
/// assert!(query.is_positional());
/// ```
#[derive(Debug, Clone, Serialize)]
pub struct ArgumentSpec {
    /// Field name, used as the key in the parsed map.
    pub name: String,
    pub kind: ArgKind,
    /// Slot among positional tokens, unique within a schema.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub position: Option<usize>,
    /// Single-character alias, unique within a schema.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub short: Option<char>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<ArgValue>,
    /// Explicitly optional (may be absent from the parsed map).
    pub optional: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub examples: Vec<String>,
    #[serde(skip_serializing_if = "Constraints::is_empty")]
    pub constraints: Constraints,
    #[serde(skip)]
    pub validators: Vec<Arc<dyn FieldValidator>>,
}

impl ArgumentSpec {
    pub fn new(name: impl Into<String>, kind: ArgKind) -> Self {
        Self {
            name: name.into(),
            kind,
            position: None,
            short: None,
            default: None,
            optional: false,
            description: None,
            examples: Vec::new(),
            constraints: Constraints::default(),
            validators: Vec::new(),
        }
    }

    /// Boolean flag with a `false` default.
    pub fn flag(name: impl Into<String>) -> Self {
        Self::new(name, ArgKind::Boolean).with_default(false)
    }

    pub fn at_position(mut self, position: usize) -> Self {
        self.position = Some(position);
        self
    }

    pub fn with_short(mut self, short: char) -> Self {
        self.short = Some(short);
        self
    }

    pub fn with_default(mut self, value: impl Into<ArgValue>) -> Self {
        self.default = Some(value.into());
        self
    }

    pub fn optional(mut self) -> Self {
        self.optional = true;
        self
    }

    pub fn with_description(mut self, description: &str) -> Self {
        self.description = Some(description.to_string());
        self
    }

    pub fn with_example(mut self, example: &str) -> Self {
        self.examples.push(example.to_string());
        self
    }

    pub fn with_min(mut self, min: f64) -> Self {
        self.constraints.min = Some(min);
        self
    }

    pub fn with_max(mut self, max: f64) -> Self {
        self.constraints.max = Some(max);
        self
    }

    pub fn with_choices<I, S>(mut self, choices: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.constraints.choices = choices.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_pattern(mut self, pattern: Pattern) -> Self {
        self.constraints.pattern = Some(pattern);
        self
    }

    pub fn with_validator(mut self, validator: impl FieldValidator + 'static) -> Self {
        self.validators.push(Arc::new(validator));
        self
    }

    /// Boolean fields take no value: their presence sets them to `true`.
    pub fn is_flag(&self) -> bool {
        self.kind.is_boolean()
    }

    pub fn has_default(&self) -> bool {
        self.default.is_some()
    }

    pub fn is_required(&self) -> bool {
        !self.optional && self.default.is_none()
    }

    pub fn is_positional(&self) -> bool {
        self.position.is_some()
    }

    /// `--long-name` spelling of this field.
    pub fn long_name(&self) -> String {
        format!("--{}", self.name.replace('_', "-"))
    }

    /// How to supply this field, used in missing-value hints.
    pub fn usage_hint(&self) -> String {
        let named = if self.is_flag() {
            self.long_name()
        } else {
            format!("{} <value>", self.long_name())
        };
        match self.position {
            Some(position) => format!("<{}> (position {}) or {named}", self.name, position + 1),
            None => named,
        }
    }
}

/// Opaque reference to the host's handler for a command.
///
/// The registry never invokes handlers; it only reports which one an input
/// resolved to.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HandlerRef(pub String);

impl HandlerRef {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for HandlerRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One node of the command tree.
///
/// A node with subcommands but no handler is a pure group: reaching it
/// exactly means a subcommand is still required.
///
/// # Examples
///
/// ```
/// use command_router_core::{ArgKind, ArgumentSpec, CommandNode};
///
/// let remote = CommandNode::new("remote", "Manage remotes")
///     .with_subcommand(
///         CommandNode::new("add", "Add a remote")
///             .with_handler("remote_add")
///             .with_arg(ArgumentSpec::new("name", ArgKind::String).at_position(0)),
///     );
///
/// assert!(remote.is_group());
/// assert!(remote.find_subcommand("add").is_some());
/// assert!(remote.find_subcommand("rm").is_none());
/// ```
#[derive(Debug, Clone, Serialize)]
pub struct CommandNode {
    pub name: String,
    pub description: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub aliases: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub handler: Option<HandlerRef>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub args: Vec<ArgumentSpec>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub subcommands: Vec<CommandNode>,
}

impl CommandNode {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            aliases: Vec::new(),
            handler: None,
            args: Vec::new(),
            subcommands: Vec::new(),
        }
    }

    pub fn with_handler(mut self, handler: impl Into<String>) -> Self {
        self.handler = Some(HandlerRef::new(handler));
        self
    }

    pub fn with_alias(mut self, alias: &str) -> Self {
        self.aliases.push(alias.to_string());
        self
    }

    pub fn with_arg(mut self, arg: ArgumentSpec) -> Self {
        self.args.push(arg);
        self
    }

    pub fn with_subcommand(mut self, sub: CommandNode) -> Self {
        self.subcommands.push(sub);
        self
    }

    /// Returns `true` if `token` is this node's name or one of its aliases.
    pub fn matches(&self, token: &str) -> bool {
        self.name == token || self.aliases.iter().any(|alias| alias == token)
    }

    /// Finds a direct child by name or alias.
    pub fn find_subcommand(&self, token: &str) -> Option<&CommandNode> {
        self.subcommands.iter().find(|sub| sub.matches(token))
    }

    pub fn has_subcommands(&self) -> bool {
        !self.subcommands.is_empty()
    }

    /// Handler-less node with children.
    pub fn is_group(&self) -> bool {
        self.handler.is_none() && self.has_subcommands()
    }

    pub fn subcommand_names(&self) -> Vec<&str> {
        self.subcommands.iter().map(|s| s.name.as_str()).collect()
    }
}

/// Successfully parsed arguments, keyed by field name.
///
/// # Examples
///
/// ```
/// use command_router_core::{ArgKind, ArgumentSpec, parse_arguments};
///
/// let schema = vec![
///     ArgumentSpec::new("query", ArgKind::String).at_position(0),
///     ArgumentSpec::new("limit", ArgKind::Number).with_default(10.0),
/// ];
/// let tokens: Vec<String> = vec!["rust".into(), "--limit".into(), "5".into()];
/// let args = parse_arguments(&tokens, &schema).unwrap();
/// assert_eq!(args.get_str("query"), Some("rust"));
/// assert_eq!(args.get_number("limit"), Some(5.0));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct ParsedArgs {
    values: BTreeMap<String, ArgValue>,
}

impl ParsedArgs {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, value: ArgValue) {
        self.values.insert(name.into(), value);
    }

    pub fn get(&self, name: &str) -> Option<&ArgValue> {
        self.values.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    pub fn get_str(&self, name: &str) -> Option<&str> {
        match self.get(name)? {
            ArgValue::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn get_number(&self, name: &str) -> Option<f64> {
        match self.get(name)? {
            ArgValue::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn get_bool(&self, name: &str) -> Option<bool> {
        match self.get(name)? {
            ArgValue::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    pub fn get_date(&self, name: &str) -> Option<DateTime<Utc>> {
        match self.get(name)? {
            ArgValue::Date(d) => Some(*d),
            _ => None,
        }
    }

    pub fn get_bigint(&self, name: &str) -> Option<i128> {
        match self.get(name)? {
            ArgValue::BigInt(n) => Some(*n),
            _ => None,
        }
    }

    pub fn get_array(&self, name: &str) -> Option<&[ArgValue]> {
        match self.get(name)? {
            ArgValue::Array(items) => Some(items),
            _ => None,
        }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ArgValue)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_deserializes_from_snake_case() {
        let kind: ArgKind = serde_json::from_str(r#""bigint""#).unwrap();
        assert_eq!(kind, ArgKind::BigInt);
        let kind: ArgKind = serde_json::from_str(r#"{"array":"number"}"#).unwrap();
        assert_eq!(kind, ArgKind::array(ArgKind::Number));
    }

    #[test]
    fn test_value_matches_kind() {
        let tags = ArgValue::Array(vec!["a".into(), "b".into()]);
        assert!(tags.matches_kind(&ArgKind::array(ArgKind::String)));
        assert!(!tags.matches_kind(&ArgKind::array(ArgKind::Number)));
        assert!(!ArgValue::Number(1.0).matches_kind(&ArgKind::BigInt));
    }

    #[test]
    fn test_spec_required_and_flag() {
        let flag = ArgumentSpec::flag("verbose");
        assert!(flag.is_flag());
        assert!(!flag.is_required());

        let opt = ArgumentSpec::new("out", ArgKind::String).optional();
        assert!(!opt.is_required());

        let req = ArgumentSpec::new("id", ArgKind::Number);
        assert!(req.is_required());
    }

    #[test]
    fn test_usage_hint() {
        let named = ArgumentSpec::new("dry_run_id", ArgKind::String);
        assert_eq!(named.usage_hint(), "--dry-run-id <value>");

        let positional = ArgumentSpec::new("path", ArgKind::String).at_position(1);
        assert_eq!(
            positional.usage_hint(),
            "<path> (position 2) or --path <value>"
        );
    }

    #[test]
    fn test_node_matches_alias() {
        let node = CommandNode::new("search", "Search").with_alias("find");
        assert!(node.matches("search"));
        assert!(node.matches("find"));
        assert!(!node.matches("lookup"));
    }

    #[test]
    fn test_parsed_args_serializes_as_map() {
        let mut args = ParsedArgs::new();
        args.insert("limit", ArgValue::Number(5.0));
        args.insert("verbose", ArgValue::Boolean(true));
        args.insert("id", ArgValue::BigInt(12));
        let json = serde_json::to_value(&args).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"id": 12, "limit": 5.0, "verbose": true})
        );
    }
}
