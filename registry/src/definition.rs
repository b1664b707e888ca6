//! Registry definition files.
//!
//! A definition is the static, serializable description of a command tree.
//! It is read from YAML or JSON, fingerprinted, and then converted into a
//! validated [`CommandRegistry`].
//!
//! # Example YAML
//!
//! ```yaml
//! version: "1"
//! strict_tokenizer: false
//! commands:
//!   - name: search
//!     description: Search the index
//!     handler: search
//!     aliases: [find]
//!     args:
//!       - name: query
//!         kind: string
//!         position: 0
//!       - name: limit
//!         kind: number
//!         short: l
//!         default: 10
//!         min: 1
//!         max: 100
//!       - name: tag
//!         kind: { array: string }
//! ```

use std::path::Path;

use command_router_core::{
    ArgKind, ArgValue, ArgumentSpec, CommandNode, CommandRegistry, Pattern, TokenizerMode,
    coerce_text,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sha2::{Digest, Sha256};
use tracing::debug;

use crate::error::{LoadError, Result};

fn default_version() -> String {
    "1".to_string()
}

/// Top-level contents of a definition file.
///
/// # Examples
///
/// ```
/// use command_router_registry::RegistryDefinition;
///
/// let definition = RegistryDefinition::from_yaml_str(
///     r#"
/// commands:
///   - name: greet
///     description: Say hello
///     handler: greet
///     args:
///       - name: who
///         kind: string
///         position: 0
/// "#,
/// )
/// .unwrap();
///
/// assert_eq!(definition.fingerprint().len(), 64);
/// let registry = definition.into_registry().unwrap();
/// let invocation = registry.resolve("greet world").unwrap();
/// assert_eq!(invocation.args.get_str("who"), Some("world"));
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegistryDefinition {
    #[serde(default = "default_version")]
    pub version: String,
    /// Rejects shell metacharacters in command strings when `true`.
    #[serde(default)]
    pub strict_tokenizer: bool,
    pub commands: Vec<CommandDefinition>,
    #[serde(skip)]
    fingerprint: String,
}

/// One command node as written in a definition file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommandDefinition {
    pub name: String,
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub handler: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub aliases: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub args: Vec<ArgDefinition>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub subcommands: Vec<CommandDefinition>,
}

/// One argument field as written in a definition file.
///
/// `default` is kept as loose JSON until the field's kind is known.
/// Strings are coerced the same way command-line text is, so a date
/// default may be written as `"2024-01-01"`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArgDefinition {
    pub name: String,
    pub kind: ArgKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub short: Option<char>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
    #[serde(default)]
    pub optional: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub choices: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub examples: Vec<String>,
}

impl RegistryDefinition {
    /// Reads a definition file, choosing the format by extension
    /// (`.yaml`/`.yml` or `.json`).
    ///
    /// # Errors
    ///
    /// Returns [`LoadError::IoError`] if the file cannot be read,
    /// [`LoadError::UnsupportedFormat`] for any other extension, or a
    /// syntax error from the matching parser.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase);
        let bytes = std::fs::read(path)?;

        let mut definition: Self = match extension.as_deref() {
            Some("yaml" | "yml") => from_yaml_slice(&bytes)?,
            Some("json") => serde_json::from_slice(&bytes)?,
            _ => return Err(LoadError::UnsupportedFormat(path.display().to_string())),
        };
        definition.fingerprint = fingerprint_bytes(&bytes);
        debug!(path = %path.display(), commands = definition.commands.len(), "read registry definition");
        Ok(definition)
    }

    /// Parses a YAML definition.
    ///
    /// # Errors
    ///
    /// Returns [`LoadError::YamlError`] on malformed input.
    pub fn from_yaml_str(source: &str) -> Result<Self> {
        let mut definition = from_yaml_slice(source.as_bytes())?;
        definition.fingerprint = fingerprint_bytes(source.as_bytes());
        Ok(definition)
    }

    /// Parses a JSON definition.
    ///
    /// # Errors
    ///
    /// Returns [`LoadError::JsonError`] on malformed input.
    pub fn from_json_str(source: &str) -> Result<Self> {
        let mut definition: Self = serde_json::from_str(source)?;
        definition.fingerprint = fingerprint_bytes(source.as_bytes());
        Ok(definition)
    }

    /// SHA-256 of the source bytes as lowercase hex.
    ///
    /// Empty for definitions built in memory rather than parsed.
    pub fn fingerprint(&self) -> &str {
        &self.fingerprint
    }

    pub fn tokenizer_mode(&self) -> TokenizerMode {
        if self.strict_tokenizer {
            TokenizerMode::Strict
        } else {
            TokenizerMode::Literal
        }
    }

    /// Converts the definition into command nodes without validating the
    /// tree.
    ///
    /// # Errors
    ///
    /// Returns [`LoadError::InvalidPattern`] or [`LoadError::InvalidDefault`]
    /// for the first field that cannot be converted.
    pub fn to_nodes(&self) -> Result<Vec<CommandNode>> {
        let mut path = Vec::new();
        self.commands
            .iter()
            .map(|command| command.to_node(&mut path))
            .collect()
    }

    /// Builds a validated registry.
    ///
    /// # Errors
    ///
    /// Returns a field conversion error from [`to_nodes`](Self::to_nodes),
    /// or [`LoadError::InvalidDefinition`] with every structural defect.
    pub fn into_registry(self) -> Result<CommandRegistry> {
        let nodes = self.to_nodes()?;
        Ok(CommandRegistry::new(nodes)?)
    }
}

impl CommandDefinition {
    fn to_node(&self, path: &mut Vec<String>) -> Result<CommandNode> {
        path.push(self.name.clone());
        let command = path.join(" ");

        let mut node = CommandNode::new(&self.name, &self.description);
        if let Some(handler) = &self.handler {
            node = node.with_handler(handler);
        }
        for alias in &self.aliases {
            node = node.with_alias(alias);
        }
        for arg in &self.args {
            node = node.with_arg(arg.to_spec(&command)?);
        }
        for sub in &self.subcommands {
            node = node.with_subcommand(sub.to_node(path)?);
        }

        path.pop();
        Ok(node)
    }
}

impl ArgDefinition {
    fn to_spec(&self, command: &str) -> Result<ArgumentSpec> {
        let mut spec = ArgumentSpec::new(&self.name, self.kind.clone());
        if let Some(position) = self.position {
            spec = spec.at_position(position);
        }
        if let Some(short) = self.short {
            spec = spec.with_short(short);
        }
        if let Some(value) = &self.default {
            let default =
                default_value(value, &self.kind).map_err(|reason| LoadError::InvalidDefault {
                    command: command.to_string(),
                    name: self.name.clone(),
                    reason,
                })?;
            spec = spec.with_default(default);
        }
        if self.optional {
            spec = spec.optional();
        }
        if let Some(description) = &self.description {
            spec = spec.with_description(description);
        }
        for example in &self.examples {
            spec = spec.with_example(example);
        }
        if let Some(min) = self.min {
            spec = spec.with_min(min);
        }
        if let Some(max) = self.max {
            spec = spec.with_max(max);
        }
        if !self.choices.is_empty() {
            spec = spec.with_choices(self.choices.iter().cloned());
        }
        if let Some(source) = &self.pattern {
            let pattern = Pattern::new(source).map_err(|source| LoadError::InvalidPattern {
                command: command.to_string(),
                name: self.name.clone(),
                source,
            })?;
            spec = spec.with_pattern(pattern);
        }
        Ok(spec)
    }
}

/// Converts a loosely typed default to a value of `kind`.
fn default_value(value: &Value, kind: &ArgKind) -> std::result::Result<ArgValue, String> {
    match (kind, value) {
        (ArgKind::Array(element), Value::Array(items)) => items
            .iter()
            .map(|item| default_value(item, element))
            .collect::<std::result::Result<Vec<_>, _>>()
            .map(ArgValue::Array),
        (ArgKind::Number, Value::Number(n)) => n
            .as_f64()
            .map(ArgValue::Number)
            .ok_or_else(|| format!("{n} is not a finite number")),
        (ArgKind::BigInt, Value::Number(n)) => n
            .as_i64()
            .map(i128::from)
            .or_else(|| n.as_u64().map(i128::from))
            .map(ArgValue::BigInt)
            .ok_or_else(|| format!("{n} is not an integer")),
        (ArgKind::Boolean, Value::Bool(b)) => Ok(ArgValue::Boolean(*b)),
        (kind, Value::String(text)) if !kind.is_array() => coerce_text(text, kind),
        (kind, other) => Err(format!("expected {kind}, received {other}")),
    }
}

/// Enum-valued fields such as `kind: { array: string }` are written as
/// single-key maps rather than YAML tags.
fn from_yaml_slice(bytes: &[u8]) -> Result<RegistryDefinition> {
    let deserializer = serde_yaml::Deserializer::from_slice(bytes);
    Ok(serde_yaml::with::singleton_map_recursive::deserialize(
        deserializer,
    )?)
}

fn fingerprint_bytes(bytes: &[u8]) -> String {
    format!("{:x}", Sha256::digest(bytes))
}
