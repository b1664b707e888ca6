//! Argument parser.
//!
//! Maps the tokens left over after routing onto a command's argument
//! schema. Parsing happens in three steps:
//!
//! 1. A single left-to-right scan classifies each token as `--`, a negated
//!    flag (`--no-x`), a long option (`--name`, `--name=value`), a short
//!    option cluster (`-abc`, `-n5`, `-n=5`) or a positional candidate,
//!    filling a raw, still string-typed value per field.
//! 2. Positional candidates fill positional fields in ascending index order,
//!    skipping fields already set by name.
//! 3. Each field, in declaration order, is coerced to its [`ArgKind`] and
//!    validated. The first failure rejects the whole argument set.
//!
//! # Examples
//!
//! ```
//! use command_router_core::{ArgKind, ArgumentSpec, parse_arguments};
//!
//! let schema = vec![
//!     ArgumentSpec::new("path", ArgKind::String).at_position(0),
//!     ArgumentSpec::flag("all").with_short('a'),
//!     ArgumentSpec::flag("long").with_short('l'),
//!     ArgumentSpec::new("tag", ArgKind::array(ArgKind::String)).optional(),
//! ];
//! let tokens: Vec<String> = ["-al", "--tag", "x", "--tag=y", "src"]
//!     .iter()
//!     .map(|s| s.to_string())
//!     .collect();
//!
//! let args = parse_arguments(&tokens, &schema).unwrap();
//! assert_eq!(args.get_str("path"), Some("src"));
//! assert_eq!(args.get_bool("all"), Some(true));
//! assert_eq!(args.get_bool("long"), Some(true));
//! assert_eq!(args.get_array("tag").map(|t| t.len()), Some(2));
//! ```

use chrono::{DateTime, NaiveDate, Utc};
use tracing::debug;

use crate::error::ArgumentError;
use crate::types::{ArgKind, ArgValue, ArgumentSpec, ParsedArgs};

/// Raw value collected during the scan, before coercion.
#[derive(Debug, Clone, PartialEq)]
enum RawValue {
    Text(String),
    Flag(bool),
    List(Vec<String>),
}

/// Parses `tokens` against `schema`.
///
/// # Errors
///
/// Returns an [`ArgumentError`] for unknown options, options missing their
/// value, negation of non-boolean fields, leftover positional tokens,
/// values that cannot be coerced, constraint violations, and missing
/// required fields. Missing required fields carry a hint with the expected
/// spelling.
pub fn parse_arguments(
    tokens: &[String],
    schema: &[ArgumentSpec],
) -> Result<ParsedArgs, ArgumentError> {
    let mut raw: Vec<Option<RawValue>> = vec![None; schema.len()];
    let positionals = scan(tokens, schema, &mut raw)?;
    assign_positionals(positionals, schema, &mut raw)?;

    let mut parsed = ParsedArgs::new();
    for (spec, value) in schema.iter().zip(raw) {
        if let Some(value) = finish_field(spec, value)? {
            parsed.insert(spec.name.clone(), value);
        }
    }

    debug!(
        tokens = tokens.len(),
        fields = parsed.len(),
        "parsed command arguments"
    );
    Ok(parsed)
}

fn scan(
    tokens: &[String],
    schema: &[ArgumentSpec],
    raw: &mut [Option<RawValue>],
) -> Result<Vec<String>, ArgumentError> {
    let mut positionals = Vec::new();
    let mut index = 0;

    while index < tokens.len() {
        let token = &tokens[index];
        index += 1;

        if token == "--" {
            positionals.extend(tokens[index..].iter().cloned());
            break;
        }

        if let Some(body) = token.strip_prefix("--") {
            let (name, inline) = match body.split_once('=') {
                Some((name, value)) => (name, Some(value)),
                None => (body, None),
            };

            let negated = name
                .strip_prefix("no-")
                .filter(|_| find_field(schema, name).is_none());
            if let Some(key) = negated {
                let Some(field) = find_field(schema, key) else {
                    return Err(unknown_option(&format!("--{name}")));
                };
                if !schema[field].kind.is_boolean() {
                    return Err(ArgumentError::new(format!(
                        "--no-{key} can only be used with boolean flags"
                    ))
                    .at(schema[field].name.clone()));
                }
                if inline.is_some() {
                    return Err(ArgumentError::new(format!("--no-{key} does not take a value"))
                        .at(schema[field].name.clone())
                        .with_hint(format!("use --no-{key} or --{key}=<true|false>")));
                }
                raw[field] = Some(RawValue::Flag(false));
                continue;
            }

            let Some(field) = find_field(schema, name) else {
                return Err(unknown_option(&format!("--{name}")));
            };
            let spec = &schema[field];

            if spec.is_flag() {
                raw[field] = Some(match inline {
                    Some(value) => RawValue::Text(value.to_string()),
                    None => RawValue::Flag(true),
                });
                continue;
            }

            let value = match inline {
                Some(value) => value.to_string(),
                None => {
                    let Some(next) = tokens.get(index) else {
                        return Err(requires_value(&format!("--{name}"), spec));
                    };
                    index += 1;
                    next.clone()
                }
            };
            store(&mut raw[field], spec, value);
            continue;
        }

        if token.len() > 1 && token.starts_with('-') && !is_negative_number(token, schema) {
            index = scan_short_cluster(token, index, tokens, schema, raw)?;
            continue;
        }

        positionals.push(token.clone());
    }

    Ok(positionals)
}

/// Processes one `-abc` cluster and returns the index of the next unread
/// token.
fn scan_short_cluster(
    token: &str,
    mut index: usize,
    tokens: &[String],
    schema: &[ArgumentSpec],
    raw: &mut [Option<RawValue>],
) -> Result<usize, ArgumentError> {
    let cluster: Vec<char> = token[1..].chars().collect();

    for (offset, &alias) in cluster.iter().enumerate() {
        let Some(field) = schema.iter().position(|spec| spec.short == Some(alias)) else {
            return Err(unknown_option(&format!("-{alias}")));
        };
        let spec = &schema[field];

        if spec.is_flag() {
            raw[field] = Some(RawValue::Flag(true));
            continue;
        }

        let rest: String = cluster[offset + 1..].iter().collect();
        let value = if rest.is_empty() {
            let Some(next) = tokens.get(index) else {
                return Err(requires_value(&format!("-{alias}"), spec));
            };
            index += 1;
            next.clone()
        } else {
            rest.strip_prefix('=').unwrap_or(&rest).to_string()
        };
        store(&mut raw[field], spec, value);
        break;
    }

    Ok(index)
}

/// Resolves an option name to a field index: exact match first, then with
/// hyphens read as underscores.
fn find_field(schema: &[ArgumentSpec], name: &str) -> Option<usize> {
    schema
        .iter()
        .position(|spec| spec.name == name)
        .or_else(|| {
            let normalized = name.replace('-', "_");
            schema
                .iter()
                .position(|spec| spec.name.replace('-', "_") == normalized)
        })
}

/// `-5` or `-2.5` is a value unless its first digit is a declared alias.
/// Words such as `-nan` or `-inf` are never numbers here.
fn is_negative_number(token: &str, schema: &[ArgumentSpec]) -> bool {
    let Some(first) = token[1..].chars().next() else {
        return false;
    };
    (first.is_ascii_digit() || first == '.')
        && token.parse::<f64>().is_ok()
        && !schema.iter().any(|spec| spec.short == Some(first))
}

fn store(slot: &mut Option<RawValue>, spec: &ArgumentSpec, value: String) {
    if spec.kind.is_array() {
        match slot {
            Some(RawValue::List(items)) => items.push(value),
            _ => *slot = Some(RawValue::List(vec![value])),
        }
    } else {
        *slot = Some(RawValue::Text(value));
    }
}

fn assign_positionals(
    candidates: Vec<String>,
    schema: &[ArgumentSpec],
    raw: &mut [Option<RawValue>],
) -> Result<(), ArgumentError> {
    let mut fields: Vec<(usize, usize)> = schema
        .iter()
        .enumerate()
        .filter_map(|(field, spec)| spec.position.map(|position| (position, field)))
        .collect();
    fields.sort_unstable();

    let mut candidates = candidates.into_iter().peekable();
    for (_, field) in fields {
        if raw[field].is_some() {
            continue;
        }
        if candidates.peek().is_none() {
            break;
        }
        if schema[field].kind.is_array() {
            raw[field] = Some(RawValue::List(candidates.by_ref().collect()));
        } else {
            raw[field] = candidates.next().map(RawValue::Text);
        }
        debug!(field = %schema[field].name, "assigned positional argument");
    }

    match candidates.next() {
        Some(extra) => Err(ArgumentError::new(format!("unexpected argument '{extra}'"))),
        None => Ok(()),
    }
}

/// Coerces and validates one field. `Ok(None)` means an optional field was
/// left out.
fn finish_field(
    spec: &ArgumentSpec,
    raw: Option<RawValue>,
) -> Result<Option<ArgValue>, ArgumentError> {
    let Some(raw) = raw else {
        if let Some(default) = &spec.default {
            return Ok(Some(default.clone()));
        }
        if spec.optional {
            return Ok(None);
        }
        return Err(ArgumentError::new("required value is missing")
            .at(spec.name.clone())
            .with_hint(format!("provide {}", spec.usage_hint())));
    };

    let value = coerce(raw, &spec.kind, &spec.name)?;
    spec.constraints.check(&value, &spec.name)?;

    spec.validators.iter().try_fold(value, |value, validator| {
        validator
            .validate(value)
            .map_err(|message| ArgumentError::new(message).at(spec.name.clone()))
    })
    .map(Some)
}

fn coerce(raw: RawValue, kind: &ArgKind, path: &str) -> Result<ArgValue, ArgumentError> {
    match (raw, kind) {
        (RawValue::List(items), ArgKind::Array(inner)) => items
            .into_iter()
            .enumerate()
            .map(|(index, item)| {
                coerce_text(&item, inner)
                    .map_err(|message| ArgumentError::new(message).at(format!("{path}.{index}")))
            })
            .collect::<Result<Vec<_>, _>>()
            .map(ArgValue::Array),
        (RawValue::Flag(flag), ArgKind::Boolean) => Ok(ArgValue::Boolean(flag)),
        (RawValue::Flag(_), other) => {
            Err(ArgumentError::new(format!("expected {other}, received a flag")).at(path))
        }
        (RawValue::Text(text), kind) => {
            coerce_text(&text, kind).map_err(|message| ArgumentError::new(message).at(path))
        }
        (RawValue::List(_), other) => {
            Err(ArgumentError::new(format!("expected {other}, received a list")).at(path))
        }
    }
}

/// Converts one string to `kind`.
///
/// # Examples
///
/// ```
/// use command_router_core::{ArgKind, ArgValue, coerce_text};
///
/// assert_eq!(coerce_text("42", &ArgKind::Number), Ok(ArgValue::Number(42.0)));
/// assert_eq!(coerce_text("false", &ArgKind::Boolean), Ok(ArgValue::Boolean(false)));
/// assert!(coerce_text("abc", &ArgKind::Number).is_err());
/// ```
pub fn coerce_text(text: &str, kind: &ArgKind) -> Result<ArgValue, String> {
    let mismatch = || format!("expected {kind}, received '{text}'");
    match kind {
        ArgKind::String => Ok(ArgValue::String(text.to_string())),
        ArgKind::Number => text
            .trim()
            .parse::<f64>()
            .ok()
            .filter(|n| n.is_finite())
            .map(ArgValue::Number)
            .ok_or_else(mismatch),
        ArgKind::Boolean => match text.to_ascii_lowercase().as_str() {
            "true" => Ok(ArgValue::Boolean(true)),
            "false" => Ok(ArgValue::Boolean(false)),
            _ => Err(mismatch()),
        },
        ArgKind::Date => parse_date(text.trim())
            .map(ArgValue::Date)
            .ok_or_else(mismatch),
        ArgKind::BigInt => text
            .trim()
            .parse::<i128>()
            .map(ArgValue::BigInt)
            .map_err(|_| mismatch()),
        ArgKind::Array(inner) => coerce_text(text, inner).map(|item| ArgValue::Array(vec![item])),
    }
}

fn parse_date(text: &str) -> Option<DateTime<Utc>> {
    if let Ok(date) = DateTime::parse_from_rfc3339(text) {
        return Some(date.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(text, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

fn unknown_option(option: &str) -> ArgumentError {
    ArgumentError::new(format!("unknown option: {option}"))
}

fn requires_value(option: &str, spec: &ArgumentSpec) -> ArgumentError {
    ArgumentError::new(format!("option {option} requires a value"))
        .at(spec.name.clone())
        .with_hint(format!("provide {option} <value>"))
}
