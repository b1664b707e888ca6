//! Field validators.
//!
//! A field's value passes through two layers after coercion: the built-in
//! [`Constraints`] (bounds, choices, pattern) and then any number of custom
//! [`FieldValidator`]s attached to the [`ArgumentSpec`](crate::ArgumentSpec).

use std::fmt;

use regex::Regex;
use serde::{Serialize, Serializer};

use crate::error::ArgumentError;
use crate::types::ArgValue;

/// A validation capability for one field.
///
/// Receives the coerced value and returns it (possibly transformed) or a
/// human-readable failure message. The parser attaches the field path.
///
/// # Examples
///
/// ```
/// use command_router_core::{ArgValue, FieldValidator, validator_fn};
///
/// let even = validator_fn("even", |value| match value {
///     ArgValue::Number(n) if n % 2.0 == 0.0 => Ok(value),
///     _ => Err("must be even".to_string()),
/// });
/// assert!(even.validate(ArgValue::Number(4.0)).is_ok());
/// assert_eq!(even.validate(ArgValue::Number(3.0)), Err("must be even".to_string()));
/// ```
pub trait FieldValidator: fmt::Debug + Send + Sync {
    fn validate(&self, value: ArgValue) -> Result<ArgValue, String>;
}

/// Closure-backed [`FieldValidator`], built with [`validator_fn`].
pub struct FnValidator<F> {
    name: &'static str,
    check: F,
}

impl<F> fmt::Debug for FnValidator<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnValidator")
            .field("name", &self.name)
            .finish()
    }
}

impl<F> FieldValidator for FnValidator<F>
where
    F: Fn(ArgValue) -> Result<ArgValue, String> + Send + Sync,
{
    fn validate(&self, value: ArgValue) -> Result<ArgValue, String> {
        (self.check)(value)
    }
}

/// Wraps a closure as a named [`FieldValidator`].
pub fn validator_fn<F>(name: &'static str, check: F) -> FnValidator<F>
where
    F: Fn(ArgValue) -> Result<ArgValue, String> + Send + Sync,
{
    FnValidator { name, check }
}

/// Compiled regular expression that serializes as its source text.
#[derive(Debug, Clone)]
pub struct Pattern(Regex);

impl Pattern {
    /// Compiles `source`.
    ///
    /// # Errors
    ///
    /// Returns the [`regex::Error`] if `source` is not a valid expression.
    pub fn new(source: &str) -> Result<Self, regex::Error> {
        Regex::new(source).map(Self)
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }

    pub fn is_match(&self, text: &str) -> bool {
        self.0.is_match(text)
    }
}

impl Serialize for Pattern {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// Declarative constraints checked after coercion.
///
/// - `min`/`max` bound numbers and big integers by value, strings by
///   character count and arrays by element count.
/// - `choices` restricts string values (each element, for arrays).
/// - `pattern` must match string values (each element, for arrays).
#[derive(Debug, Clone, Default, Serialize)]
pub struct Constraints {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub choices: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pattern: Option<Pattern>,
}

impl Constraints {
    pub fn is_empty(&self) -> bool {
        self.min.is_none() && self.max.is_none() && self.choices.is_empty() && self.pattern.is_none()
    }

    /// Checks `value`, reporting failures against `path`.
    pub fn check(&self, value: &ArgValue, path: &str) -> Result<(), ArgumentError> {
        match value {
            ArgValue::Array(items) => {
                self.check_bounds(items.len() as f64, "items", path)?;
                for (index, item) in items.iter().enumerate() {
                    self.check_text(item, &format!("{path}.{index}"))?;
                }
                Ok(())
            }
            ArgValue::Number(n) => self.check_bounds(*n, "", path),
            ArgValue::BigInt(n) => self.check_bounds(*n as f64, "", path),
            ArgValue::String(s) => {
                self.check_bounds(s.chars().count() as f64, "characters", path)?;
                self.check_text(value, path)
            }
            ArgValue::Boolean(_) | ArgValue::Date(_) => Ok(()),
        }
    }

    fn check_bounds(&self, measured: f64, unit: &str, path: &str) -> Result<(), ArgumentError> {
        let suffix = if unit.is_empty() {
            String::new()
        } else {
            format!(" {unit}")
        };
        if let Some(min) = self.min.filter(|min| measured < *min) {
            return Err(ArgumentError::new(format!("must be at least {min}{suffix}")).at(path));
        }
        if let Some(max) = self.max.filter(|max| measured > *max) {
            return Err(ArgumentError::new(format!("must be at most {max}{suffix}")).at(path));
        }
        Ok(())
    }

    fn check_text(&self, value: &ArgValue, path: &str) -> Result<(), ArgumentError> {
        let ArgValue::String(text) = value else {
            return Ok(());
        };
        if !self.choices.is_empty() && !self.choices.iter().any(|c| c == text) {
            return Err(ArgumentError::new(format!(
                "must be one of: {} (received '{text}')",
                self.choices.join(", ")
            ))
            .at(path));
        }
        if let Some(pattern) = self.pattern.as_ref().filter(|p| !p.is_match(text)) {
            return Err(
                ArgumentError::new(format!("must match pattern {}", pattern.as_str())).at(path),
            );
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_number_bounds() {
        let c = Constraints {
            min: Some(1.0),
            max: Some(10.0),
            ..Default::default()
        };
        assert!(c.check(&ArgValue::Number(5.0), "n").is_ok());
        let err = c.check(&ArgValue::Number(11.0), "n").unwrap_err();
        assert_eq!(err.message, "must be at most 10");
        assert_eq!(err.path.as_deref(), Some("n"));
        assert!(c.check(&ArgValue::BigInt(0), "n").is_err());
    }

    #[test]
    fn test_string_length_bounds() {
        let c = Constraints {
            min: Some(2.0),
            ..Default::default()
        };
        let err = c.check(&ArgValue::String("a".into()), "name").unwrap_err();
        assert_eq!(err.message, "must be at least 2 characters");
    }

    #[test]
    fn test_choices_apply_to_array_elements() {
        let c = Constraints {
            choices: vec!["json".into(), "yaml".into()],
            ..Default::default()
        };
        let value = ArgValue::Array(vec![
            ArgValue::String("json".into()),
            ArgValue::String("toml".into()),
        ]);
        let err = c.check(&value, "format").unwrap_err();
        assert_eq!(err.path.as_deref(), Some("format.1"));
        assert!(err.message.contains("json, yaml"));
    }

    #[test]
    fn test_pattern() {
        let c = Constraints {
            pattern: Some(Pattern::new("^[a-z]+$").unwrap()),
            ..Default::default()
        };
        assert!(c.check(&ArgValue::String("abc".into()), "id").is_ok());
        assert!(c.check(&ArgValue::String("ABC".into()), "id").is_err());
    }

    #[test]
    fn test_array_length_bounds() {
        let c = Constraints {
            max: Some(1.0),
            ..Default::default()
        };
        let value = ArgValue::Array(vec![ArgValue::Number(1.0), ArgValue::Number(2.0)]);
        let err = c.check(&value, "ids").unwrap_err();
        assert_eq!(err.message, "must be at most 1 items");
    }
}
