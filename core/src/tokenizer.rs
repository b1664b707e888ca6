//! Command string tokenizer.
//!
//! Splits a raw command line into tokens with POSIX-like quoting rules but
//! without any shell semantics: there is no globbing, no variable or
//! command substitution, and no pipelines. Characters such as `;`, `|` or
//! `$` are ordinary token content unless [`TokenizerMode::Strict`] is
//! selected.
//!
//! # Examples
//!
//! ```
//! use command_router_core::tokenize;
//!
//! let tokens = tokenize(r#"search "hello world" --tag 'a b' x\ y"#).unwrap();
//! assert_eq!(tokens, vec!["search", "hello world", "--tag", "a b", "x y"]);
//!
//! assert!(tokenize("echo 'unterminated").is_err());
//! ```

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{ParseError, QuoteKind};

/// Maximum length of a command string, in characters.
pub const MAX_INPUT_LENGTH: usize = 10_000;
/// Maximum length of a single token, in characters.
pub const MAX_TOKEN_LENGTH: usize = 10_000;
/// Maximum number of tokens in one command.
pub const MAX_TOKEN_COUNT: usize = 100;

const SHELL_METACHARACTERS: &[char] = &[';', '|', '&', '`', '$', '(', ')', '<', '>'];

/// Policy for shell metacharacters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenizerMode {
    /// Every character is literal text (the default).
    #[default]
    Literal,
    /// Reject unquoted or double-quoted shell metacharacters. Single-quoted
    /// and backslash-escaped occurrences are still accepted.
    Strict,
}

/// Tokenizes `input` with [`TokenizerMode::Literal`].
///
/// # Errors
///
/// Returns a [`ParseError`] for an unclosed quote or when one of the size
/// limits ([`MAX_INPUT_LENGTH`], [`MAX_TOKEN_LENGTH`], [`MAX_TOKEN_COUNT`])
/// is exceeded.
pub fn tokenize(input: &str) -> Result<Vec<String>, ParseError> {
    tokenize_with(input, TokenizerMode::Literal)
}

/// Tokenizes `input` under the given metacharacter policy.
///
/// # Errors
///
/// Same as [`tokenize`], plus [`ParseError::ForbiddenCharacter`] in strict
/// mode.
///
/// # Examples
///
/// ```
/// use command_router_core::{ParseError, TokenizerMode, tokenize_with};
///
/// assert_eq!(
///     tokenize_with("ls; rm", TokenizerMode::Strict),
///     Err(ParseError::ForbiddenCharacter(';')),
/// );
/// assert_eq!(
///     tokenize_with("grep 'a|b'", TokenizerMode::Strict).unwrap(),
///     vec!["grep", "a|b"],
/// );
/// ```
pub fn tokenize_with(input: &str, mode: TokenizerMode) -> Result<Vec<String>, ParseError> {
    let length = input.chars().count();
    if length > MAX_INPUT_LENGTH {
        return Err(ParseError::InputTooLong {
            length,
            max: MAX_INPUT_LENGTH,
        });
    }

    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut in_single = false;
    let mut in_double = false;
    let mut escaped = false;

    for ch in input.chars() {
        if escaped {
            current.push(ch);
            escaped = false;
            continue;
        }

        match ch {
            '\\' if !in_single => escaped = true,
            '\'' if !in_double => in_single = !in_single,
            '"' if !in_single => in_double = !in_double,
            c if c.is_whitespace() && !in_single && !in_double => {
                finish_token(&mut tokens, &mut current)?;
            }
            c => {
                if mode == TokenizerMode::Strict && !in_single && SHELL_METACHARACTERS.contains(&c)
                {
                    return Err(ParseError::ForbiddenCharacter(c));
                }
                current.push(c);
            }
        }
    }

    if in_single {
        return Err(ParseError::UnclosedQuote(QuoteKind::Single));
    }
    if in_double {
        return Err(ParseError::UnclosedQuote(QuoteKind::Double));
    }
    // A trailing backslash has nothing to escape and is kept as text.
    if escaped {
        current.push('\\');
    }
    finish_token(&mut tokens, &mut current)?;

    debug!(tokens = tokens.len(), "tokenized command");
    Ok(tokens)
}

fn finish_token(tokens: &mut Vec<String>, current: &mut String) -> Result<(), ParseError> {
    if current.is_empty() {
        return Ok(());
    }
    let length = current.chars().count();
    if length > MAX_TOKEN_LENGTH {
        return Err(ParseError::TokenTooLong {
            length,
            max: MAX_TOKEN_LENGTH,
        });
    }
    if tokens.len() >= MAX_TOKEN_COUNT {
        return Err(ParseError::TooManyTokens {
            max: MAX_TOKEN_COUNT,
        });
    }
    tokens.push(std::mem::take(current));
    Ok(())
}
