//! Shared, swappable registry.
//!
//! Readers take a cheap [`Arc`] snapshot and keep using it for as long as
//! they like; a reload only affects snapshots taken afterwards.

use std::path::Path;
use std::sync::{Arc, PoisonError, RwLock};

use command_router_core::{CommandError, CommandRegistry, Invocation, TokenizerMode};
use tracing::{debug, info, warn};

use crate::definition::RegistryDefinition;
use crate::error::Result;

#[derive(Debug)]
struct Current {
    registry: Arc<CommandRegistry>,
    mode: TokenizerMode,
    fingerprint: Option<String>,
}

/// Thread-safe holder of the active [`CommandRegistry`].
///
/// # Examples
///
/// ```
/// use command_router_core::{CommandNode, CommandRegistry};
/// use command_router_registry::RegistryHandle;
///
/// let handle = RegistryHandle::new(CommandRegistry::new(vec![
///     CommandNode::new("ping", "Ping").with_handler("ping"),
/// ]).unwrap());
///
/// let before = handle.snapshot();
/// handle.replace(CommandRegistry::new(vec![
///     CommandNode::new("pong", "Pong").with_handler("pong"),
/// ]).unwrap());
///
/// assert!(before.find("ping").is_some());
/// assert!(handle.snapshot().find("pong").is_some());
/// assert!(handle.resolve("ping").is_err());
/// ```
#[derive(Debug)]
pub struct RegistryHandle {
    current: RwLock<Current>,
}

impl RegistryHandle {
    /// Wraps an in-memory registry using the literal tokenizer.
    pub fn new(registry: CommandRegistry) -> Self {
        Self {
            current: RwLock::new(Current {
                registry: Arc::new(registry),
                mode: TokenizerMode::Literal,
                fingerprint: None,
            }),
        }
    }

    /// Loads the initial registry from a definition file.
    ///
    /// # Errors
    ///
    /// Any [`LoadError`](crate::LoadError) from reading or validating the
    /// definition.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let definition = RegistryDefinition::load(path)?;
        let handle = Self::from_definition(definition)?;
        info!(path = %path.display(), "loaded command registry");
        Ok(handle)
    }

    /// Builds a handle from an already parsed definition.
    ///
    /// # Errors
    ///
    /// Any conversion or validation error from
    /// [`RegistryDefinition::into_registry`].
    pub fn from_definition(definition: RegistryDefinition) -> Result<Self> {
        let current = build(definition)?;
        Ok(Self {
            current: RwLock::new(current),
        })
    }

    /// The registry active right now.
    pub fn snapshot(&self) -> Arc<CommandRegistry> {
        Arc::clone(&self.read().registry)
    }

    pub fn tokenizer_mode(&self) -> TokenizerMode {
        self.read().mode
    }

    /// Fingerprint of the definition the active registry came from, if it
    /// was loaded from one.
    pub fn fingerprint(&self) -> Option<String> {
        self.read().fingerprint.clone()
    }

    /// Swaps in `registry`, keeping the current tokenizer mode.
    pub fn replace(&self, registry: CommandRegistry) {
        let mut current = self.write();
        current.registry = Arc::new(registry);
        current.fingerprint = None;
        debug!("replaced command registry");
    }

    /// Re-reads `path` and swaps in the result if its fingerprint differs
    /// from the active one.
    ///
    /// Returns `Ok(true)` if a new registry was installed, `Ok(false)` if the
    /// file was unchanged. On error the active registry stays in place.
    ///
    /// # Errors
    ///
    /// Any [`LoadError`](crate::LoadError) from reading or validating the
    /// definition.
    pub fn reload_from(&self, path: impl AsRef<Path>) -> Result<bool> {
        let path = path.as_ref();
        let loaded = RegistryDefinition::load(path).and_then(|definition| {
            if self.fingerprint().as_deref() == Some(definition.fingerprint()) {
                return Ok(None);
            }
            build(definition).map(Some)
        });

        match loaded {
            Ok(Some(next)) => {
                *self.write() = next;
                info!(path = %path.display(), "reloaded command registry");
                Ok(true)
            }
            Ok(None) => {
                debug!(path = %path.display(), "registry definition unchanged");
                Ok(false)
            }
            Err(err) => {
                warn!(path = %path.display(), error = %err, "rejected registry reload");
                Err(err)
            }
        }
    }

    /// Resolves `input` against the active registry with its tokenizer
    /// mode.
    ///
    /// # Errors
    ///
    /// See [`CommandRegistry::resolve_with`].
    pub fn resolve(&self, input: &str) -> std::result::Result<Invocation, CommandError> {
        let (registry, mode) = {
            let current = self.read();
            (Arc::clone(&current.registry), current.mode)
        };
        registry.resolve_with(input, mode)
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, Current> {
        self.current.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, Current> {
        self.current.write().unwrap_or_else(PoisonError::into_inner)
    }
}

fn build(definition: RegistryDefinition) -> Result<Current> {
    let mode = definition.tokenizer_mode();
    let fingerprint = definition.fingerprint().to_string();
    let registry = definition.into_registry()?;
    Ok(Current {
        registry: Arc::new(registry),
        mode,
        fingerprint: Some(fingerprint),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use command_router_core::CommandNode;

    fn ping_registry() -> CommandRegistry {
        CommandRegistry::new(vec![CommandNode::new("ping", "Ping").with_handler("ping")]).unwrap()
    }

    #[test]
    fn test_new_handle_has_no_fingerprint() {
        let handle = RegistryHandle::new(ping_registry());
        assert!(handle.fingerprint().is_none());
        assert_eq!(handle.tokenizer_mode(), TokenizerMode::Literal);
        assert_eq!(handle.snapshot().len(), 1);
    }

    #[test]
    fn test_from_definition_keeps_mode_and_fingerprint() {
        let definition = RegistryDefinition::from_yaml_str(
            r#"
strict_tokenizer: true
commands:
  - name: echo
    description: Echo
    handler: echo
    args:
      - name: text
        kind: string
        position: 0
"#,
        )
        .unwrap();
        let expected = definition.fingerprint().to_string();

        let handle = RegistryHandle::from_definition(definition).unwrap();
        assert_eq!(handle.fingerprint(), Some(expected));
        assert_eq!(handle.tokenizer_mode(), TokenizerMode::Strict);
        assert_eq!(handle.resolve("echo 'a;b'").unwrap().args.get_str("text"), Some("a;b"));
        assert_eq!(handle.resolve("echo a;b").unwrap_err().code(), "PARSE_ERROR");
    }

    #[test]
    fn test_replace_leaves_old_snapshots_alone() {
        let handle = RegistryHandle::new(ping_registry());
        let old = handle.snapshot();

        handle.replace(CommandRegistry::default());

        assert_eq!(old.len(), 1);
        assert!(handle.snapshot().is_empty());
    }
}
