//! Registry definition files and hot-swappable registries.
//!
//! This crate loads command trees from YAML or JSON definition files into
//! validated [`CommandRegistry`](command_router_core::CommandRegistry)
//! values and keeps the active one behind a [`RegistryHandle`] that can be
//! reloaded while readers hold snapshots.
//!
//! # Quick start
//!
//! ```no_run
//! use command_router_registry::{RegistryDefinition, RegistryHandle};
//!
//! // One-shot load
//! let registry = RegistryDefinition::load("commands.yaml")
//!     .unwrap()
//!     .into_registry()
//!     .unwrap();
//! println!("{} top-level commands", registry.len());
//!
//! // Long-lived handle with reload
//! let handle = RegistryHandle::load("commands.yaml").unwrap();
//! let invocation = handle.resolve("search rust --limit 5").unwrap();
//! println!("dispatching to {:?}", invocation.handler);
//! if handle.reload_from("commands.yaml").unwrap() {
//!     println!("definitions changed");
//! }
//! ```

mod definition;
mod error;
mod handle;

pub use definition::{ArgDefinition, CommandDefinition, RegistryDefinition};
pub use error::{LoadError, Result};
pub use handle::RegistryHandle;
