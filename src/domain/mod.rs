//! Domain layer: templates, the page tree and placement rules
//!
//! This layer is independent of external concerns (no I/O, no CLI, no config loading).

pub mod arena;
pub mod bounds;
pub mod error;
pub mod template;

pub use arena::{MovePosition, Page, PageArena, PageData, PageId, PageTree};
pub use bounds::{PlacementValidator, Violation, ViolationKind};
pub use error::{DomainError, DomainResult, PlacementError};
pub use template::{Region, Template, TemplateRegistry};

/// Expand environment variables in a path string.
///
/// Supports `$VAR`, `${VAR}` and `~` for the home directory.
pub fn expand_env_vars(path: &str) -> String {
    shellexpand::full(path)
        .map(|s| s.into_owned())
        .unwrap_or_else(|_| path.to_string())
}
