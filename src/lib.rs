//! pagebounds: placement rules for page templates
//!
//! Templates may be marked unique, first-level-only or no-children, and the
//! page tree may be limited to a maximum navigation depth. The rules are
//! enforced when pages are submitted through [`application::PageForm`] and
//! when they are moved in the tree through [`application::services::PageAdmin`].

pub mod application;
pub mod cli;
pub mod config;
pub mod domain;
pub mod exitcode;
pub mod infrastructure;
pub mod tree_traits;
pub mod util;
