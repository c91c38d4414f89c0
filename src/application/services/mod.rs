//! Application services
//!
//! Concrete service implementations that orchestrate domain logic.
//! Services depend on I/O boundary traits (FileSystem)
//! but are themselves concrete structs, not traits.

mod admin;
mod site;

pub use admin::{
    move_error_message, MoveRejected, MoveRequest, PageAction, PageAdmin, SERVER_ERROR,
};
pub use site::{PageDef, RegionDef, Site, SiteFile, SiteService, TemplateDef};
