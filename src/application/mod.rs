//! Application layer: forms and services
//!
//! This layer orchestrates domain logic and depends on I/O boundary traits.

pub mod error;
pub mod error_ext;
pub mod form;
pub mod services;

pub use error::{ApplicationError, ApplicationResult};
pub use error_ext::{FormatResultExt, IoResultExt};
pub use form::{BoundForm, CleanedPage, FormErrors, FormField, PageForm, PageSubmission};
