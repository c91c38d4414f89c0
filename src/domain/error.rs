//! Domain-level errors (no external dependencies)

use thiserror::Error;

use crate::domain::arena::PageId;

/// Reasons a template may not be placed where it was asked to go.
///
/// All variants are recoverable: callers map them to user-facing messages.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PlacementError {
    #[error("template already in use: {key}")]
    TemplateInUse { key: String },

    #[error("template not allowed as child: {key}")]
    NotAllowedAsChild { key: String },

    #[error("parent cannot have children")]
    ParentCannotHaveChildren,

    #[error("only {max} levels allowed")]
    DepthExceeded { max: usize },
}

/// Domain errors represent business logic violations.
/// These are independent of infrastructure concerns.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    #[error(transparent)]
    Placement(#[from] PlacementError),

    #[error("unknown template: {0}")]
    UnknownTemplate(String),

    #[error("page not found: {0}")]
    PageNotFound(PageId),

    #[error("template already registered: {0}")]
    DuplicateTemplate(String),

    #[error("duplicate page slug: {0}")]
    DuplicateSlug(String),

    #[error("cannot move page {page} below itself")]
    InvalidMove { page: PageId },
}

/// Result type for domain operations.
pub type DomainResult<T> = Result<T, DomainError>;
