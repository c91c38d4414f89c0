//! Error conversion helpers for file and TOML operations
//!
//! Attach the affected path to lower-level errors.

use std::fmt::Display;
use std::io;
use std::path::Path;

use crate::application::{ApplicationError, ApplicationResult};

/// Extension trait for converting `io::Result` to `ApplicationResult` with context.
pub trait IoResultExt<T> {
    /// Add path context to an I/O error.
    ///
    /// # Example
    /// ```ignore
    /// fs.read_to_string(&path)
    ///     .with_path_context("read site file", &path)?;
    /// ```
    fn with_path_context(self, action: &str, path: &Path) -> ApplicationResult<T>;
}

impl<T> IoResultExt<T> for io::Result<T> {
    fn with_path_context(self, action: &str, path: &Path) -> ApplicationResult<T> {
        self.map_err(|e| ApplicationError::OperationFailed {
            context: format!("{}: {}", action, path.display()),
            source: Box::new(e),
        })
    }
}

/// Extension trait for parse/serialize results of site and config files.
pub trait FormatResultExt<T> {
    /// Map the error to [`ApplicationError::Site`] for `path`.
    fn site_context(self, path: &Path) -> ApplicationResult<T>;

    /// Map the error to [`ApplicationError::Config`], naming `path`.
    fn config_context(self, path: &Path) -> ApplicationResult<T>;
}

impl<T, E: Display> FormatResultExt<T> for Result<T, E> {
    fn site_context(self, path: &Path) -> ApplicationResult<T> {
        self.map_err(|e| ApplicationError::Site {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }

    fn config_context(self, path: &Path) -> ApplicationResult<T> {
        self.map_err(|e| ApplicationError::Config {
            message: format!("parse {}: {}", path.display(), e),
        })
    }
}
