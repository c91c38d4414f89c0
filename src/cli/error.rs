//! CLI-level errors (wraps infrastructure errors)

use thiserror::Error;

use crate::application::services::MoveRejected;
use crate::application::ApplicationError;
use crate::domain::DomainError;
use crate::exitcode;
use crate::infrastructure::InfraError;

/// CLI errors are the top-level error type.
/// These are what get displayed to the user.
#[derive(Error, Debug)]
pub enum CliError {
    #[error("{0}")]
    Infra(#[from] InfraError),

    #[error("{0}")]
    Application(#[from] ApplicationError),

    #[error("move rejected: {0}")]
    MoveRejected(#[from] MoveRejected),

    #[error("{0} placement violations")]
    Violations(usize),

    #[error("invalid arguments: {0}")]
    InvalidArgs(String),

    #[error("{0}")]
    Usage(String),
}

impl From<DomainError> for CliError {
    fn from(e: DomainError) -> Self {
        CliError::Application(e.into())
    }
}

/// Result type for CLI operations.
pub type CliResult<T> = Result<T, CliError>;

fn application_exit_code(e: &ApplicationError) -> i32 {
    match e {
        ApplicationError::Domain(_)
        | ApplicationError::InvalidForm(_)
        | ApplicationError::Site { .. } => exitcode::DATAERR,
        ApplicationError::UnknownSlug(_) => exitcode::NOINPUT,
        ApplicationError::Config { .. } => exitcode::CONFIG,
        ApplicationError::OperationFailed { .. } => exitcode::IOERR,
    }
}

impl CliError {
    /// Get the appropriate exit code for this error.
    pub fn exit_code(&self) -> i32 {
        match self {
            CliError::InvalidArgs(_) | CliError::Usage(_) => exitcode::USAGE,
            CliError::Violations(_) => exitcode::VIOLATIONS,
            CliError::MoveRejected(_) => exitcode::DATAERR,
            CliError::Application(e) => application_exit_code(e),
            CliError::Infra(e) => match e {
                InfraError::Io { source, .. } if source.kind() == std::io::ErrorKind::NotFound => {
                    exitcode::NOINPUT
                }
                InfraError::Io { .. } => exitcode::IOERR,
                InfraError::Application(e) => application_exit_code(e),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn given_cli_errors_when_mapping_exit_codes_then_follow_sysexits() {
        assert_eq!(CliError::Violations(2).exit_code(), exitcode::VIOLATIONS);
        assert_eq!(CliError::Usage("x".into()).exit_code(), exitcode::USAGE);
        assert_eq!(
            CliError::from(DomainError::UnknownTemplate("x".into())).exit_code(),
            exitcode::DATAERR
        );
        let missing = InfraError::io(
            "site file not found",
            std::io::Error::new(std::io::ErrorKind::NotFound, "gone"),
        );
        assert_eq!(CliError::from(missing).exit_code(), exitcode::NOINPUT);
        let config = InfraError::from(ApplicationError::Config {
            message: "bad".into(),
        });
        assert_eq!(CliError::from(config).exit_code(), exitcode::CONFIG);
    }
}
