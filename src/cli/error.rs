//! CLI-level errors (wraps infrastructure errors)

use std::io::ErrorKind;

use thiserror::Error;

use crate::application::ApplicationError;
use crate::infrastructure::InfraError;

/// CLI errors are the top-level error type.
/// These are what get displayed to the user.
#[derive(Error, Debug)]
pub enum CliError {
    #[error("{0}")]
    Infra(#[from] InfraError),

    #[error("{0}")]
    Usage(String),
}

impl From<ApplicationError> for CliError {
    fn from(e: ApplicationError) -> Self {
        CliError::Infra(InfraError::Application(e))
    }
}

/// Result type for CLI operations.
pub type CliResult<T> = Result<T, CliError>;

impl CliError {
    /// Get the appropriate exit code for this error.
    pub fn exit_code(&self) -> i32 {
        match self {
            CliError::Usage(_) => crate::exitcode::USAGE,
            CliError::Infra(e) => match e {
                InfraError::Io { source, .. } if source.kind() == ErrorKind::NotFound => {
                    crate::exitcode::NOINPUT
                }
                InfraError::Io { .. } => crate::exitcode::IOERR,
                InfraError::Serialize { .. } => crate::exitcode::DATAERR,
                InfraError::Application(ApplicationError::Config { .. }) => {
                    crate::exitcode::CONFIG
                }
                InfraError::Application(ApplicationError::FingerprintMismatch { .. }) => {
                    crate::exitcode::DATAERR
                }
                InfraError::Application(ApplicationError::ServiceNotFound { .. }) => {
                    crate::exitcode::NOINPUT
                }
                InfraError::Application(_) => crate::exitcode::SOFTWARE,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn given_missing_file_when_mapping_exit_code_then_noinput() {
        let err = CliError::from(InfraError::io(
            "read dump.toml",
            std::io::Error::from(ErrorKind::NotFound),
        ));
        assert_eq!(err.exit_code(), crate::exitcode::NOINPUT);
    }

    #[test]
    fn given_fingerprint_mismatch_when_mapping_exit_code_then_dataerr() {
        let err = CliError::from(ApplicationError::FingerprintMismatch {
            expected: "a".into(),
            actual: "b".into(),
        });
        assert_eq!(err.exit_code(), crate::exitcode::DATAERR);
    }
}
