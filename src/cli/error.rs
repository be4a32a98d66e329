//! CLI-level errors (wraps infrastructure errors)

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

    #[error("cannot render output: {0}")]
    Render(#[from] serde_json::Error),
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
            CliError::Render(_) => crate::exitcode::SOFTWARE,
            CliError::Infra(e) => match e {
                InfraError::Io { .. } => crate::exitcode::IOERR,
                InfraError::SnapshotMissing(_) => crate::exitcode::NOINPUT,
                InfraError::Snapshot { .. } => crate::exitcode::DATAERR,
                InfraError::Application(app) => match app {
                    ApplicationError::Access { .. } => crate::exitcode::NOPERM,
                    ApplicationError::Upstream { .. } => crate::exitcode::UNAVAILABLE,
                    ApplicationError::Config { .. } | ApplicationError::Domain(_) => {
                        crate::exitcode::CONFIG
                    }
                },
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use rstest::rstest;

    use super::*;
    use crate::exitcode;
    use crate::infrastructure::FetchError;

    #[rstest]
    #[case(ApplicationError::Access { config_id: "c".into() }.into(), exitcode::NOPERM)]
    #[case(ApplicationError::Upstream { context: "visit 1".into(), source: FetchError::Unavailable("down".into()) }.into(), exitcode::UNAVAILABLE)]
    #[case(ApplicationError::Config { message: "bad".into() }.into(), exitcode::CONFIG)]
    #[case(CliError::Infra(InfraError::SnapshotMissing(PathBuf::from("x"))), exitcode::NOINPUT)]
    #[case(CliError::Usage("no command".into()), exitcode::USAGE)]
    fn given_error_when_mapping_then_uses_sysexits_code(#[case] err: CliError, #[case] code: i32) {
        assert_eq!(err.exit_code(), code);
    }
}
