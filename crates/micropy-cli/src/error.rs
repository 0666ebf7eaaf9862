//! Error types for micropy-cli

use micropy_stubs::ErrorKind;

/// Result type for CLI operations
pub type Result<T> = std::result::Result<T, CliError>;

/// Errors that can occur in CLI operations
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    #[error(transparent)]
    Project(#[from] micropy_project::Error),

    #[error(transparent)]
    Stubs(#[from] micropy_stubs::Error),

    #[error(transparent)]
    Fs(#[from] micropy_fs::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// User-facing error with a message
    #[error("{message}")]
    User { message: String },
}

impl CliError {
    pub fn user(message: impl Into<String>) -> Self {
        Self::User {
            message: message.into(),
        }
    }

    /// Category recorded in the debug log when a command fails.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Project(e) => e.kind(),
            Self::Stubs(e) => e.kind(),
            Self::Fs(_) | Self::Io(_) => ErrorKind::Io,
            Self::User { .. } => ErrorKind::Other,
        }
    }
}
