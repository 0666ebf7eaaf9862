//! Error types for micropy-project

use std::path::PathBuf;

use micropy_stubs::ErrorKind;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Stubs(#[from] micropy_stubs::Error),

    #[error(transparent)]
    Config(#[from] micropy_config::Error),

    #[error(transparent)]
    Templates(#[from] micropy_templates::Error),

    #[error(transparent)]
    Fs(#[from] micropy_fs::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error("No project found at {path}")]
    ProjectNotFound { path: PathBuf },

    #[error("Package not found: {name}")]
    PackageNotFound { name: String },

    #[error("Failed to fetch package {package}: {source}")]
    PackageFetch {
        package: String,
        source: micropy_stubs::Error,
    },

    #[error("Invalid requirement '{spec}': {message}")]
    InvalidRequirement { spec: String, message: String },

    #[error("No hook '{name}' accepts {arguments}")]
    HookNotFound { name: String, arguments: String },

    #[error("Invalid arguments for hook '{name}': {message}")]
    HookArguments { name: String, message: String },
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Stubs(e) => e.kind(),
            Self::Config(micropy_config::Error::Invalid { .. }) => ErrorKind::ConfigInvalid,
            Self::Config(_) | Self::Json(_) => ErrorKind::Other,
            Self::Templates(_) => ErrorKind::Other,
            Self::Fs(_) => ErrorKind::Io,
            Self::ProjectNotFound { .. } | Self::PackageNotFound { .. } | Self::HookNotFound { .. } => {
                ErrorKind::NotFound
            }
            Self::PackageFetch { .. } => ErrorKind::Transport,
            Self::InvalidRequirement { .. } | Self::HookArguments { .. } => ErrorKind::Validation,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fetch_failure_is_transport() {
        let err = Error::PackageFetch {
            package: "picoweb".into(),
            source: micropy_stubs::Error::transport("https://pypi.org", "timed out"),
        };
        assert_eq!(err.kind(), ErrorKind::Transport);
        assert!(err.to_string().contains("picoweb"));
    }

    #[test]
    fn test_stub_errors_keep_their_kind() {
        let err = Error::from(micropy_stubs::Error::StubNotFound {
            name: "esp32".into(),
        });
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }
}
