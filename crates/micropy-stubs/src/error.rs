//! Error types for micropy-stubs

use std::path::PathBuf;

/// Result type for stub operations
pub type Result<T> = std::result::Result<T, Error>;

/// Abstract failure categories surfaced to the command layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    NotFound,
    Validation,
    Integrity,
    Duplicate,
    Transport,
    ConfigInvalid,
    Io,
    Other,
}

impl ErrorKind {
    pub fn label(&self) -> &'static str {
        match self {
            Self::NotFound => "not found",
            Self::Validation => "validation",
            Self::Integrity => "integrity",
            Self::Duplicate => "duplicate",
            Self::Transport => "transport",
            Self::ConfigInvalid => "invalid config",
            Self::Io => "io",
            Self::Other => "error",
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Errors raised by the stub subsystem
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// No locator or repository could resolve the requested stub
    #[error("stub not found: {name}")]
    StubNotFound { name: String },

    /// `info.json` failed both the device and firmware schemas
    #[error("invalid stub at {path}: {}", errors.join("; "))]
    StubValidation { path: PathBuf, errors: Vec<String> },

    /// The stub directory has no `info.json`
    #[error("stub at {path} is missing info.json")]
    StubIntegrity { path: PathBuf },

    #[error("stub already installed: {name}")]
    StubExists { name: String },

    /// Network fetch failed or the URL is malformed
    #[error("failed to fetch {url}: {message}")]
    Transport { url: String, message: String },

    /// Archive bytes did not match the published digest
    #[error("checksum mismatch for {url}: expected {expected}, got {actual}")]
    ChecksumMismatch {
        url: String,
        expected: String,
        actual: String,
    },

    #[error("failed to extract archive: {message}")]
    Archive { message: String },

    /// A repository document matched none of the registered manifest schemas
    #[error("unrecognized repository manifest from {origin}")]
    ManifestUnrecognized { origin: String },

    /// Stub metadata could not be read or parsed
    #[error("malformed metadata at {path}: {message}")]
    Metadata { path: PathBuf, message: String },

    #[error("invalid stub schema: {0}")]
    Schema(String),

    #[error("Filesystem error: {0}")]
    Fs(#[from] micropy_fs::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    pub fn transport(url: impl Into<String>, message: impl std::fmt::Display) -> Self {
        Self::Transport {
            url: url.into(),
            message: message.to_string(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::StubNotFound { .. } => ErrorKind::NotFound,
            Self::StubValidation { .. } | Self::Schema(_) => ErrorKind::Validation,
            Self::StubIntegrity { .. } | Self::Metadata { .. } => ErrorKind::Integrity,
            Self::StubExists { .. } => ErrorKind::Duplicate,
            Self::Transport { .. } | Self::ChecksumMismatch { .. } => ErrorKind::Transport,
            Self::Archive { .. } | Self::ManifestUnrecognized { .. } => ErrorKind::Other,
            Self::Fs(_) => ErrorKind::Io,
            Self::Json(_) => ErrorKind::Other,
        }
    }
}
