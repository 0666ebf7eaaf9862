//! Error types for micropy-config

use std::path::PathBuf;

/// Result type for config operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while reading or mutating a config tree
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The backing file exists but is unreadable or not a JSON object
    #[error("Invalid configuration at {path}: {message}")]
    Invalid { path: PathBuf, message: String },

    /// A strict mutation addressed a key whose parent does not exist
    #[error("Key not found: {key}")]
    KeyNotFound { key: String },

    /// A key path walked into a value that cannot hold children
    #[error("Cannot address '{key}': {found} is not a container")]
    NotAContainer { key: String, found: &'static str },

    /// A sequence operation addressed a non-sequence leaf
    #[error("Expected a sequence at '{key}', found {found}")]
    NotASequence { key: String, found: &'static str },

    #[error("Filesystem error: {0}")]
    Fs(#[from] micropy_fs::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
