//! Error types for micropy-templates

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Filesystem error: {0}")]
    Fs(#[from] micropy_fs::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Config error: {0}")]
    Config(#[from] micropy_config::Error),

    #[error("Unknown template: {key}")]
    UnknownTemplate { key: String },

    #[error("Environment check '{check}' failed for template {template}")]
    CheckFailed { template: String, check: String },
}
