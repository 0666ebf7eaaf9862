//! Available (not yet installed) stub packages

mod index;
mod manifest;

pub use index::{IndexLayer, RepositoryEntry, StubRepository};
pub use manifest::{
    MicropyManifest, MicropythonManifest, PYPI_PACKAGES, RepositoryInfo, StubPackage,
    StubsManifest, lenient_semver,
};

/// Public stub repositories consulted when none are configured.
pub const DEFAULT_SOURCES: &[&str] =
    &["https://raw.githubusercontent.com/BradenM/micropy-stubs/master/source.json"];
