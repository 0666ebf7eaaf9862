//! Well-known file and directory names.

use std::path::Path;

/// Standard micropy filesystem markers and paths.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MicropyPath {
    /// The project manifest, `micropy.json`
    ProjectManifest,
    /// The hidden per-project data directory, `.micropy`
    DataDir,
    /// Per-key scratch file inside the data directory
    Cache,
    /// Stub package descriptor, `info.json`
    StubInfo,
    /// Device stub subtree
    StubsDir,
    /// Frozen module subtree
    FrozenDir,
    /// Python distribution metadata file
    PkgInfo,
    /// Installed stubs directory under the micropy home
    StubsRoot,
}

impl MicropyPath {
    /// Get the string representation of the path.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ProjectManifest => "micropy.json",
            Self::DataDir => ".micropy",
            Self::Cache => ".cache",
            Self::StubInfo => "info.json",
            Self::StubsDir => "stubs",
            Self::FrozenDir => "frozen",
            Self::PkgInfo => "PKG-INFO",
            Self::StubsRoot => "stubs",
        }
    }
}

impl AsRef<Path> for MicropyPath {
    fn as_ref(&self) -> &Path {
        Path::new(self.as_str())
    }
}

impl AsRef<str> for MicropyPath {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl std::fmt::Display for MicropyPath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
