//! Normalized path handling for cross-platform compatibility

use std::path::{Path, PathBuf};

/// A path normalized to use forward slashes internally.
///
/// Rendered editor settings and the project manifest store paths as
/// strings; keeping them forward-slashed makes those files identical
/// across platforms. Conversion back to a native path happens only at
/// I/O boundaries.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NormalizedPath {
    /// Internal representation always uses forward slashes
    inner: String,
}

impl NormalizedPath {
    /// Create a new NormalizedPath from any path-like input.
    pub fn new(path: impl AsRef<Path>) -> Self {
        let path_str = path.as_ref().to_string_lossy();
        let mut normalized = path_str.replace('\\', "/");
        while normalized.len() > 1 && normalized.ends_with('/') {
            normalized.pop();
        }
        Self { inner: normalized }
    }

    /// Get the internal normalized string representation.
    pub fn as_str(&self) -> &str {
        &self.inner
    }

    /// Convert to a platform-native PathBuf for I/O operations.
    pub fn to_native(&self) -> PathBuf {
        PathBuf::from(&self.inner)
    }

    /// Join this path with a segment.
    pub fn join(&self, segment: &str) -> Self {
        let segment_normalized = segment.replace('\\', "/");
        let joined = if self.inner.ends_with('/') {
            format!("{}{}", self.inner, segment_normalized)
        } else {
            format!("{}/{}", self.inner, segment_normalized)
        };
        Self { inner: joined }
    }

    /// Get the parent directory.
    pub fn parent(&self) -> Option<Self> {
        let trimmed = self.inner.trim_end_matches('/');
        match trimmed.rfind('/') {
            Some(idx) if idx > 0 => Some(Self {
                inner: trimmed[..idx].to_string(),
            }),
            Some(0) => Some(Self {
                inner: "/".to_string(),
            }),
            _ => None,
        }
    }

    /// Get the file name component.
    pub fn file_name(&self) -> Option<&str> {
        let trimmed = self.inner.trim_end_matches('/');
        trimmed.rsplit('/').next().filter(|name| !name.is_empty())
    }

    /// Check if this path exists on the filesystem.
    pub fn exists(&self) -> bool {
        self.to_native().exists()
    }

    /// Check if this is a directory.
    pub fn is_dir(&self) -> bool {
        self.to_native().is_dir()
    }

    /// Check if this is a file.
    pub fn is_file(&self) -> bool {
        self.to_native().is_file()
    }

    /// Return this path relative to `base`, if it lies underneath it.
    ///
    /// Comparison is by path segments, so `/a/bc` is not inside `/a/b`.
    /// A path equal to `base` yields `"."`.
    pub fn relative_to(&self, base: &NormalizedPath) -> Option<NormalizedPath> {
        if self.inner == base.inner {
            return Some(Self {
                inner: ".".to_string(),
            });
        }
        let prefix = if base.inner.ends_with('/') {
            base.inner.clone()
        } else {
            format!("{}/", base.inner)
        };
        self.inner.strip_prefix(&prefix).map(|rest| Self {
            inner: rest.to_string(),
        })
    }

    /// Whether this path lies underneath (or equals) `base`.
    pub fn starts_with(&self, base: &NormalizedPath) -> bool {
        self.relative_to(base).is_some()
    }
}

impl AsRef<Path> for NormalizedPath {
    fn as_ref(&self) -> &Path {
        Path::new(&self.inner)
    }
}

impl std::fmt::Display for NormalizedPath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.inner)
    }
}

impl From<&str> for NormalizedPath {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for NormalizedPath {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

impl From<PathBuf> for NormalizedPath {
    fn from(p: PathBuf) -> Self {
        Self::new(p)
    }
}

impl From<&Path> for NormalizedPath {
    fn from(p: &Path) -> Self {
        Self::new(p)
    }
}

impl From<&PathBuf> for NormalizedPath {
    fn from(p: &PathBuf) -> Self {
        Self::new(p)
    }
}

impl From<&NormalizedPath> for NormalizedPath {
    fn from(p: &NormalizedPath) -> Self {
        p.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn test_backslashes_normalized() {
        let path = NormalizedPath::new("C:\\work\\proj");
        assert_eq!(path.as_str(), "C:/work/proj");
    }

    #[test]
    fn test_trailing_slash_trimmed() {
        assert_eq!(NormalizedPath::new("/a/b/").as_str(), "/a/b");
        assert_eq!(NormalizedPath::new("/").as_str(), "/");
    }

    #[rstest]
    #[case("/proj/.micropy/esp32", "/proj", Some(".micropy/esp32"))]
    #[case("/proj", "/proj", Some("."))]
    #[case("/project/src", "/proj", None)]
    #[case("/other/lib", "/proj", None)]
    fn test_relative_to(#[case] path: &str, #[case] base: &str, #[case] expected: Option<&str>) {
        let rel = NormalizedPath::new(path).relative_to(&NormalizedPath::new(base));
        assert_eq!(rel.as_ref().map(|p| p.as_str()), expected);
    }

    #[test]
    fn test_file_name() {
        let path = NormalizedPath::new("/a/settings.json");
        assert_eq!(path.file_name(), Some("settings.json"));
        assert_eq!(NormalizedPath::new("/a/.pylintrc/").file_name(), Some(".pylintrc"));
    }

    #[test]
    fn test_parent() {
        let path = NormalizedPath::new("/a/b/c");
        assert_eq!(path.parent().unwrap().as_str(), "/a/b");
        assert_eq!(NormalizedPath::new("/a").parent().unwrap().as_str(), "/");
        assert!(NormalizedPath::new("a").parent().is_none());
    }
}
