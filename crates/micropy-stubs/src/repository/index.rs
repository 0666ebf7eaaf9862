//! Searchable index over available stub packages
//!
//! Each registered manifest contributes one immutable [`IndexLayer`].
//! Adding a repository never mutates existing layers; it returns a new
//! [`StubRepository`] sharing the old layers plus one on top, so clones
//! and iterators taken earlier stay valid.

use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap};
use std::path::Path;
use std::sync::Arc;

use micropy_fs::{NormalizedPath, ServiceLog, io};
use serde_json::Value;
use url::Url;

use super::manifest::{StubPackage, StubsManifest};
use crate::fetch;
use crate::{Error, Result};

/// A package paired with the manifest that published it.
#[derive(Debug, Clone)]
pub struct RepositoryEntry {
    manifest: Arc<StubsManifest>,
    package: StubPackage,
}

impl RepositoryEntry {
    pub fn new(manifest: Arc<StubsManifest>, package: StubPackage) -> Self {
        Self { manifest, package }
    }

    pub fn manifest(&self) -> &StubsManifest {
        &self.manifest
    }

    pub fn package(&self) -> &StubPackage {
        &self.package
    }

    pub fn repo_name(&self) -> &str {
        &self.manifest.repository().name
    }

    pub fn name(&self) -> &str {
        &self.package.name
    }

    pub fn version(&self) -> &str {
        &self.package.version
    }

    pub fn checksum(&self) -> Option<&str> {
        self.package.sha256sum.as_deref()
    }

    /// `name-version`
    pub fn versioned_name(&self) -> String {
        format!("{}-{}", self.name(), self.version())
    }

    /// `repo/name`
    pub fn absolute_name(&self) -> String {
        format!("{}/{}", self.repo_name(), self.name())
    }

    /// `repo/name-version`
    pub fn absolute_versioned_name(&self) -> String {
        format!("{}/{}", self.repo_name(), self.versioned_name())
    }

    /// Names that address this exact entry.
    pub fn matchers(&self) -> [String; 3] {
        [
            self.absolute_versioned_name(),
            self.versioned_name(),
            self.absolute_name(),
        ]
    }

    pub fn url(&self) -> Result<Url> {
        self.manifest.resolve_package_url(&self.package)
    }

    fn cmp_version(&self, other: &Self) -> Ordering {
        self.manifest
            .compare_versions(self.version(), other.version())
    }
}

impl std::fmt::Display for RepositoryEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.absolute_versioned_name())
    }
}

/// Indexes contributed by one manifest.
#[derive(Debug, Default)]
pub struct IndexLayer {
    by_absolute_versioned: HashMap<String, RepositoryEntry>,
    by_name: BTreeMap<String, Vec<RepositoryEntry>>,
}

impl IndexLayer {
    fn from_manifest(manifest: Arc<StubsManifest>) -> Self {
        let mut layer = Self::default();
        for package in manifest.packages() {
            let entry = RepositoryEntry::new(Arc::clone(&manifest), package.clone());
            layer
                .by_absolute_versioned
                .insert(entry.absolute_versioned_name(), entry.clone());
            layer
                .by_name
                .entry(entry.name().to_string())
                .or_default()
                .push(entry);
        }
        layer
    }
}

/// The catalog of available stub packages.
#[derive(Debug, Clone)]
pub struct StubRepository {
    layers: Vec<Arc<IndexLayer>>,
    log: ServiceLog,
}

impl Default for StubRepository {
    fn default() -> Self {
        Self::new(ServiceLog::new("repository"))
    }
}

impl StubRepository {
    pub fn new(log: ServiceLog) -> Self {
        Self {
            layers: Vec::new(),
            log,
        }
    }

    /// Fetch each source document and register it. A source naming an
    /// existing file is read from disk.
    pub fn from_sources(sources: &[String], log: ServiceLog) -> Result<Self> {
        let mut repo = Self::new(log);
        for source in sources {
            let document = if Path::new(source).is_file() {
                serde_json::from_str(&io::read_text(&NormalizedPath::new(source))?)?
            } else {
                fetch::fetch_json(source)?
            };
            repo = repo.add_repository(&document, source)?;
        }
        Ok(repo)
    }

    /// A new repository with `document` layered on top of this one.
    pub fn add_repository(&self, document: &Value, origin: &str) -> Result<Self> {
        let manifest = Arc::new(StubsManifest::decode(document, origin)?);
        self.log.debug(format_args!(
            "registered {} repository '{}' ({} packages) from {origin}",
            manifest.schema(),
            manifest.repository().name,
            manifest.packages().len()
        ));
        let mut layers = self.layers.clone();
        layers.push(Arc::new(IndexLayer::from_manifest(manifest)));
        Ok(Self {
            layers,
            log: self.log.clone(),
        })
    }

    pub fn is_empty(&self) -> bool {
        self.layers.iter().all(|l| l.by_absolute_versioned.is_empty())
    }

    /// Number of indexed packages across all repositories.
    pub fn len(&self) -> usize {
        self.layers.iter().map(|l| l.by_absolute_versioned.len()).sum()
    }

    /// Look up an entry by `repo/name-version`.
    pub fn get(&self, absolute_versioned_name: &str) -> Option<&RepositoryEntry> {
        self.layers
            .iter()
            .rev()
            .find_map(|l| l.by_absolute_versioned.get(absolute_versioned_name))
    }

    /// Every indexed name, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self
            .layers
            .iter()
            .flat_map(|l| l.by_name.keys().map(String::as_str))
            .collect();
        names.sort_unstable();
        names.dedup();
        names
    }

    /// All versions of `name`, oldest first.
    pub fn versions(&self, name: &str) -> Vec<&RepositoryEntry> {
        let mut entries: Vec<&RepositoryEntry> = self
            .layers
            .iter()
            .filter_map(|l| l.by_name.get(name))
            .flatten()
            .collect();
        entries.sort_by(|a, b| a.cmp_version(b));
        entries
    }

    /// Latest version of `name`.
    pub fn latest(&self, name: &str) -> Option<&RepositoryEntry> {
        self.versions(name).into_iter().last()
    }

    /// Case-insensitive substring search over package names.
    ///
    /// With `include_versions` every version is yielded; otherwise only
    /// the latest version of each matching name.
    pub fn search(&self, query: &str, include_versions: bool) -> Vec<&RepositoryEntry> {
        let needle = query.to_lowercase();
        self.names()
            .into_iter()
            .filter(|name| name.to_lowercase().contains(&needle))
            .flat_map(|name| {
                if include_versions {
                    self.versions(name)
                } else {
                    self.latest(name).into_iter().collect()
                }
            })
            .collect()
    }

    /// Resolve `name` to a single entry.
    ///
    /// `name` may be an absolute versioned name, a versioned name, an
    /// absolute name, or a bare package name (resolving to the latest
    /// version).
    pub fn resolve_package(&self, name: &str) -> Result<&RepositoryEntry> {
        let matches = |entry: &&RepositoryEntry| {
            entry.matchers().iter().any(|m| m == name) || entry.name() == name
        };
        self.search("", false)
            .into_iter()
            .find(matches)
            .or_else(|| self.search("", true).into_iter().find(matches))
            .ok_or_else(|| Error::StubNotFound {
                name: name.to_string(),
            })
    }

    /// Latest version of every package.
    pub fn iter_latest(&self) -> impl Iterator<Item = &RepositoryEntry> {
        self.search("", false).into_iter()
    }
}
