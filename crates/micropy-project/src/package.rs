//! Fetching third-party packages and materializing them into a project

use std::fmt::Debug;
use std::path::{Path, PathBuf};

use micropy_fs::{NormalizedPath, ServiceLog, io};
use micropy_stubs::fetch::{self, NoProgress, Unpacked};
use serde_json::Value;
use walkdir::WalkDir;

use crate::requirement::Requirement;
use crate::stubgen;
use crate::{Error, Result};

/// Source of package archives.
pub trait PackageFetcher: Debug {
    /// Gzipped source distribution for `requirement`.
    fn fetch(&self, requirement: &Requirement) -> Result<Vec<u8>>;
}

/// Fetches source distributions through the PyPI JSON API.
#[derive(Debug, Clone)]
pub struct PypiFetcher {
    index: String,
    log: ServiceLog,
}

impl PypiFetcher {
    pub const DEFAULT_INDEX: &'static str = "https://pypi.org/pypi";

    pub fn new(log: ServiceLog) -> Self {
        Self {
            index: Self::DEFAULT_INDEX.to_string(),
            log,
        }
    }

    pub fn with_index(mut self, index: impl Into<String>) -> Self {
        self.index = index.into().trim_end_matches('/').to_string();
        self
    }

    /// JSON metadata URL for `requirement`, pinned when it has an exact
    /// version.
    pub fn metadata_url(&self, requirement: &Requirement) -> String {
        match requirement.pinned_version() {
            Some(version) => format!("{}/{}/{}/json", self.index, requirement.name, version),
            None => format!("{}/{}/json", self.index, requirement.name),
        }
    }

    /// URL of the source distribution listed in `metadata`.
    pub fn sdist_url(metadata: &Value) -> Option<&str> {
        metadata
            .get("urls")?
            .as_array()?
            .iter()
            .find(|file| file.get("packagetype").and_then(Value::as_str) == Some("sdist"))
            .and_then(|file| file.get("url"))
            .and_then(Value::as_str)
    }
}

impl PackageFetcher for PypiFetcher {
    fn fetch(&self, requirement: &Requirement) -> Result<Vec<u8>> {
        let wrap = |source: micropy_stubs::Error| Error::PackageFetch {
            package: requirement.name.clone(),
            source,
        };
        let metadata = fetch::fetch_json(&self.metadata_url(requirement)).map_err(wrap)?;
        let url = Self::sdist_url(&metadata).ok_or_else(|| Error::PackageNotFound {
            name: requirement.to_string(),
        })?;
        self.log.info(format_args!("downloading {requirement} from {url}"));
        fetch::download(url, &mut NoProgress).map_err(wrap)
    }
}

/// Unpack `archive`, synthesize interface stubs, and move the result into
/// `dest`.
///
/// When the distribution contains an importable package (a directory with
/// `__init__.py`) that directory is moved whole; otherwise only the
/// generated `.pyi` files are. Returns the paths created under `dest`.
pub fn materialize(
    archive: &[u8],
    requirement: &Requirement,
    dest: &NormalizedPath,
) -> Result<Vec<NormalizedPath>> {
    let unpacked = Unpacked::from_bytes(archive)?;
    let root = unpacked.root();
    let generated = synthesize_stubs(root)?;

    let mut installed = Vec::new();
    if let Some(package) = find_package_dir(root, &requirement.name) {
        let name = package
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| requirement.name.clone());
        let target = dest.join(&name);
        io::remove_path(&target.to_native())?;
        io::copy_dir(&package, &target.to_native())?;
        installed.push(target);
    } else {
        for stub in generated {
            let Some(file_name) = stub.file_name().map(|n| n.to_string_lossy().into_owned())
            else {
                continue;
            };
            let target = dest.join(&file_name);
            let content = io::read_text(&NormalizedPath::new(&stub))?;
            io::write_text(&target, &content)?;
            installed.push(target);
        }
    }
    Ok(installed)
}

/// Write a `.pyi` next to every stub-worthy `.py` under `root`.
fn synthesize_stubs(root: &Path) -> Result<Vec<PathBuf>> {
    let sources: Vec<PathBuf> = WalkDir::new(root)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .map(|e| e.into_path())
        .filter(|p| stubgen::is_stub_candidate(p))
        .collect();

    let mut generated = Vec::with_capacity(sources.len());
    for source in sources {
        let text = io::read_text(&NormalizedPath::new(&source))?;
        let stub = source.with_extension("pyi");
        io::write_text(&NormalizedPath::new(&stub), &stubgen::generate(&text))?;
        generated.push(stub);
    }
    generated.sort();
    Ok(generated)
}

/// The shallowest directory holding `__init__.py`, preferring one named
/// after the package.
fn find_package_dir(root: &Path, name: &str) -> Option<PathBuf> {
    let module_name = name.to_lowercase().replace('-', "_");
    WalkDir::new(root)
        .min_depth(1)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_dir() && e.path().join("__init__.py").is_file())
        .min_by_key(|e| {
            let named = e
                .file_name()
                .to_str()
                .is_some_and(|n| n.to_lowercase() == module_name);
            (e.depth(), !named, e.path().to_path_buf())
        })
        .map(|e| e.into_path())
}
