//! Locators: turning a user-supplied stub location into a local directory
//!
//! A location is a repository name, an archive URL, an archive file or a
//! directory. The manager runs each [`Locator`] in turn; a locator either
//! produces a ready directory or hands a (possibly rewritten) request to
//! the next one.

use std::path::{Path, PathBuf};

use micropy_fs::ServiceLog;

use crate::fetch::{self, Progress, Unpacked};
use crate::repository::StubRepository;
use crate::{Error, Result};

/// What the caller asked for, plus anything learned along the chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocateRequest {
    pub location: String,
    /// Expected archive digest, when a repository published one.
    pub checksum: Option<String>,
}

impl LocateRequest {
    pub fn new(location: impl Into<String>) -> Self {
        Self {
            location: location.into(),
            checksum: None,
        }
    }
}

/// A local stub directory, kept alive for as long as it is needed.
#[derive(Debug)]
pub enum LocatedDir {
    /// A directory owned by someone else.
    Borrowed(PathBuf),
    /// A directory inside a temporary extraction, removed on drop.
    Unpacked(Unpacked),
}

impl LocatedDir {
    pub fn path(&self) -> &Path {
        match self {
            Self::Borrowed(path) => path,
            Self::Unpacked(unpacked) => unpacked.root(),
        }
    }
}

/// Outcome of a single locator.
#[derive(Debug)]
pub enum Located {
    Ready(LocatedDir),
    Next(LocateRequest),
}

pub trait Locator: std::fmt::Debug {
    fn name(&self) -> &'static str;

    fn prepare(&self, request: LocateRequest, progress: &mut dyn Progress) -> Result<Located>;
}

/// Rewrites repository package names into archive URLs.
#[derive(Debug)]
pub struct RepoLocator {
    repository: StubRepository,
    log: ServiceLog,
}

impl RepoLocator {
    pub fn new(repository: StubRepository, log: ServiceLog) -> Self {
        Self { repository, log }
    }
}

impl Locator for RepoLocator {
    fn name(&self) -> &'static str {
        "repository"
    }

    fn prepare(&self, request: LocateRequest, _progress: &mut dyn Progress) -> Result<Located> {
        if fetch::is_url(&request.location) || Path::new(&request.location).exists() {
            return Ok(Located::Next(request));
        }
        match self.repository.resolve_package(&request.location) {
            Ok(entry) => {
                let url = entry.url()?;
                self.log
                    .debug(format_args!("resolved {} to {url}", request.location));
                // Repositories mirrored on disk publish file:// sources.
                let location = match url.to_file_path() {
                    Ok(path) if url.scheme() == "file" => path.to_string_lossy().into_owned(),
                    _ => url.to_string(),
                };
                Ok(Located::Next(LocateRequest {
                    location,
                    checksum: entry.checksum().map(str::to_string),
                }))
            }
            Err(Error::StubNotFound { .. }) => Ok(Located::Next(request)),
            Err(e) => Err(e),
        }
    }
}

/// Downloads (or reads) gzipped tarballs and unpacks them.
#[derive(Debug)]
pub struct RemoteLocator {
    log: ServiceLog,
}

impl RemoteLocator {
    pub fn new(log: ServiceLog) -> Self {
        Self { log }
    }

    fn read_bytes(&self, request: &LocateRequest, progress: &mut dyn Progress) -> Result<Vec<u8>> {
        if fetch::is_url(&request.location) {
            self.log.info(format_args!("downloading {}", request.location));
            return fetch::download(&request.location, progress);
        }
        std::fs::read(&request.location)
            .map_err(|e| micropy_fs::Error::io(&request.location, e).into())
    }
}

impl Locator for RemoteLocator {
    fn name(&self) -> &'static str {
        "remote"
    }

    fn prepare(&self, request: LocateRequest, progress: &mut dyn Progress) -> Result<Located> {
        let local_archive =
            fetch::is_archive(&request.location) && Path::new(&request.location).is_file();
        if !fetch::is_url(&request.location) && !local_archive {
            return Ok(Located::Next(request));
        }
        let bytes = self.read_bytes(&request, progress)?;
        if let Some(expected) = request.checksum.as_deref() {
            fetch::verify(&request.location, &bytes, expected)?;
        }
        let unpacked = Unpacked::from_bytes(&bytes)?;
        Ok(Located::Ready(LocatedDir::Unpacked(unpacked)))
    }
}

/// Accepts an existing directory as-is.
#[derive(Debug, Default)]
pub struct LocalLocator;

impl Locator for LocalLocator {
    fn name(&self) -> &'static str {
        "local"
    }

    fn prepare(&self, request: LocateRequest, _progress: &mut dyn Progress) -> Result<Located> {
        let path = PathBuf::from(&request.location);
        if path.is_dir() {
            Ok(Located::Ready(LocatedDir::Borrowed(path)))
        } else {
            Ok(Located::Next(request))
        }
    }
}

/// Run `locators` in order until one produces a directory.
pub fn locate(
    locators: &[Box<dyn Locator>],
    location: &str,
    progress: &mut dyn Progress,
) -> Result<LocatedDir> {
    let mut request = LocateRequest::new(location);
    for locator in locators {
        match locator.prepare(request, progress)? {
            Located::Ready(dir) => return Ok(dir),
            Located::Next(next) => request = next,
        }
    }
    Err(Error::StubNotFound {
        name: location.to_string(),
    })
}
