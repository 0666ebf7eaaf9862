//! Shared command environment
//!
//! Resolves where installed stubs live and which repository sources to
//! consult, and assembles the stub manager and project module graph that
//! the commands operate on.

use std::path::{Path, PathBuf};

use micropy_fs::ServiceLog;
use micropy_project::{PackagesModule, Project, PypiFetcher, StubsModule, TemplatesModule};
use micropy_stubs::repository::DEFAULT_SOURCES;
use micropy_stubs::{DeviceStub, StubManager, StubRepository};
use micropy_templates::BUILTIN_KEYS;

use crate::error::{CliError, Result};

/// Directory under the user's home used when `--home` is not given.
pub const DEFAULT_HOME_DIR: &str = ".micropy";

#[derive(Debug, Clone)]
pub struct Environment {
    home: PathBuf,
    sources: Vec<String>,
    log: ServiceLog,
}

impl Environment {
    /// Resolve the environment from command-line values, falling back to
    /// `~/.micropy` and the public stub repositories.
    pub fn resolve(home: Option<PathBuf>, sources: Vec<String>) -> Result<Self> {
        let home = match home {
            Some(home) => home,
            None => dirs::home_dir()
                .map(|dir| dir.join(DEFAULT_HOME_DIR))
                .ok_or_else(|| CliError::user("Could not determine the home directory; pass --home"))?,
        };
        let sources = if sources.is_empty() {
            DEFAULT_SOURCES.iter().map(|s| s.to_string()).collect()
        } else {
            sources
        };
        Ok(Self {
            home,
            sources,
            log: ServiceLog::new("micropy"),
        })
    }

    pub fn home(&self) -> &Path {
        &self.home
    }

    /// Where installed stubs live.
    pub fn stubs_root(&self) -> PathBuf {
        self.home.join("stubs")
    }

    pub fn sources(&self) -> &[String] {
        &self.sources
    }

    /// Load the stub repository index.
    ///
    /// When `strict` is false an unreachable source degrades to an empty
    /// index so commands that only need installed stubs keep working.
    pub fn repository(&self, strict: bool) -> Result<StubRepository> {
        let log = self.log.child("repository");
        match StubRepository::from_sources(&self.sources, log.clone()) {
            Ok(repository) => Ok(repository),
            Err(e) if !strict => {
                log.warn(format_args!("stub repositories unavailable: {e}"));
                Ok(StubRepository::new(log))
            }
            Err(e) => Err(e.into()),
        }
    }

    pub fn stub_manager(&self, strict: bool) -> Result<StubManager> {
        let repository = self.repository(strict)?;
        let log = self.log.child("stubs");
        let progress_log = log.child("download");
        let manager = StubManager::new(self.stubs_root(), repository, log)?.with_progress(
            move |transferred: u64, total: Option<u64>| match total {
                Some(total) => progress_log.debug(format_args!("{transferred}/{total} bytes")),
                None => progress_log.debug(format_args!("{transferred} bytes")),
            },
        );
        Ok(manager)
    }

    /// Assemble the full module graph for the project at `path`.
    pub fn project<S: AsRef<str>>(
        &self,
        path: &Path,
        name: Option<&str>,
        manager: StubManager,
        stubs: Vec<DeviceStub>,
        templates: &[S],
    ) -> Result<Project> {
        let log = self.log.child("project");
        let project = Project::new(path, name, log.clone())?
            .with_module(StubsModule::new(manager, stubs, log.child("stubs")))
            .with_module(PackagesModule::new(
                PypiFetcher::new(log.child("pypi")),
                log.child("packages"),
            ))
            .with_module(PackagesModule::dev(log.child("dev-packages")))
            .with_module(TemplatesModule::new(templates, log.child("templates"))?);
        Ok(project)
    }

    /// Open and load an existing project.
    pub fn load_project(&self, path: &Path) -> Result<Project> {
        let manager = self.stub_manager(false)?;
        let mut project = self.project(path, None, manager, Vec::new(), BUILTIN_KEYS)?;
        if !project.exists() {
            return Err(CliError::user(format!(
                "No micropy project found in {}. Run 'micropy init' first.",
                path.display()
            )));
        }
        project.load()?;
        Ok(project)
    }
}
