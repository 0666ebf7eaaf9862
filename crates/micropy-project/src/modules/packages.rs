//! The Packages and DevPackages modules

use std::any::Any;
use std::path::Path;

use micropy_config::Config;
use micropy_fs::{NormalizedPath, ServiceLog};
use serde_json::{Map, Value, json};

use crate::hooks::{HookCall, HookSpec};
use crate::module::{ProjectModule, ProjectState};
use crate::package::{self, PackageFetcher};
use crate::requirement::{self, Requirement};
use crate::{Error, Result};

/// Runtime or development dependencies of a project.
///
/// Requirements are kept as `name → spec` under [`key`](Self::key) in
/// the manifest and mirrored to a requirements file. Runtime packages
/// with a fetcher are downloaded and stubbed into the per-project package
/// directory; editable packages are referenced in place.
#[derive(Debug)]
pub struct PackagesModule {
    dev: bool,
    packages: Map<String, Value>,
    fetcher: Option<Box<dyn PackageFetcher>>,
    log: ServiceLog,
}

impl PackagesModule {
    pub const PRIORITY: i32 = 8;
    pub const DEV_PRIORITY: i32 = 7;

    /// Runtime packages, fetched through `fetcher`.
    pub fn new(fetcher: impl PackageFetcher + 'static, log: ServiceLog) -> Self {
        Self {
            dev: false,
            packages: Map::new(),
            fetcher: Some(Box::new(fetcher)),
            log,
        }
    }

    /// Development packages. These are recorded but never stubbed.
    pub fn dev(log: ServiceLog) -> Self {
        Self {
            dev: true,
            packages: Map::new(),
            fetcher: None,
            log,
        }
    }

    pub fn is_dev(&self) -> bool {
        self.dev
    }

    /// Manifest key holding the requirements.
    pub fn key(&self) -> &'static str {
        if self.dev { "dev-packages" } else { "packages" }
    }

    pub fn requirements_file(&self) -> &'static str {
        if self.dev {
            "dev-requirements.txt"
        } else {
            "requirements.txt"
        }
    }

    pub fn packages(&self) -> &Map<String, Value> {
        &self.packages
    }

    fn defaults(&self) -> Map<String, Value> {
        let mut defaults = Map::new();
        if self.dev {
            defaults.insert("micropy-cli".to_string(), json!("*"));
        }
        defaults
    }

    pub fn requirements(&self) -> Result<Vec<Requirement>> {
        self.packages
            .iter()
            .map(|(name, value)| Requirement::from_manifest(name, value.as_str().unwrap_or("*")))
            .collect()
    }

    /// Where fetched packages are materialized.
    pub fn package_dir(state: &ProjectState) -> NormalizedPath {
        state.data_dir().join(&state.name())
    }

    /// Editable package directories, plus the package directory once it
    /// holds anything.
    fn local_paths(&self, state: &ProjectState) -> Result<Vec<NormalizedPath>> {
        let mut paths: Vec<NormalizedPath> = self
            .requirements()?
            .iter()
            .filter_map(|req| req.editable.as_deref())
            .map(|path| editable_path(state.path(), path))
            .collect();
        let package_dir = Self::package_dir(state);
        if !self.dev && has_entries(&package_dir) {
            paths.push(package_dir);
        }
        Ok(paths)
    }

    fn publish(&self, state: &mut ProjectState) -> Result<()> {
        let paths: Vec<Value> = self
            .local_paths(state)?
            .iter()
            .map(|p| json!(p.as_str()))
            .collect();
        state.context.extend("local_paths", paths)?;
        Ok(())
    }

    fn write_requirements(&self, state: &ProjectState) -> Result<()> {
        let path = state.path().join(self.requirements_file());
        requirement::write_requirements(&path, &self.requirements()?)
    }

    fn install_cache(state: &ProjectState) -> Result<Config> {
        Ok(Config::json(state.cache_path(), json!({}))?)
    }

    /// Fetch and stub `req` unless it is editable, a dev dependency, or
    /// already installed.
    fn install(&self, req: &Requirement, state: &ProjectState) -> Result<()> {
        let Some(fetcher) = self.fetcher.as_ref() else {
            return Ok(());
        };
        if req.is_editable() {
            return Ok(());
        }
        let mut cache = Self::install_cache(state)?;
        let record = format!("packages/{}", req.name);
        if cache.get_opt(&record).is_some() {
            self.log
                .debug(format_args!("{} is already installed", req.name));
            return Ok(());
        }

        let archive = fetcher.fetch(req)?;
        let installed = package::materialize(&archive, req, &Self::package_dir(state))?;
        for path in &installed {
            self.log.debug(format_args!("installed {path}"));
        }
        cache.add(&record, json!(req.manifest_value()))?;
        self.log.success(format_args!("installed {req}"));
        Ok(())
    }

    fn install_all(&self, state: &ProjectState) -> Result<()> {
        for req in self.requirements()? {
            self.install(&req, state)?;
        }
        Ok(())
    }

    /// Add one requirement. Adding a name that is already present does
    /// nothing and returns `false`.
    pub fn add_package(&mut self, spec: &str, state: &mut ProjectState) -> Result<bool> {
        let req = Requirement::parse(spec)?;
        if self.packages.contains_key(&req.name) {
            self.log
                .info(format_args!("{} is already a dependency", req.name));
            return Ok(false);
        }
        self.install(&req, state)?;

        let value = req.manifest_value();
        self.packages.insert(req.name.clone(), json!(value));
        state
            .config
            .add(&format!("{}/{}", self.key(), req.name), json!(value))?;
        self.write_requirements(state)?;
        self.publish(state)?;
        self.log
            .success(format_args!("added {req} to {}", self.key()));
        Ok(true)
    }

    /// Add every requirement listed in `path`, defaulting to this
    /// module's requirements file in the project. Returns the names
    /// that were new.
    pub fn add_from_file(
        &mut self,
        path: Option<&Path>,
        state: &mut ProjectState,
    ) -> Result<Vec<String>> {
        let path = match path {
            Some(path) => NormalizedPath::new(path),
            None => state.path().join(self.requirements_file()),
        };
        let mut added = Vec::new();
        for req in requirement::read_requirements(&path)? {
            if self.add_package(&req.to_string(), state)? {
                added.push(req.name);
            }
        }
        Ok(added)
    }

    fn sync_from_manifest(&mut self, state: &ProjectState) {
        let mut packages = self.defaults();
        if let Some(listed) = state.config.get_opt(self.key()).and_then(Value::as_object) {
            packages.extend(listed.iter().map(|(k, v)| (k.clone(), v.clone())));
        }
        packages.extend(std::mem::take(&mut self.packages));
        self.packages = packages;
    }
}

fn editable_path(root: &NormalizedPath, path: &str) -> NormalizedPath {
    if Path::new(path).is_absolute() {
        return NormalizedPath::new(path);
    }
    let trimmed = path.trim_start_matches("./");
    if trimmed.is_empty() || trimmed == "." {
        root.clone()
    } else {
        root.join(trimmed)
    }
}

fn has_entries(dir: &NormalizedPath) -> bool {
    std::fs::read_dir(dir.to_native())
        .map(|mut entries| entries.next().is_some())
        .unwrap_or(false)
}

impl ProjectModule for PackagesModule {
    fn name(&self) -> &'static str {
        if self.dev { "dev-packages" } else { "packages" }
    }

    fn priority(&self) -> i32 {
        if self.dev {
            Self::DEV_PRIORITY
        } else {
            Self::PRIORITY
        }
    }

    fn config(&self) -> Value {
        let mut packages = self.defaults();
        packages.extend(self.packages.iter().map(|(k, v)| (k.clone(), v.clone())));
        json!({ self.key(): packages })
    }

    fn context(&self, state: &ProjectState) -> Value {
        let paths: Vec<String> = self
            .local_paths(state)
            .unwrap_or_default()
            .iter()
            .map(ToString::to_string)
            .collect();
        json!({ "local_paths": paths })
    }

    fn load(&mut self, state: &mut ProjectState) -> Result<()> {
        self.sync_from_manifest(state);
        self.publish(state)
    }

    fn create(&mut self, state: &mut ProjectState) -> Result<()> {
        self.sync_from_manifest(state);
        self.install_all(state)?;
        self.write_requirements(state)?;
        self.publish(state)
    }

    fn update(&mut self, state: &mut ProjectState) -> Result<()> {
        self.sync_from_manifest(state);
        self.install_all(state)?;
        self.write_requirements(state)?;
        state.config.merge(self.key(), &Value::Object(self.packages.clone()))?;
        self.publish(state)
    }

    fn hooks(&self) -> Vec<HookSpec> {
        vec![
            HookSpec::new("add_package").with("dev", self.dev),
            HookSpec::new("add_from_file").with("dev", self.dev),
        ]
    }

    fn call_hook(&mut self, call: &HookCall, state: &mut ProjectState) -> Result<Value> {
        match call.name.as_str() {
            "add_package" => {
                let spec = call.get_str("package").ok_or_else(|| Error::HookArguments {
                    name: call.name.clone(),
                    message: "missing 'package'".to_string(),
                })?;
                Ok(json!(self.add_package(spec, state)?))
            }
            "add_from_file" => {
                let path = call.get_str("path").map(Path::new);
                Ok(json!(self.add_from_file(path, state)?))
            }
            _ => Err(Error::HookNotFound {
                name: call.name.clone(),
                arguments: call.describe_args(),
            }),
        }
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}
