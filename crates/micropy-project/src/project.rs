//! A project: a directory, its manifest, and the modules attached to it

use std::path::Path;

use micropy_config::{Config, deep_merge};
use micropy_fs::{MicropyPath, NormalizedPath, ServiceLog};
use micropy_stubs::StubManager;
use serde_json::{Value, json};

use crate::hooks::{HookCall, HookRegistry};
use crate::module::{ProjectModule, ProjectState};
use crate::modules::StubsModule;
use crate::{Error, Result};

/// A MicroPython project.
///
/// Modules are attached with [`add_module`](Self::add_module) and then
/// driven through [`create`](Self::create), [`load`](Self::load) and
/// [`update`](Self::update). Hooks the modules declare are reachable
/// through [`call`](Self::call) and the typed helpers built on it.
#[derive(Debug)]
pub struct Project {
    state: ProjectState,
    modules: Vec<Box<dyn ProjectModule>>,
    hooks: HookRegistry,
    log: ServiceLog,
}

impl Project {
    /// Open the project at `path`. `name` defaults to the directory name.
    ///
    /// Nothing is written until [`create`](Self::create) or a mutation.
    pub fn new(path: impl Into<NormalizedPath>, name: Option<&str>, log: ServiceLog) -> Result<Self> {
        let path = path.into();
        let name = name
            .map(str::to_string)
            .or_else(|| path.file_name().map(str::to_string))
            .unwrap_or_else(|| "project".to_string());
        let manifest = path.join(MicropyPath::ProjectManifest.as_str());
        let config = Config::json(manifest, json!({ "name": name }))?.with_log(log.child("config"));
        Ok(Self {
            state: ProjectState::new(path, config, log.clone()),
            modules: Vec::new(),
            hooks: HookRegistry::new(),
            log,
        })
    }

    /// Attach a module and register its hooks.
    pub fn add_module(&mut self, module: Box<dyn ProjectModule>) {
        let index = self.modules.len();
        self.hooks.register(index, module.hooks());
        self.log
            .debug(format_args!("attached module {}", module.name()));
        self.modules.push(module);
    }

    pub fn with_module(mut self, module: impl ProjectModule + 'static) -> Self {
        self.add_module(Box::new(module));
        self
    }

    pub fn path(&self) -> &NormalizedPath {
        self.state.path()
    }

    pub fn data_dir(&self) -> &NormalizedPath {
        self.state.data_dir()
    }

    pub fn name(&self) -> String {
        self.state.name()
    }

    /// The persisted manifest.
    pub fn config(&self) -> &Config {
        &self.state.config
    }

    /// The in-memory Context shared between modules.
    pub fn context(&self) -> &Config {
        &self.state.context
    }

    /// Whether a manifest exists on disk.
    pub fn exists(&self) -> bool {
        self.path()
            .join(MicropyPath::ProjectManifest.as_str())
            .is_file()
    }

    /// The first attached module of type `T`.
    pub fn module<T: ProjectModule + 'static>(&self) -> Option<&T> {
        self.modules
            .iter()
            .find_map(|m| m.as_any().downcast_ref::<T>())
    }

    pub fn module_mut<T: ProjectModule + 'static>(&mut self) -> Option<&mut T> {
        self.modules
            .iter_mut()
            .find_map(|m| m.as_any_mut().downcast_mut::<T>())
    }

    pub fn stub_manager(&self) -> Option<&StubManager> {
        self.module::<StubsModule>().map(StubsModule::manager)
    }

    /// Names of every hook the attached modules provide.
    pub fn hook_names(&self) -> Vec<&'static str> {
        self.hooks.names()
    }

    /// Module indices, highest priority first. Equal priorities keep
    /// attachment order.
    fn by_priority(&self) -> Vec<usize> {
        let mut order: Vec<usize> = (0..self.modules.len()).collect();
        order.sort_by_key(|&i| std::cmp::Reverse(self.modules[i].priority()));
        order
    }

    /// Re-read the manifest, with each module's defaults underneath, and
    /// load every module from it.
    pub fn load(&mut self) -> Result<()> {
        if !self.exists() {
            return Err(Error::ProjectNotFound {
                path: self.path().to_native(),
            });
        }
        let mut defaults = json!({ "name": self.state.name() });
        for module in &self.modules {
            deep_merge(&mut defaults, &module.config());
        }
        let manifest = self.path().join(MicropyPath::ProjectManifest.as_str());
        self.state.config = Config::json(manifest, defaults)?.with_log(self.log.child("config"));

        for module in &mut self.modules {
            module.load(&mut self.state)?;
        }
        self.log.info(format_args!("loaded project {}", self.name()));
        Ok(())
    }

    /// Write a new project: each module, highest priority first, merges
    /// its config into the manifest and its context into the Context,
    /// then creates its files.
    pub fn create(&mut self) -> Result<()> {
        let data_dir = self.data_dir().to_native();
        std::fs::create_dir_all(&data_dir).map_err(|e| micropy_fs::Error::io(&data_dir, e))?;

        for index in self.by_priority() {
            let module = &mut self.modules[index];
            self.state.config.merge("", &module.config())?;
            let context = module.context(&self.state);
            self.state.context.merge("", &context)?;
            self.log.debug(format_args!("creating {}", module.name()));
            module.create(&mut self.state)?;
        }
        // Modules that create no state still get a manifest on disk.
        self.state.config.sync()?;
        self.log
            .success(format_args!("created project {}", self.name()));
        Ok(())
    }

    /// Bring every module's files in line with the manifest and Context.
    pub fn update(&mut self) -> Result<()> {
        for index in self.by_priority() {
            self.modules[index].update(&mut self.state)?;
        }
        Ok(())
    }

    /// Dispatch `call` to the module whose hook accepts it.
    pub fn call(&mut self, call: HookCall) -> Result<Value> {
        let index = self.hooks.resolve(&call).ok_or_else(|| Error::HookNotFound {
            name: call.name.clone(),
            arguments: call.describe_args(),
        })?;
        self.modules[index].call_hook(&call, &mut self.state)
    }

    /// Add a stub to the project and refresh its files. Returns the
    /// stub's name.
    pub fn add_stub(&mut self, location: &str, force: bool) -> Result<String> {
        let added = self.call(
            HookCall::new("add_stub")
                .arg("stub", location)
                .arg("force", force),
        )?;
        self.update()?;
        Ok(added.as_str().unwrap_or(location).to_string())
    }

    /// Add a runtime (`dev == false`) or development requirement.
    /// Returns `false` when the package was already listed.
    pub fn add_package(&mut self, spec: &str, dev: bool) -> Result<bool> {
        let added = self.call(
            HookCall::new("add_package")
                .arg("package", spec)
                .arg("dev", dev),
        )?;
        self.update()?;
        Ok(added.as_bool().unwrap_or(false))
    }

    /// Add every requirement in `path` (or the module's requirements
    /// file). Returns the names that were new.
    pub fn add_from_file(&mut self, path: Option<&Path>, dev: bool) -> Result<Vec<String>> {
        let mut call = HookCall::new("add_from_file").arg("dev", dev);
        if let Some(path) = path {
            call = call.arg("path", path.to_string_lossy().into_owned());
        }
        let added = self.call(call)?;
        self.update()?;
        Ok(serde_json::from_value(added)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modules::{PackagesModule, TemplatesModule};
    use micropy_templates::CheckMode;
    use pretty_assertions::assert_eq;
    use std::any::Any;
    use tempfile::TempDir;

    #[derive(Debug)]
    struct Recorder {
        name: &'static str,
        priority: i32,
    }

    impl ProjectModule for Recorder {
        fn name(&self) -> &'static str {
            self.name
        }

        fn priority(&self) -> i32 {
            self.priority
        }

        fn config(&self) -> Value {
            json!({ self.name: true })
        }

        fn load(&mut self, _state: &mut ProjectState) -> Result<()> {
            Ok(())
        }

        fn create(&mut self, state: &mut ProjectState) -> Result<()> {
            state.context.extend("order", vec![json!(self.name)])?;
            Ok(())
        }

        fn update(&mut self, _state: &mut ProjectState) -> Result<()> {
            Ok(())
        }

        fn as_any(&self) -> &dyn Any {
            self
        }

        fn as_any_mut(&mut self) -> &mut dyn Any {
            self
        }
    }

    fn recorder(name: &'static str, priority: i32) -> Recorder {
        Recorder { name, priority }
    }

    #[test]
    fn test_create_runs_highest_priority_first() {
        let temp = TempDir::new().unwrap();
        let mut project = Project::new(temp.path().join("demo"), None, ServiceLog::new("test"))
            .unwrap()
            .with_module(recorder("low", 1))
            .with_module(recorder("high", 9))
            .with_module(recorder("mid", 5));

        project.create().unwrap();

        assert_eq!(
            project.context().get("order", Value::Null),
            json!(["high", "mid", "low"])
        );
        assert_eq!(
            project.config().raw(),
            json!({"name": "demo", "high": true, "mid": true, "low": true})
        );
        assert!(project.exists());
    }

    #[test]
    fn test_load_requires_manifest() {
        let temp = TempDir::new().unwrap();
        let mut project = Project::new(temp.path(), None, ServiceLog::new("test")).unwrap();
        assert!(matches!(
            project.load(),
            Err(Error::ProjectNotFound { .. })
        ));
    }

    #[test]
    fn test_unknown_hook() {
        let temp = TempDir::new().unwrap();
        let mut project = Project::new(temp.path(), None, ServiceLog::new("test"))
            .unwrap()
            .with_module(recorder("only", 0));
        let err = project.call(HookCall::new("add_stub")).unwrap_err();
        assert!(matches!(err, Error::HookNotFound { .. }));
    }

    #[test]
    fn test_module_lookup_by_type() {
        let temp = TempDir::new().unwrap();
        let project = Project::new(temp.path(), Some("Blinky"), ServiceLog::new("test"))
            .unwrap()
            .with_module(PackagesModule::dev(ServiceLog::new("test")))
            .with_module(
                TemplatesModule::new(&["main"], ServiceLog::new("test"))
                    .unwrap()
                    .with_check_mode(CheckMode::Off),
            );

        assert!(project.module::<PackagesModule>().is_some_and(|m| m.is_dev()));
        assert!(project.module::<TemplatesModule>().is_some());
        assert!(project.stub_manager().is_none());
        assert_eq!(project.name(), "Blinky");
        assert_eq!(project.hook_names(), vec!["add_package", "add_from_file"]);
    }
}
