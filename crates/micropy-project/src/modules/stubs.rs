//! The Stubs module: device stubs linked into the project

use std::any::Any;
use std::path::Path;

use micropy_fs::{NormalizedPath, ServiceLog};
use micropy_stubs::{DeviceStub, StubManager};
use serde_json::{Map, Value, json};

use crate::hooks::{HookCall, HookSpec};
use crate::module::{ProjectModule, ProjectState};
use crate::{Error, Result};

pub const STUBS_KEY: &str = "stubs";

/// Keeps `stubs` in the manifest and the stub search paths in the
/// Context in step with the stubs linked under the data directory.
#[derive(Debug)]
pub struct StubsModule {
    manager: StubManager,
    stubs: Vec<DeviceStub>,
    log: ServiceLog,
}

impl StubsModule {
    pub const PRIORITY: i32 = 9;

    pub fn new(manager: StubManager, stubs: Vec<DeviceStub>, log: ServiceLog) -> Self {
        Self {
            manager,
            stubs,
            log,
        }
    }

    pub fn manager(&self) -> &StubManager {
        &self.manager
    }

    pub fn manager_mut(&mut self) -> &mut StubManager {
        &mut self.manager
    }

    pub fn stubs(&self) -> &[DeviceStub] {
        &self.stubs
    }

    /// Search paths: every stub's frozen modules, then every firmware's
    /// frozen modules, then every stub's API stubs. First occurrence wins.
    pub fn paths(&self) -> Vec<NormalizedPath> {
        let frozen = self.stubs.iter().map(DeviceStub::frozen);
        let firmware = self
            .stubs
            .iter()
            .filter_map(DeviceStub::firmware)
            .map(|fw| fw.frozen());
        let api = self.stubs.iter().map(DeviceStub::stubs);

        let mut paths: Vec<NormalizedPath> = Vec::new();
        for path in frozen.chain(firmware).chain(api) {
            if !paths.contains(&path) {
                paths.push(path);
            }
        }
        paths
    }

    fn stub_versions(&self) -> Value {
        let map: Map<String, Value> = self
            .stubs
            .iter()
            .map(|s| (s.name().to_string(), json!(s.stub_version())))
            .collect();
        Value::Object(map)
    }

    fn context_fragment(&self, state: &ProjectState) -> Value {
        let names: Vec<&str> = self.stubs.iter().map(DeviceStub::name).collect();
        let paths: Vec<String> = self.paths().iter().map(ToString::to_string).collect();
        json!({
            "stubs": names,
            "paths": paths,
            "datadir": state.data_dir().as_str(),
        })
    }

    /// Link every stub under the data directory and publish the linked
    /// view to the Context.
    fn resolve(&mut self, state: &mut ProjectState) -> Result<()> {
        self.stubs = self
            .manager
            .resolve_subresource(&self.stubs, &state.data_dir().to_native())?;
        let fragment = self.context_fragment(state);
        for key in ["stubs", "paths", "datadir"] {
            state.context.add(key, fragment[key].clone())?;
        }
        Ok(())
    }

    /// Find a stub listed in the manifest: by path when the entry names
    /// an existing directory, else by name. Names that are not installed
    /// yet are installed through the manager's repository.
    fn locate(&mut self, name: &str, value: &Value) -> Option<DeviceStub> {
        let location = match value.as_str() {
            Some(path) if Path::new(path).is_dir() => path,
            _ => name,
        };
        if let Some(stub) = self.manager.get(location) {
            return Some(stub.clone());
        }
        match self.manager.add(location, false) {
            Ok(added) => added.into_iter().find_map(|s| s.into_device()),
            Err(e) => {
                self.log.warn(format_args!("could not load stub {name}: {e}"));
                None
            }
        }
    }

    /// Add a stub by installed name or by any location the manager
    /// accepts, and link it into the project.
    pub fn add_stub(
        &mut self,
        location: &str,
        force: bool,
        state: &mut ProjectState,
    ) -> Result<DeviceStub> {
        let installed = match self.manager.get(location) {
            Some(stub) if !force => stub.clone(),
            _ => self
                .manager
                .add(location, force)?
                .into_iter()
                .find_map(|s| s.into_device())
                .ok_or_else(|| micropy_stubs::Error::StubNotFound {
                    name: location.to_string(),
                })?,
        };
        let name = installed.name().to_string();
        self.stubs.retain(|s| s.name() != name);
        self.stubs.push(installed);
        self.resolve(state)?;

        let linked = self
            .stubs
            .iter()
            .find(|s| s.name() == name)
            .cloned()
            .ok_or_else(|| micropy_stubs::Error::StubNotFound { name: name.clone() })?;
        state
            .config
            .add(&format!("{STUBS_KEY}/{name}"), json!(linked.stub_version()))?;
        self.log.success(format_args!("added {name} to project"));
        Ok(linked)
    }
}

impl ProjectModule for StubsModule {
    fn name(&self) -> &'static str {
        "stubs"
    }

    fn priority(&self) -> i32 {
        Self::PRIORITY
    }

    fn config(&self) -> Value {
        json!({ STUBS_KEY: self.stub_versions() })
    }

    fn context(&self, state: &ProjectState) -> Value {
        self.context_fragment(state)
    }

    fn load(&mut self, state: &mut ProjectState) -> Result<()> {
        let listed = state
            .config
            .get_opt(STUBS_KEY)
            .and_then(Value::as_object)
            .cloned()
            .unwrap_or_default();

        let mut stubs = Vec::with_capacity(listed.len());
        for (name, value) in &listed {
            match self.locate(name, value) {
                Some(stub) => stubs.push(stub),
                None => self
                    .log
                    .warn(format_args!("stub {name} is not available, skipping")),
            }
        }
        self.stubs = stubs;
        self.resolve(state)
    }

    fn create(&mut self, state: &mut ProjectState) -> Result<()> {
        self.resolve(state)?;
        self.log
            .debug(format_args!("linked {} stubs", self.stubs.len()));
        Ok(())
    }

    fn update(&mut self, state: &mut ProjectState) -> Result<()> {
        self.resolve(state)?;
        state.config.merge(STUBS_KEY, &self.stub_versions())?;
        Ok(())
    }

    fn hooks(&self) -> Vec<HookSpec> {
        vec![HookSpec::new("add_stub")]
    }

    fn call_hook(&mut self, call: &HookCall, state: &mut ProjectState) -> Result<Value> {
        match call.name.as_str() {
            "add_stub" => {
                let location = call.get_str("stub").ok_or_else(|| Error::HookArguments {
                    name: call.name.clone(),
                    message: "missing 'stub'".to_string(),
                })?;
                let force = call.get_bool("force", false);
                let stub = self.add_stub(location, force, state)?;
                Ok(json!(stub.name()))
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
