//! The [`ProjectModule`] contract and the state modules operate on

use std::any::Any;
use std::fmt::Debug;

use micropy_config::Config;
use micropy_fs::{MicropyPath, NormalizedPath, ServiceLog};
use micropy_templates::TemplateContext;
use serde_json::{Value, json};

use crate::hooks::{HookCall, HookSpec};
use crate::{Error, Result};

/// Shared project state handed to every module call.
///
/// `config` is the persisted manifest (`micropy.json`); `context` is an
/// in-memory tree modules use to publish data to one another.
#[derive(Debug)]
pub struct ProjectState {
    path: NormalizedPath,
    data_dir: NormalizedPath,
    pub config: Config,
    pub context: Config,
    log: ServiceLog,
}

impl ProjectState {
    pub fn new(path: NormalizedPath, config: Config, log: ServiceLog) -> Self {
        let data_dir = path.join(MicropyPath::DataDir.as_str());
        Self {
            path,
            data_dir,
            config,
            context: Config::in_memory(json!({})),
            log,
        }
    }

    pub fn path(&self) -> &NormalizedPath {
        &self.path
    }

    /// The hidden per-project data directory.
    pub fn data_dir(&self) -> &NormalizedPath {
        &self.data_dir
    }

    /// Scratch file for module bookkeeping, inside the data directory.
    pub fn cache_path(&self) -> NormalizedPath {
        self.data_dir.join(MicropyPath::Cache.as_str())
    }

    /// Project name from the manifest, else the directory name.
    pub fn name(&self) -> String {
        self.config
            .get_opt("name")
            .and_then(Value::as_str)
            .map(str::to_string)
            .or_else(|| self.path.file_name().map(str::to_string))
            .unwrap_or_else(|| "project".to_string())
    }

    pub fn log(&self) -> &ServiceLog {
        &self.log
    }

    /// The current Context, shaped for template rendering.
    pub fn template_context(&self) -> Result<TemplateContext> {
        let mut ctx = TemplateContext::from_value(self.path.clone(), &self.context.raw())?;
        ctx.name = Some(self.name());
        Ok(ctx)
    }
}

/// A pluggable unit of project behavior.
///
/// On create, modules run in descending [`priority`](Self::priority);
/// before each module's `create`, its [`config`](Self::config) fragment
/// is merged into the manifest and its [`context`](Self::context)
/// fragment into the Context.
pub trait ProjectModule: Debug {
    fn name(&self) -> &'static str;

    fn priority(&self) -> i32 {
        0
    }

    /// Manifest fragment contributed by this module.
    fn config(&self) -> Value {
        json!({})
    }

    /// Context fragment contributed by this module.
    fn context(&self, _state: &ProjectState) -> Value {
        json!({})
    }

    fn load(&mut self, state: &mut ProjectState) -> Result<()>;

    fn create(&mut self, state: &mut ProjectState) -> Result<()>;

    fn update(&mut self, state: &mut ProjectState) -> Result<()>;

    fn hooks(&self) -> Vec<HookSpec> {
        Vec::new()
    }

    fn call_hook(&mut self, call: &HookCall, _state: &mut ProjectState) -> Result<Value> {
        Err(Error::HookNotFound {
            name: call.name.clone(),
            arguments: call.describe_args(),
        })
    }

    fn as_any(&self) -> &dyn Any;

    fn as_any_mut(&mut self) -> &mut dyn Any;
}
