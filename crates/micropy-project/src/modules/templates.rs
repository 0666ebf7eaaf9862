//! The Templates module: editor and project files rendered from the Context

use std::any::Any;

use micropy_fs::ServiceLog;
use micropy_templates::{CheckMode, TemplateProvider};
use serde_json::{Map, Value, json};

use crate::Result;
use crate::module::{ProjectModule, ProjectState};

/// Templates the manifest can switch on and off under `config`.
pub const TOGGLE_KEYS: &[&str] = &["vscode", "pylint"];

#[derive(Debug)]
pub struct TemplatesModule {
    keys: Vec<String>,
    provider: TemplateProvider,
    check_mode: CheckMode,
    log: ServiceLog,
}

impl TemplatesModule {
    pub const PRIORITY: i32 = 0;

    pub fn new<S: AsRef<str>>(keys: &[S], log: ServiceLog) -> Result<Self> {
        let keys: Vec<String> = keys.iter().map(|k| k.as_ref().to_string()).collect();
        let provider = TemplateProvider::new(keys.as_slice(), log.clone())?;
        Ok(Self {
            keys,
            provider,
            check_mode: CheckMode::default(),
            log,
        })
    }

    pub fn with_check_mode(mut self, mode: CheckMode) -> Self {
        self.check_mode = mode;
        self.provider = self.provider.with_check_mode(mode);
        self
    }

    pub fn keys(&self) -> &[String] {
        &self.keys
    }

    fn toggles(&self) -> Map<String, Value> {
        TOGGLE_KEYS
            .iter()
            .map(|key| (key.to_string(), json!(self.keys.iter().any(|k| k == *key))))
            .collect()
    }

    fn rebuild(&mut self, keys: Vec<String>) -> Result<()> {
        self.provider =
            TemplateProvider::new(keys.as_slice(), self.log.clone())?.with_check_mode(self.check_mode);
        self.keys = keys;
        Ok(())
    }
}

impl ProjectModule for TemplatesModule {
    fn name(&self) -> &'static str {
        "templates"
    }

    fn priority(&self) -> i32 {
        Self::PRIORITY
    }

    fn config(&self) -> Value {
        json!({ "config": self.toggles() })
    }

    /// Switch toggle templates to match the manifest's `config` section.
    fn load(&mut self, state: &mut ProjectState) -> Result<()> {
        let Some(toggles) = state.config.get_opt("config").and_then(Value::as_object) else {
            return Ok(());
        };
        let mut keys: Vec<String> = self
            .keys
            .iter()
            .filter(|k| !TOGGLE_KEYS.contains(&k.as_str()))
            .cloned()
            .collect();
        for key in TOGGLE_KEYS {
            if toggles.get(*key).and_then(Value::as_bool).unwrap_or(false) {
                keys.push(key.to_string());
            }
        }
        self.rebuild(keys)
    }

    fn create(&mut self, state: &mut ProjectState) -> Result<()> {
        let ctx = state.template_context()?;
        let written = self.provider.render_all(&ctx)?;
        self.log
            .info(format_args!("rendered {} project files", written.len()));
        Ok(())
    }

    fn update(&mut self, state: &mut ProjectState) -> Result<()> {
        let ctx = state.template_context()?;
        for path in self.provider.update_all(&ctx)? {
            self.log.debug(format_args!("refreshed {path}"));
        }
        Ok(())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}
