//! Renders a chosen set of templates into a project

use micropy_fs::{NormalizedPath, ServiceLog};

use crate::checks::CheckMode;
use crate::context::TemplateContext;
use crate::template::{self, Template};
use crate::{Error, Result};

/// A set of templates rendered together into one project.
#[derive(Debug)]
pub struct TemplateProvider {
    templates: Vec<Box<dyn Template>>,
    check_mode: CheckMode,
    log: ServiceLog,
}

impl TemplateProvider {
    /// Provider for the built-in templates named by `keys`.
    pub fn new<S: AsRef<str>>(keys: &[S], log: ServiceLog) -> Result<Self> {
        let templates = keys
            .iter()
            .map(|key| {
                template::builtin(key.as_ref()).ok_or_else(|| Error::UnknownTemplate {
                    key: key.as_ref().to_string(),
                })
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self::from_templates(templates, log))
    }

    pub fn from_templates(templates: Vec<Box<dyn Template>>, log: ServiceLog) -> Self {
        Self {
            templates,
            check_mode: CheckMode::default(),
            log,
        }
    }

    pub fn with_check_mode(mut self, mode: CheckMode) -> Self {
        self.check_mode = mode;
        self
    }

    pub fn keys(&self) -> Vec<&'static str> {
        self.templates.iter().map(|t| t.key()).collect()
    }

    pub fn get(&self, key: &str) -> Option<&dyn Template> {
        self.templates
            .iter()
            .find(|t| t.key() == key)
            .map(|t| t.as_ref())
    }

    fn require(&self, key: &str) -> Result<&dyn Template> {
        self.get(key).ok_or_else(|| Error::UnknownTemplate {
            key: key.to_string(),
        })
    }

    fn run_checks(&self, template: &dyn Template) -> Result<()> {
        if self.check_mode == CheckMode::Off {
            return Ok(());
        }
        for check in template.checks() {
            if check.run() {
                continue;
            }
            match self.check_mode {
                CheckMode::Strict => {
                    return Err(Error::CheckFailed {
                        template: template.key().to_string(),
                        check: check.name(),
                    });
                }
                _ => self.log.warn(format_args!(
                    "{} template: environment check failed: {}",
                    template.key(),
                    check.name()
                )),
            }
        }
        Ok(())
    }

    /// Render `key` into the project. Returns the written path, or `None`
    /// if the file was left untouched.
    pub fn render(&self, key: &str, ctx: &TemplateContext) -> Result<Option<NormalizedPath>> {
        let template = self.require(key)?;
        self.run_checks(template)?;
        let path = ctx.root().join(template.output());
        let rendered = template.render(ctx)?;
        if template.writer().write(&path, &rendered)? {
            self.log.debug(format_args!("rendered {}", path));
            Ok(Some(path))
        } else {
            Ok(None)
        }
    }

    /// Re-render `key` from the current context.
    ///
    /// Files that are only written on creation are left alone once they
    /// exist.
    pub fn update(&self, key: &str, ctx: &TemplateContext) -> Result<Option<NormalizedPath>> {
        let template = self.require(key)?;
        let path = ctx.root().join(template.output());
        if path.exists() && !template.writer().updates_existing() {
            return Ok(None);
        }
        let rendered = template.render(ctx)?;
        if template.writer().write(&path, &rendered)? {
            self.log.debug(format_args!("updated {}", path));
            Ok(Some(path))
        } else {
            Ok(None)
        }
    }

    pub fn render_all(&self, ctx: &TemplateContext) -> Result<Vec<NormalizedPath>> {
        let mut written = Vec::new();
        for key in self.keys() {
            written.extend(self.render(key, ctx)?);
        }
        Ok(written)
    }

    pub fn update_all(&self, ctx: &TemplateContext) -> Result<Vec<NormalizedPath>> {
        let mut written = Vec::new();
        for key in self.keys() {
            written.extend(self.update(key, ctx)?);
        }
        Ok(written)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checks::EnvironmentCheck;
    use crate::template::VsCodeTemplate;
    use tempfile::TempDir;

    #[derive(Debug)]
    struct Failing;

    impl EnvironmentCheck for Failing {
        fn name(&self) -> String {
            "always fails".into()
        }

        fn run(&self) -> bool {
            false
        }
    }

    fn failing_vscode() -> Vec<Box<dyn Template>> {
        vec![Box::new(VsCodeTemplate::new(vec![Box::new(Failing)]))]
    }

    #[test]
    fn test_unknown_key() {
        let err = TemplateProvider::new(&["vscode", "emacs"], ServiceLog::new("test")).unwrap_err();
        assert!(matches!(err, Error::UnknownTemplate { key } if key == "emacs"));
    }

    #[test]
    fn test_failed_check_only_warns() {
        let temp = TempDir::new().unwrap();
        let ctx = TemplateContext::new(temp.path());
        let provider = TemplateProvider::from_templates(failing_vscode(), ServiceLog::new("test"));

        let written = provider.render("vscode", &ctx).unwrap();
        assert!(written.unwrap().is_file());
    }

    #[test]
    fn test_strict_check_aborts() {
        let temp = TempDir::new().unwrap();
        let ctx = TemplateContext::new(temp.path());
        let provider = TemplateProvider::from_templates(failing_vscode(), ServiceLog::new("test"))
            .with_check_mode(CheckMode::Strict);

        let err = provider.render("vscode", &ctx).unwrap_err();
        assert!(matches!(err, Error::CheckFailed { .. }));
        assert!(!temp.path().join(".vscode/settings.json").exists());
    }

    #[test]
    fn test_update_skips_create_only_files() {
        let temp = TempDir::new().unwrap();
        let ctx = TemplateContext::new(temp.path());
        let provider = TemplateProvider::new(&["main"], ServiceLog::new("test")).unwrap();

        assert!(provider.update("main", &ctx).unwrap().is_some());
        assert!(provider.update("main", &ctx).unwrap().is_none());
    }
}
