//! The [`Template`] trait and the built-in templates

use std::fmt::Debug;

use semver::Version;
use serde_json::json;

use crate::Result;
use crate::checks::{EnvironmentCheck, VsCodeExtensionCheck};
use crate::context::TemplateContext;
use crate::writer::{CreateOnlyWriter, JsonMergeWriter, LineWriter, TemplateWriter};

/// Keys of every built-in template, in render order.
pub const BUILTIN_KEYS: &[&str] = &["vscode", "pylint", "pymakr", "main", "boot", "gitignore"];

/// A single project file rendered from a [`TemplateContext`].
pub trait Template: Debug + Send + Sync {
    fn key(&self) -> &'static str;

    /// Output path relative to the project root.
    fn output(&self) -> &'static str;

    fn render(&self, ctx: &TemplateContext) -> Result<String>;

    fn writer(&self) -> &dyn TemplateWriter;

    /// Checks to run before rendering.
    fn checks(&self) -> &[Box<dyn EnvironmentCheck>] {
        &[]
    }
}

/// Instantiate the built-in template registered under `key`.
pub fn builtin(key: &str) -> Option<Box<dyn Template>> {
    let template: Box<dyn Template> = match key {
        "vscode" => Box::new(VsCodeTemplate::default()),
        "pylint" => Box::new(PylintTemplate::default()),
        "pymakr" => Box::new(StaticTemplate::new("pymakr", "pymakr.conf", PYMAKR_CONF)),
        "main" => Box::new(StaticTemplate::new("main", "src/main.py", MAIN_PY)),
        "boot" => Box::new(StaticTemplate::new("boot", "src/boot.py", BOOT_PY)),
        "gitignore" => Box::new(StaticTemplate::new("gitignore", ".gitignore", GITIGNORE)),
        _ => return None,
    };
    Some(template)
}

/// `.vscode/settings.json`, pointing the Python extension at the stubs.
#[derive(Debug)]
pub struct VsCodeTemplate {
    writer: JsonMergeWriter,
    checks: Vec<Box<dyn EnvironmentCheck>>,
}

impl VsCodeTemplate {
    pub fn new(checks: Vec<Box<dyn EnvironmentCheck>>) -> Self {
        Self {
            writer: JsonMergeWriter,
            checks,
        }
    }
}

impl Default for VsCodeTemplate {
    fn default() -> Self {
        Self::new(vec![Box::new(VsCodeExtensionCheck::new(
            "ms-python.python",
            Version::new(2019, 9, 34474),
        ))])
    }
}

impl Template for VsCodeTemplate {
    fn key(&self) -> &'static str {
        "vscode"
    }

    fn output(&self) -> &'static str {
        ".vscode/settings.json"
    }

    fn render(&self, ctx: &TemplateContext) -> Result<String> {
        let paths = ctx.search_paths();
        let typeshed: Vec<String> = ctx.datadir_display().into_iter().collect();
        let settings = json!({
            "python.languageServer": "Pylance",
            "python.analysis.typeCheckingMode": "basic",
            "python.analysis.typeshedPaths": typeshed,
            "python.analysis.extraPaths": paths,
            "python.autoComplete.extraPaths": paths,
            "python.linting.enabled": true,
            "python.linting.pylintEnabled": true,
        });
        Ok(serde_json::to_string_pretty(&settings)?)
    }

    fn writer(&self) -> &dyn TemplateWriter {
        &self.writer
    }

    fn checks(&self) -> &[Box<dyn EnvironmentCheck>] {
        &self.checks
    }
}

/// `.pylintrc`, whose stub lines are kept current on every update.
#[derive(Debug)]
pub struct PylintTemplate {
    writer: LineWriter,
}

impl Default for PylintTemplate {
    fn default() -> Self {
        Self {
            writer: LineWriter::new(&["Loaded Stubs:", "init-hook"]),
        }
    }
}

impl Template for PylintTemplate {
    fn key(&self) -> &'static str {
        "pylint"
    }

    fn output(&self) -> &'static str {
        ".pylintrc"
    }

    fn render(&self, ctx: &TemplateContext) -> Result<String> {
        let paths: Vec<String> = ctx
            .stub_paths()
            .into_iter()
            .map(|p| format!("\"{p}\""))
            .collect();
        Ok(format!(
            "[MASTER]\n\
             # Loaded Stubs: {stubs}\n\
             init-hook='import sys;sys.path[1:1]=[{paths}]'\n\
             \n\
             [MESSAGES CONTROL]\n\
             disable=missing-docstring, line-too-long, trailing-newlines, broad-except,\n    \
             invalid-name, wrong-import-order, no-method-argument, no-value-for-parameter\n",
            stubs = ctx.stubs.join(", "),
            paths = paths.join(", "),
        ))
    }

    fn writer(&self) -> &dyn TemplateWriter {
        &self.writer
    }
}

/// A fixed file written once and then owned by the user.
#[derive(Debug)]
pub struct StaticTemplate {
    key: &'static str,
    output: &'static str,
    body: &'static str,
    writer: CreateOnlyWriter,
}

impl StaticTemplate {
    pub fn new(key: &'static str, output: &'static str, body: &'static str) -> Self {
        Self {
            key,
            output,
            body,
            writer: CreateOnlyWriter,
        }
    }
}

impl Template for StaticTemplate {
    fn key(&self) -> &'static str {
        self.key
    }

    fn output(&self) -> &'static str {
        self.output
    }

    fn render(&self, _ctx: &TemplateContext) -> Result<String> {
        Ok(self.body.to_string())
    }

    fn writer(&self) -> &dyn TemplateWriter {
        &self.writer
    }
}

const PYMAKR_CONF: &str = r#"{
    "address": "/dev/ttyUSB0",
    "username": "micro",
    "password": "python",
    "sync_folder": "src",
    "open_on_start": true,
    "safe_boot_on_upload": false,
    "py_ignore": [
        "pymakr.conf",
        ".vscode",
        ".gitignore",
        ".git",
        "project.pymakr",
        "env",
        "venv",
        ".micropy",
        "micropy.json",
        "requirements.txt",
        "dev-requirements.txt"
    ],
    "fast_upload": false
}
"#;

const MAIN_PY: &str = "# main.py\n";

const BOOT_PY: &str = "# boot.py - runs on boot-up\n";

const GITIGNORE: &str = "\
# micropy
.micropy/
!micropy.json
!src/

# python
__pycache__/
*.py[cod]
.venv/
";
