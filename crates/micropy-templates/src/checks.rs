//! Environment checks run before rendering a template

use std::fmt::Debug;
use std::process::Command;

use semver::Version;

/// A pass/fail check of the host environment.
pub trait EnvironmentCheck: Debug + Send + Sync {
    /// Short human-readable description, used in log output.
    fn name(&self) -> String;

    fn run(&self) -> bool;
}

/// How failed checks are treated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CheckMode {
    /// Do not run checks.
    Off,
    /// Run checks and log failures.
    #[default]
    Warn,
    /// Run checks and refuse to render on failure.
    Strict,
}

/// Requires a VS Code extension at or above a minimum version.
///
/// Installed versions come from `code --list-extensions --show-versions`.
#[derive(Debug, Clone)]
pub struct VsCodeExtensionCheck {
    extension: String,
    minimum: Version,
    program: String,
}

impl VsCodeExtensionCheck {
    pub fn new(extension: impl Into<String>, minimum: Version) -> Self {
        Self {
            extension: extension.into(),
            minimum,
            program: "code".to_string(),
        }
    }

    /// Query a different editor executable.
    pub fn with_program(mut self, program: impl Into<String>) -> Self {
        self.program = program.into();
        self
    }

    /// Evaluate the check against a `--show-versions` listing.
    pub fn evaluate(&self, listing: &str) -> bool {
        listing
            .lines()
            .filter_map(|line| line.trim().split_once('@'))
            .filter(|(ext, _)| ext.eq_ignore_ascii_case(&self.extension))
            .filter_map(|(_, version)| Version::parse(version.trim()).ok())
            .any(|version| version >= self.minimum)
    }
}

impl EnvironmentCheck for VsCodeExtensionCheck {
    fn name(&self) -> String {
        format!("{} >= {}", self.extension, self.minimum)
    }

    fn run(&self) -> bool {
        Command::new(&self.program)
            .args(["--list-extensions", "--show-versions"])
            .output()
            .ok()
            .filter(|output| output.status.success())
            .map(|output| self.evaluate(&String::from_utf8_lossy(&output.stdout)))
            .unwrap_or(false)
    }
}
