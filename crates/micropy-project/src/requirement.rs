//! Package requirement specs and requirements files
//!
//! Accepted forms: `name`, `name==1.0` (or any other comparison
//! operator), and `-e <path>` for editable local packages. The manifest
//! stores each requirement as `name → value`, where value is the version
//! specifier, `*` for any version, or `-e <path>`.

use std::fmt;
use std::sync::LazyLock;

use micropy_fs::{NormalizedPath, io};
use regex::Regex;

use crate::{Error, Result};

static REQUIREMENT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?P<name>[A-Za-z0-9][A-Za-z0-9._-]*)\s*(?P<spec>(?:==|>=|<=|~=|!=|>|<)\s*\S+)?$")
        .expect("Invalid requirement regex")
});

const ANY_VERSION: &str = "*";
const EDITABLE_PREFIX: &str = "-e";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Requirement {
    pub name: String,
    /// Version specifier such as `==1.0`; `None` means any version.
    pub specifier: Option<String>,
    /// Local path as written, for editable requirements.
    pub editable: Option<String>,
}

impl Requirement {
    /// Parse a requirement line.
    pub fn parse(spec: &str) -> Result<Self> {
        let spec = spec.trim();
        if let Some(rest) = spec.strip_prefix(EDITABLE_PREFIX)
            && (rest.is_empty() || rest.starts_with(char::is_whitespace))
        {
            return Self::editable(spec, rest.trim());
        }
        let caps = REQUIREMENT_RE
            .captures(spec)
            .ok_or_else(|| Error::InvalidRequirement {
                spec: spec.to_string(),
                message: "expected 'name', 'name<op>version' or '-e <path>'".to_string(),
            })?;
        Ok(Self {
            name: caps["name"].to_string(),
            specifier: caps
                .name("spec")
                .map(|m| m.as_str().split_whitespace().collect::<String>()),
            editable: None,
        })
    }

    fn editable(spec: &str, path: &str) -> Result<Self> {
        let name = NormalizedPath::new(path)
            .file_name()
            .filter(|n| !n.is_empty() && *n != "." && *n != "..")
            .map(str::to_string)
            .ok_or_else(|| Error::InvalidRequirement {
                spec: spec.to_string(),
                message: "editable requirement needs a path".to_string(),
            })?;
        Ok(Self {
            name,
            specifier: None,
            editable: Some(path.to_string()),
        })
    }

    /// Rebuild a requirement from a manifest entry.
    pub fn from_manifest(name: &str, value: &str) -> Result<Self> {
        let value = value.trim();
        if let Some(path) = value.strip_prefix(EDITABLE_PREFIX) {
            let mut req = Self::editable(value, path.trim())?;
            req.name = name.to_string();
            return Ok(req);
        }
        let specifier = (value != ANY_VERSION && !value.is_empty()).then(|| value.to_string());
        Ok(Self {
            name: name.to_string(),
            specifier,
            editable: None,
        })
    }

    /// The value stored under this requirement's name in the manifest.
    pub fn manifest_value(&self) -> String {
        match (&self.editable, &self.specifier) {
            (Some(path), _) => format!("{EDITABLE_PREFIX} {path}"),
            (None, Some(spec)) => spec.clone(),
            (None, None) => ANY_VERSION.to_string(),
        }
    }

    pub fn is_editable(&self) -> bool {
        self.editable.is_some()
    }

    /// The pinned version, for `==` specifiers.
    pub fn pinned_version(&self) -> Option<&str> {
        self.specifier.as_deref().and_then(|s| s.strip_prefix("=="))
    }
}

impl fmt::Display for Requirement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.editable, &self.specifier) {
            (Some(path), _) => write!(f, "{EDITABLE_PREFIX} {path}"),
            (None, Some(spec)) => write!(f, "{}{}", self.name, spec),
            (None, None) => write!(f, "{}", self.name),
        }
    }
}

/// Read a requirements file, skipping blank lines and `#` comments.
pub fn read_requirements(path: &NormalizedPath) -> Result<Vec<Requirement>> {
    io::read_text(path)?
        .lines()
        .map(|line| line.split(" #").next().unwrap_or(line).trim())
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(Requirement::parse)
        .collect()
}

/// Write `requirements` one per line.
pub fn write_requirements(path: &NormalizedPath, requirements: &[Requirement]) -> Result<()> {
    let mut content: String = requirements.iter().map(|r| format!("{r}\n")).collect();
    if content.is_empty() {
        content.push('\n');
    }
    io::write_text(path, &content)?;
    Ok(())
}
