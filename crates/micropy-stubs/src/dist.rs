//! Python distribution metadata
//!
//! Stub packages published to PyPI (`micropython-<port>[-<board>]-stubs`)
//! carry a `PKG-INFO` file instead of `info.json`. The descriptor is
//! synthesized from the distribution name and version.

use std::sync::LazyLock;

use micropy_fs::{MicropyPath, NormalizedPath, io};
use regex::Regex;
use serde_json::{Value, json};

use crate::{Error, Result};

static REQUIREMENT_NAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*([A-Za-z0-9][A-Za-z0-9._-]*)").expect("Invalid requirement regex")
});

static POST_RELEASE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\.post\d+$").expect("Invalid post-release regex"));

/// The subset of core metadata micropy reads.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DistMetadata {
    pub name: String,
    pub version: String,
    pub summary: Option<String>,
    pub requires_dist: Vec<String>,
}

impl DistMetadata {
    /// Parse the RFC 822 style header block of a `PKG-INFO` file.
    pub fn parse(text: &str) -> Self {
        let mut meta = Self::default();
        for line in text.lines() {
            // Headers end at the first blank line; the description follows.
            if line.trim().is_empty() {
                break;
            }
            let Some((key, value)) = line.split_once(':') else {
                continue;
            };
            let value = value.trim().to_string();
            match key.trim() {
                "Name" => meta.name = value,
                "Version" => meta.version = value,
                "Summary" => meta.summary = Some(value),
                "Requires-Dist" => meta.requires_dist.push(value),
                _ => {}
            }
        }
        meta
    }

    pub fn load(package: &NormalizedPath) -> Result<Self> {
        let path = package.join(MicropyPath::PkgInfo.as_str());
        let meta = Self::parse(&io::read_text(&path)?);
        if meta.name.is_empty() || meta.version.is_empty() {
            return Err(Error::Metadata {
                path: path.to_native(),
                message: "missing Name or Version".to_string(),
            });
        }
        Ok(meta)
    }

    /// Names of required distributions that are themselves stub packages.
    pub fn required_stubs(&self) -> Vec<String> {
        self.requires_dist
            .iter()
            .filter_map(|req| REQUIREMENT_NAME.captures(req))
            .filter_map(|caps| caps.get(1).map(|m| m.as_str().to_string()))
            .filter(|name| name.to_lowercase().contains("stub"))
            .collect()
    }

    /// Port (and board, if any) encoded in the distribution name.
    pub fn port(&self) -> (String, Option<String>) {
        let name = self.name.to_lowercase().replace('_', "-");
        let core = name.strip_prefix("micropython-").unwrap_or(&name);
        let core = core.strip_suffix("-stubs").unwrap_or(core);
        match core.split_once('-') {
            Some((port, board)) => (port.to_string(), Some(board.to_string())),
            None => (core.to_string(), None),
        }
    }

    /// Device-stub descriptor equivalent to this distribution.
    pub fn to_info(&self) -> Value {
        let (port, board) = self.port();
        let version = POST_RELEASE.replace(&self.version, "").into_owned();
        let mut firmware = json!({
            "sysname": port,
            "version": version,
            "name": "micropython",
        });
        if let Some(board) = board {
            firmware["machine"] = json!(board);
        }
        json!({
            "firmware": firmware,
            "stubber": {"version": self.version},
            "modules": [],
        })
    }
}

/// Whether `package` looks like an unpacked Python distribution.
pub fn is_distribution(package: &NormalizedPath) -> bool {
    package.join(MicropyPath::PkgInfo.as_str()).is_file()
}
