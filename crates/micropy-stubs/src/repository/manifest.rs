//! Repository manifest schemas
//!
//! A repository source document looks like
//!
//! ```json
//! {
//!   "repository": {"name": "micropy-stubs", "source": "https://.../packages"},
//!   "packages": ...
//! }
//! ```
//!
//! where the shape of `packages` depends on the schema. Each variant of
//! [`StubsManifest`] decides from the document whether it matches; the
//! variants are tried in [`StubsManifest::DECODERS`] order.

use std::cmp::Ordering;
use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use url::Url;

use crate::{Error, Result};

/// Where PyPI serves source distributions from.
pub const PYPI_PACKAGES: &str = "https://files.pythonhosted.org/packages";

/// `repository` header shared by every schema.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepositoryInfo {
    pub name: String,
    pub source: String,
}

/// One published package version, independent of schema.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct StubPackage {
    pub name: String,
    pub version: String,
    pub sha256sum: Option<String>,
}

/// A package as listed by the micropy-stubs repository.
#[derive(Debug, Clone, Deserialize)]
struct MicropyPackage {
    name: String,
    #[serde(rename = "type")]
    #[allow(dead_code)]
    kind: String,
    sha256sum: String,
    version: String,
}

#[derive(Debug, Clone, Deserialize)]
struct MicropyDocument {
    repository: RepositoryInfo,
    packages: Vec<MicropyPackage>,
}

#[derive(Debug, Clone, Deserialize)]
struct MicropythonDocument {
    repository: RepositoryInfo,
    packages: BTreeMap<String, Vec<String>>,
}

/// Archives hosted next to the manifest, one per package name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MicropyManifest {
    pub repository: RepositoryInfo,
    pub packages: Vec<StubPackage>,
}

impl MicropyManifest {
    pub fn try_decode(document: &Value) -> Option<Self> {
        let doc: MicropyDocument = serde_json::from_value(document.clone()).ok()?;
        Some(Self {
            repository: doc.repository,
            packages: doc
                .packages
                .into_iter()
                .map(|p| StubPackage {
                    name: p.name,
                    version: p.version,
                    sha256sum: Some(p.sha256sum),
                })
                .collect(),
        })
    }

    fn resolve_package_url(&self, package: &StubPackage) -> Result<Url> {
        let base = self.repository.source.trim_end_matches('/');
        parse_url(&format!("{base}/{}.tar.gz", package.name))
    }
}

/// PyPI-published stub distributions, keyed by name with a version list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MicropythonManifest {
    pub repository: RepositoryInfo,
    pub packages: Vec<StubPackage>,
}

impl MicropythonManifest {
    pub fn try_decode(document: &Value) -> Option<Self> {
        let doc: MicropythonDocument = serde_json::from_value(document.clone()).ok()?;
        Some(Self {
            repository: doc.repository,
            packages: doc
                .packages
                .into_iter()
                .flat_map(|(name, versions)| {
                    versions.into_iter().map(move |version| StubPackage {
                        name: name.clone(),
                        version,
                        sha256sum: None,
                    })
                })
                .collect(),
        })
    }

    fn resolve_package_url(&self, package: &StubPackage) -> Result<Url> {
        let name = &package.name;
        let initial = name.chars().next().unwrap_or('_');
        let file_stem = name.replace('-', "_");
        parse_url(&format!(
            "{PYPI_PACKAGES}/source/{initial}/{name}/{file_stem}-{}.tar.gz",
            package.version
        ))
    }
}

fn parse_url(raw: &str) -> Result<Url> {
    Url::parse(raw).map_err(|e| Error::transport(raw, format!("malformed url: {e}")))
}

type Decoder = fn(&Value) -> Option<StubsManifest>;

/// A decoded repository manifest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StubsManifest {
    Micropy(MicropyManifest),
    Micropython(MicropythonManifest),
}

impl StubsManifest {
    /// Registered schemas, in the order they are attempted.
    pub const DECODERS: [(&'static str, Decoder); 2] = [
        ("micropy", Self::decode_micropy),
        ("micropython", Self::decode_micropython),
    ];

    fn decode_micropy(document: &Value) -> Option<Self> {
        MicropyManifest::try_decode(document).map(Self::Micropy)
    }

    fn decode_micropython(document: &Value) -> Option<Self> {
        MicropythonManifest::try_decode(document).map(Self::Micropython)
    }

    /// Decode `document` with the first schema that accepts it.
    pub fn decode(document: &Value, origin: &str) -> Result<Self> {
        Self::DECODERS
            .iter()
            .find_map(|(_, decode)| decode(document))
            .ok_or_else(|| Error::ManifestUnrecognized {
                origin: origin.to_string(),
            })
    }

    pub fn schema(&self) -> &'static str {
        match self {
            Self::Micropy(_) => "micropy",
            Self::Micropython(_) => "micropython",
        }
    }

    pub fn repository(&self) -> &RepositoryInfo {
        match self {
            Self::Micropy(m) => &m.repository,
            Self::Micropython(m) => &m.repository,
        }
    }

    pub fn packages(&self) -> &[StubPackage] {
        match self {
            Self::Micropy(m) => &m.packages,
            Self::Micropython(m) => &m.packages,
        }
    }

    /// Download location of `package`.
    pub fn resolve_package_url(&self, package: &StubPackage) -> Result<Url> {
        match self {
            Self::Micropy(m) => m.resolve_package_url(package),
            Self::Micropython(m) => m.resolve_package_url(package),
        }
    }

    /// Version ordering used to pick the latest release.
    pub fn compare_versions(&self, a: &str, b: &str) -> Ordering {
        match self {
            Self::Micropy(_) => compare_semver(a, b),
            Self::Micropython(_) => compare_dotted(a, b),
        }
    }
}

/// Parse `1.11`, `v1.11.0`, `1.11.0-rc1` leniently as semver.
pub fn lenient_semver(raw: &str) -> Option<semver::Version> {
    let raw = raw.trim();
    let raw = raw.strip_prefix('v').unwrap_or(raw);
    if let Ok(version) = semver::Version::parse(raw) {
        return Some(version);
    }
    let (core, rest) = match raw.find(['-', '+']) {
        Some(idx) => raw.split_at(idx),
        None => (raw, ""),
    };
    let mut parts: Vec<&str> = core.split('.').collect();
    if parts.is_empty() || parts.len() > 3 {
        return None;
    }
    while parts.len() < 3 {
        parts.push("0");
    }
    semver::Version::parse(&format!("{}{rest}", parts.join("."))).ok()
}

fn compare_semver(a: &str, b: &str) -> Ordering {
    match (lenient_semver(a), lenient_semver(b)) {
        (Some(a), Some(b)) => a.cmp(&b),
        (Some(_), None) => Ordering::Greater,
        (None, Some(_)) => Ordering::Less,
        (None, None) => compare_dotted(a, b),
    }
}

/// Component-wise comparison; numeric components compare as numbers.
fn compare_dotted(a: &str, b: &str) -> Ordering {
    let mut left = a.split('.');
    let mut right = b.split('.');
    loop {
        match (left.next(), right.next()) {
            (None, None) => return Ordering::Equal,
            (Some(_), None) => return Ordering::Greater,
            (None, Some(_)) => return Ordering::Less,
            (Some(l), Some(r)) => {
                let ord = match (l.parse::<u64>(), r.parse::<u64>()) {
                    (Ok(l), Ok(r)) => l.cmp(&r),
                    _ => l.cmp(r),
                };
                if ord != Ordering::Equal {
                    return ord;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;
    use serde_json::json;

    fn micropy_doc() -> Value {
        json!({
            "repository": {"name": "micropy-stubs", "source": "https://example.com/packages/"},
            "packages": [
                {"name": "esp32-micropython-1.11.0", "type": "device", "sha256sum": "abc", "version": "1.2.0"}
            ]
        })
    }

    fn micropython_doc() -> Value {
        json!({
            "repository": {"name": "micropython-stubs", "source": "https://example.com/index.json"},
            "packages": {"micropython-esp32-stubs": ["1.18.0", "1.19.1"]}
        })
    }

    #[test]
    fn test_decode_selects_schema() {
        let micropy = StubsManifest::decode(&micropy_doc(), "a").unwrap();
        assert_eq!(micropy.schema(), "micropy");
        let micropython = StubsManifest::decode(&micropython_doc(), "b").unwrap();
        assert_eq!(micropython.schema(), "micropython");
        assert_eq!(micropython.packages().len(), 2);
    }

    #[test]
    fn test_decode_rejects_unknown_shape() {
        let err = StubsManifest::decode(&json!({"repository": {"name": "x"}}), "c").unwrap_err();
        assert!(matches!(err, Error::ManifestUnrecognized { .. }));
    }

    #[test]
    fn test_micropy_url() {
        let manifest = StubsManifest::decode(&micropy_doc(), "a").unwrap();
        let url = manifest
            .resolve_package_url(&manifest.packages()[0])
            .unwrap();
        assert_eq!(
            url.as_str(),
            "https://example.com/packages/esp32-micropython-1.11.0.tar.gz"
        );
    }

    #[test]
    fn test_micropython_url() {
        let manifest = StubsManifest::decode(&micropython_doc(), "b").unwrap();
        let url = manifest
            .resolve_package_url(&manifest.packages()[1])
            .unwrap();
        assert_eq!(
            url.as_str(),
            "https://files.pythonhosted.org/packages/source/m/micropython-esp32-stubs/micropython_esp32_stubs-1.19.1.tar.gz"
        );
    }

    #[rstest]
    #[case("1.11.0", "1.9.0", Ordering::Greater)]
    #[case("v1.11", "1.11.0", Ordering::Equal)]
    #[case("1.12.0-rc1", "1.12.0", Ordering::Less)]
    #[case("1.2.0", "weird", Ordering::Greater)]
    fn test_semver_ordering(#[case] a: &str, #[case] b: &str, #[case] expected: Ordering) {
        assert_eq!(compare_semver(a, b), expected);
    }

    #[rstest]
    #[case("1.19.1", "1.9.3", Ordering::Greater)]
    #[case("1.19", "1.19.1", Ordering::Less)]
    #[case("1.19.1", "1.19.1.post1", Ordering::Less)]
    fn test_dotted_ordering(#[case] a: &str, #[case] b: &str, #[case] expected: Ordering) {
        assert_eq!(compare_dotted(a, b), expected);
    }
}
