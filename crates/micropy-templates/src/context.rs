//! Render context handed to every template

use micropy_fs::NormalizedPath;
use serde::Deserialize;
use serde_json::Value;

use crate::Result;

#[derive(Debug, Default, Deserialize)]
struct RawContext {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    stubs: Vec<String>,
    #[serde(default)]
    paths: Vec<String>,
    #[serde(default)]
    datadir: Option<String>,
    #[serde(default)]
    local_paths: Vec<String>,
}

/// Everything a template may reference, anchored at the project root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateContext {
    root: NormalizedPath,
    pub name: Option<String>,
    /// Names of the stubs loaded into the project.
    pub stubs: Vec<String>,
    /// Ordered stub search paths.
    pub paths: Vec<NormalizedPath>,
    pub datadir: Option<NormalizedPath>,
    /// Editable local package directories.
    pub local_paths: Vec<NormalizedPath>,
}

impl TemplateContext {
    pub fn new(root: impl Into<NormalizedPath>) -> Self {
        Self {
            root: root.into(),
            name: None,
            stubs: Vec::new(),
            paths: Vec::new(),
            datadir: None,
            local_paths: Vec::new(),
        }
    }

    /// Build a context from a project Context tree.
    ///
    /// Missing keys fall back to empty values; relative paths are taken
    /// relative to `root`.
    pub fn from_value(root: impl Into<NormalizedPath>, value: &Value) -> Result<Self> {
        let root = root.into();
        let raw: RawContext = if value.is_null() {
            RawContext::default()
        } else {
            serde_json::from_value(value.clone())?
        };
        let to_path = |p: String| anchor(&root, &p);
        Ok(Self {
            name: raw.name,
            stubs: raw.stubs,
            paths: raw.paths.into_iter().map(to_path).collect(),
            datadir: raw.datadir.map(to_path),
            local_paths: raw.local_paths.into_iter().map(to_path).collect(),
            root,
        })
    }

    pub fn root(&self) -> &NormalizedPath {
        &self.root
    }

    /// `path` as it should appear in a rendered file: relative to the
    /// project root when inside it, absolute otherwise.
    pub fn display_path(&self, path: &NormalizedPath) -> String {
        match path.relative_to(&self.root) {
            Some(rel) => rel.as_str().to_string(),
            None => path.as_str().to_string(),
        }
    }

    /// Stub search paths followed by local package paths, rendered and
    /// without duplicates.
    pub fn search_paths(&self) -> Vec<String> {
        let mut out: Vec<String> = Vec::new();
        for path in self.paths.iter().chain(&self.local_paths) {
            let shown = self.display_path(path);
            if !out.contains(&shown) {
                out.push(shown);
            }
        }
        out
    }

    pub fn stub_paths(&self) -> Vec<String> {
        self.paths.iter().map(|p| self.display_path(p)).collect()
    }

    pub fn datadir_display(&self) -> Option<String> {
        self.datadir.as_ref().map(|d| self.display_path(d))
    }
}

fn anchor(root: &NormalizedPath, path: &str) -> NormalizedPath {
    let normalized = NormalizedPath::new(path);
    if std::path::Path::new(path).is_absolute() || normalized.as_str().starts_with('/') {
        normalized
    } else {
        root.join(normalized.as_str().trim_start_matches("./"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_from_value_anchors_relative_paths() {
        let ctx = TemplateContext::from_value(
            "/work/proj",
            &json!({
                "stubs": ["esp32-micropython-1.11.0"],
                "paths": ["/work/proj/.micropy/esp32/stubs", "/opt/stubs/fw"],
                "datadir": "/work/proj/.micropy",
                "local_paths": ["./src/lib/mycustom"]
            }),
        )
        .unwrap();

        assert_eq!(ctx.local_paths, vec![NormalizedPath::new("/work/proj/src/lib/mycustom")]);
        assert_eq!(
            ctx.search_paths(),
            vec![".micropy/esp32/stubs", "/opt/stubs/fw", "src/lib/mycustom"]
        );
        assert_eq!(ctx.datadir_display().as_deref(), Some(".micropy"));
    }

    #[test]
    fn test_from_null_is_empty() {
        let ctx = TemplateContext::from_value("/p", &Value::Null).unwrap();
        assert!(ctx.paths.is_empty());
        assert!(ctx.datadir.is_none());
    }

    #[test]
    fn test_search_paths_deduplicate() {
        let mut ctx = TemplateContext::new("/p");
        ctx.paths = vec!["/p/a".into(), "/p/b".into(), "/p/a".into()];
        ctx.local_paths = vec!["/p/b".into()];
        assert_eq!(ctx.search_paths(), vec!["a", "b"]);
    }
}
