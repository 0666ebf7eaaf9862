//! Backing sources for a [`Config`](crate::Config)

use micropy_fs::{NormalizedPath, io};
use serde_json::{Map, Value};

use crate::{Error, Result};

/// Where a config tree is read from and written to.
///
/// Implementations perform their own scoped acquisition: a file source
/// holds a shared lock for the duration of [`process`](Self::process) and
/// an exclusive lock while [`save`](Self::save) writes.
pub trait ConfigSource: std::fmt::Debug {
    /// Whether the source currently holds persisted content.
    fn exists(&self) -> bool;

    /// Read and parse the persisted tree.
    fn process(&self) -> Result<Value>;

    /// Serialize and persist `content`.
    fn save(&mut self, content: &Value) -> Result<()>;

    /// Filesystem location, for sources that have one.
    fn location(&self) -> Option<&NormalizedPath> {
        None
    }
}

/// File-backed JSON source, written pretty-printed.
#[derive(Debug, Clone)]
pub struct JsonSource {
    path: NormalizedPath,
}

impl JsonSource {
    pub fn new(path: impl Into<NormalizedPath>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &NormalizedPath {
        &self.path
    }
}

impl ConfigSource for JsonSource {
    fn exists(&self) -> bool {
        self.path.is_file()
    }

    fn process(&self) -> Result<Value> {
        let content = io::read_text_locked(&self.path)?;
        if content.trim().is_empty() {
            return Ok(Value::Object(Map::new()));
        }
        let value: Value = serde_json::from_str(&content).map_err(|e| Error::Invalid {
            path: self.path.to_native(),
            message: e.to_string(),
        })?;
        if !value.is_object() {
            return Err(Error::Invalid {
                path: self.path.to_native(),
                message: "top-level value must be an object".to_string(),
            });
        }
        Ok(value)
    }

    fn save(&mut self, content: &Value) -> Result<()> {
        let mut text = serde_json::to_string_pretty(content)?;
        text.push('\n');
        io::write_text(&self.path, &text)?;
        Ok(())
    }

    fn location(&self) -> Option<&NormalizedPath> {
        Some(&self.path)
    }
}

/// In-memory source. "Persisting" stores a copy of the tree.
#[derive(Debug, Clone, Default)]
pub struct DictSource {
    stored: Option<Value>,
}

impl DictSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start with content that behaves as if it had been persisted.
    pub fn with_content(content: Value) -> Self {
        Self {
            stored: Some(content),
        }
    }

    /// The last saved tree.
    pub fn stored(&self) -> Option<&Value> {
        self.stored.as_ref()
    }
}

impl ConfigSource for DictSource {
    fn exists(&self) -> bool {
        self.stored.is_some()
    }

    fn process(&self) -> Result<Value> {
        Ok(self
            .stored
            .clone()
            .unwrap_or_else(|| Value::Object(Map::new())))
    }

    fn save(&mut self, content: &Value) -> Result<()> {
        self.stored = Some(content.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    #[test]
    fn test_json_source_roundtrip() {
        let temp = TempDir::new().unwrap();
        let mut source = JsonSource::new(temp.path().join("micropy.json"));
        assert!(!source.exists());

        source.save(&json!({"name": "demo"})).unwrap();
        assert!(source.exists());
        assert_eq!(source.process().unwrap(), json!({"name": "demo"}));
    }

    #[test]
    fn test_json_source_is_pretty_printed() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("micropy.json");
        let mut source = JsonSource::new(&path);
        source.save(&json!({"name": "demo"})).unwrap();

        let text = std::fs::read_to_string(path).unwrap();
        assert_eq!(text, "{\n  \"name\": \"demo\"\n}\n");
    }

    #[test]
    fn test_json_source_rejects_non_object() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("micropy.json");
        std::fs::write(&path, "[1, 2]").unwrap();

        let err = JsonSource::new(&path).process().unwrap_err();
        assert!(matches!(err, Error::Invalid { .. }));
    }

    #[test]
    fn test_json_source_rejects_garbage() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("micropy.json");
        std::fs::write(&path, "{not json").unwrap();

        let err = JsonSource::new(&path).process().unwrap_err();
        assert!(matches!(err, Error::Invalid { .. }));
    }

    #[test]
    fn test_dict_source_empty_until_saved() {
        let mut source = DictSource::new();
        assert!(!source.exists());
        source.save(&json!({"a": 1})).unwrap();
        assert_eq!(source.stored(), Some(&json!({"a": 1})));
    }
}
