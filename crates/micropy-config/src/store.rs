//! The write-through config store

use micropy_fs::{NormalizedPath, ServiceLog};
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use crate::source::{ConfigSource, DictSource, JsonSource};
use crate::tree::{self, KeyPath};
use crate::{Error, Result};

/// A JSON tree backed by a [`ConfigSource`].
///
/// The store is created from a default tree. If the source already holds
/// content it is merged *over* the defaults on construction. Nothing is
/// written until the first mutation; from then on every mutating call
/// saves the whole tree before returning.
///
/// A store may be rooted at a key prefix, in which case every key passed
/// to it is interpreted relative to that prefix.
#[derive(Debug)]
pub struct Config {
    source: Box<dyn ConfigSource>,
    tree: Value,
    root: Option<String>,
    log: ServiceLog,
}

impl Config {
    /// Create a store over `source`, seeded with `defaults`.
    pub fn new(source: impl ConfigSource + 'static, defaults: Value) -> Result<Self> {
        let mut config = Self {
            source: Box::new(source),
            tree: normalize_root(defaults),
            root: None,
            log: ServiceLog::new("config"),
        };
        config.load()?;
        Ok(config)
    }

    /// File-backed store at `path`.
    pub fn json(path: impl Into<NormalizedPath>, defaults: Value) -> Result<Self> {
        Self::new(JsonSource::new(path), defaults)
    }

    /// In-memory store, never touching disk.
    pub fn in_memory(defaults: Value) -> Self {
        Self {
            source: Box::new(DictSource::new()),
            tree: normalize_root(defaults),
            root: None,
            log: ServiceLog::new("config"),
        }
    }

    /// Interpret keys relative to `root`.
    pub fn with_root(mut self, root: impl Into<String>) -> Self {
        let root = root.into();
        let root = root.trim_matches('/').to_string();
        self.root = (!root.is_empty()).then_some(root);
        self
    }

    pub fn with_log(mut self, log: ServiceLog) -> Self {
        self.log = log;
        self
    }

    /// The prefix keys are resolved against, if any.
    pub fn root(&self) -> Option<&str> {
        self.root.as_deref()
    }

    /// Filesystem location of the backing source, if it has one.
    pub fn location(&self) -> Option<&NormalizedPath> {
        self.source.location()
    }

    /// Whether the backing source holds persisted content.
    pub fn exists(&self) -> bool {
        self.source.exists()
    }

    fn key(&self, key: &str) -> KeyPath {
        KeyPath::rooted(self.root.as_deref(), key)
    }

    /// Merge persisted content over the current tree.
    fn load(&mut self) -> Result<()> {
        if self.source.exists() {
            let stored = self.source.process()?;
            tree::deep_merge(&mut self.tree, &stored);
            self.log.debug(format_args!(
                "loaded config from {}",
                self.describe_source()
            ));
        }
        Ok(())
    }

    fn describe_source(&self) -> String {
        self.source
            .location()
            .map(|p| p.to_string())
            .unwrap_or_else(|| "memory".to_string())
    }

    /// Rebind the backing source.
    ///
    /// Content already persisted in the new source is merged over the
    /// current tree; nothing is written until the next mutation or
    /// [`sync`](Self::sync).
    pub fn set_source(&mut self, source: impl ConfigSource + 'static) -> Result<()> {
        self.source = Box::new(source);
        self.load()
    }

    /// Flush the in-memory tree to the source.
    pub fn sync(&mut self) -> Result<()> {
        self.source.save(&self.tree)?;
        self.log
            .debug(format_args!("saved config to {}", self.describe_source()));
        Ok(())
    }

    /// Value at `key`, or `default` when missing.
    pub fn get(&self, key: &str, default: Value) -> Value {
        tree::lookup(&self.tree, &self.key(key))
            .cloned()
            .unwrap_or(default)
    }

    /// Value at `key` if present.
    pub fn get_opt(&self, key: &str) -> Option<&Value> {
        tree::lookup(&self.tree, &self.key(key))
    }

    /// Value at `key` deserialized into `T`; `None` when missing or of
    /// the wrong shape.
    pub fn get_as<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        self.get_opt(key)
            .and_then(|v| serde_json::from_value(v.clone()).ok())
    }

    /// Write `value` at `key`. The parent must already exist.
    ///
    /// Returns the resulting tree (rooted at the configured prefix).
    pub fn set(&mut self, key: &str, value: Value) -> Result<Value> {
        let path = self.key(key);
        tree::insert(&mut self.tree, &path, value, false)?;
        self.sync()?;
        Ok(self.raw())
    }

    /// Like [`set`](Self::set) but creates intermediate mappings.
    pub fn add(&mut self, key: &str, value: Value) -> Result<Value> {
        let path = self.key(key);
        tree::insert(&mut self.tree, &path, value, true)?;
        self.sync()?;
        Ok(self.raw())
    }

    /// Remove the leaf at `key` and return the tree as it was before.
    ///
    /// Removing a missing key is a no-op and does not write.
    pub fn pop(&mut self, key: &str) -> Result<Value> {
        let prior = self.raw();
        let path = self.key(key);
        if tree::remove(&mut self.tree, &path).is_some() {
            self.sync()?;
        }
        Ok(prior)
    }

    /// Append each item to the sequence at `key`, skipping items that are
    /// already present. A missing leaf starts as an empty sequence.
    pub fn extend(&mut self, key: &str, items: Vec<Value>) -> Result<Value> {
        let path = self.key(key);
        match tree::lookup_mut(&mut self.tree, &path) {
            Some(Value::Array(existing)) => tree::extend_unique(existing, items),
            Some(other) => {
                return Err(Error::NotASequence {
                    key: path.as_string(),
                    found: tree::kind(other),
                });
            }
            None => {
                let mut fresh = Vec::new();
                tree::extend_unique(&mut fresh, items);
                tree::insert(&mut self.tree, &path, Value::Array(fresh), true)?;
            }
        }
        self.sync()?;
        Ok(self.raw())
    }

    /// Replace the value at `key` while keeping existing order.
    ///
    /// For sequences, items of the existing sequence that survive in
    /// `value` keep their position; new items are appended in the order
    /// given. For mappings, `value` is deep-merged over the existing
    /// mapping. Anything else is written as-is.
    pub fn upsert(&mut self, key: &str, value: Value) -> Result<Value> {
        let path = self.key(key);
        let merged = match (tree::lookup_mut(&mut self.tree, &path), &value) {
            (Some(Value::Array(existing)), Value::Array(incoming)) => {
                existing.retain(|item| incoming.contains(item));
                tree::extend_unique(existing, incoming.iter().cloned());
                true
            }
            (Some(existing @ Value::Object(_)), incoming @ Value::Object(_)) => {
                tree::deep_merge(existing, incoming);
                true
            }
            _ => false,
        };
        if !merged {
            tree::insert(&mut self.tree, &path, value, true)?;
        }
        self.sync()?;
        Ok(self.raw())
    }

    /// Deep-merge `fragment` into the mapping at `key` (or the root).
    ///
    /// Sequences present on both sides are extended with unique items
    /// rather than replaced.
    pub fn merge(&mut self, key: &str, fragment: &Value) -> Result<Value> {
        let path = self.key(key);
        if tree::lookup(&self.tree, &path).is_none() {
            tree::insert(&mut self.tree, &path, Value::Object(Map::new()), true)?;
        }
        if let Some(target) = tree::lookup_mut(&mut self.tree, &path) {
            merge_extending(target, fragment);
        }
        self.sync()?;
        Ok(self.raw())
    }

    /// Deep copy of the tree rooted at the configured prefix.
    pub fn raw(&self) -> Value {
        match &self.root {
            Some(root) => tree::lookup(&self.tree, &KeyPath::parse(root))
                .cloned()
                .unwrap_or(Value::Null),
            None => self.tree.clone(),
        }
    }
}

fn normalize_root(defaults: Value) -> Value {
    match defaults {
        Value::Null => Value::Object(Map::new()),
        other => other,
    }
}

fn merge_extending(base: &mut Value, other: &Value) {
    match (base, other) {
        (Value::Object(base_map), Value::Object(other_map)) => {
            for (key, other_val) in other_map {
                match base_map.get_mut(key) {
                    Some(base_val) => merge_extending(base_val, other_val),
                    None => {
                        base_map.insert(key.clone(), other_val.clone());
                    }
                }
            }
        }
        (Value::Array(base_items), Value::Array(other_items)) => {
            tree::extend_unique(base_items, other_items.iter().cloned());
        }
        (base, other) => *base = other.clone(),
    }
}
