//! Key-path navigation over `serde_json::Value` trees

use serde_json::{Map, Value};

use crate::{Error, Result};

/// A parsed `/`-separated key path.
///
/// Empty segments are ignored, so `"a//b/"` addresses the same leaf as
/// `"a/b"`. Numeric segments index into sequences.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyPath {
    segments: Vec<String>,
}

impl KeyPath {
    pub fn parse(key: &str) -> Self {
        Self {
            segments: key
                .split('/')
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect(),
        }
    }

    /// Prepend a root prefix.
    pub fn rooted(root: Option<&str>, key: &str) -> Self {
        match root {
            Some(root) => Self::parse(&format!("{root}/{key}")),
            None => Self::parse(key),
        }
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn as_string(&self) -> String {
        self.segments.join("/")
    }

    fn split_last(&self) -> Option<(&String, &[String])> {
        self.segments.split_last()
    }
}

pub(crate) fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "a sequence",
        Value::Object(_) => "a mapping",
    }
}

fn child<'a>(value: &'a Value, segment: &str) -> Option<&'a Value> {
    match value {
        Value::Object(map) => map.get(segment),
        Value::Array(items) => segment.parse::<usize>().ok().and_then(|i| items.get(i)),
        _ => None,
    }
}

fn child_mut<'a>(value: &'a mut Value, segment: &str) -> Option<&'a mut Value> {
    match value {
        Value::Object(map) => map.get_mut(segment),
        Value::Array(items) => segment
            .parse::<usize>()
            .ok()
            .and_then(move |i| items.get_mut(i)),
        _ => None,
    }
}

/// Look up the value at `path`.
pub fn lookup<'a>(tree: &'a Value, path: &KeyPath) -> Option<&'a Value> {
    path.segments
        .iter()
        .try_fold(tree, |node, segment| child(node, segment))
}

/// Look up the value at `path` mutably.
pub fn lookup_mut<'a>(tree: &'a mut Value, path: &KeyPath) -> Option<&'a mut Value> {
    let mut node = tree;
    for segment in &path.segments {
        node = child_mut(node, segment)?;
    }
    Some(node)
}

/// Write `value` at `path`.
///
/// With `create_parents`, missing intermediate mappings are created;
/// otherwise a missing parent is a [`Error::KeyNotFound`].
pub fn insert(tree: &mut Value, path: &KeyPath, value: Value, create_parents: bool) -> Result<()> {
    let Some((leaf, parents)) = path.split_last() else {
        *tree = value;
        return Ok(());
    };

    let mut node = tree;
    let mut walked = Vec::with_capacity(parents.len());
    for segment in parents {
        walked.push(segment.as_str());
        let exists = child(node, segment).is_some();
        if !exists {
            if !create_parents {
                return Err(Error::KeyNotFound {
                    key: path.as_string(),
                });
            }
            match node {
                Value::Object(map) => {
                    map.insert(segment.clone(), Value::Object(Map::new()));
                }
                Value::Null => {
                    let mut map = Map::new();
                    map.insert(segment.clone(), Value::Object(Map::new()));
                    *node = Value::Object(map);
                }
                other => {
                    return Err(Error::NotAContainer {
                        key: walked.join("/"),
                        found: kind(other),
                    });
                }
            }
        }
        node = child_mut(node, segment).ok_or_else(|| Error::KeyNotFound {
            key: path.as_string(),
        })?;
    }

    match node {
        Value::Object(map) => {
            map.insert(leaf.clone(), value);
            Ok(())
        }
        Value::Array(items) => {
            let index = leaf.parse::<usize>().map_err(|_| Error::KeyNotFound {
                key: path.as_string(),
            })?;
            if index < items.len() {
                items[index] = value;
            } else if index == items.len() {
                items.push(value);
            } else {
                return Err(Error::KeyNotFound {
                    key: path.as_string(),
                });
            }
            Ok(())
        }
        Value::Null if create_parents => {
            let mut map = Map::new();
            map.insert(leaf.clone(), value);
            *node = Value::Object(map);
            Ok(())
        }
        other => Err(Error::NotAContainer {
            key: parents.join("/"),
            found: kind(other),
        }),
    }
}

/// Remove and return the value at `path`.
pub fn remove(tree: &mut Value, path: &KeyPath) -> Option<Value> {
    let (leaf, parents) = path.split_last()?;
    let parent = lookup_mut(
        tree,
        &KeyPath {
            segments: parents.to_vec(),
        },
    )?;
    match parent {
        Value::Object(map) => map.shift_remove(leaf),
        Value::Array(items) => {
            let index = leaf.parse::<usize>().ok()?;
            (index < items.len()).then(|| items.remove(index))
        }
        _ => None,
    }
}

/// Deep merge `other` into `base`.
///
/// Mappings merge recursively with `other` taking precedence; any other
/// pair of values is replaced by `other`.
pub fn deep_merge(base: &mut Value, other: &Value) {
    match (base, other) {
        (Value::Object(base_map), Value::Object(other_map)) => {
            for (key, other_val) in other_map {
                if let Some(base_val) = base_map.get_mut(key) {
                    deep_merge(base_val, other_val);
                } else {
                    base_map.insert(key.clone(), other_val.clone());
                }
            }
        }
        (base, other) => {
            *base = other.clone();
        }
    }
}

/// Append each item of `items` to `target` unless already present.
pub(crate) fn extend_unique(target: &mut Vec<Value>, items: impl IntoIterator<Item = Value>) {
    for item in items {
        if !target.contains(&item) {
            target.push(item);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_keypath_ignores_empty_segments() {
        assert_eq!(KeyPath::parse("a//b/"), KeyPath::parse("a/b"));
        assert!(KeyPath::parse("").is_root());
    }

    #[test]
    fn test_lookup_into_sequence() {
        let tree = json!({"sub": {"items": ["x", "y"]}});
        assert_eq!(lookup(&tree, &KeyPath::parse("sub/items/1")), Some(&json!("y")));
        assert_eq!(lookup(&tree, &KeyPath::parse("sub/items/5")), None);
    }

    #[test]
    fn test_insert_strict_requires_parent() {
        let mut tree = json!({});
        let err = insert(&mut tree, &KeyPath::parse("a/b"), json!(1), false).unwrap_err();
        assert!(matches!(err, Error::KeyNotFound { .. }));
    }

    #[test]
    fn test_insert_creates_parents() {
        let mut tree = json!({});
        insert(&mut tree, &KeyPath::parse("a/b/c"), json!(1), true).unwrap();
        assert_eq!(tree, json!({"a": {"b": {"c": 1}}}));
    }

    #[test]
    fn test_insert_through_scalar_fails() {
        let mut tree = json!({"a": 1});
        let err = insert(&mut tree, &KeyPath::parse("a/b"), json!(1), true).unwrap_err();
        assert!(matches!(err, Error::NotAContainer { .. }));
    }

    #[test]
    fn test_remove_keeps_sibling_order() {
        let mut tree = json!({"a": 1, "b": 2, "c": 3});
        assert_eq!(remove(&mut tree, &KeyPath::parse("b")), Some(json!(2)));
        let keys: Vec<_> = tree.as_object().unwrap().keys().cloned().collect();
        assert_eq!(keys, vec!["a", "c"]);
    }

    #[test]
    fn test_deep_merge_overrides_leaves() {
        let mut base = json!({"config": {"vscode": true, "pylint": true}, "name": "a"});
        deep_merge(&mut base, &json!({"config": {"pylint": false}, "name": "b"}));
        assert_eq!(
            base,
            json!({"config": {"vscode": true, "pylint": false}, "name": "b"})
        );
    }
}
