// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Deep-merge reference implementation
//!
//! The executable specification of the runtime helper shipped with emitted
//! output (`runtime/runtime.js`). A source object graph is merged into a
//! destination without overwriting subtrees the destination already owns,
//! unless overwrite is requested for leaf values. This is what lets many
//! generated modules contribute different leaves to one namespace root in
//! any load order.

use serde_json::{Map, Value};

use crate::error::{Result, TransformError};

/// Deep-merge `source` into `dest`.
///
/// For each key of `source`: a key absent (or null) on `dest` adopts the
/// source branch wholesale; two object values merge recursively; an
/// existing non-object destination value is replaced only when `overwrite`
/// is set, and wins silently otherwise. Non-object sources are ignored.
pub fn merge(source: &Value, dest: &mut Value, overwrite: bool) {
    let (Value::Object(source), Value::Object(dest)) = (source, dest) else {
        return;
    };
    for (key, value) in source {
        match dest.get_mut(key) {
            None => {
                dest.insert(key.clone(), value.clone());
            }
            Some(existing) if existing.is_null() => {
                *existing = value.clone();
            }
            Some(existing) => {
                if existing.is_object() && value.is_object() {
                    merge(value, existing, overwrite);
                } else if overwrite {
                    *existing = value.clone();
                }
            }
        }
    }
}

/// Deep-merge `source` into the dotted `path` under `root`.
///
/// Missing (or null) path segments are created as empty objects; a segment
/// that exists as anything else is a fatal merge target error.
pub fn merge_at_path(root: &mut Value, path: &str, source: &Value, overwrite: bool) -> Result<()> {
    let dest = resolve_path(root, path)?;
    merge(source, dest, overwrite);
    Ok(())
}

fn resolve_path<'a>(mut current: &'a mut Value, path: &str) -> Result<&'a mut Value> {
    for segment in path.split('.').filter(|s| !s.is_empty()) {
        let map = match current {
            Value::Object(map) => map,
            _ => return Err(TransformError::invalid_merge_target(path, segment)),
        };
        let entry = map.entry(segment.to_string()).or_insert(Value::Null);
        if entry.is_null() {
            *entry = Value::Object(Map::new());
        }
        if !entry.is_object() {
            return Err(TransformError::invalid_merge_target(path, segment));
        }
        current = entry;
    }
    Ok(current)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_merge_disjoint_subtrees() {
        let source = json!({"a": {"b": 1}});
        let mut dest = json!({"a": {"c": 2}});
        merge(&source, &mut dest, false);
        assert_eq!(dest, json!({"a": {"b": 1, "c": 2}}));
    }

    #[test]
    fn test_existing_leaf_wins_without_overwrite() {
        let source = json!({"a": 1});
        let mut dest = json!({"a": 2});
        merge(&source, &mut dest, false);
        assert_eq!(dest, json!({"a": 2}));
    }

    #[test]
    fn test_overwrite_replaces_leaf() {
        let source = json!({"a": 1});
        let mut dest = json!({"a": 2});
        merge(&source, &mut dest, true);
        assert_eq!(dest, json!({"a": 1}));
    }

    #[test]
    fn test_absent_branch_is_adopted_wholesale() {
        let source = json!({"a": {"b": {"c": 3}}});
        let mut dest = json!({});
        merge(&source, &mut dest, false);
        assert_eq!(dest, json!({"a": {"b": {"c": 3}}}));
    }

    #[test]
    fn test_null_destination_counts_as_absent() {
        let source = json!({"a": {"b": 1}});
        let mut dest = json!({"a": null});
        merge(&source, &mut dest, false);
        assert_eq!(dest, json!({"a": {"b": 1}}));
    }

    #[test]
    fn test_object_never_replaces_non_object_without_overwrite() {
        let source = json!({"a": {"b": 1}});
        let mut dest = json!({"a": 7});
        merge(&source, &mut dest, false);
        assert_eq!(dest, json!({"a": 7}));
    }

    #[test]
    fn test_merge_at_path_creates_segments() {
        let mut root = json!({});
        merge_at_path(&mut root, "x.y", &json!({"z": 1}), false).unwrap();
        assert_eq!(root, json!({"x": {"y": {"z": 1}}}));
    }

    #[test]
    fn test_merge_at_path_preserves_siblings() {
        let mut root = json!({"x": {"kept": true}});
        merge_at_path(&mut root, "x.y", &json!({"z": 1}), false).unwrap();
        assert_eq!(root, json!({"x": {"kept": true, "y": {"z": 1}}}));
    }

    #[test]
    fn test_merge_at_path_rejects_non_object_segment() {
        let mut root = json!({"x": {"y": 5}});
        let err = merge_at_path(&mut root, "x.y", &json!({"z": 1}), false).unwrap_err();
        assert!(matches!(
            err,
            TransformError::InvalidMergeTarget { ref segment, .. } if segment == "y"
        ));
    }
}
