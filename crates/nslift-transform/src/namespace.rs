// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Namespace tree construction and flattening
//!
//! Dotted namespace paths are folded into a nested segment tree. The tree
//! drives two pieces of generated code: the referenced tree becomes the
//! `{}`-leaved literal materialized against the global scope, and the
//! exported tree becomes the export literal whose leaves are live
//! identifier expressions.

use regex::Regex;
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// A node in the namespace tree.
///
/// The variant is fixed at construction time: a `Leaf` is the deepest
/// inserted segment of a path, and inserting a longer path through it
/// promotes it to a `Node`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NamespaceTree {
    /// Deepest inserted segment of a namespace path
    Leaf,
    /// Interior namespace with child segments
    Node(BTreeMap<String, NamespaceTree>),
}

impl NamespaceTree {
    /// Create an empty tree.
    pub fn new() -> Self {
        NamespaceTree::Node(BTreeMap::new())
    }

    /// Build a tree from dotted paths.
    pub fn from_paths<I, S>(paths: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut tree = Self::new();
        for path in paths {
            tree.insert(path.as_ref());
        }
        tree
    }

    /// Insert one dotted path, creating intermediate nodes as needed.
    ///
    /// Re-inserting a path already present is a no-op.
    pub fn insert(&mut self, path: &str) {
        let mut layer = self;
        for segment in path.split('.').filter(|s| !s.is_empty()) {
            layer = layer.child_entry(segment);
        }
    }

    fn child_entry(&mut self, segment: &str) -> &mut NamespaceTree {
        if matches!(self, NamespaceTree::Leaf) {
            *self = NamespaceTree::Node(BTreeMap::new());
        }
        match self {
            NamespaceTree::Node(children) => children
                .entry(segment.to_string())
                .or_insert(NamespaceTree::Leaf),
            NamespaceTree::Leaf => unreachable!("leaf was just promoted to a node"),
        }
    }

    /// Whether the tree contains no namespaces.
    pub fn is_empty(&self) -> bool {
        match self {
            NamespaceTree::Leaf => true,
            NamespaceTree::Node(children) => children.is_empty(),
        }
    }

    /// Child segments of this node; a leaf has none.
    pub fn children(&self) -> &BTreeMap<String, NamespaceTree> {
        static EMPTY: BTreeMap<String, NamespaceTree> = BTreeMap::new();
        match self {
            NamespaceTree::Leaf => &EMPTY,
            NamespaceTree::Node(children) => children,
        }
    }

    /// Flatten back to the dotted paths of all leaves.
    pub fn paths(&self) -> Vec<String> {
        let mut out = Vec::new();
        self.collect_paths("", &mut out);
        out
    }

    fn collect_paths(&self, prefix: &str, out: &mut Vec<String>) {
        for (segment, child) in self.children() {
            let path = if prefix.is_empty() {
                segment.clone()
            } else {
                format!("{prefix}.{segment}")
            };
            match child {
                NamespaceTree::Leaf => out.push(path),
                NamespaceTree::Node(_) => child.collect_paths(&path, out),
            }
        }
    }

    /// Serialize to a JSON object literal with `{}` leaves.
    pub fn to_literal(&self) -> String {
        self.to_value().to_string()
    }

    fn to_value(&self) -> Value {
        let mut map = Map::new();
        for (segment, child) in self.children() {
            map.insert(segment.clone(), child.to_value());
        }
        Value::Object(map)
    }

    /// Serialize one exported root to a literal whose leaves are live
    /// identifier expressions.
    ///
    /// Each leaf is first annotated with a `%full.path%` token, the tree is
    /// serialized to JSON, and the token quoting is stripped so the leaf
    /// becomes a reference to the runtime value: `{"def":abc.def}`. A root
    /// that is itself a leaf serializes to `{}` (the caller falls back to
    /// exporting the root identifier directly).
    pub fn to_export_literal(&self, root: &str) -> String {
        match self {
            NamespaceTree::Leaf => "{}".to_string(),
            NamespaceTree::Node(_) => strip_placeholders(&self.annotate(root).to_string()),
        }
    }

    fn annotate(&self, path: &str) -> Value {
        match self {
            NamespaceTree::Leaf => Value::String(format!("%{path}%")),
            NamespaceTree::Node(children) => {
                let mut map = Map::new();
                for (segment, child) in children {
                    map.insert(segment.clone(), child.annotate(&format!("{path}.{segment}")));
                }
                Value::Object(map)
            }
        }
    }
}

impl Default for NamespaceTree {
    fn default() -> Self {
        Self::new()
    }
}

fn strip_placeholders(json: &str) -> String {
    let re = Regex::new(r#""%([^"%]*)%""#).unwrap();
    re.replace_all(json, "$1").into_owned()
}

/// Append a namespace to an ordered list unless it is already present.
pub fn push_unique(list: &mut Vec<String>, value: &str) {
    if !list.iter().any(|existing| existing == value) {
        list.push(value.to_string());
    }
}

/// Drop paths whose proper-prefix ancestor is also present in the list.
///
/// `["a.b", "a.b.c", "x"]` becomes `["a.b", "x"]`; exports implied by an
/// ancestor's export must not be emitted again.
pub fn remove_nested(paths: &[String]) -> Vec<String> {
    paths
        .iter()
        .filter(|path| {
            !path
                .match_indices('.')
                .any(|(idx, _)| paths.iter().any(|other| other.as_str() == &path[..idx]))
        })
        .cloned()
        .collect()
}
