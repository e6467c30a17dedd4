// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Prefix and postfix code synthesis
//!
//! The prefix runs before any module code: it binds the runtime helper,
//! materializes every referenced namespace root against the global scope
//! (never replacing populated leaves), and declares one import binding per
//! required module. The postfix exports the provided namespaces and,
//! in ES module mode, a default export with the interop marker.

use crate::namespace::NamespaceTree;
use crate::runtime::RUNTIME_IDENT;
use crate::scanner::RequiredModule;

/// Build the prefix injected ahead of the module code.
pub fn create_prefix(
    referenced: &NamespaceTree,
    required_modules: &[RequiredModule],
    runtime_module: &str,
) -> String {
    let mut prefix = String::new();
    if !referenced.is_empty() {
        prefix.push_str(&format!(
            "var {RUNTIME_IDENT} = require({});",
            js_string(runtime_module)
        ));
        prefix.push_str(&format!(
            "\n{RUNTIME_IDENT}.merge({}, globalThis, false);",
            referenced.to_literal()
        ));
    }
    for module in required_modules {
        if !prefix.is_empty() {
            prefix.push('\n');
        }
        prefix.push_str(&format!(
            "var {} = require({});",
            module.ident,
            js_string(&module.specifier)
        ));
    }
    prefix
}

/// Build the postfix appended after the module code.
///
/// Empty when the file exports nothing and no default export is wanted.
pub fn create_postfix(exported: &NamespaceTree, exported_paths: &[String], es6mode: bool) -> String {
    if exported.is_empty() {
        return String::new();
    }
    let mut postfix = String::from("\n;");
    for (root, subtree) in exported.children() {
        let literal = subtree.to_export_literal(root);
        if literal == "{}" {
            // Provide was declared but the namespace value may never have
            // been assigned; fall back to the root with a marker default.
            postfix.push_str(&format!("exports.{root}={root} || {{ empty: true }};"));
        } else {
            postfix.push_str(&format!("exports.{root}={literal};"));
        }
    }
    if es6mode {
        if let Some(first) = exported_paths.first() {
            postfix.push_str(&format!("exports.default={first};exports.__esModule=true;"));
        }
    }
    postfix
}

/// Assemble the final module text.
pub fn assemble(prefix: &str, source: &str, postfix: &str) -> String {
    if prefix.is_empty() {
        format!("{source}{postfix}")
    } else {
        format!("{prefix}\n{source}{postfix}")
    }
}

/// Number of generated lines the prefix shifts the original source down by.
pub fn prefix_line_count(prefix: &str) -> usize {
    if prefix.is_empty() {
        0
    } else {
        prefix.lines().count()
    }
}

fn js_string(value: &str) -> String {
    format!("\"{}\"", value.replace('\\', "\\\\").replace('"', "\\\""))
}
