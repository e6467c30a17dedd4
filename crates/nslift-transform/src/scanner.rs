// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Directive scanning and rewriting
//!
//! Locates `NS.provide(...)` / `NS.require(...)` directives by pattern
//! matching on the raw text, strips the provide declarations and rewrites
//! each require into an assignment against the resolved import. Directives
//! inside string or template literals are not excluded; the documented
//! directive form is a plain statement.

use std::path::Path;

use regex::Regex;

use crate::error::{Result, TransformError};
use crate::namespace::push_unique;
use crate::runtime::RUNTIME_IDENT;
use nslift_deps::DependencyMap;

/// One entry of the required-module table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequiredModule {
    /// Deterministic binding name derived from the specifier
    pub ident: String,
    /// Import specifier of the provider file
    pub specifier: String,
}

/// Result of scanning and rewriting one file.
#[derive(Debug, Clone)]
pub struct ScanOutput {
    /// Rewritten source text
    pub source: String,
    /// All namespaces mentioned (provided and required), first-mention order
    pub referenced: Vec<String>,
    /// Provided namespaces, first-mention order
    pub provided: Vec<String>,
    /// Import bindings to declare in the prefix
    pub required_modules: Vec<RequiredModule>,
}

struct Directive {
    text: String,
    namespace: String,
}

/// Directive scanner with precompiled patterns.
pub struct Scanner {
    provide_re: Regex,
    require_re: Regex,
}

impl Scanner {
    /// Create a scanner for the documented directive forms.
    pub fn new() -> Self {
        Self {
            provide_re: Regex::new(r#"NS\.provide[ \t]*\(\s*['"]([^'"]+)['"]\s*\)[ \t]*;?"#)
                .unwrap(),
            require_re: Regex::new(r#"NS\.require[ \t]*\(\s*['"]([^'"]+)['"]\s*\)[ \t]*;?"#)
                .unwrap(),
        }
    }

    /// Scan `source`, stripping provide directives and rewriting requires.
    ///
    /// `resource` is the file under transform (import specifiers are made
    /// relative to its directory); `map` resolves required namespaces to
    /// provider files. An unresolvable require aborts the whole scan.
    pub fn scan(&self, source: &str, resource: &Path, map: &DependencyMap) -> Result<ScanOutput> {
        let mut source = source.to_string();
        let mut referenced = Vec::new();
        let mut provided = Vec::new();
        let mut required_modules: Vec<RequiredModule> = Vec::new();

        // Provide pass: a directive may legitimately appear more than once
        // verbatim; every uncommented occurrence is removed.
        while let Some(directive) = first_directive(&self.provide_re, &source) {
            source = replace_unsuppressed(&source, &directive.text, "");
            push_unique(&mut referenced, &directive.namespace);
            push_unique(&mut provided, &directive.namespace);
        }

        // Require pass: each occurrence is rewritten into an assignment
        // binding the namespace identifier path to the resolved import.
        while let Some(directive) = first_directive(&self.require_re, &source) {
            let namespace = &directive.namespace;
            let Some(provider) = map.get(namespace) else {
                return Err(TransformError::unresolvable(namespace));
            };
            push_unique(&mut referenced, namespace);

            let specifier = import_specifier(provider, resource);
            let ident = import_ident(&specifier);
            if !required_modules.iter().any(|module| module.ident == ident) {
                required_modules.push(RequiredModule {
                    ident: ident.clone(),
                    specifier,
                });
            }

            let replacement = if is_ancestor_of_any(namespace, &provided) {
                // Deeper leaves this file provides under the required root
                // must survive adopting the import.
                format!("{namespace}={RUNTIME_IDENT}.merge({ident}.{namespace}, \"{namespace}\", false);")
            } else {
                format!("{namespace}={ident}.{namespace};")
            };
            source = replace_unsuppressed(&source, &directive.text, &replacement);
        }

        Ok(ScanOutput {
            source,
            referenced,
            provided,
            required_modules,
        })
    }
}

impl Default for Scanner {
    fn default() -> Self {
        Self::new()
    }
}

/// First directive occurrence not suppressed by a same-line `//`.
fn first_directive(re: &Regex, source: &str) -> Option<Directive> {
    let mut search_from = 0;
    while let Some(caps) = re.captures_at(source, search_from) {
        let full = caps.get(0)?;
        if commented_out(source, full.start()) {
            search_from = full.end();
            continue;
        }
        return Some(Directive {
            text: full.as_str().to_string(),
            namespace: caps[1].to_string(),
        });
    }
    None
}

fn commented_out(source: &str, offset: usize) -> bool {
    let line_start = source[..offset].rfind('\n').map_or(0, |idx| idx + 1);
    source[line_start..offset].contains("//")
}

/// Replace every uncommented literal occurrence of `needle`.
fn replace_unsuppressed(source: &str, needle: &str, replacement: &str) -> String {
    let mut out = String::with_capacity(source.len());
    let mut cursor = 0;
    for (start, _) in source.match_indices(needle) {
        if start < cursor || commented_out(source, start) {
            continue;
        }
        out.push_str(&source[cursor..start]);
        out.push_str(replacement);
        cursor = start + needle.len();
    }
    out.push_str(&source[cursor..]);
    out
}

/// Whether some provided namespace lies strictly below `namespace`.
fn is_ancestor_of_any(namespace: &str, provided: &[String]) -> bool {
    let prefix = format!("{namespace}.");
    provided.iter().any(|p| p.starts_with(&prefix))
}

/// Import specifier for a provider file, relative to the transformed file.
fn import_specifier(provider: &Path, resource: &Path) -> String {
    let base = resource.parent().unwrap_or_else(|| Path::new("."));
    let relative = pathdiff::diff_paths(provider, base).unwrap_or_else(|| provider.to_path_buf());
    let mut specifier = relative.to_string_lossy().replace('\\', "/");
    if !specifier.starts_with("./") && !specifier.starts_with("../") && !specifier.starts_with('/')
    {
        specifier = format!("./{specifier}");
    }
    specifier
}

/// Deterministic binding name for an import specifier.
///
/// Non-alphanumeric characters map to `_`, so `./vendor/z.js` becomes
/// `__vendor_z_js` and repeated requires of namespaces from one file share
/// a single binding.
fn import_ident(specifier: &str) -> String {
    specifier
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn map(entries: &[(&str, &str)]) -> DependencyMap {
        entries
            .iter()
            .map(|(ns, path)| (ns.to_string(), PathBuf::from(path)))
            .collect()
    }

    fn resource() -> PathBuf {
        PathBuf::from("/srv/app/src/main.js")
    }

    #[test]
    fn test_provide_directives_are_removed() {
        let scanner = Scanner::new();
        let out = scanner
            .scan(
                "NS.provide('x.y');\ndoStuff();\n",
                &resource(),
                &map(&[]),
            )
            .unwrap();
        assert_eq!(out.source, "\ndoStuff();\n");
        assert_eq!(out.provided, vec!["x.y"]);
        assert_eq!(out.referenced, vec!["x.y"]);
    }

    #[test]
    fn test_repeated_provide_occurrences_are_all_removed() {
        let scanner = Scanner::new();
        let out = scanner
            .scan(
                "NS.provide('x.y');\ncode();\nNS.provide('x.y');\n",
                &resource(),
                &map(&[]),
            )
            .unwrap();
        assert_eq!(out.source, "\ncode();\n\n");
        assert_eq!(out.provided, vec!["x.y"]);
    }

    #[test]
    fn test_commented_directives_are_ignored() {
        let scanner = Scanner::new();
        let out = scanner
            .scan(
                "// NS.provide('dead.ns');\nNS.provide('live.ns');\n",
                &resource(),
                &map(&[]),
            )
            .unwrap();
        assert_eq!(out.source, "// NS.provide('dead.ns');\n\n");
        assert_eq!(out.provided, vec!["live.ns"]);
    }

    #[test]
    fn test_require_is_rewritten_to_import_binding() {
        let scanner = Scanner::new();
        let out = scanner
            .scan(
                "NS.require('x.z');\ndoStuff();\n",
                &resource(),
                &map(&[("x.z", "/srv/app/src/z.js")]),
            )
            .unwrap();
        assert_eq!(out.source, "x.z=__z_js.x.z;\ndoStuff();\n");
        assert_eq!(out.referenced, vec!["x.z"]);
        assert_eq!(
            out.required_modules,
            vec![RequiredModule {
                ident: "__z_js".to_string(),
                specifier: "./z.js".to_string(),
            }]
        );
    }

    #[test]
    fn test_requires_from_one_file_share_a_binding() {
        let scanner = Scanner::new();
        let out = scanner
            .scan(
                "NS.require('x.a');\nNS.require('x.b');\n",
                &resource(),
                &map(&[("x.a", "/srv/app/src/x.js"), ("x.b", "/srv/app/src/x.js")]),
            )
            .unwrap();
        assert_eq!(out.required_modules.len(), 1);
        assert_eq!(out.source, "x.a=__x_js.x.a;\nx.b=__x_js.x.b;\n");
    }

    #[test]
    fn test_ancestor_require_uses_merge() {
        let scanner = Scanner::new();
        let out = scanner
            .scan(
                "NS.provide('a.b.c');\nNS.require('a');\n",
                &resource(),
                &map(&[("a", "/srv/app/src/a.js")]),
            )
            .unwrap();
        assert_eq!(
            out.source,
            "\na=__nslift.merge(__a_js.a, \"a\", false);\n"
        );
    }

    #[test]
    fn test_non_ancestor_require_uses_plain_assignment() {
        let scanner = Scanner::new();
        let out = scanner
            .scan(
                "NS.provide('a.b');\nNS.require('a.c');\n",
                &resource(),
                &map(&[("a.c", "/srv/app/src/c.js")]),
            )
            .unwrap();
        assert!(out.source.contains("a.c=__c_js.a.c;"));
        assert!(!out.source.contains("merge"));
    }

    #[test]
    fn test_unresolvable_require_fails_the_scan() {
        let scanner = Scanner::new();
        let err = scanner
            .scan("NS.require('no.such.ns');\n", &resource(), &map(&[]))
            .unwrap_err();
        assert!(matches!(
            err,
            TransformError::UnresolvableDependency(ref ns) if ns == "no.such.ns"
        ));
    }

    #[test]
    fn test_import_specifier_walks_up_directories() {
        let specifier = import_specifier(
            Path::new("/srv/app/vendor/z.js"),
            Path::new("/srv/app/src/main.js"),
        );
        assert_eq!(specifier, "../vendor/z.js");
        assert_eq!(import_ident(&specifier), "___vendor_z_js");
    }
}
