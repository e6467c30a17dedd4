// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Transform orchestration
//!
//! Drives the per-file pipeline: build cache lookup, dependency map
//! resolution (the only suspension point), directive scan/rewrite, tree
//! construction, prefix/postfix synthesis, source map adjustment, and
//! finally the shared-snapshot and cache writes. A failure anywhere fails
//! that file's transform only; the shared snapshot and other files' cache
//! entries are never left partially updated.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use dashmap::DashMap;
use tracing::debug;

use crate::cache::{BuildCache, CacheEntry};
use crate::codegen;
use crate::config::Config;
use crate::error::Result;
use crate::namespace::{self, NamespaceTree};
use crate::scanner::Scanner;
use crate::sourcemap::SourceMap;
use nslift_deps::DepsBuilder;

/// Process-long namespace snapshot shared across transforms.
///
/// Append-only: keys are inserted or overwritten with fresher providers,
/// never pruned, so namespaces resolved earlier in a run stay resolvable
/// even after the builder's own map was rebuilt in between.
pub type SharedNamespaces = Arc<DashMap<String, PathBuf>>;

/// Counters for host diagnostics.
#[derive(Debug, Default)]
pub struct TransformStats {
    transforms: AtomicU64,
    cache_hits: AtomicU64,
}

impl TransformStats {
    /// Number of full scanner/generator runs.
    pub fn transforms(&self) -> u64 {
        self.transforms.load(Ordering::Relaxed)
    }

    /// Number of lookups served from the build cache.
    pub fn cache_hits(&self) -> u64 {
        self.cache_hits.load(Ordering::Relaxed)
    }
}

/// Result of one file transform.
#[derive(Debug, Clone, PartialEq)]
pub struct TransformOutput {
    /// Rewritten module text
    pub content: String,
    /// Adjusted source map, present when an input map was supplied
    pub map: Option<SourceMap>,
}

/// Per-file transform driver.
pub struct Transformer {
    config: Config,
    scanner: Scanner,
    cache: Option<BuildCache>,
    deps: DepsBuilder,
    shared: SharedNamespaces,
    stats: TransformStats,
}

impl Transformer {
    /// Create a transformer; fails on an invalid cache configuration.
    pub fn new(config: Config) -> Result<Self> {
        Self::with_shared(config, Arc::new(DashMap::new()))
    }

    /// Create a transformer sharing an existing namespace snapshot.
    pub fn with_shared(config: Config, shared: SharedNamespaces) -> Result<Self> {
        config.validate()?;
        let cache = BuildCache::from_config(&config)?;
        Ok(Self {
            config,
            scanner: Scanner::new(),
            cache,
            deps: DepsBuilder::new(),
            shared,
            stats: TransformStats::default(),
        })
    }

    /// Diagnostic counters.
    pub fn stats(&self) -> &TransformStats {
        &self.stats
    }

    /// Handle on the shared namespace snapshot.
    pub fn shared(&self) -> SharedNamespaces {
        Arc::clone(&self.shared)
    }

    /// Transform one file.
    ///
    /// `resource` is the absolute source path (the cache key and the base
    /// for import specifiers); `source` its current text. When `input_map`
    /// is given, the returned output carries an adjusted map.
    pub async fn transform(
        &self,
        resource: &Path,
        source: &str,
        input_map: Option<SourceMap>,
    ) -> Result<TransformOutput> {
        let require_map = input_map.is_some();
        if let Some(cache) = &self.cache {
            if let Some(entry) = cache.lookup(resource, require_map)? {
                self.stats.cache_hits.fetch_add(1, Ordering::Relaxed);
                debug!(resource = %resource.display(), "build cache hit");
                return Ok(TransformOutput {
                    content: entry.content,
                    map: entry.map,
                });
            }
        }

        // The one suspension point; everything below runs synchronously.
        let mut map = self
            .deps
            .build(&self.config.paths, self.config.watch, &self.config.file_ext)
            .await?;
        for entry in self.shared.iter() {
            map.entry(entry.key().clone())
                .or_insert_with(|| entry.value().clone());
        }

        let scan = self.scanner.scan(source, resource, &map)?;

        let referenced_tree = NamespaceTree::from_paths(&scan.referenced);
        let exported_paths = namespace::remove_nested(&scan.provided);
        let exported_tree = NamespaceTree::from_paths(&exported_paths);

        let prefix = codegen::create_prefix(
            &referenced_tree,
            &scan.required_modules,
            &self.config.runtime_module,
        );
        let postfix = codegen::create_postfix(&exported_tree, &exported_paths, self.config.es6mode);
        let content = codegen::assemble(&prefix, &scan.source, &postfix);

        let out_map = input_map.map(|mut out_map| {
            out_map.shift_generated_lines(codegen::prefix_line_count(&prefix));
            out_map.file = Some(resource.display().to_string());
            out_map
        });

        // Publish only after the whole transform succeeded: the fresh map
        // keys, then this file's own provides.
        for (namespace, provider) in &map {
            self.shared.insert(namespace.clone(), provider.clone());
        }
        for namespace in &scan.provided {
            self.shared.insert(namespace.clone(), resource.to_path_buf());
        }

        self.stats.transforms.fetch_add(1, Ordering::Relaxed);
        debug!(
            resource = %resource.display(),
            provided = scan.provided.len(),
            referenced = scan.referenced.len(),
            "transform complete"
        );

        if let Some(cache) = &self.cache {
            if let Ok(meta) = std::fs::metadata(resource) {
                if let Ok(mtime) = meta.modified() {
                    cache.store(
                        resource,
                        CacheEntry {
                            content: content.clone(),
                            map: out_map.clone(),
                            mtime,
                        },
                    )?;
                }
            }
        }

        Ok(TransformOutput {
            content,
            map: out_map,
        })
    }
}
