//! Provider scanning and dependency map construction.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use dashmap::DashMap;
use notify::{RecommendedWatcher, RecursiveMode, Watcher};
use parking_lot::{Mutex, RwLock};
use regex::Regex;
use tracing::{debug, warn};
use walkdir::WalkDir;

use crate::error::{DepsError, Result};

/// Mapping from dotted namespace path to the file providing it.
pub type DependencyMap = HashMap<String, PathBuf>;

/// Scan one file's text for provide directives.
///
/// Returns the declared namespaces in first-mention order. A `//` earlier on
/// the same line suppresses the match.
pub fn scan_provides(source: &str) -> Vec<String> {
    let re = Regex::new(r#"NS\.provide[ \t]*\(\s*['"]([^'"]+)['"]\s*\)[ \t]*;?"#).unwrap();
    let mut provides = Vec::new();
    for caps in re.captures_iter(source) {
        let Some(full) = caps.get(0) else { continue };
        if commented_out(source, full.start()) {
            continue;
        }
        let namespace = caps[1].to_string();
        if !provides.contains(&namespace) {
            provides.push(namespace);
        }
    }
    provides
}

fn commented_out(source: &str, offset: usize) -> bool {
    let line_start = source[..offset].rfind('\n').map_or(0, |idx| idx + 1);
    source[line_start..offset].contains("//")
}

fn matches_extension(path: &Path, file_ext: &str) -> bool {
    path.file_name()
        .map(|name| name.to_string_lossy().ends_with(file_ext))
        .unwrap_or(false)
}

type BuilderKey = (Vec<PathBuf>, String);

struct MapHandle {
    map: Arc<RwLock<DependencyMap>>,
    // Kept alive so watch mode survives between build calls.
    _watcher: Option<Arc<Mutex<RecommendedWatcher>>>,
}

/// Builds and memoizes namespace dependency maps.
///
/// One map is kept per `(roots, extension)` pair. The first `build` with
/// `watch` enabled installs a recursive file watcher over the roots; change
/// events re-scan the affected file in place so subsequent builds observe
/// fresher entries without a rescan.
pub struct DepsBuilder {
    maps: DashMap<BuilderKey, MapHandle>,
}

impl DepsBuilder {
    /// Create a builder with no memoized maps.
    pub fn new() -> Self {
        Self {
            maps: DashMap::new(),
        }
    }

    /// Build the namespace map for the given provider roots.
    ///
    /// Resolves once per invocation with a snapshot of the current map.
    pub async fn build(
        &self,
        paths: &[PathBuf],
        watch: bool,
        file_ext: &str,
    ) -> Result<DependencyMap> {
        let key = (paths.to_vec(), file_ext.to_string());
        if let Some(handle) = self.maps.get(&key) {
            return Ok(handle.map.read().clone());
        }

        let mut built = DependencyMap::new();
        for root in paths {
            if !root.is_dir() {
                return Err(DepsError::InvalidRoot(root.clone()));
            }
            scan_root(root, file_ext, &mut built).await?;
        }
        debug!(namespaces = built.len(), roots = paths.len(), "dependency map built");

        let map = Arc::new(RwLock::new(built));
        let watcher = if watch {
            Some(spawn_watcher(paths, file_ext, Arc::clone(&map))?)
        } else {
            None
        };
        let snapshot = map.read().clone();
        self.maps.insert(
            key,
            MapHandle {
                map,
                _watcher: watcher,
            },
        );
        Ok(snapshot)
    }
}

impl Default for DepsBuilder {
    fn default() -> Self {
        Self::new()
    }
}

async fn scan_root(root: &Path, file_ext: &str, map: &mut DependencyMap) -> Result<()> {
    for entry in WalkDir::new(root).into_iter().filter_map(|e| e.ok()) {
        if !entry.file_type().is_file() {
            continue;
        }
        let path = entry.path();
        if !matches_extension(path, file_ext) {
            continue;
        }
        let source = match tokio::fs::read_to_string(path).await {
            Ok(source) => source,
            Err(err) => {
                warn!(file = %path.display(), "skipping unreadable provider file: {err}");
                continue;
            }
        };
        record_provides(path, &source, map);
    }
    Ok(())
}

fn record_provides(path: &Path, source: &str, map: &mut DependencyMap) {
    for namespace in scan_provides(source) {
        if let Some(previous) = map.insert(namespace.clone(), path.to_path_buf()) {
            if previous != path {
                warn!(
                    namespace = %namespace,
                    old = %previous.display(),
                    new = %path.display(),
                    "namespace provided by multiple files"
                );
            }
        }
    }
}

fn spawn_watcher(
    paths: &[PathBuf],
    file_ext: &str,
    map: Arc<RwLock<DependencyMap>>,
) -> Result<Arc<Mutex<RecommendedWatcher>>> {
    let ext = file_ext.to_string();
    let mut watcher = notify::recommended_watcher(move |result: notify::Result<notify::Event>| {
        let event = match result {
            Ok(event) => event,
            Err(err) => {
                warn!("watch error: {err}");
                return;
            }
        };
        for path in &event.paths {
            if matches_extension(path, &ext) {
                refresh_file(path, &map);
            }
        }
    })?;
    for root in paths {
        watcher.watch(root, RecursiveMode::Recursive)?;
    }
    debug!(roots = paths.len(), "dependency map watcher installed");
    Ok(Arc::new(Mutex::new(watcher)))
}

/// Re-scan one changed provider file, dropping entries it no longer provides.
fn refresh_file(path: &Path, map: &Arc<RwLock<DependencyMap>>) {
    let mut guard = map.write();
    guard.retain(|_, provider| provider != path);
    match std::fs::read_to_string(path) {
        Ok(source) => {
            for namespace in scan_provides(&source) {
                guard.insert(namespace, path.to_path_buf());
            }
            debug!(file = %path.display(), "dependency map refreshed");
        }
        Err(_) => {
            debug!(file = %path.display(), "provider file removed from dependency map");
        }
    }
}
