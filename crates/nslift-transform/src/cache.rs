// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Build cache with memory and disk backends
//!
//! Keyed by absolute resource path and invalidated by the source file's
//! modification timestamp. The memory backend lives for the process; the
//! disk backend mirrors the project tree under a cache directory and is
//! validated against the live file on each read. Reads and writes are
//! synchronous and not guarded against concurrent writers from other
//! processes.

use std::fs;
use std::path::{Component, Path, PathBuf};
use std::time::SystemTime;

use dashmap::DashMap;
use tracing::debug;

use crate::config::{CacheMode, Config};
use crate::error::{Result, TransformError};
use crate::sourcemap::SourceMap;

/// One cached transform result.
#[derive(Debug, Clone)]
pub struct CacheEntry {
    /// Emitted file content
    pub content: String,
    /// Emitted source map, when one was produced
    pub map: Option<SourceMap>,
    /// Source modification timestamp at transform time
    pub mtime: SystemTime,
}

/// Build cache backend, selected by configuration.
pub enum BuildCache {
    /// Process-wide in-memory table
    Memory(MemoryCache),
    /// Mirrored directory tree on disk
    Disk(DiskCache),
}

impl BuildCache {
    /// Select a backend from the configuration; `None` when caching is off.
    pub fn from_config(config: &Config) -> Result<Option<BuildCache>> {
        match config.cache {
            CacheMode::Off => Ok(None),
            CacheMode::Memory => Ok(Some(BuildCache::Memory(MemoryCache::new()))),
            CacheMode::Disk => {
                let root = config
                    .root
                    .clone()
                    .ok_or(TransformError::MissingConfiguration("root"))?;
                let cache_path = config
                    .cache_path
                    .clone()
                    .ok_or(TransformError::MissingConfiguration("cachePath"))?;
                Ok(Some(BuildCache::Disk(DiskCache::new(root, cache_path))))
            }
        }
    }

    /// Look up a fresh entry for `resource`.
    ///
    /// `require_map` forces a miss when the stored entry carries no source
    /// map (the caller supplied an input map and needs one back).
    pub fn lookup(&self, resource: &Path, require_map: bool) -> Result<Option<CacheEntry>> {
        match self {
            BuildCache::Memory(cache) => Ok(cache.lookup(resource, require_map)),
            BuildCache::Disk(cache) => cache.lookup(resource, require_map),
        }
    }

    /// Store an entry for `resource`, overwriting any previous one.
    pub fn store(&self, resource: &Path, entry: CacheEntry) -> Result<()> {
        match self {
            BuildCache::Memory(cache) => {
                cache.store(resource, entry);
                Ok(())
            }
            BuildCache::Disk(cache) => cache.store(resource, &entry),
        }
    }
}

/// In-memory cache table, keyed by resource path.
pub struct MemoryCache {
    entries: DashMap<PathBuf, CacheEntry>,
}

impl MemoryCache {
    /// Create an empty cache table.
    pub fn new() -> Self {
        Self {
            entries: DashMap::new(),
        }
    }

    fn lookup(&self, resource: &Path, require_map: bool) -> Option<CacheEntry> {
        let entry = match self.entries.get(resource) {
            Some(entry) => entry.value().clone(),
            None => return None,
        };
        let Ok(mtime) = source_mtime(resource) else {
            return None;
        };
        if mtime != entry.mtime {
            // Stale entries are evicted so a failed re-transform cannot
            // resurrect them.
            self.entries.remove(resource);
            return None;
        }
        if require_map && entry.map.is_none() {
            return None;
        }
        Some(entry)
    }

    fn store(&self, resource: &Path, entry: CacheEntry) {
        self.entries.insert(resource.to_path_buf(), entry);
    }
}

impl Default for MemoryCache {
    fn default() -> Self {
        Self::new()
    }
}

/// Directory-mirroring disk cache.
pub struct DiskCache {
    root: PathBuf,
    cache_dir: PathBuf,
}

impl DiskCache {
    /// Create a disk cache under `cache_dir`, relativizing resources
    /// against the project `root`.
    pub fn new(root: PathBuf, cache_dir: PathBuf) -> Self {
        Self { root, cache_dir }
    }

    /// Compute the mirrored cache path for a resource.
    ///
    /// Fatal when the resource does not relativize under the project root,
    /// when the mirrored path would escape the cache root, or when it
    /// collides with the resource itself (a cache write must never clobber
    /// source).
    pub fn cache_path(&self, resource: &Path) -> Result<PathBuf> {
        let relative = pathdiff::diff_paths(resource, &self.root).ok_or_else(|| {
            invalid_config(resource, "resource does not relativize against the project root")
        })?;
        if relative
            .components()
            .any(|component| matches!(component, Component::ParentDir))
        {
            return Err(invalid_config(resource, "resource lies outside the project root"));
        }
        let path = self.cache_dir.join(&relative);
        if path == resource {
            return Err(invalid_config(resource, "cache path equals the resource path"));
        }
        Ok(path)
    }

    fn lookup(&self, resource: &Path, require_map: bool) -> Result<Option<CacheEntry>> {
        let path = self.cache_path(resource)?;
        let Ok(cache_meta) = fs::metadata(&path) else {
            return Ok(None);
        };
        let Ok(source_meta) = fs::metadata(resource) else {
            return Ok(None);
        };
        let (Ok(cached_at), Ok(modified)) = (cache_meta.modified(), source_meta.modified()) else {
            return Ok(None);
        };
        // The mirrored copy carries no separate timestamp record; it is
        // fresh only while it is at least as new as the source.
        if cached_at < modified {
            return Ok(None);
        }
        let content = fs::read_to_string(&path)?;
        let map = match fs::read_to_string(map_path(&path)) {
            Ok(json) => Some(SourceMap::from_json(&json)?),
            Err(_) => None,
        };
        if require_map && map.is_none() {
            return Ok(None);
        }
        debug!(resource = %resource.display(), "disk cache hit");
        Ok(Some(CacheEntry {
            content,
            map,
            mtime: modified,
        }))
    }

    fn store(&self, resource: &Path, entry: &CacheEntry) -> Result<()> {
        let path = self.cache_path(resource)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, &entry.content)?;
        if let Some(map) = &entry.map {
            fs::write(map_path(&path), map.to_json()?)?;
        }
        debug!(resource = %resource.display(), cache = %path.display(), "disk cache write");
        Ok(())
    }
}

fn invalid_config(resource: &Path, reason: &str) -> TransformError {
    TransformError::InvalidCacheConfig {
        resource: resource.to_path_buf(),
        reason: reason.to_string(),
    }
}

fn map_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_os_string();
    name.push(".map");
    PathBuf::from(name)
}

fn source_mtime(resource: &Path) -> std::io::Result<SystemTime> {
    fs::metadata(resource)?.modified()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread::sleep;
    use std::time::Duration;

    fn entry_for(resource: &Path, content: &str) -> CacheEntry {
        CacheEntry {
            content: content.to_string(),
            map: None,
            mtime: source_mtime(resource).unwrap(),
        }
    }

    #[test]
    fn test_memory_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let resource = dir.path().join("a.js");
        fs::write(&resource, "code();").unwrap();

        let cache = MemoryCache::new();
        cache.store(&resource, entry_for(&resource, "out"));
        let hit = cache.lookup(&resource, false).unwrap();
        assert_eq!(hit.content, "out");
    }

    #[test]
    fn test_memory_mtime_change_evicts() {
        let dir = tempfile::tempdir().unwrap();
        let resource = dir.path().join("a.js");
        fs::write(&resource, "code();").unwrap();

        let cache = MemoryCache::new();
        cache.store(&resource, entry_for(&resource, "out"));

        sleep(Duration::from_millis(10));
        fs::write(&resource, "code(); // edited").unwrap();
        assert!(cache.lookup(&resource, false).is_none());
        // The stale entry was evicted, not just skipped.
        assert!(cache.entries.get(&resource).is_none());
    }

    #[test]
    fn test_memory_require_map_misses_without_map() {
        let dir = tempfile::tempdir().unwrap();
        let resource = dir.path().join("a.js");
        fs::write(&resource, "code();").unwrap();

        let cache = MemoryCache::new();
        cache.store(&resource, entry_for(&resource, "out"));
        assert!(cache.lookup(&resource, false).is_some());
        assert!(cache.lookup(&resource, true).is_none());
    }

    #[test]
    fn test_disk_cache_path_mirrors_project_tree() {
        let cache = DiskCache::new(PathBuf::from("/srv/app"), PathBuf::from("/srv/cache"));
        let path = cache.cache_path(Path::new("/srv/app/src/main.js")).unwrap();
        assert_eq!(path, PathBuf::from("/srv/cache/src/main.js"));
    }

    #[test]
    fn test_disk_cache_rejects_resource_outside_root() {
        let cache = DiskCache::new(PathBuf::from("/srv/app"), PathBuf::from("/srv/cache"));
        let err = cache.cache_path(Path::new("/etc/passwd.js")).unwrap_err();
        assert!(matches!(err, TransformError::InvalidCacheConfig { .. }));
    }

    #[test]
    fn test_disk_cache_rejects_colliding_cache_path() {
        // cache_dir == root mirrors every resource onto itself.
        let cache = DiskCache::new(PathBuf::from("/srv/app"), PathBuf::from("/srv/app"));
        let err = cache.cache_path(Path::new("/srv/app/src/main.js")).unwrap_err();
        assert!(matches!(err, TransformError::InvalidCacheConfig { .. }));
    }

    #[test]
    fn test_disk_round_trip_with_map_sidecar() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("project");
        let cache_dir = dir.path().join("cache");
        fs::create_dir_all(root.join("src")).unwrap();
        let resource = root.join("src/main.js");
        fs::write(&resource, "code();").unwrap();

        let cache = DiskCache::new(root, cache_dir.clone());
        let map = SourceMap {
            version: 3,
            file: None,
            source_root: None,
            sources: vec!["main.js".to_string()],
            sources_content: None,
            names: vec![],
            mappings: "AAAA".to_string(),
        };
        let entry = CacheEntry {
            content: "out".to_string(),
            map: Some(map.clone()),
            mtime: source_mtime(&resource).unwrap(),
        };
        cache.store(&resource, &entry).unwrap();
        assert!(cache_dir.join("src/main.js").is_file());
        assert!(cache_dir.join("src/main.js.map").is_file());

        let hit = cache.lookup(&resource, true).unwrap().unwrap();
        assert_eq!(hit.content, "out");
        assert_eq!(hit.map, Some(map));
    }

    #[test]
    fn test_disk_missing_sidecar_is_not_a_miss_unless_required() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("project");
        let cache_dir = dir.path().join("cache");
        fs::create_dir_all(&root).unwrap();
        let resource = root.join("main.js");
        fs::write(&resource, "code();").unwrap();

        let cache = DiskCache::new(root, cache_dir);
        let entry = CacheEntry {
            content: "out".to_string(),
            map: None,
            mtime: source_mtime(&resource).unwrap(),
        };
        cache.store(&resource, &entry).unwrap();

        let hit = cache.lookup(&resource, false).unwrap().unwrap();
        assert_eq!(hit.map, None);
        assert!(cache.lookup(&resource, true).unwrap().is_none());
    }

    #[test]
    fn test_disk_stale_source_misses() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("project");
        let cache_dir = dir.path().join("cache");
        fs::create_dir_all(&root).unwrap();
        let resource = root.join("main.js");
        fs::write(&resource, "code();").unwrap();

        let cache = DiskCache::new(root, cache_dir);
        let entry = CacheEntry {
            content: "out".to_string(),
            map: None,
            mtime: source_mtime(&resource).unwrap(),
        };
        cache.store(&resource, &entry).unwrap();
        assert!(cache.lookup(&resource, false).unwrap().is_some());

        sleep(Duration::from_millis(10));
        fs::write(&resource, "code(); // edited").unwrap();
        assert!(cache.lookup(&resource, false).unwrap().is_none());
    }
}
