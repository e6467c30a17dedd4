// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Transform configuration

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::error::{Result, TransformError};

/// Default extension filter for provider files
pub const DEFAULT_FILE_EXT: &str = ".js";

/// Default import specifier emitted for the runtime helper
pub const DEFAULT_RUNTIME_MODULE: &str = "nslift/runtime";

/// Build cache backend selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum CacheMode {
    /// Every invocation re-runs the full transform
    #[default]
    Off,
    /// Process-wide in-memory cache table
    Memory,
    /// Mirrored directory tree on disk
    Disk,
}

/// Configuration for the namespace transform
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Config {
    /// Root directories scanned for provider files
    pub paths: Vec<PathBuf>,

    /// Emit a default export and ES module interop marker
    pub es6mode: bool,

    /// Keep the dependency map fresh with a file watcher
    pub watch: bool,

    /// Extension filter for provider files
    pub file_ext: String,

    /// Build cache backend
    pub cache: CacheMode,

    /// Project root, required when disk caching is enabled
    pub root: Option<PathBuf>,

    /// Cache directory, required when disk caching is enabled
    pub cache_path: Option<PathBuf>,

    /// Import specifier for the deep-merge runtime helper
    pub runtime_module: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            paths: Vec::new(),
            es6mode: false,
            watch: true,
            file_ext: DEFAULT_FILE_EXT.to_string(),
            cache: CacheMode::Off,
            root: None,
            cache_path: None,
            runtime_module: DEFAULT_RUNTIME_MODULE.to_string(),
        }
    }
}

impl Config {
    /// Check option combinations that cannot be validated field by field.
    pub fn validate(&self) -> Result<()> {
        if self.cache == CacheMode::Disk {
            if self.root.is_none() {
                return Err(TransformError::MissingConfiguration("root"));
            }
            if self.cache_path.is_none() {
                return Err(TransformError::MissingConfiguration("cachePath"));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert!(config.paths.is_empty());
        assert!(!config.es6mode);
        assert!(config.watch);
        assert_eq!(config.file_ext, ".js");
        assert_eq!(config.cache, CacheMode::Off);
        assert_eq!(config.runtime_module, DEFAULT_RUNTIME_MODULE);
    }

    #[test]
    fn test_deserialize_option_names() {
        let config: Config = serde_json::from_str(
            r#"{
                "paths": ["/srv/js"],
                "es6mode": true,
                "fileExt": ".module.js",
                "cache": "disk",
                "root": "/srv",
                "cachePath": "/srv/.cache"
            }"#,
        )
        .unwrap();
        assert_eq!(config.paths, vec![PathBuf::from("/srv/js")]);
        assert!(config.es6mode);
        assert_eq!(config.file_ext, ".module.js");
        assert_eq!(config.cache, CacheMode::Disk);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_disk_cache_requires_root_and_cache_path() {
        let mut config = Config {
            cache: CacheMode::Disk,
            ..Config::default()
        };
        assert!(matches!(
            config.validate(),
            Err(TransformError::MissingConfiguration("root"))
        ));

        config.root = Some(PathBuf::from("/srv"));
        assert!(matches!(
            config.validate(),
            Err(TransformError::MissingConfiguration("cachePath"))
        ));

        config.cache_path = Some(PathBuf::from("/srv/.cache"));
        assert!(config.validate().is_ok());
    }
}
