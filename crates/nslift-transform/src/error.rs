// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Error types for the namespace transform

use std::path::PathBuf;
use thiserror::Error;

/// Result type for transform operations
pub type Result<T> = std::result::Result<T, TransformError>;

/// Errors that can occur while transforming a source file
#[derive(Debug, Error)]
pub enum TransformError {
    /// A required namespace has no provider in the dependency map
    #[error("Can't find namespace dependency '{0}'")]
    UnresolvableDependency(String),

    /// Disk caching enabled without a required option
    #[error("Missing required configuration option '{0}' for disk caching")]
    MissingConfiguration(&'static str),

    /// Computed cache path escapes the cache root or collides with the source
    #[error("Invalid cache configuration for '{resource}': {reason}")]
    InvalidCacheConfig {
        /// Resource the cache path was computed for
        resource: PathBuf,
        /// Why the computed path was rejected
        reason: String,
    },

    /// A merge path segment exists but is not a mergeable object
    #[error("Invalid merge target: segment '{segment}' of '{path}' is not an object")]
    InvalidMergeTarget {
        /// Full dotted target path
        path: String,
        /// Offending segment
        segment: String,
    },

    /// Dependency map construction failed
    #[error("Dependency map error: {0}")]
    DepMap(#[from] nslift_deps::DepsError),

    /// File system error
    #[error("File system error: {0}")]
    Fs(#[from] std::io::Error),

    /// Source map or literal serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl TransformError {
    /// Create an unresolvable dependency error
    pub fn unresolvable(namespace: impl Into<String>) -> Self {
        Self::UnresolvableDependency(namespace.into())
    }

    /// Create an invalid merge target error
    pub fn invalid_merge_target(path: impl Into<String>, segment: impl Into<String>) -> Self {
        Self::InvalidMergeTarget {
            path: path.into(),
            segment: segment.into(),
        }
    }
}
