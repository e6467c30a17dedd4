// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! # nslift-transform
//!
//! Rewrites source files that declare dotted-namespace symbols through
//! `NS.provide("a.b.c")` / `NS.require("a.b.c")` directives into CommonJS
//! modules with explicit imports and exports.
//!
//! For each file the transform:
//!
//! - strips every provide directive and records the declared namespaces
//! - replaces every require directive with an assignment against the
//!   resolved import (merge-based when the required namespace is an
//!   ancestor of one this file provides)
//! - injects a prefix that materializes the referenced namespace roots on
//!   `globalThis` through a small deep-merge runtime helper, without
//!   clobbering subtrees other modules already populated
//! - appends a postfix exporting the provided namespaces
//!
//! Results are memoized per source file in a build cache (in-memory or
//! directory-mirroring disk backend) keyed by modification timestamp.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use nslift_transform::{Config, Transformer};
//!
//! #[tokio::main]
//! async fn main() -> nslift_transform::Result<()> {
//!     let config = Config {
//!         paths: vec!["./js".into()],
//!         ..Config::default()
//!     };
//!     let transformer = Transformer::new(config)?;
//!     let out = transformer
//!         .transform("./js/app.js".as_ref(), "NS.provide('app');", None)
//!         .await?;
//!     println!("{}", out.content);
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod cache;
pub mod codegen;
pub mod config;
pub mod error;
pub mod merge;
pub mod namespace;
pub mod runtime;
pub mod scanner;
pub mod sourcemap;
pub mod transform;

pub use cache::{BuildCache, CacheEntry};
pub use config::{CacheMode, Config, DEFAULT_FILE_EXT, DEFAULT_RUNTIME_MODULE};
pub use error::{Result, TransformError};
pub use namespace::NamespaceTree;
pub use runtime::{RUNTIME_FILE_NAME, RUNTIME_IDENT, RUNTIME_SOURCE, RUNTIME_VERSION};
pub use scanner::{RequiredModule, ScanOutput, Scanner};
pub use sourcemap::SourceMap;
pub use transform::{SharedNamespaces, TransformOutput, TransformStats, Transformer};
