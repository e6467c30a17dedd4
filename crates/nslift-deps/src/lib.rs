//! nslift-deps - namespace dependency map builder.
//!
//! Scans provider roots for `NS.provide("dotted.path")` declarations and
//! produces the mapping from namespace path to the file that provides it.
//! Maps are memoized per `(roots, extension)` pair; under watch mode a file
//! watcher keeps the memoized map fresh so later builds observe new or
//! changed providers without a full rescan.

mod builder;
mod error;

pub use builder::{DependencyMap, DepsBuilder, scan_provides};
pub use error::{DepsError, Result};
