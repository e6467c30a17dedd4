// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! CLI argument parsing for nslift

use clap::Parser;
use std::path::PathBuf;

use nslift_transform::DEFAULT_RUNTIME_MODULE;

/// nslift - rewrite NS.provide/NS.require namespace directives into CommonJS modules
#[derive(Parser, Debug)]
#[command(name = "nslift")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Directory of source files to transform
    pub input: PathBuf,

    /// Directory the rewritten files are mirrored into
    #[arg(short, long)]
    pub out: PathBuf,

    /// Provider root scanned for NS.provide declarations (repeatable)
    #[arg(short = 'p', long = "provider-path")]
    pub provider_paths: Vec<PathBuf>,

    /// Extension filter for provider and input files
    #[arg(long, default_value = ".js")]
    pub ext: String,

    /// Emit a default export and ES module interop marker
    #[arg(long)]
    pub es6: bool,

    /// Keep the dependency map fresh with a file watcher
    #[arg(long)]
    pub watch: bool,

    /// Build cache backend
    #[arg(long, default_value = "off", value_parser = ["off", "memory", "disk"])]
    pub cache: String,

    /// Project root, required for disk caching
    #[arg(long)]
    pub project_root: Option<PathBuf>,

    /// Cache directory, required for disk caching
    #[arg(long)]
    pub cache_root: Option<PathBuf>,

    /// Import specifier emitted for the runtime helper
    #[arg(long, default_value = DEFAULT_RUNTIME_MODULE)]
    pub runtime_module: String,

    /// Write the runtime helper module into the output directory
    #[arg(long)]
    pub emit_runtime: bool,

    /// Enable verbose output
    #[arg(short, long)]
    pub verbose: bool,
}
