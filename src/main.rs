// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! nslift - namespace directive transformer
//!
//! Batch driver: walks an input tree, rewrites the provide/require
//! directives in every matching file through one shared transformer, and
//! mirrors the results into the output directory. A `.map` sidecar next to
//! an input file is carried through the transform as its input source map.

mod cli;

use std::path::Path;
use std::process::ExitCode;

use anyhow::Context;
use clap::Parser;
use owo_colors::OwoColorize;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use walkdir::WalkDir;

use cli::Cli;
use nslift_transform::{
    CacheMode, Config, RUNTIME_FILE_NAME, RUNTIME_SOURCE, SourceMap, Transformer,
};

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    match run(&cli).await {
        Ok(0) => ExitCode::SUCCESS,
        Ok(_) => ExitCode::FAILURE,
        Err(err) => {
            eprintln!("{} {err:#}", "error:".red().bold());
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: &Cli) -> anyhow::Result<usize> {
    let config = build_config(cli)?;
    let transformer = Transformer::new(config)?;

    tokio::fs::create_dir_all(&cli.out)
        .await
        .with_context(|| format!("creating output directory {}", cli.out.display()))?;
    if cli.emit_runtime {
        let runtime_path = cli.out.join(RUNTIME_FILE_NAME);
        tokio::fs::write(&runtime_path, RUNTIME_SOURCE)
            .await
            .with_context(|| format!("writing runtime helper {}", runtime_path.display()))?;
        if cli.verbose {
            println!("{} {}", "runtime".cyan(), runtime_path.display());
        }
    }

    let mut transformed = 0usize;
    let mut failures = 0usize;
    for entry in WalkDir::new(&cli.input).into_iter().filter_map(|e| e.ok()) {
        if !entry.file_type().is_file() {
            continue;
        }
        let path = entry.path();
        let matches_ext = path
            .file_name()
            .map(|name| name.to_string_lossy().ends_with(&cli.ext))
            .unwrap_or(false);
        if !matches_ext {
            continue;
        }
        match transform_file(&transformer, cli, path).await {
            Ok(()) => {
                transformed += 1;
                if cli.verbose {
                    println!("{} {}", "rewrote".green(), path.display());
                }
            }
            Err(err) => {
                failures += 1;
                eprintln!("{} {}: {err:#}", "failed".red(), path.display());
            }
        }
    }

    let stats = transformer.stats();
    println!(
        "{} {} transformed, {} cache hits, {} failed",
        "done:".green().bold(),
        transformed,
        stats.cache_hits(),
        failures
    );
    Ok(failures)
}

async fn transform_file(transformer: &Transformer, cli: &Cli, path: &Path) -> anyhow::Result<()> {
    let source = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("reading {}", path.display()))?;
    let input_map = load_sidecar_map(path).await?;
    let output = transformer.transform(path, &source, input_map).await?;

    let relative = path.strip_prefix(&cli.input).unwrap_or(path);
    let dest = cli.out.join(relative);
    if let Some(parent) = dest.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }
    tokio::fs::write(&dest, &output.content)
        .await
        .with_context(|| format!("writing {}", dest.display()))?;
    if let Some(map) = output.map {
        let mut sidecar = dest.into_os_string();
        sidecar.push(".map");
        tokio::fs::write(&sidecar, map.to_json()?).await?;
    }
    Ok(())
}

/// Read a `.map` sidecar next to the input file, if one exists.
async fn load_sidecar_map(path: &Path) -> anyhow::Result<Option<SourceMap>> {
    let mut sidecar = path.as_os_str().to_os_string();
    sidecar.push(".map");
    match tokio::fs::read_to_string(&sidecar).await {
        Ok(json) => Ok(Some(SourceMap::from_json(&json).with_context(|| {
            format!("parsing input source map {}", Path::new(&sidecar).display())
        })?)),
        Err(_) => Ok(None),
    }
}

fn build_config(cli: &Cli) -> anyhow::Result<Config> {
    let cache = match cli.cache.as_str() {
        "off" => CacheMode::Off,
        "memory" => CacheMode::Memory,
        "disk" => CacheMode::Disk,
        other => anyhow::bail!("unknown cache backend '{other}'"),
    };
    Ok(Config {
        paths: cli.provider_paths.clone(),
        es6mode: cli.es6,
        watch: cli.watch,
        file_ext: cli.ext.clone(),
        cache,
        root: cli.project_root.clone(),
        cache_path: cli.cache_root.clone(),
        runtime_module: cli.runtime_module.clone(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cli(args: &[&str]) -> Cli {
        Cli::parse_from(args)
    }

    #[test]
    fn test_build_config_maps_flags() {
        let cli = cli(&[
            "nslift",
            "js",
            "--out",
            "dist",
            "--provider-path",
            "js/lib",
            "--es6",
            "--cache",
            "memory",
        ]);
        let config = build_config(&cli).unwrap();
        assert_eq!(config.paths, vec![std::path::PathBuf::from("js/lib")]);
        assert!(config.es6mode);
        assert!(!config.watch);
        assert_eq!(config.cache, CacheMode::Memory);
        assert_eq!(config.file_ext, ".js");
    }

    #[test]
    fn test_disk_cache_flags() {
        let cli = cli(&[
            "nslift",
            "js",
            "--out",
            "dist",
            "--cache",
            "disk",
            "--project-root",
            ".",
            "--cache-root",
            ".cache",
        ]);
        let config = build_config(&cli).unwrap();
        assert_eq!(config.cache, CacheMode::Disk);
        assert!(config.validate().is_ok());
    }
}
