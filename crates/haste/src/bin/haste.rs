// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! `haste` CLI entry point: build an index over a directory and print
//! summary statistics, or resolve a module id against it.

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use tracing_subscriber::{EnvFilter, fmt};

use haste::{CollisionPolicy, ExitCode, HasteMapBuilder, HasteMapOptions, cache, config, discovery};

/// Build and query an incremental module index ("haste map").
#[derive(Parser)]
#[command(name = "haste")]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Use a specific `haste.toml` config file instead of discovering one.
    #[arg(short = 'C', long = "config", global = true, env = "HASTE_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Build (or rebuild) the index and print summary statistics.
    Build(BuildArgs),
    /// Build the index, then resolve a single module id.
    Query(QueryArgs),
}

#[derive(clap::Args, Clone)]
struct BuildArgs {
    /// Root directories to crawl (default: current directory).
    #[arg(short = 'r', long = "root")]
    roots: Vec<PathBuf>,

    /// File extensions to include.
    #[arg(short = 'e', long = "extension")]
    extensions: Vec<String>,

    /// Logical project name, used to derive the cache file name.
    #[arg(long)]
    name: Option<String>,

    /// Regex matched against absolute paths; matches are ignored.
    #[arg(long)]
    ignore_pattern: Option<String>,

    /// Worker pool size. 1 or less runs extraction in-process.
    #[arg(long, default_value_t = 1)]
    max_workers: usize,

    /// Regex identifying mock files.
    #[arg(long)]
    mocks_pattern: Option<String>,

    /// Recognized platform tokens for `Name.<platform>.<ext>` parsing.
    #[arg(long = "platform")]
    platforms: Vec<String>,

    /// `node_modules` package names to include despite the default exclusion.
    #[arg(long = "node-modules-whitelist")]
    node_modules_whitelist: Vec<String>,

    /// Bypass the cache read entirely and start from an empty index.
    #[arg(long)]
    reset_cache: bool,

    /// Keep `node_modules` files in the file store without extracting them.
    #[arg(long)]
    retain_all_files: bool,

    /// Abort the build on a module naming collision instead of warning.
    #[arg(long)]
    throw_on_collision: bool,

    /// Permit the watcher crawler, subject to its availability probe.
    #[arg(long)]
    use_watchman: bool,

    /// Cache file location (default: the system temp directory).
    #[arg(long)]
    cache_dir: Option<PathBuf>,
}

#[derive(clap::Args)]
struct QueryArgs {
    #[command(flatten)]
    build: BuildArgs,

    /// The module id to resolve.
    id: String,

    /// Platform to resolve against.
    #[arg(long, default_value_t = haste::GENERIC_PLATFORM.to_string())]
    platform: String,

    /// Fall back to the native-platform entry if the exact platform is absent.
    #[arg(long)]
    native: bool,

    /// Restrict resolution to package-kind entries.
    #[arg(long)]
    package: bool,
}

fn init_logging() {
    let filter = EnvFilter::try_from_env("HASTE_LOG").unwrap_or_else(|_| EnvFilter::new("off"));
    fmt().with_env_filter(filter).with_writer(std::io::stderr).with_target(false).init();
}

fn main() {
    init_logging();

    let exit_code = match run() {
        Ok(code) => code,
        Err(e) => {
            eprintln!("haste: {e}");
            match e.downcast_ref::<haste::Error>() {
                Some(err) => ExitCode::from(err),
                None => ExitCode::InternalError,
            }
        }
    };

    std::process::exit(exit_code as i32);
}

fn run() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();

    match &cli.command {
        Command::Build(args) => run_build(args, cli.config.as_deref()),
        Command::Query(args) => run_query(args, cli.config.as_deref()),
    }
}

/// Resolve [`HasteMapOptions`] from an optional `haste.toml` plus whatever
/// flags the caller explicitly passed, the flags winning on conflict.
fn build_options(args: &BuildArgs, explicit_config: Option<&Path>) -> anyhow::Result<HasteMapOptions> {
    let cwd = std::env::current_dir()?;
    let config_path = discovery::resolve_config(explicit_config, &cwd)?;

    let mut options = match &config_path {
        Some(path) => {
            tracing::debug!(path = %path.display(), "loading config");
            config::load(path)?
        }
        None => {
            if args.extensions.is_empty() {
                return Err(haste::Error::Config(
                    "--extension is required when no haste.toml is found".to_string(),
                )
                .into());
            }
            let roots = if args.roots.is_empty() { vec![cwd.clone()] } else { args.roots.clone() };
            let name = args.name.clone().unwrap_or_else(|| {
                cwd.file_name().map(|n| n.to_string_lossy().into_owned()).unwrap_or_else(|| "haste".to_string())
            });
            HasteMapOptions::new(name, roots, args.extensions.clone())
        }
    };

    if !args.extensions.is_empty() {
        options.extensions = args.extensions.clone();
    }
    if !args.roots.is_empty() {
        options.roots = args.roots.clone();
    }
    if let Some(name) = &args.name {
        options.name = name.clone();
    }
    if let Some(pattern) = &args.ignore_pattern {
        options.ignore_pattern = Some(pattern.clone());
    }
    if args.max_workers != 1 {
        options.max_workers = args.max_workers;
    }
    if let Some(pattern) = &args.mocks_pattern {
        options.mocks_pattern = Some(pattern.clone());
    }
    if !args.platforms.is_empty() {
        options.platforms = args.platforms.clone();
    }
    if !args.node_modules_whitelist.is_empty() {
        options.provides_module_node_modules = args.node_modules_whitelist.clone();
    }
    if args.reset_cache {
        options.reset_cache = true;
    }
    if args.retain_all_files {
        options.retain_all_files = true;
    }
    if args.throw_on_collision {
        options.collision_policy = CollisionPolicy::Throw;
    }
    if args.use_watchman {
        options.use_watchman = true;
    }
    if let Some(dir) = &args.cache_dir {
        options.cache_directory = dir.clone();
    }

    options.validate()?;
    Ok(options)
}

fn run_build(args: &BuildArgs, explicit_config: Option<&Path>) -> anyhow::Result<ExitCode> {
    let options = build_options(args, explicit_config)?;
    let cache_path = cache::cache_file_path(&options);
    let builder = HasteMapBuilder::new(options);

    match builder.build() {
        Ok(output) => {
            println!("files: {}", output.file_store.len());
            println!("cache: {}", cache_path.display());
            Ok(ExitCode::Success)
        }
        Err(e) => {
            eprintln!("haste: {e}");
            Ok(ExitCode::from(&e))
        }
    }
}

fn run_query(args: &QueryArgs, explicit_config: Option<&Path>) -> anyhow::Result<ExitCode> {
    let options = build_options(&args.build, explicit_config)?;
    let builder = HasteMapBuilder::new(options);
    let output = builder.build()?;

    let resolved = if args.package {
        output.module_map.get_package(&args.id, &args.platform)
    } else {
        output.module_map.get_module(&args.id, &args.platform, args.native)
    };

    match resolved {
        Some(path) => {
            println!("{}", path.display());
            Ok(ExitCode::Success)
        }
        None => {
            eprintln!("haste: no module named \"{}\" for platform \"{}\"", args.id, args.platform);
            Ok(ExitCode::BuildFailed)
        }
    }
}
