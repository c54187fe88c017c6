// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Constructor options for a haste map build.
//!
//! The options surface is deliberately mechanical: a plain struct with one
//! field per documented option, plus an optional `haste.toml` project file
//! that can supply the same fields for the CLI binary. Library consumers
//! normally construct [`HasteMapOptions`] directly.

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::{Error, Result};

/// How the metadata builder's module installer handles two files declaring
/// the same `(id, platform)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CollisionPolicy {
    /// Keep the first-installed module, emit a `tracing::warn!` diagnostic.
    #[default]
    Warn,
    /// Abort the build with [`Error::ModuleCollision`].
    Throw,
}

/// Options controlling a single haste map build.
#[derive(Debug, Clone)]
pub struct HasteMapOptions {
    /// Logical project name, used to derive the cache file name.
    pub name: String,
    /// Directories to start crawling from.
    pub roots: Vec<PathBuf>,
    /// File extensions to include (required, non-empty).
    pub extensions: Vec<String>,
    /// Regex matched against absolute paths; matches are ignored.
    pub ignore_pattern: Option<String>,
    /// Worker pool size. `<= 1` runs extraction in-process.
    pub max_workers: usize,
    /// Regex identifying mock files, if the project uses a mocks registry.
    pub mocks_pattern: Option<String>,
    /// Recognized platform tokens for `Name.<platform>.<ext>` parsing.
    pub platforms: Vec<String>,
    /// `node_modules` package names to include despite the default exclusion.
    pub provides_module_node_modules: Vec<String>,
    /// Bypass the cache read entirely and start from an empty index.
    pub reset_cache: bool,
    /// Keep `node_modules` files in `files` (metadata extraction still skips
    /// them) instead of excluding them from the crawl outright.
    pub retain_all_files: bool,
    /// Collision policy for the module installer.
    pub collision_policy: CollisionPolicy,
    /// Permit the watcher crawler, subject to its availability probe.
    pub use_watchman: bool,
    /// Cache file location (default: the system temp directory).
    pub cache_directory: PathBuf,
    /// Version token of the builder/extractor; bumped whenever extraction
    /// semantics change so stale caches are never mistakenly reused.
    pub builder_version: String,
}

impl HasteMapOptions {
    /// Construct options with the required fields and every optional field
    /// at its documented default.
    pub fn new(name: impl Into<String>, roots: Vec<PathBuf>, extensions: Vec<String>) -> Self {
        Self {
            name: name.into(),
            roots,
            extensions,
            ignore_pattern: None,
            max_workers: 1,
            mocks_pattern: None,
            platforms: Vec::new(),
            provides_module_node_modules: Vec::new(),
            reset_cache: false,
            retain_all_files: false,
            collision_policy: CollisionPolicy::Warn,
            use_watchman: false,
            cache_directory: std::env::temp_dir(),
            builder_version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }

    /// Builder-style setter for `max_workers`.
    pub fn with_max_workers(mut self, max_workers: usize) -> Self {
        self.max_workers = max_workers;
        self
    }

    /// Builder-style setter for `mocks_pattern`.
    pub fn with_mocks_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.mocks_pattern = Some(pattern.into());
        self
    }

    /// Builder-style setter for `ignore_pattern`.
    pub fn with_ignore_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.ignore_pattern = Some(pattern.into());
        self
    }

    /// Builder-style setter for `collision_policy`.
    pub fn throw_on_collision(mut self, throw: bool) -> Self {
        self.collision_policy = if throw {
            CollisionPolicy::Throw
        } else {
            CollisionPolicy::Warn
        };
        self
    }

    /// Builder-style setter for `use_watchman`.
    pub fn with_watchman(mut self, use_watchman: bool) -> Self {
        self.use_watchman = use_watchman;
        self
    }

    /// Builder-style setter for `retain_all_files`.
    pub fn with_retain_all_files(mut self, retain: bool) -> Self {
        self.retain_all_files = retain;
        self
    }

    /// Reject obviously-invalid configurations before a build starts.
    pub fn validate(&self) -> Result<()> {
        if self.extensions.is_empty() {
            return Err(Error::Config(
                "at least one file extension must be configured".to_string(),
            ));
        }
        if self.roots.is_empty() {
            return Err(Error::Config(
                "at least one root directory must be configured".to_string(),
            ));
        }
        if let Some(pattern) = &self.ignore_pattern {
            regex::Regex::new(pattern)
                .map_err(|e| Error::Config(format!("invalid ignore_pattern: {e}")))?;
        }
        if let Some(pattern) = &self.mocks_pattern {
            regex::Regex::new(pattern)
                .map_err(|e| Error::Config(format!("invalid mocks_pattern: {e}")))?;
        }
        Ok(())
    }
}

/// On-disk `haste.toml` schema for the CLI binary. Library consumers of
/// `haste` as a crate never need this — they build [`HasteMapOptions`]
/// directly.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct HasteFileConfig {
    /// Config file version (must be 1).
    pub version: i64,
    /// Logical project name; defaults to the directory name if absent.
    pub name: Option<String>,
    /// Directories to crawl, relative to the config file's directory.
    #[serde(default)]
    pub roots: Vec<PathBuf>,
    /// File extensions to include.
    #[serde(default)]
    pub extensions: Vec<String>,
    /// Regex matched against absolute paths to ignore.
    pub ignore_pattern: Option<String>,
    /// Worker pool size.
    pub max_workers: Option<usize>,
    /// Regex identifying mock files.
    pub mocks_pattern: Option<String>,
    /// Recognized platform tokens.
    #[serde(default)]
    pub platforms: Vec<String>,
    /// Whitelisted `node_modules` package names.
    #[serde(default)]
    pub provides_module_node_modules: Vec<String>,
    /// Keep `node_modules` files in `files` without extracting them.
    #[serde(default)]
    pub retain_all_files: bool,
    /// Abort the build on a module naming collision instead of warning.
    #[serde(default)]
    pub throw_on_module_collision: bool,
    /// Permit the watcher crawler.
    #[serde(default)]
    pub use_watchman: bool,
}

/// Parse a `haste.toml` file and apply it on top of the required fields.
pub fn load(path: &Path) -> Result<HasteMapOptions> {
    let text = std::fs::read_to_string(path).map_err(|e| Error::Io {
        path: path.to_path_buf(),
        source: e,
    })?;
    let file: HasteFileConfig =
        toml::from_str(&text).map_err(|e| Error::Config(format!("{}: {e}", path.display())))?;

    if file.version != 1 {
        return Err(Error::Config(format!(
            "{}: unsupported config version {} (expected 1)",
            path.display(),
            file.version
        )));
    }

    let base_dir = path.parent().unwrap_or_else(|| Path::new("."));
    let name = file
        .name
        .unwrap_or_else(|| base_dir.to_string_lossy().into_owned());
    let roots = if file.roots.is_empty() {
        vec![base_dir.to_path_buf()]
    } else {
        file.roots.iter().map(|r| base_dir.join(r)).collect()
    };

    let mut options = HasteMapOptions::new(name, roots, file.extensions);
    options.ignore_pattern = file.ignore_pattern;
    options.mocks_pattern = file.mocks_pattern;
    options.platforms = file.platforms;
    options.provides_module_node_modules = file.provides_module_node_modules;
    options.retain_all_files = file.retain_all_files;
    options.collision_policy = if file.throw_on_module_collision {
        CollisionPolicy::Throw
    } else {
        CollisionPolicy::Warn
    };
    options.use_watchman = file.use_watchman;
    if let Some(max_workers) = file.max_workers {
        options.max_workers = max_workers;
    }

    options.validate()?;
    Ok(options)
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
