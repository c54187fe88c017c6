// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Cache file location, loading, and atomic persistence.
//!
//! The cache path is a pure function of everything that would invalidate a
//! previous build's result. Changing any of those inputs simply produces a
//! different path — old caches are never migrated, only orphaned.

use std::path::{Path, PathBuf};

use md5::{Digest, Md5};
use serde::{Deserialize, Serialize};

use crate::config::HasteMapOptions;
use crate::data::HasteMap;
use crate::error::{Error, Result};

/// Bumped whenever the on-disk envelope (not the `HasteMap` shape itself,
/// which carries its own semantic version via `builder_version`) changes.
const CACHE_FORMAT_VERSION: u32 = 1;

/// Separator used when concatenating path-derivation tokens. Chosen to be
/// unlikely to appear inside an extension or platform token.
const TOKEN_SEPARATOR: &str = "\u{0}";

/// Replace non-word characters in a logical project name with `-`.
fn sanitize_name(name: &str) -> String {
    name.chars()
        .map(|c| if c.is_alphanumeric() || c == '_' { c } else { '-' })
        .collect()
}

/// Concatenate every input that should invalidate a cache on change.
fn digest_tokens(options: &HasteMapOptions) -> String {
    let mut tokens = Vec::new();
    tokens.push(options.builder_version.clone());
    for root in &options.roots {
        tokens.push(root.to_string_lossy().into_owned());
    }
    tokens.extend(options.extensions.iter().cloned());
    tokens.extend(options.platforms.iter().cloned());
    if let Some(pattern) = &options.mocks_pattern {
        tokens.push(pattern.clone());
    }
    tokens.join(TOKEN_SEPARATOR)
}

/// The deterministic cache file path for this build configuration.
///
/// `<cache_directory>/<sanitized_name>-<md5hex>` where the digest covers
/// the builder version, roots, extensions, platforms, and mocks pattern:
/// any change to those produces a distinct path.
pub fn cache_file_path(options: &HasteMapOptions) -> PathBuf {
    let mut hasher = Md5::new();
    hasher.update(digest_tokens(options).as_bytes());
    let digest = hasher.finalize();

    let file_name = format!("{}-{:x}", sanitize_name(&options.name), digest);
    options.cache_directory.join(file_name)
}

/// On-disk envelope wrapping the serialized [`HasteMap`].
#[derive(Debug, Serialize, Deserialize)]
struct PersistedCache {
    format_version: u32,
    builder_version: String,
    map: HasteMap,
}

/// Failure modes for a cache read attempt. Every variant is recoverable —
/// callers of [`read`] never see these, only an empty map plus a logged
/// diagnostic.
#[derive(Debug, thiserror::Error)]
enum CacheReadError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("deserialization error: {0}")]
    Postcard(#[from] postcard::Error),
    #[error("cache format version mismatch")]
    FormatVersionMismatch,
    #[error("builder version mismatch")]
    BuilderVersionMismatch,
}

fn read_checked(path: &Path, options: &HasteMapOptions) -> std::result::Result<HasteMap, CacheReadError> {
    let bytes = std::fs::read(path)?;
    let cache: PersistedCache = postcard::from_bytes(&bytes)?;

    if cache.format_version != CACHE_FORMAT_VERSION {
        return Err(CacheReadError::FormatVersionMismatch);
    }
    if cache.builder_version != options.builder_version {
        return Err(CacheReadError::BuilderVersionMismatch);
    }

    Ok(cache.map)
}

/// Load the cache for `options`, or an empty [`HasteMap`] if the file is
/// absent, unreadable, corrupt, version-mismatched, or `reset_cache` was
/// requested. This never fails: a cache miss is the normal cold-start path.
pub fn read(options: &HasteMapOptions) -> HasteMap {
    if options.reset_cache {
        tracing::debug!("reset_cache set; skipping cache read");
        return HasteMap::empty();
    }

    let path = cache_file_path(options);
    match read_checked(&path, options) {
        Ok(map) => map,
        Err(err) => {
            tracing::debug!(path = %path.display(), error = %err, "cache miss, starting empty");
            HasteMap::empty()
        }
    }
}

/// Serialize `map` and write it to `path` atomically via a temp file plus
/// rename. A persist failure is fatal — the caller's `build()` rejects.
pub fn persist(path: &Path, map: &HasteMap, builder_version: &str) -> Result<()> {
    let cache = PersistedCache {
        format_version: CACHE_FORMAT_VERSION,
        builder_version: builder_version.to_string(),
        map: map.clone(),
    };

    let bytes = postcard::to_allocvec(&cache).map_err(|e| Error::Persist {
        path: path.to_path_buf(),
        source: std::io::Error::other(e),
    })?;

    let temp_path = path.with_extension("tmp");
    std::fs::write(&temp_path, &bytes).map_err(|e| Error::Persist {
        path: path.to_path_buf(),
        source: e,
    })?;
    std::fs::rename(&temp_path, path).map_err(|e| Error::Persist {
        path: path.to_path_buf(),
        source: e,
    })?;
    Ok(())
}

#[cfg(test)]
#[path = "cache_tests.rs"]
mod tests;
