// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! The metadata extractor contract.
//!
//! The real extractor — parsing a file in its source language to discover
//! the module it declares and what it depends on — is a separate concern;
//! this module defines only the interface the build pipeline dispatches
//! against, plus a minimal default implementation so the pipeline is
//! exercisable end-to-end without embedding a real per-language parser.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::data::{ModuleKind, ModuleRef};

/// Maximum number of bytes the default extractor will read from a file.
/// Larger files are skipped (empty result), not rejected — extraction
/// failures are recoverable.
pub const MAX_EXTRACT_SIZE: u64 = 10 * 1024 * 1024;

/// The result of extracting one file's metadata.
///
/// `id` and `module` are either both present or both absent — a file can
/// declare dependencies without itself providing a module id.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WorkerResult {
    pub id: Option<String>,
    pub module: Option<ModuleRef>,
    pub dependencies: Vec<String>,
}

/// Errors an extractor can report for a single file. Always recoverable at
/// the call site: the metadata builder drops the file from `files` and
/// continues.
#[derive(Debug, thiserror::Error)]
pub enum ExtractError {
    #[error("io error reading {path}: {source}")]
    Io {
        path: std::path::PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("file too large to extract: {0} bytes")]
    TooLarge(u64),
}

/// Extracts `(id, module kind, dependencies)` from a single file.
///
/// Implementations run inside a worker (in-process call or subprocess, per
/// [`crate::worker`]) and must not assume access to any state beyond the
/// path they're given.
pub trait Extractor: Send + Sync {
    fn extract(&self, path: &Path) -> Result<WorkerResult, ExtractError>;
}

/// A minimal marker-comment extractor: looks for a `haste-id:` line naming
/// the declared module, an optional `haste-kind:` line (`module` or
/// `package`, default `module`), and an optional `haste-deps:` line listing
/// comma-separated dependency ids. Good enough to exercise the full
/// pipeline — collision detection, platform resolution, dependency
/// propagation — without a real per-language parser.
#[derive(Debug, Default, Clone, Copy)]
pub struct MarkerExtractor;

const ID_MARKER: &str = "haste-id:";
const KIND_MARKER: &str = "haste-kind:";
const DEPS_MARKER: &str = "haste-deps:";

impl Extractor for MarkerExtractor {
    fn extract(&self, path: &Path) -> Result<WorkerResult, ExtractError> {
        let metadata = std::fs::metadata(path).map_err(|e| ExtractError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;
        if metadata.len() > MAX_EXTRACT_SIZE {
            return Err(ExtractError::TooLarge(metadata.len()));
        }

        let content = std::fs::read_to_string(path).map_err(|e| ExtractError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;

        let mut id = None;
        let mut kind = ModuleKind::Module;
        let mut dependencies = Vec::new();

        for line in content.lines() {
            let trimmed = line.trim_start_matches("//").trim();
            if let Some(rest) = trimmed.strip_prefix(ID_MARKER) {
                id = Some(rest.trim().to_string());
            } else if let Some(rest) = trimmed.strip_prefix(KIND_MARKER) {
                kind = match rest.trim() {
                    "package" => ModuleKind::Package,
                    _ => ModuleKind::Module,
                };
            } else if let Some(rest) = trimmed.strip_prefix(DEPS_MARKER) {
                dependencies = rest
                    .split(',')
                    .map(|s| s.trim().to_string())
                    .filter(|s| !s.is_empty())
                    .collect();
            }
        }

        let module = id.as_ref().map(|_| ModuleRef {
            path: path.to_path_buf(),
            kind,
        });

        Ok(WorkerResult {
            id,
            module,
            dependencies,
        })
    }
}

#[cfg(test)]
#[path = "extractor_tests.rs"]
mod tests;
