// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! The haste map data model: four flat tables keyed by string.
//!
//! Named-field structs are used in memory for clarity; the wire format
//! produced by [`crate::cache`] is positional (via `postcard`), so the two
//! representations stay decoupled without either sacrificing size or
//! readability.

use std::collections::HashMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Sentinel platform used when a file has no platform-specific variant.
/// Applies to all platforms unless a more specific entry exists.
pub const GENERIC_PLATFORM: &str = "g";

/// Platform token for a cross-platform-but-not-quite-generic variant
/// (`Foo.native.js`): checked as a fallback between an exact platform
/// match and the generic entry when the caller opts in via
/// `supports_native_platform`.
pub const NATIVE_PLATFORM: &str = "native";

/// Whether a [`ModuleRef`] names a single-file module or a package directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ModuleKind {
    /// A single file module.
    Module,
    /// A directory whose manifest declares the module id.
    Package,
}

/// A module-id resolution target: the file that provides it, and its kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModuleRef {
    pub path: PathBuf,
    pub kind: ModuleKind,
}

/// Per-file record tracked by the `files` table.
///
/// `visited = true` means the extractor has processed the file at `mtime`
/// and `id`/`dependencies` are authoritative for that mtime. A record with
/// `visited = false` is due for (re-)extraction.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FileRecord {
    /// The module id this file declares, if any.
    pub id: Option<String>,
    /// Modification time, seconds since epoch. Zero for newly-discovered,
    /// not-yet-extracted files.
    pub mtime: i64,
    /// Whether the extractor has processed this file at `mtime`.
    pub visited: bool,
    /// Module ids this file depends on, as returned by the extractor.
    pub dependencies: Vec<String>,
}

impl FileRecord {
    /// A record for a newly discovered file: zero mtime, not visited.
    pub fn new_unvisited() -> Self {
        Self {
            id: None,
            mtime: 0,
            visited: false,
            dependencies: Vec::new(),
        }
    }

    /// Clear derived fields, as the crawler does for a changed file: the
    /// record stays in `files` but is marked due for re-extraction.
    pub fn clear_derived(&mut self, mtime: i64) {
        self.id = None;
        self.mtime = mtime;
        self.visited = false;
        self.dependencies.clear();
    }
}

/// The module-name -> (platform -> file) index, plus its supporting tables.
///
/// All four tables are plain `HashMap`s: only explicitly inserted keys are
/// ever observable — no hidden or inherited entries under string keys.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HasteMap {
    /// Watcher clock token per crawled root, used for delta synchronization.
    pub clocks: HashMap<String, String>,
    /// Canonical set of files in scope, keyed by absolute path.
    pub files: HashMap<PathBuf, FileRecord>,
    /// Module id -> platform -> providing file.
    pub map: HashMap<String, HashMap<String, ModuleRef>>,
    /// Mock stem -> absolute file path.
    pub mocks: HashMap<String, PathBuf>,
}

impl HasteMap {
    /// A fresh, empty index: all four tables present and empty.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Check invariants I1-I4 (map entries resolve into `files`, visited
    /// files with an id are reachable via `map`, mocks resolve into
    /// `files`). Returns the first violation found, if any. Used by
    /// property tests; never called on the hot path.
    pub fn check_invariants(&self) -> std::result::Result<(), String> {
        // I1: every map[id][platform].path is a key in files.
        for (id, platforms) in &self.map {
            for (platform, module_ref) in platforms {
                if !self.files.contains_key(&module_ref.path) {
                    return Err(format!(
                        "I1 violated: map[{id}][{platform}] points to {} which is not in files",
                        module_ref.path.display()
                    ));
                }
            }
        }

        // I2: every visited file with a non-empty id appears in map under
        // some platform, pointing back at that same path.
        for (path, record) in &self.files {
            if record.visited
                && let Some(id) = &record.id
            {
                let found = self
                    .map
                    .get(id)
                    .is_some_and(|platforms| platforms.values().any(|m| &m.path == path));
                if !found {
                    return Err(format!(
                        "I2 violated: {} declares id {id} but is not reachable via map",
                        path.display()
                    ));
                }
            }
        }

        // I3 is enforced at insertion time by the collision policy (see
        // crate::builder) and is not re-derivable from the final map alone
        // without the file-iteration order, so it is not re-checked here.

        // I4: every mocks[stem] resolves to a path in files.
        for (stem, path) in &self.mocks {
            if !self.files.contains_key(path) {
                return Err(format!(
                    "I4 violated: mocks[{stem}] points to {} which is not in files",
                    path.display()
                ));
            }
        }

        Ok(())
    }
}

#[cfg(test)]
#[path = "data_tests.rs"]
mod tests;
