// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! The two published query facades: [`FileStore`] over `files` and
//! [`ModuleMap`] over `map`/`mocks`. Both wrap `Arc`-shared tables so
//! cloning a facade is O(1).

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::data::{FileRecord, GENERIC_PLATFORM, HasteMap, ModuleKind, ModuleRef, NATIVE_PLATFORM};

/// Immutable snapshot over the `files` table, published once a build
/// completes. Every operation is O(1) except [`FileStore::match_files`].
#[derive(Debug, Clone)]
pub struct FileStore {
    files: Arc<HashMap<PathBuf, FileRecord>>,
}

impl FileStore {
    pub(crate) fn new(map: &HasteMap) -> Self {
        Self { files: Arc::new(map.files.clone()) }
    }

    /// The file's last-observed modification time, if it's in scope.
    pub fn get_mtime(&self, path: &Path) -> Option<i64> {
        self.files.get(path).map(|record| record.mtime)
    }

    /// The module ids a file depends on, if it's in scope.
    pub fn get_dependencies(&self, path: &Path) -> Option<&[String]> {
        self.files.get(path).map(|record| record.dependencies.as_slice())
    }

    /// Whether `path` is a tracked file in this index.
    pub fn exists(&self, path: &Path) -> bool {
        self.files.contains_key(path)
    }

    /// Every tracked path matching `predicate`. O(|files|).
    pub fn match_files(&self, mut predicate: impl FnMut(&Path) -> bool) -> Vec<PathBuf> {
        self.files.keys().filter(|path| predicate(path)).cloned().collect()
    }

    /// Total number of tracked files.
    pub fn len(&self) -> usize {
        self.files.len()
    }

    /// Whether the store has no tracked files.
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

/// Immutable snapshot over the `map`/`mocks` tables, published once a
/// build completes.
#[derive(Debug, Clone)]
pub struct ModuleMap {
    map: Arc<HashMap<String, HashMap<String, ModuleRef>>>,
    mocks: Arc<HashMap<String, PathBuf>>,
}

impl ModuleMap {
    pub(crate) fn new(map: &HasteMap) -> Self {
        Self { map: Arc::new(map.map.clone()), mocks: Arc::new(map.mocks.clone()) }
    }

    /// Resolve `id` for `platform`: exact platform match, then — if
    /// `supports_native_platform` — the native-platform fallback, then the
    /// generic entry.
    pub fn get_module(&self, id: &str, platform: &str, supports_native_platform: bool) -> Option<&Path> {
        self.resolve(id, platform, supports_native_platform, None)
    }

    /// Like [`Self::get_module`], restricted to entries whose kind is
    /// [`ModuleKind::Package`].
    pub fn get_package(&self, id: &str, platform: &str) -> Option<&Path> {
        self.resolve(id, platform, false, Some(ModuleKind::Package))
    }

    fn resolve(
        &self,
        id: &str,
        platform: &str,
        supports_native_platform: bool,
        kind_filter: Option<ModuleKind>,
    ) -> Option<&Path> {
        let platforms = self.map.get(id)?;

        let matches_kind = |module: &ModuleRef| kind_filter.is_none_or(|k| module.kind == k);

        if let Some(module) = platforms.get(platform).filter(|m| matches_kind(m)) {
            return Some(module.path.as_path());
        }

        if supports_native_platform
            && let Some(module) = platforms.get(NATIVE_PLATFORM).filter(|m| matches_kind(m))
        {
            return Some(module.path.as_path());
        }

        platforms.get(GENERIC_PLATFORM).filter(|m| matches_kind(m)).map(|m| m.path.as_path())
    }

    /// The file registered under the mocks registry for `stem`, if any.
    pub fn get_mock_module(&self, stem: &str) -> Option<&Path> {
        self.mocks.get(stem).map(|p| p.as_path())
    }
}

#[cfg(test)]
#[path = "store_tests.rs"]
mod tests;
