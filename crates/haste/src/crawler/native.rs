// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! The native crawler: a parallel directory walk using the `ignore` crate.

use std::path::{Path, PathBuf};
use std::time::SystemTime;

use crossbeam_channel::{bounded, Sender};
use ignore::{WalkBuilder, WalkState};

use crate::config::HasteMapOptions;
use crate::crawler::{CrawlError, Crawler};
use crate::data::{FileRecord, HasteMap};
use crate::ignore::IgnoreMatcher;

/// Below this many top-level entries, walk each root on the calling thread
/// rather than paying for a parallel walker's thread pool.
const PARALLEL_THRESHOLD: usize = 256;

fn mtime_secs(metadata: &std::fs::Metadata) -> i64 {
    metadata
        .modified()
        .ok()
        .and_then(|t| t.duration_since(SystemTime::UNIX_EPOCH).ok())
        .map(|d| d.as_secs() as i64)
        .unwrap_or(0)
}

fn has_whitelisted_extension(path: &Path, extensions: &[String]) -> bool {
    let Some(ext) = path.extension().and_then(|e| e.to_str()) else {
        return false;
    };
    extensions.iter().any(|e| e.eq_ignore_ascii_case(ext))
}

fn should_use_parallel(root: &Path) -> bool {
    std::fs::read_dir(root)
        .map(|entries| entries.count())
        .unwrap_or(0)
        >= PARALLEL_THRESHOLD
}

/// Emit `(path, mtime_secs)` for every included file under `root` into `tx`.
fn walk_root(root: &Path, extensions: &[String], ignore: &IgnoreMatcher, tx: &Sender<(PathBuf, i64)>) {
    let mut builder = WalkBuilder::new(root);
    builder.hidden(false).git_ignore(false).git_exclude(false);

    if should_use_parallel(root) {
        builder.build_parallel().run(|| {
            let tx = tx.clone();
            let extensions = extensions.to_vec();
            Box::new(move |entry| {
                let Ok(entry) = entry else {
                    return WalkState::Continue;
                };
                if !entry.file_type().map(|t| t.is_file()).unwrap_or(false) {
                    return WalkState::Continue;
                }
                let path = entry.path();
                if !has_whitelisted_extension(path, &extensions) {
                    return WalkState::Continue;
                }
                if ignore.is_ignored(path) {
                    return WalkState::Continue;
                }
                let Ok(metadata) = entry.metadata() else {
                    return WalkState::Continue;
                };
                if tx.send((path.to_path_buf(), mtime_secs(&metadata))).is_err() {
                    return WalkState::Quit;
                }
                WalkState::Continue
            })
        });
    } else {
        for entry in builder.build() {
            let Ok(entry) = entry else { continue };
            if !entry.file_type().map(|t| t.is_file()).unwrap_or(false) {
                continue;
            }
            let path = entry.path();
            if !has_whitelisted_extension(path, extensions) {
                continue;
            }
            if ignore.is_ignored(path) {
                continue;
            }
            let Ok(metadata) = entry.metadata() else {
                continue;
            };
            if tx.send((path.to_path_buf(), mtime_secs(&metadata))).is_err() {
                break;
            }
        }
    }
}

/// Walks `options.roots` with the `ignore` crate and folds the result
/// against `prior` to decide which `files` records changed.
#[derive(Debug, Default, Clone, Copy)]
pub struct NativeCrawler;

impl Crawler for NativeCrawler {
    fn crawl(
        &self,
        options: &HasteMapOptions,
        ignore: &IgnoreMatcher,
        prior: &HasteMap,
    ) -> std::result::Result<HasteMap, CrawlError> {
        let (tx, rx) = bounded(1024);

        let roots = &options.roots;
        let extensions = &options.extensions;
        std::thread::scope(|scope| {
            scope.spawn(|| {
                for root in roots {
                    walk_root(root, extensions, ignore, &tx);
                }
                drop(tx);
            });

            let mut files = std::collections::HashMap::new();
            for (path, disk_mtime) in rx.iter() {
                let record = match prior.files.get(&path) {
                    None => FileRecord::new_unvisited(),
                    Some(existing) if existing.mtime == disk_mtime => existing.clone(),
                    Some(existing) => {
                        let mut changed = existing.clone();
                        changed.clear_derived(disk_mtime);
                        changed
                    }
                };
                files.insert(path, record);
            }

            Ok(HasteMap {
                clocks: prior.clocks.clone(),
                files,
                map: prior.map.clone(),
                mocks: prior.mocks.clone(),
            })
        })
    }
}

#[cfg(test)]
#[path = "native_tests.rs"]
mod tests;
