// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! The watcher crawler: a thin client for the `watchman` file-watching
//! service, queried over its JSON protocol by shelling out to an external
//! binary and parsing its JSON output.
//!
//! The watcher service's own implementation is a separate concern; only the
//! crawler contract matters here. This client covers the subset of the
//! protocol the pipeline needs: resolve a watch root, run a `since`-scoped
//! (or full) query, and record the returned clock for the next delta sync.

use std::process::{Command, Stdio};
use std::sync::OnceLock;

use serde::Deserialize;
use serde_json::json;

use crate::config::HasteMapOptions;
use crate::crawler::{CrawlError, Crawler};
use crate::data::{FileRecord, HasteMap};
use crate::ignore::IgnoreMatcher;

/// Process-wide cache of the watcher-availability probe: checked once per
/// process lifetime, never reprobed per build.
static AVAILABILITY: OnceLock<bool> = OnceLock::new();

/// Whether a `watchman` binary is invocable on this machine. Cached for the
/// process lifetime.
pub fn is_available() -> bool {
    *AVAILABILITY.get_or_init(probe)
}

fn probe() -> bool {
    Command::new("watchman")
        .arg("version")
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .is_ok_and(|status| status.success())
}

/// One row of a watchman `query` response under the `files` key.
#[derive(Debug, Deserialize)]
struct WatchmanFile {
    name: String,
    mtime_ms: i64,
    exists: bool,
}

#[derive(Debug, Deserialize)]
struct WatchRootResponse {
    watch: Option<String>,
    relative_path: Option<String>,
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct QueryResponse {
    files: Option<Vec<WatchmanFile>>,
    clock: Option<String>,
    error: Option<String>,
}

/// Run a single JSON command through `watchman -j` and decode the response.
fn run_command<T: for<'de> Deserialize<'de>>(command: &serde_json::Value) -> Result<T, CrawlError> {
    let mut child = Command::new("watchman")
        .arg("-j")
        .arg("--no-pretty")
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|e| CrawlError::Message(format!("failed to spawn watchman: {e}")))?;

    {
        use std::io::Write;
        let stdin = child
            .stdin
            .as_mut()
            .ok_or_else(|| CrawlError::Message("watchman: no stdin handle".to_string()))?;
        stdin
            .write_all(command.to_string().as_bytes())
            .map_err(|e| CrawlError::Message(format!("writing watchman request: {e}")))?;
    }

    let output = child
        .wait_with_output()
        .map_err(|e| CrawlError::Message(format!("reading watchman response: {e}")))?;

    serde_json::from_slice(&output.stdout)
        .map_err(|e| CrawlError::Message(format!("decoding watchman response: {e}")))
}

fn watch_root(root: &std::path::Path) -> Result<String, CrawlError> {
    let resp: WatchRootResponse = run_command(&json!(["watch-project", root.to_string_lossy()]))?;
    if let Some(err) = resp.error {
        return Err(CrawlError::Message(format!("watchman watch-project: {err}")));
    }
    resp.watch
        .ok_or_else(|| CrawlError::Message("watchman watch-project returned no watch root".to_string()))
}

/// Crawls via the `watchman` service, reusing a prior clock for a delta
/// query when available.
#[derive(Debug, Default, Clone, Copy)]
pub struct WatchmanCrawler;

impl Crawler for WatchmanCrawler {
    fn crawl(
        &self,
        options: &HasteMapOptions,
        ignore: &IgnoreMatcher,
        prior: &HasteMap,
    ) -> Result<HasteMap, CrawlError> {
        let mut clocks = prior.clocks.clone();
        let mut files = std::collections::HashMap::new();
        let mut removed = std::collections::HashSet::new();

        for root in &options.roots {
            let watch = watch_root(root)?;
            let since = prior.clocks.get(&root.to_string_lossy().into_owned()).cloned();

            let mut query = json!({
                "fields": ["name", "mtime_ms", "exists"],
                "suffix": options.extensions,
            });
            if let Some(since) = &since {
                query["since"] = json!(since);
            }

            let resp: QueryResponse = run_command(&json!(["query", &watch, query]))?;
            if let Some(err) = resp.error {
                return Err(CrawlError::Message(format!("watchman query: {err}")));
            }

            if let Some(clock) = resp.clock {
                clocks.insert(root.to_string_lossy().into_owned(), clock);
            }

            for entry in resp.files.unwrap_or_default() {
                let path = root.join(&entry.name);
                if ignore.is_ignored(&path) {
                    continue;
                }
                if !entry.exists {
                    removed.insert(path);
                    continue;
                }

                let mtime_secs = entry.mtime_ms / 1000;
                let record = match prior.files.get(&path) {
                    None => FileRecord::new_unvisited(),
                    Some(existing) if existing.mtime == mtime_secs => existing.clone(),
                    Some(existing) => {
                        let mut changed = existing.clone();
                        changed.clear_derived(mtime_secs);
                        changed
                    }
                };
                files.insert(path, record);
            }

            // A `since`-scoped query only returns changed files; carry
            // forward everything else from the prior snapshot so a delta
            // sync doesn't drop untouched files. Files the query reported
            // as removed stay excluded.
            if since.is_some() {
                for (path, record) in &prior.files {
                    if !removed.contains(path) {
                        files.entry(path.clone()).or_insert_with(|| record.clone());
                    }
                }
            }
        }

        Ok(HasteMap {
            clocks,
            files,
            map: prior.map.clone(),
            mocks: prior.mocks.clone(),
        })
    }
}

#[cfg(test)]
#[path = "watchman_tests.rs"]
mod tests;
