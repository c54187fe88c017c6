// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! The coordinating object: cache load, crawl dispatch, metadata build,
//! persist — a four-stage pipeline, single-flight per instance.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use regex::Regex;

use crate::cache;
use crate::config::{CollisionPolicy, HasteMapOptions};
use crate::crawler;
use crate::data::{HasteMap, ModuleRef};
use crate::error::{Error, Result};
use crate::extractor::{Extractor, MarkerExtractor};
use crate::ignore::IgnoreMatcher;
use crate::platform;
use crate::store::{FileStore, ModuleMap};
use crate::worker::Backend;

/// The two published facades, handed to the caller once a build completes.
#[derive(Debug, Clone)]
pub struct BuildOutput {
    pub file_store: FileStore,
    pub module_map: ModuleMap,
}

/// Single-flight build state: a build hasn't started, or it has resolved
/// (successfully or not) and every later call observes the same outcome.
///
/// The failure case is stored as a message rather than the original
/// [`Error`] because `Error` carries non-`Clone` sources (`std::io::Error`);
/// re-wrapping it as [`Error::Latched`] preserves the diagnostic without
/// requiring the whole error type to be cloneable.
enum BuildState {
    Idle,
    Done(std::result::Result<BuildOutput, String>),
}

/// Builds and maintains a haste map for one logical project.
///
/// One `HasteMapBuilder` corresponds to one cache file. `build()` is
/// reentrant-safe: concurrent or repeated calls observe the same pending or
/// completed result and never run the pipeline twice. A failed build
/// latches — later calls return [`Error::Latched`] rather than retrying.
pub struct HasteMapBuilder {
    options: HasteMapOptions,
    extractor: Arc<dyn Extractor>,
    state: Mutex<BuildState>,
}

impl HasteMapBuilder {
    /// A builder using the default marker-comment extractor.
    pub fn new(options: HasteMapOptions) -> Self {
        Self::with_extractor(options, Arc::new(MarkerExtractor))
    }

    /// A builder using a caller-supplied extractor, e.g. in tests or when
    /// embedding a real per-language parser (the extractor itself is a
    /// separate concern from this crate).
    pub fn with_extractor(options: HasteMapOptions, extractor: Arc<dyn Extractor>) -> Self {
        Self { options, extractor, state: Mutex::new(BuildState::Idle) }
    }

    /// Run the build pipeline, or return the already-running/completed
    /// result if another call got there first.
    pub fn build(&self) -> Result<BuildOutput> {
        let mut guard = self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner());

        if let BuildState::Done(outcome) = &*guard {
            return match outcome {
                Ok(output) => Ok(output.clone()),
                Err(message) => Err(Error::Latched(message.clone())),
            };
        }

        let outcome = self.run_pipeline();
        *guard = BuildState::Done(match &outcome {
            Ok(output) => Ok(output.clone()),
            Err(err) => Err(err.to_string()),
        });
        outcome
    }

    fn run_pipeline(&self) -> Result<BuildOutput> {
        self.options.validate()?;

        let ignore = IgnoreMatcher::new(
            self.options.ignore_pattern.as_deref(),
            &self.options.provides_module_node_modules,
            self.options.retain_all_files,
        )
        .map_err(|e| Error::Config(format!("invalid ignore_pattern: {e}")))?;

        let prior = cache::read(&self.options);
        let crawled = crawler::dispatch(&self.options, &ignore, &prior)?;
        let assembled = self.build_metadata(crawled, &ignore)?;

        let cache_path = cache::cache_file_path(&self.options);
        cache::persist(&cache_path, &assembled, &self.options.builder_version)?;

        Ok(BuildOutput { file_store: FileStore::new(&assembled), module_map: ModuleMap::new(&assembled) })
    }

    /// Walk `files` in a stable order, skip already-valid extractions, fan
    /// the rest out to the worker backend, and assemble fresh `map`/`mocks`
    /// tables with collision detection.
    fn build_metadata(&self, mut haste: HasteMap, ignore: &IgnoreMatcher) -> Result<HasteMap> {
        let mocks_regex = self
            .options
            .mocks_pattern
            .as_deref()
            .map(Regex::new)
            .transpose()
            .map_err(|e| Error::Config(format!("invalid mocks_pattern: {e}")))?;
        let platforms: std::collections::HashSet<String> = self.options.platforms.iter().cloned().collect();

        let mut new_map: HashMap<String, HashMap<String, ModuleRef>> = HashMap::new();
        let mut new_mocks: HashMap<String, PathBuf> = HashMap::new();

        // Stable order: collision tie-breaks and warnings are a pure
        // function of this order.
        let mut paths: Vec<PathBuf> = haste.files.keys().cloned().collect();
        paths.sort();

        let mut pending = Vec::new();
        for path in &paths {
            if self.options.retain_all_files && ignore.is_under_node_modules(path) {
                continue;
            }

            if let Some(re) = &mocks_regex
                && let Some(path_str) = path.to_str()
                && re.is_match(path_str)
                && let Some(stem) = path.file_stem().and_then(|s| s.to_str())
            {
                new_mocks.insert(stem.to_string(), path.clone());
            }

            let record = haste.files.get(path).expect("path came from haste.files.keys()");
            if record.visited {
                match &record.id {
                    None => continue,
                    Some(id) => match haste.map.get(id) {
                        Some(prior_platforms) => {
                            // Already resolved by a prior build; trust it
                            // and skip re-extraction entirely.
                            new_map.insert(id.clone(), prior_platforms.clone());
                            continue;
                        }
                        None => {
                            // Inconsistent cache: visited with a declared
                            // id, but that id isn't in the prior map.
                            // Re-extract rather than drop the file silently.
                            tracing::warn!(
                                path = %path.display(),
                                id,
                                "visited file's id is missing from the prior map; re-extracting"
                            );
                        }
                    },
                }
            }

            pending.push(path.clone());
        }

        if !pending.is_empty() {
            let backend = if self.options.max_workers <= 1 {
                Backend::in_process(Arc::clone(&self.extractor))
            } else {
                Backend::pool(self.options.max_workers)
                    .map_err(|e| Error::Config(format!("failed to start worker pool: {e}")))?
            };

            let mut results = backend.extract_all(pending);
            // Completion order is backend-defined; re-sort by path so the
            // installer sees the same stable order regardless of backend.
            results.sort_by(|a, b| a.0.cmp(&b.0));

            for (path, outcome) in results {
                match outcome {
                    Err(err) => {
                        tracing::warn!(path = %path.display(), error = %err, "extraction failed, dropping file");
                        haste.files.remove(&path);
                    }
                    Ok(result) => {
                        if let Some(record) = haste.files.get_mut(&path) {
                            record.visited = true;
                            record.id = result.id.clone();
                            record.dependencies = result.dependencies;
                        }

                        if let (Some(id), Some(module)) = (result.id, result.module) {
                            self.install_module(&mut new_map, &id, module, &platforms)?;
                        }
                    }
                }
            }
        }

        Ok(HasteMap { clocks: haste.clocks, files: haste.files, map: new_map, mocks: new_mocks })
    }

    /// The collision-checked module installer: first-installed wins;
    /// `throw_on_module_collision` controls whether a differing second
    /// file aborts the build.
    fn install_module(
        &self,
        map: &mut HashMap<String, HashMap<String, ModuleRef>>,
        id: &str,
        module: ModuleRef,
        platforms: &std::collections::HashSet<String>,
    ) -> Result<()> {
        let platform = platform::effective_platform(&module.path, platforms);
        let slot = map.entry(id.to_string()).or_default();

        match slot.get(&platform) {
            None => {
                slot.insert(platform, module);
            }
            Some(existing) if existing.path == module.path => {
                // Same file seen twice; no-op.
            }
            Some(existing) => {
                let existing_path = existing.path.clone();
                match self.options.collision_policy {
                    CollisionPolicy::Throw => {
                        return Err(Error::ModuleCollision {
                            id: id.to_string(),
                            platform,
                            existing: existing_path,
                            incoming: module.path,
                        });
                    }
                    CollisionPolicy::Warn => {
                        tracing::warn!(
                            id,
                            platform = %platform,
                            existing = %existing_path.display(),
                            incoming = %module.path.display(),
                            "module naming collision; keeping the first-installed file"
                        );
                    }
                }
            }
        }

        Ok(())
    }
}

#[cfg(test)]
#[path = "builder_tests.rs"]
mod tests;
