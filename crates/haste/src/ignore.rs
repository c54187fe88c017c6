// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! The ignore predicate: a configured regex, plus the `node_modules`
//! whitelist policy.

use std::collections::HashSet;
use std::path::{Component, Path};

use regex::Regex;

/// A path is ignored if it matches the configured pattern, or if it lies
/// under a `node_modules` segment and is not whitelisted — unless
/// `retain_all_files` is set, in which case `node_modules` files are kept
/// in `files` (metadata extraction still skips them; see `builder.rs`).
pub struct IgnoreMatcher {
    pattern: Option<Regex>,
    whitelist: HashSet<String>,
    retain_all_files: bool,
}

impl IgnoreMatcher {
    /// Build a matcher from a configured pattern string and the list of
    /// `node_modules` package names to include despite the default exclusion.
    pub fn new(
        pattern: Option<&str>,
        node_modules_whitelist: &[String],
        retain_all_files: bool,
    ) -> std::result::Result<Self, regex::Error> {
        let pattern = pattern.map(Regex::new).transpose()?;
        Ok(Self {
            pattern,
            whitelist: node_modules_whitelist.iter().cloned().collect(),
            retain_all_files,
        })
    }

    /// Whether `path` should be excluded from the crawl.
    pub fn is_ignored(&self, path: &Path) -> bool {
        if let Some(pattern) = &self.pattern
            && let Some(path_str) = path.to_str()
            && pattern.is_match(path_str)
        {
            return true;
        }

        if self.retain_all_files {
            return false;
        }

        if let Some(package) = node_modules_package(path) {
            return !self.whitelist.contains(package);
        }

        false
    }

    /// Whether `path` is under `node_modules` at all (used by the metadata
    /// builder to skip extraction even when `retain_all_files` keeps the
    /// record around).
    pub fn is_under_node_modules(&self, path: &Path) -> bool {
        node_modules_package(path).is_some()
    }
}

/// Return the package name directly under the innermost `node_modules`
/// segment of `path`, if any: `/repo/node_modules/left-pad/index.js` ->
/// `Some("left-pad")`.
fn node_modules_package(path: &Path) -> Option<&str> {
    let components: Vec<Component<'_>> = path.components().collect();
    let idx = components
        .iter()
        .rposition(|c| c.as_os_str() == "node_modules")?;
    components.get(idx + 1)?.as_os_str().to_str()
}

#[cfg(test)]
#[path = "ignore_tests.rs"]
mod tests;
