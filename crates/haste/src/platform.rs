// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Platform-extension parsing: `Foo.ios.js` denotes the iOS variant of `Foo`.

use std::collections::HashSet;
use std::path::Path;

use crate::data::GENERIC_PLATFORM;

/// Extract the platform token from a file name, if any.
///
/// For `Name.<platform>.<ext>`, returns `<platform>` when it is a member of
/// `platforms`. Anything else — including `Name.<ext>` with no platform
/// segment, or a token not in the configured set — yields `None`, and the
/// caller falls back to [`GENERIC_PLATFORM`].
pub fn extract_platform_from_filename(path: &Path, platforms: &HashSet<String>) -> Option<String> {
    let stem = path.file_stem()?; // "Foo.ios" for "Foo.ios.js"
    let candidate = Path::new(stem).extension()?.to_str()?; // "ios"

    if platforms.contains(candidate) {
        Some(candidate.to_string())
    } else {
        None
    }
}

/// Resolve the effective platform for a file: its parsed token, or generic.
pub fn effective_platform(path: &Path, platforms: &HashSet<String>) -> String {
    extract_platform_from_filename(path, platforms)
        .unwrap_or_else(|| GENERIC_PLATFORM.to_string())
}

#[cfg(test)]
#[path = "platform_tests.rs"]
mod tests;
