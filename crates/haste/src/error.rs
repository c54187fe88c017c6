// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Crate-wide error type for the haste map build pipeline.

use std::path::PathBuf;

/// Errors that can escape a `build()` call.
///
/// Recoverable conditions (missing cache, a watcher crawler that fails once)
/// are logged as `tracing::warn!` diagnostics and never become an `Error` —
/// only conditions the pipeline cannot route around reach here.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// I/O error against a specific path.
    #[error("io error: {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Both the watcher crawler and the native retry failed.
    #[error(
        "crawl failed: native crawler error: {native}{}",
        .watcher.as_ref().map(|w| format!("; watcher crawler error: {w}")).unwrap_or_default()
    )]
    Crawl {
        native: String,
        watcher: Option<String>,
    },

    /// Two files declared the same module id/platform and the collision
    /// policy is configured to abort rather than warn.
    #[error(
        "naming collision: module \"{id}\" (platform {platform}) is provided by both {} and {}",
        .existing.display(), .incoming.display()
    )]
    ModuleCollision {
        id: String,
        platform: String,
        existing: PathBuf,
        incoming: PathBuf,
    },

    /// Serializing or writing the cache file failed.
    #[error("failed to persist cache at {path}: {source}")]
    Persist {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Invalid configuration (e.g. no extensions configured).
    #[error("configuration error: {0}")]
    Config(String),

    /// A prior `build()` call on this instance failed; the failure is
    /// latched and retried calls observe the same error.
    #[error("a previous build() call failed: {0}")]
    Latched(String),
}

/// Result type using [`Error`].
pub type Result<T> = std::result::Result<T, Error>;

/// Process exit codes for the `haste` CLI binary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ExitCode {
    /// Build succeeded.
    Success = 0,
    /// Build failed (crawl, collision, persist, or config error).
    BuildFailed = 1,
    /// Invalid command-line arguments or configuration.
    ConfigError = 2,
    /// Internal error (bug).
    InternalError = 3,
}

impl From<&Error> for ExitCode {
    fn from(err: &Error) -> Self {
        match err {
            Error::Config(_) => ExitCode::ConfigError,
            Error::Io { .. } | Error::Persist { .. } => ExitCode::InternalError,
            Error::Crawl { .. } | Error::ModuleCollision { .. } | Error::Latched(_) => {
                ExitCode::BuildFailed
            }
        }
    }
}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
