//! Crawler dispatch: the watcher crawler (with one native retry on
//! failure) or the native crawler directly.

pub mod native;
pub mod watchman;

use crate::config::HasteMapOptions;
use crate::data::HasteMap;
use crate::error::{Error, Result};
use crate::ignore::IgnoreMatcher;

/// A crawler produces a fresh `files` table (and, for the watcher crawler,
/// an updated `clocks` entry) from the current on-disk state, reusing
/// `prior` to decide which records are unchanged.
pub trait Crawler {
    fn crawl(
        &self,
        options: &HasteMapOptions,
        ignore: &IgnoreMatcher,
        prior: &HasteMap,
    ) -> std::result::Result<HasteMap, CrawlError>;
}

/// A crawler-specific failure. Always wrapped into [`Error::Crawl`] by
/// [`dispatch`] before it can escape the pipeline.
#[derive(Debug, thiserror::Error)]
pub enum CrawlError {
    #[error("{0}")]
    Message(String),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Select and run a crawler, retrying once with the native crawler if the
/// watcher crawler rejects.
pub fn dispatch(options: &HasteMapOptions, ignore: &IgnoreMatcher, prior: &HasteMap) -> Result<HasteMap> {
    dispatch_with(
        options,
        ignore,
        prior,
        options.use_watchman && watchman::is_available(),
        &watchman::WatchmanCrawler,
        &native::NativeCrawler,
    )
}

/// The testable core of [`dispatch`]: which crawlers to use is passed in
/// rather than resolved from process-global state, so the retry policy can
/// be exercised with fakes.
fn dispatch_with(
    options: &HasteMapOptions,
    ignore: &IgnoreMatcher,
    prior: &HasteMap,
    use_watcher: bool,
    watcher: &dyn Crawler,
    native: &dyn Crawler,
) -> Result<HasteMap> {
    if use_watcher {
        match watcher.crawl(options, ignore, prior) {
            Ok(map) => return Ok(map),
            Err(watcher_err) => {
                tracing::warn!(
                    error = %watcher_err,
                    "watcher crawler failed; is the watcher service running, or is a \
                     repository root marker absent? retrying with the native crawler"
                );
                return native.crawl(options, ignore, prior).map_err(|native_err| Error::Crawl {
                    native: native_err.to_string(),
                    watcher: Some(watcher_err.to_string()),
                });
            }
        }
    }

    native.crawl(options, ignore, prior).map_err(|native_err| Error::Crawl {
        native: native_err.to_string(),
        watcher: None,
    })
}

#[cfg(test)]
#[path = "mod_tests.rs"]
mod tests;
