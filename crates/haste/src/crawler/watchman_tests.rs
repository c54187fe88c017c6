#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

use tempfile::tempdir;

use super::*;
use crate::config::HasteMapOptions;

/// Force `watchman` to be unresolvable via `PATH`, regardless of whether
/// the host actually has it installed, so the failure path is deterministic.
// `env::set_var`/`remove_var` are `unsafe fn` as of edition 2024. Single-
// threaded test execution per process is not guaranteed by cargo, but these
// two tests are the only ones in this module touching PATH and run under
// `cargo test`'s default thread-per-test model with no other PATH readers
// in this crate's test suite.
#[allow(unsafe_code)]
fn with_empty_path<T>(f: impl FnOnce() -> T) -> T {
    let saved = std::env::var_os("PATH");
    unsafe { std::env::set_var("PATH", "") };
    let result = f();
    match saved {
        Some(path) => unsafe { std::env::set_var("PATH", path) },
        None => unsafe { std::env::remove_var("PATH") },
    }
    result
}

#[test]
fn is_available_is_cached_across_calls() {
    assert_eq!(is_available(), is_available());
}

#[test]
fn crawl_reports_a_message_error_when_watchman_is_unresolvable() {
    let dir = tempdir().unwrap();
    let options = HasteMapOptions::new("proj", vec![dir.path().to_path_buf()], vec!["js".into()]);
    let ignore = IgnoreMatcher::new(None, &[], false).unwrap();

    let result = with_empty_path(|| WatchmanCrawler.crawl(&options, &ignore, &HasteMap::empty()));

    assert!(result.is_err());
}
