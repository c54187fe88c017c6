#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, SystemTime};

use proptest::prelude::*;
use tempfile::tempdir;

use super::*;
use crate::cache;
use crate::data::GENERIC_PLATFORM;
use crate::extractor::{ExtractError, WorkerResult};

/// Delegates to [`MarkerExtractor`] but counts every call, so tests can
/// assert the metadata builder's fast path actually skips re-extraction.
struct CountingExtractor {
    calls: Arc<AtomicUsize>,
}

impl Extractor for CountingExtractor {
    fn extract(&self, path: &Path) -> std::result::Result<WorkerResult, ExtractError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        MarkerExtractor.extract(path)
    }
}

fn options_for(roots_dir: &Path, cache_dir: &Path) -> HasteMapOptions {
    let mut options = HasteMapOptions::new("proj", vec![roots_dir.to_path_buf()], vec!["js".to_string()]);
    options.cache_directory = cache_dir.to_path_buf();
    options
}

#[test]
fn empty_project_builds_to_empty_tables_and_creates_cache_file() {
    let roots_dir = tempdir().unwrap();
    let cache_dir = tempdir().unwrap();
    let options = options_for(roots_dir.path(), cache_dir.path());
    let cache_path = cache::cache_file_path(&options);

    let builder = HasteMapBuilder::new(options);
    let output = builder.build().unwrap();

    assert!(output.file_store.is_empty());
    assert!(cache_path.exists());
}

#[test]
fn single_module_is_indexed_under_generic_platform() {
    let roots_dir = tempdir().unwrap();
    let cache_dir = tempdir().unwrap();
    let a_path = roots_dir.path().join("a.js");
    std::fs::write(&a_path, "// haste-id: A\n").unwrap();

    let builder = HasteMapBuilder::new(options_for(roots_dir.path(), cache_dir.path()));
    let output = builder.build().unwrap();

    assert_eq!(output.module_map.get_module("A", GENERIC_PLATFORM, false), Some(a_path.as_path()));
    assert!(output.file_store.exists(&a_path));
}

#[test]
fn platform_specific_files_install_under_distinct_platforms_without_collision() {
    let roots_dir = tempdir().unwrap();
    let cache_dir = tempdir().unwrap();
    let ios_path = roots_dir.path().join("P.ios.js");
    let android_path = roots_dir.path().join("P.android.js");
    std::fs::write(&ios_path, "// haste-id: P\n").unwrap();
    std::fs::write(&android_path, "// haste-id: P\n").unwrap();

    let mut options = options_for(roots_dir.path(), cache_dir.path());
    options.platforms = vec!["ios".to_string(), "android".to_string()];

    let builder = HasteMapBuilder::new(options);
    let output = builder.build().unwrap();

    assert_eq!(output.module_map.get_module("P", "ios", false), Some(ios_path.as_path()));
    assert_eq!(output.module_map.get_module("P", "android", false), Some(android_path.as_path()));
}

#[test]
fn collision_with_warn_policy_keeps_first_installed_path() {
    let roots_dir = tempdir().unwrap();
    let cache_dir = tempdir().unwrap();
    let a_path = roots_dir.path().join("a.js");
    let b_path = roots_dir.path().join("b.js");
    std::fs::write(&a_path, "// haste-id: X\n").unwrap();
    std::fs::write(&b_path, "// haste-id: X\n").unwrap();

    let builder = HasteMapBuilder::new(options_for(roots_dir.path(), cache_dir.path()));
    let output = builder.build().unwrap();

    assert_eq!(output.module_map.get_module("X", GENERIC_PLATFORM, false), Some(a_path.as_path()));
}

#[test]
fn collision_with_throw_policy_aborts_the_build() {
    let roots_dir = tempdir().unwrap();
    let cache_dir = tempdir().unwrap();
    let a_path = roots_dir.path().join("a.js");
    let b_path = roots_dir.path().join("b.js");
    std::fs::write(&a_path, "// haste-id: X\n").unwrap();
    std::fs::write(&b_path, "// haste-id: X\n").unwrap();

    let mut options = options_for(roots_dir.path(), cache_dir.path());
    options.collision_policy = CollisionPolicy::Throw;

    let builder = HasteMapBuilder::new(options);
    match builder.build() {
        Err(Error::ModuleCollision { id, existing, incoming, .. }) => {
            assert_eq!(id, "X");
            let mut paths = [existing, incoming];
            paths.sort();
            assert_eq!(paths, [a_path, b_path]);
        }
        other => panic!("expected ModuleCollision, got {other:?}"),
    }
}

#[test]
fn incremental_build_only_reextracts_changed_files() {
    let roots_dir = tempdir().unwrap();
    let cache_dir = tempdir().unwrap();
    let a_path = roots_dir.path().join("a.js");
    let b_path = roots_dir.path().join("b.js");
    std::fs::write(&a_path, "// haste-id: A\n").unwrap();
    std::fs::write(&b_path, "// haste-id: B\n").unwrap();

    let options = options_for(roots_dir.path(), cache_dir.path());
    let calls = Arc::new(AtomicUsize::new(0));
    let extractor: Arc<dyn Extractor> = Arc::new(CountingExtractor { calls: Arc::clone(&calls) });

    HasteMapBuilder::with_extractor(options.clone(), Arc::clone(&extractor)).build().unwrap();
    assert_eq!(calls.load(Ordering::SeqCst), 2);

    let a_mtime_before = {
        let builder = HasteMapBuilder::with_extractor(options.clone(), Arc::clone(&extractor));
        builder.build().unwrap().file_store.get_mtime(&a_path)
    };
    // Re-running with nothing changed on disk must not re-extract either.
    assert_eq!(calls.load(Ordering::SeqCst), 2);

    let file = std::fs::File::options().write(true).open(&b_path).unwrap();
    file.set_modified(SystemTime::now() + Duration::from_secs(5)).unwrap();
    drop(file);

    let builder = HasteMapBuilder::with_extractor(options, Arc::clone(&extractor));
    let output = builder.build().unwrap();

    assert_eq!(calls.load(Ordering::SeqCst), 3);
    assert_eq!(output.file_store.get_mtime(&a_path), a_mtime_before);
}

#[test]
fn repeated_build_on_same_instance_is_single_flight() {
    let roots_dir = tempdir().unwrap();
    let cache_dir = tempdir().unwrap();
    std::fs::write(roots_dir.path().join("a.js"), "// haste-id: A\n").unwrap();

    let options = options_for(roots_dir.path(), cache_dir.path());
    let calls = Arc::new(AtomicUsize::new(0));
    let extractor: Arc<dyn Extractor> = Arc::new(CountingExtractor { calls: Arc::clone(&calls) });

    let builder = HasteMapBuilder::with_extractor(options, extractor);
    builder.build().unwrap();
    assert_eq!(calls.load(Ordering::SeqCst), 1);

    builder.build().unwrap();
    builder.build().unwrap();
    assert_eq!(calls.load(Ordering::SeqCst), 1, "second and third build() must not re-run the pipeline");
}

#[test]
fn failed_build_latches_and_does_not_retry() {
    let roots_dir = tempdir().unwrap();
    let cache_dir = tempdir().unwrap();
    std::fs::write(roots_dir.path().join("a.js"), "// haste-id: X\n").unwrap();
    std::fs::write(roots_dir.path().join("b.js"), "// haste-id: X\n").unwrap();

    let mut options = options_for(roots_dir.path(), cache_dir.path());
    options.collision_policy = CollisionPolicy::Throw;

    let builder = HasteMapBuilder::new(options);
    assert!(matches!(builder.build(), Err(Error::ModuleCollision { .. })));
    assert!(matches!(builder.build(), Err(Error::Latched(_))));
}

#[test]
fn retain_all_files_keeps_node_modules_files_without_extracting_them() {
    let roots_dir = tempdir().unwrap();
    let cache_dir = tempdir().unwrap();
    let nested = roots_dir.path().join("node_modules").join("left-pad");
    std::fs::create_dir_all(&nested).unwrap();
    let vendor_path = nested.join("index.js");
    std::fs::write(&vendor_path, "// haste-id: left-pad\n").unwrap();

    let mut options = options_for(roots_dir.path(), cache_dir.path());
    options.retain_all_files = true;

    let builder = HasteMapBuilder::new(options);
    let output = builder.build().unwrap();

    assert!(output.file_store.exists(&vendor_path));
    assert_eq!(output.module_map.get_module("left-pad", GENERIC_PLATFORM, false), None);
}

#[test]
fn visited_file_missing_from_prior_map_is_reextracted_not_dropped() {
    let roots_dir = tempdir().unwrap();
    let cache_dir = tempdir().unwrap();
    let a_path = roots_dir.path().join("a.js");
    std::fs::write(&a_path, "// haste-id: A\n").unwrap();

    let options = options_for(roots_dir.path(), cache_dir.path());
    let cache_path = cache::cache_file_path(&options);

    // Seed a cache whose only record claims to be already visited and
    // declaring id "A", but "A" is absent from the prior `map` — an
    // inconsistent state the builder should recover from rather than
    // silently dropping the file.
    let mtime = std::fs::metadata(&a_path).unwrap().modified().unwrap();
    let mtime_secs = mtime
        .duration_since(std::time::SystemTime::UNIX_EPOCH)
        .unwrap()
        .as_secs() as i64;
    let mut seeded = crate::data::HasteMap::empty();
    seeded.files.insert(
        a_path.clone(),
        crate::data::FileRecord { id: Some("A".to_string()), mtime: mtime_secs, visited: true, dependencies: vec![] },
    );
    cache::persist(&cache_path, &seeded, &options.builder_version).unwrap();

    let builder = HasteMapBuilder::new(options);
    let output = builder.build().unwrap();

    assert_eq!(output.module_map.get_module("A", GENERIC_PLATFORM, false), Some(a_path.as_path()));
}

#[test]
fn mocks_pattern_registers_stem_in_mocks_registry() {
    let roots_dir = tempdir().unwrap();
    let cache_dir = tempdir().unwrap();
    let mocks_dir = roots_dir.path().join("__mocks__");
    std::fs::create_dir_all(&mocks_dir).unwrap();
    let mock_path = mocks_dir.join("widget.js");
    std::fs::write(&mock_path, "// haste-id: WidgetMock\n").unwrap();

    let mut options = options_for(roots_dir.path(), cache_dir.path());
    options.mocks_pattern = Some(r"__mocks__".to_string());

    let builder = HasteMapBuilder::new(options);
    let output = builder.build().unwrap();

    assert_eq!(output.module_map.get_mock_module("widget"), Some(mock_path.as_path()));
}

proptest! {
    /// The resolved path for every module id is the same across two
    /// independent builds of the same unchanged tree, and every resolved
    /// id is reachable in the published file store (I1).
    #[test]
    fn repeated_independent_builds_resolve_every_module_identically(
        ids in prop::collection::hash_set("[A-Za-z][A-Za-z0-9]{2,5}", 1..6)
    ) {
        let roots_dir = tempdir().unwrap();
        let cache_dir = tempdir().unwrap();

        for id in &ids {
            let path = roots_dir.path().join(format!("{id}.js"));
            std::fs::write(&path, format!("// haste-id: {id}\n")).unwrap();
        }

        let first = HasteMapBuilder::new(options_for(roots_dir.path(), cache_dir.path())).build().unwrap();
        let second = HasteMapBuilder::new(options_for(roots_dir.path(), cache_dir.path())).build().unwrap();

        for id in &ids {
            let file_path = roots_dir.path().join(format!("{id}.js"));
            prop_assert_eq!(
                first.module_map.get_module(id, GENERIC_PLATFORM, false),
                Some(file_path.as_path())
            );
            prop_assert_eq!(
                second.module_map.get_module(id, GENERIC_PLATFORM, false),
                Some(file_path.as_path())
            );
            prop_assert!(first.file_store.exists(&file_path));
            prop_assert!(second.file_store.exists(&file_path));
        }
    }
}
