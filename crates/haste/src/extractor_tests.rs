#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

use tempfile::tempdir;

use super::*;

fn write(dir: &tempfile::TempDir, name: &str, content: &str) -> std::path::PathBuf {
    let path = dir.path().join(name);
    std::fs::write(&path, content).unwrap();
    path
}

#[test]
fn file_with_no_markers_declares_nothing() {
    let dir = tempdir().unwrap();
    let path = write(&dir, "a.js", "console.log('hi');\n");

    let result = MarkerExtractor.extract(&path).unwrap();
    assert_eq!(result.id, None);
    assert!(result.module.is_none());
    assert!(result.dependencies.is_empty());
}

#[test]
fn id_marker_declares_a_module() {
    let dir = tempdir().unwrap();
    let path = write(&dir, "a.js", "// haste-id: A\nconsole.log('hi');\n");

    let result = MarkerExtractor.extract(&path).unwrap();
    assert_eq!(result.id, Some("A".to_string()));
    let module = result.module.unwrap();
    assert_eq!(module.path, path);
    assert_eq!(module.kind, ModuleKind::Module);
}

#[test]
fn kind_marker_selects_package() {
    let dir = tempdir().unwrap();
    let path = write(
        &dir,
        "package.json",
        "// haste-id: Widgets\n// haste-kind: package\n",
    );

    let result = MarkerExtractor.extract(&path).unwrap();
    assert_eq!(result.module.unwrap().kind, ModuleKind::Package);
}

#[test]
fn deps_marker_is_parsed_into_list() {
    let dir = tempdir().unwrap();
    let path = write(&dir, "a.js", "// haste-deps: B, C ,D\n");

    let result = MarkerExtractor.extract(&path).unwrap();
    assert_eq!(result.id, None);
    assert_eq!(
        result.dependencies,
        vec!["B".to_string(), "C".to_string(), "D".to_string()]
    );
}

#[test]
fn oversized_file_is_rejected() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("a.js");
    let file = std::fs::File::create(&path).unwrap();
    // A sparse file avoids actually writing MAX_EXTRACT_SIZE bytes to disk;
    // only its reported length matters to the size check.
    file.set_len(MAX_EXTRACT_SIZE + 1).unwrap();
    drop(file);

    let err = MarkerExtractor.extract(&path).unwrap_err();
    assert!(matches!(err, ExtractError::TooLarge(size) if size == MAX_EXTRACT_SIZE + 1));
}

#[test]
fn missing_file_is_an_io_error() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("missing.js");

    let err = MarkerExtractor.extract(&path).unwrap_err();
    assert!(matches!(err, ExtractError::Io { .. }));
}
