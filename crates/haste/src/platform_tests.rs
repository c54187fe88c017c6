#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

use std::path::Path;

use super::*;

fn platforms() -> HashSet<String> {
    ["ios", "android"].into_iter().map(String::from).collect()
}

#[test]
fn plain_file_has_no_platform() {
    assert_eq!(
        extract_platform_from_filename(Path::new("/src/P.js"), &platforms()),
        None
    );
}

#[test]
fn known_platform_token_is_extracted() {
    assert_eq!(
        extract_platform_from_filename(Path::new("/src/P.ios.js"), &platforms()),
        Some("ios".to_string())
    );
    assert_eq!(
        extract_platform_from_filename(Path::new("/src/P.android.js"), &platforms()),
        Some("android".to_string())
    );
}

#[test]
fn unknown_token_is_not_a_platform() {
    assert_eq!(
        extract_platform_from_filename(Path::new("/src/P.min.js"), &platforms()),
        None
    );
}

#[test]
fn effective_platform_falls_back_to_generic() {
    assert_eq!(
        effective_platform(Path::new("/src/P.js"), &platforms()),
        GENERIC_PLATFORM
    );
    assert_eq!(
        effective_platform(Path::new("/src/P.ios.js"), &platforms()),
        "ios"
    );
}
