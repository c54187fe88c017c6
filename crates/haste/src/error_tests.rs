#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

use super::*;

#[test]
fn config_error_maps_to_config_exit_code() {
    let err = Error::Config("no extensions configured".to_string());
    assert_eq!(ExitCode::from(&err), ExitCode::ConfigError);
}

#[test]
fn collision_maps_to_build_failed() {
    let err = Error::ModuleCollision {
        id: "Foo".to_string(),
        platform: "g".to_string(),
        existing: PathBuf::from("/src/a.js"),
        incoming: PathBuf::from("/src/b.js"),
    };
    assert_eq!(ExitCode::from(&err), ExitCode::BuildFailed);
    assert!(err.to_string().contains("/src/a.js"));
    assert!(err.to_string().contains("/src/b.js"));
}

#[test]
fn crawl_error_includes_both_messages() {
    let err = Error::Crawl {
        native: "enoent".to_string(),
        watcher: Some("socket closed".to_string()),
    };
    let msg = err.to_string();
    assert!(msg.contains("enoent"));
    assert!(msg.contains("socket closed"));
}
